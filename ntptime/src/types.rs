use core::fmt::{Display, Formatter};

/// Well-known NTP server port
pub const NTP_PORT: u16 = 123;
/// Local UDP port the client binds to unless configured otherwise
pub const DEFAULT_LOCAL_PORT: u16 = 1337;
/// Default delay between two requests, in seconds
pub const DEFAULT_SEND_INTERVAL_SEC: u32 = 1;
/// Default time to wait for a reply before the request is considered lost, in seconds
pub const DEFAULT_REPLY_TIMEOUT_SEC: u32 = 1;
/// Upper bound accepted by [`Config::set_send_interval`]
pub const MAX_SEND_INTERVAL_SEC: u32 = 60;
/// Upper bound accepted by [`Config::set_reply_timeout`]
pub const MAX_REPLY_TIMEOUT_SEC: u32 = 60;
/// Milliseconds in second constant
pub(crate) const MSEC_IN_SEC: u64 = 1_000;

/// Library result type
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the time client
///
/// Errors originate either from rejected configuration values or from the
/// underlying datagram transport. Transport errors never leave
/// [`TimeSyncClient::poll`](crate::TimeSyncClient::poll), the state machine
/// recovers from them on its own.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Requested send interval exceeds [`MAX_SEND_INTERVAL_SEC`]
    SendIntervalOutOfRange,
    /// Requested reply timeout exceeds [`MAX_REPLY_TIMEOUT_SEC`]
    ReplyTimeoutOutOfRange,
    /// Network error occurred
    Network,
    /// A NTP server address can not be resolved
    AddressResolve,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::SendIntervalOutOfRange => "send interval is out of range",
            Error::ReplyTimeoutOutOfRange => "reply timeout is out of range",
            Error::Network => "network error",
            Error::AddressResolve => "unable to resolve server address",
        };

        write!(f, "{msg}")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Daylight saving time rule applied on top of the timezone offset
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum DstRule {
    /// Timezone offset only
    #[default]
    None,
    /// Last Sunday of March to last Sunday of October, switching at 01:00
    European,
    /// Second Sunday of March to first Sunday of November, switching at 02:00 local
    Us,
}

/// Internal state of the request/response machine
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SyncState {
    /// No request is outstanding, the next poll may send one
    AwaitingSend,
    /// A request has been sent and the client waits for the reply
    AwaitingReply,
}

/// Per-client configuration
///
/// Unbounded values are set with the `with_*` builder methods, the send
/// interval and the reply timeout go through setters that reject values
/// above their limits and leave the previous value in place.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Config<'a> {
    server: &'a str,
    server_port: u16,
    local_port: u16,
    timezone_hours: f32,
    dst_rule: DstRule,
    send_interval_sec: u32,
    reply_timeout_sec: u32,
}

impl<'a> Config<'a> {
    /// Create configuration for the given server host name or IP address
    /// with UTC, no DST and default intervals
    #[must_use]
    pub fn new(server: &'a str) -> Self {
        Config {
            server,
            server_port: NTP_PORT,
            local_port: DEFAULT_LOCAL_PORT,
            timezone_hours: 0.0,
            dst_rule: DstRule::None,
            send_interval_sec: DEFAULT_SEND_INTERVAL_SEC,
            reply_timeout_sec: DEFAULT_REPLY_TIMEOUT_SEC,
        }
    }

    /// Set NTP server port
    #[must_use]
    pub fn with_server_port(mut self, port: u16) -> Self {
        self.server_port = port;
        self
    }

    /// Set local port the transport binds to
    #[must_use]
    pub fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = port;
        self
    }

    /// Set timezone as a difference to UTC in hours, fractions allowed (e.g. `5.5`)
    #[must_use]
    pub fn with_timezone(mut self, hours: f32) -> Self {
        self.timezone_hours = hours;
        self
    }

    /// Set daylight saving time rule
    #[must_use]
    pub fn with_dst_rule(mut self, rule: DstRule) -> Self {
        self.dst_rule = rule;
        self
    }

    /// Set delay between requests in seconds
    ///
    /// # Errors
    ///
    /// Returns [`Error::SendIntervalOutOfRange`] if `seconds` exceeds
    /// [`MAX_SEND_INTERVAL_SEC`]; the current value is kept.
    pub fn set_send_interval(&mut self, seconds: u32) -> Result<()> {
        if seconds > MAX_SEND_INTERVAL_SEC {
            return Err(Error::SendIntervalOutOfRange);
        }

        self.send_interval_sec = seconds;
        Ok(())
    }

    /// Set reply timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReplyTimeoutOutOfRange`] if `seconds` exceeds
    /// [`MAX_REPLY_TIMEOUT_SEC`]; the current value is kept.
    pub fn set_reply_timeout(&mut self, seconds: u32) -> Result<()> {
        if seconds > MAX_REPLY_TIMEOUT_SEC {
            return Err(Error::ReplyTimeoutOutOfRange);
        }

        self.reply_timeout_sec = seconds;
        Ok(())
    }

    #[must_use]
    pub fn server(&self) -> &'a str {
        self.server
    }

    #[must_use]
    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    #[must_use]
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    #[must_use]
    pub fn timezone(&self) -> f32 {
        self.timezone_hours
    }

    #[must_use]
    pub fn dst_rule(&self) -> DstRule {
        self.dst_rule
    }

    #[must_use]
    pub fn send_interval(&self) -> u32 {
        self.send_interval_sec
    }

    #[must_use]
    pub fn reply_timeout(&self) -> u32 {
        self.reply_timeout_sec
    }

    pub(crate) fn send_interval_ms(&self) -> u64 {
        u64::from(self.send_interval_sec) * MSEC_IN_SEC
    }

    pub(crate) fn reply_timeout_ms(&self) -> u64 {
        u64::from(self.reply_timeout_sec) * MSEC_IN_SEC
    }
}

/// A trait encapsulating the datagram socket operations required by the client
///
/// All methods must return immediately: [`DatagramTransport::available`] reports
/// `0` when nothing has been received yet instead of waiting for data.
pub trait DatagramTransport {
    /// Bind the transport to `local_port` for receiving replies
    ///
    /// # Errors
    ///
    /// Will return `Err` if the underlying socket can not be opened
    fn open(&mut self, local_port: u16) -> Result<()>;

    /// Send the given buffer to `host:port`. On success, returns the number
    /// of bytes written.
    ///
    /// Delivery is best effort, a lost datagram is detected by the client
    /// through its reply timeout.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the host can not be resolved or an underlying send fails
    fn send_to(&mut self, buf: &[u8], host: &str, port: u16) -> Result<usize>;

    /// Returns the size of the next pending datagram, `0` if there is none
    fn available(&mut self) -> usize;

    /// Consume one pending datagram into `buf`, returns the number of bytes copied
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Whether the network link is up. Transports without such knowledge
    /// keep the default.
    fn is_connected(&self) -> bool {
        true
    }
}

impl<T: DatagramTransport + ?Sized> DatagramTransport for &mut T {
    fn open(&mut self, local_port: u16) -> Result<()> {
        (**self).open(local_port)
    }

    fn send_to(&mut self, buf: &[u8], host: &str, port: u16) -> Result<usize> {
        (**self).send_to(buf, host, port)
    }

    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        (**self).read(buf)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// A trait encapsulating a monotonic millisecond counter
///
/// Under `no_std` environments there is no `Instant::now()`, so a board
/// specific tick counter can be plugged in instead. The counter may wrap,
/// elapsed time is computed with wrapping arithmetic.
pub trait MonotonicClock {
    /// Returns milliseconds elapsed since an arbitrary fixed point
    fn millis(&self) -> u64;
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn millis(&self) -> u64 {
        (**self).millis()
    }
}

#[cfg(feature = "std")]
/// Supplementary module to implement some `ntptime` boilerplate that environments with
/// `std` enable have to re-implement.
mod sup {
    use std::time::Instant;

    use crate::MonotonicClock;

    /// Standard library clock wrapper type that relies on [`std::time::Instant`]
    #[derive(Copy, Clone, Debug)]
    pub struct StdClock {
        origin: Instant,
    }

    impl Default for StdClock {
        fn default() -> Self {
            StdClock {
                origin: Instant::now(),
            }
        }
    }

    impl MonotonicClock for StdClock {
        #[allow(clippy::cast_possible_truncation)]
        fn millis(&self) -> u64 {
            self.origin.elapsed().as_millis() as u64
        }
    }
}

#[cfg(feature = "std")]
pub use sup::*;
