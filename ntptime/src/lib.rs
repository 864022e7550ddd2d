//! Rust non-blocking SNTP time client
//!
//! # Overview
//!
//! This crate requests the current time from an NTP server, converts the
//! received UNIX timestamp into calendar fields and applies a timezone
//! offset together with an optional daylight saving time rule:
//! - European: last Sunday of March to last Sunday of October
//! - US: second Sunday of March to first Sunday of November
//!
//! Only the seconds of the server transmit timestamp are used, the client
//! neither authenticates the server nor corrects for the network delay.
//!
//! # Usage
//!
//! Put this in your `Cargo.toml`:
//! ```cargo
//! [dependencies]
//! ntptime = "0.1"
//! ```
//!
//! ## Features
//!
//! `ntptime` supports several features:
//! - `std`: includes functionality that depends on the standard library
//! - `utils`: conversion of [`CalendarTime`] into `chrono` types
//! - `log`: enables library debug output during execution
//! - `defmt`: same as `log` but through `defmt` for embedded targets
//!
//! # Details
//!
//! [`TimeSyncClient::poll`] never blocks. It is meant to be called from a
//! cooperative main loop: every call either sends a request, checks for the
//! reply or does nothing, and returns `Some` only when a new time has been
//! received. At most one request is outstanding at any moment, a request
//! without a reply within the configured timeout is sent again.
//!
//! As `ntptime` supports `no_std` environment as well, the I/O is hidden
//! behind a set of traits:
//! - [`DatagramTransport`] trait should be implemented for `UdpSocket`-like objects
//!   for the library to be able to send and receive data from NTP servers
//! - [`MonotonicClock`] trait should be implemented for a tick counter so the
//!   library can measure the send interval and the reply timeout
//!
//! ## Logging support
//!
//! Library debug logs can be enabled in executables by enabling `log` feature. Requests,
//! replies and timeouts will be printed.
//!
//! # Example
//!
//! ```rust
//! use ntptime::{Config, DatagramTransport, DstRule, MonotonicClock, Result, TimeSyncClient};
//!
//! /// Answers every request with a fixed server time
//! struct LoopbackTransport {
//!     pending: bool,
//! }
//!
//! impl DatagramTransport for LoopbackTransport {
//!     fn open(&mut self, _local_port: u16) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     fn send_to(&mut self, buf: &[u8], _host: &str, _port: u16) -> Result<usize> {
//!         self.pending = true;
//!         Ok(buf.len())
//!     }
//!
//!     fn available(&mut self) -> usize {
//!         if self.pending { 48 } else { 0 }
//!     }
//!
//!     fn read(&mut self, buf: &mut [u8]) -> usize {
//!         self.pending = false;
//!         buf.fill(0);
//!         buf[40..44].copy_from_slice(&3_828_166_564u32.to_be_bytes());
//!         buf.len()
//!     }
//! }
//!
//! struct Ticks;
//!
//! impl MonotonicClock for Ticks {
//!     fn millis(&self) -> u64 {
//!         0
//!     }
//! }
//!
//! let config = Config::new("pool.ntp.org")
//!     .with_timezone(1.0)
//!     .with_dst_rule(DstRule::European);
//! let mut client = TimeSyncClient::new(config, LoopbackTransport { pending: false }, Ticks);
//!
//! loop {
//!     if let Some(time) = client.poll() {
//!         assert_eq!((2021, 4, 23), (time.year, time.month, time.day));
//!         println!("Local time: {time}");
//!         break;
//!     }
//!     // other cooperative work goes here
//! }
//! ```
//!
//! For a client running over [`std::net::UdpSocket`] see the `ntptime-net-std` crate.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "utils")]
pub mod utils;

pub mod calendar;
pub mod dst;
mod log;
mod packet;
mod types;

pub use crate::calendar::{to_calendar, CalendarTime};
pub use crate::dst::adjust;
pub use crate::packet::NTP_PACKET_SIZE;
pub use crate::types::*;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::log::{debug, error};
use crate::packet::RawNtpPacket;

/// Non-blocking SNTP client
///
/// Owns the request/response state machine, its packet buffer and the
/// configuration. Several clients can live side by side, nothing is shared
/// between them.
pub struct TimeSyncClient<'a, T, C> {
    transport: T,
    clock: C,
    config: Config<'a>,
    state: SyncState,
    /// Timestamp of the last request, `None` until the first one is sent
    last_send: Option<u64>,
    opened: bool,
    last_time: Option<CalendarTime>,
}

impl<'a, T, C> TimeSyncClient<'a, T, C>
where
    T: DatagramTransport,
    C: MonotonicClock,
{
    /// Create a client. No I/O happens before the first [`TimeSyncClient::poll`].
    pub fn new(config: Config<'a>, transport: T, clock: C) -> Self {
        TimeSyncClient {
            transport,
            clock,
            config,
            state: SyncState::AwaitingSend,
            last_send: None,
            opened: false,
            last_time: None,
        }
    }

    /// Advance the state machine by one step
    ///
    /// Returns `Some` with the local calendar time when a valid reply has been
    /// processed during this call, `None` otherwise. Lost requests, transport
    /// failures and malformed replies all show up as `None`; the machine
    /// recovers from them by itself.
    pub fn poll(&mut self) -> Option<CalendarTime> {
        if !self.transport.is_connected() {
            #[cfg(any(feature = "log", feature = "defmt"))]
            debug!("network is not connected");
            return None;
        }

        match self.state {
            SyncState::AwaitingSend => {
                self.poll_send();
                None
            }
            SyncState::AwaitingReply => self.poll_reply(),
        }
    }

    fn poll_send(&mut self) {
        self.drop_stale_datagram();

        let now = self.clock.millis();

        if let Some(sent) = self.last_send {
            if now.wrapping_sub(sent) < self.config.send_interval_ms() {
                return;
            }
        }

        if !self.opened {
            if let Err(_err) = self.transport.open(self.config.local_port()) {
                #[cfg(any(feature = "log", feature = "defmt"))]
                error!("Unable to open transport: {}", _err);
                return;
            }

            self.opened = true;
        }

        let request = RawNtpPacket::request();
        let host = self.config.server();
        let port = self.config.server_port();

        match self.transport.send_to(&request.0, host, port) {
            Ok(size) if size == NTP_PACKET_SIZE => {
                #[cfg(any(feature = "log", feature = "defmt"))]
                debug!("Request sent to {}:{}", host, port);
            }
            Ok(_size) => {
                #[cfg(any(feature = "log", feature = "defmt"))]
                error!("Request to {}:{} truncated to {} bytes", host, port, _size);
            }
            Err(_err) => {
                #[cfg(any(feature = "log", feature = "defmt"))]
                error!("Unable to send request to {}:{}: {}", host, port, _err);
            }
        }

        self.last_send = Some(now);
        self.state = SyncState::AwaitingReply;
    }

    fn poll_reply(&mut self) -> Option<CalendarTime> {
        let now = self.clock.millis();

        if self.transport.available() == 0 {
            let sent = self.last_send.unwrap_or(now);

            if now.wrapping_sub(sent) >= self.config.reply_timeout_ms() {
                #[cfg(any(feature = "log", feature = "defmt"))]
                debug!("Reply timeout after {} ms", now.wrapping_sub(sent));
                self.state = SyncState::AwaitingSend;
            }

            return None;
        }

        let mut response = RawNtpPacket::default();
        let size = self.transport.read(&mut response.0);
        self.state = SyncState::AwaitingSend;

        let unix_time = if size < NTP_PACKET_SIZE {
            0
        } else {
            response.unix_seconds()
        };

        if unix_time == 0 {
            #[cfg(any(feature = "log", feature = "defmt"))]
            debug!("Malformed reply of {} bytes dropped", size);
            return None;
        }

        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("Reply received, UNIX time: {}", unix_time);

        let local_time = adjust(
            unix_time,
            self.config.timezone(),
            self.config.dst_rule(),
        );
        let time = to_calendar(local_time);
        self.last_time = Some(time);

        Some(time)
    }

    /// Datagrams showing up while no request is outstanding belong to a
    /// request that already timed out
    fn drop_stale_datagram(&mut self) {
        if !self.opened || self.transport.available() == 0 {
            return;
        }

        let mut scratch = RawNtpPacket::default();
        let _size = self.transport.read(&mut scratch.0);
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("Stale datagram of {} bytes dropped", _size);
    }

    /// Set delay between requests in seconds
    ///
    /// # Errors
    ///
    /// Returns [`Error::SendIntervalOutOfRange`] if `seconds` exceeds
    /// [`MAX_SEND_INTERVAL_SEC`]; the current value is kept.
    pub fn set_send_interval(&mut self, seconds: u32) -> Result<()> {
        self.config.set_send_interval(seconds)
    }

    /// Set reply timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReplyTimeoutOutOfRange`] if `seconds` exceeds
    /// [`MAX_REPLY_TIMEOUT_SEC`]; the current value is kept.
    pub fn set_reply_timeout(&mut self, seconds: u32) -> Result<()> {
        self.config.set_reply_timeout(seconds)
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &Config<'a> {
        &self.config
    }

    /// Most recent time returned by [`TimeSyncClient::poll`]
    #[must_use]
    pub fn last_time(&self) -> Option<CalendarTime> {
        self.last_time
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
