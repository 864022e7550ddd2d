//! Standard library UDP transport for the [`ntptime`] SNTP client library.
//!
//! This crate provides a thin wrapper around [`std::net::UdpSocket`] that implements
//! the [`DatagramTransport`] trait. The socket is switched to non-blocking mode, so
//! [`ntptime::TimeSyncClient::poll`] returns immediately whether a reply is there or not.
//!
//! Server names are resolved on the first send and cached afterwards; the
//! resolution itself goes through the system resolver and may block.
//!
//! # Example
//!
//! ```no_run
//! use ntptime::{Config, DstRule, StdClock, TimeSyncClient};
//! use ntptime_net_std::UdpTransport;
//!
//! let config = Config::new("pool.ntp.org")
//!     .with_timezone(1.0)
//!     .with_dst_rule(DstRule::European);
//! let mut client = TimeSyncClient::new(config, UdpTransport::new(), StdClock::default());
//!
//! loop {
//!     if let Some(time) = client.poll() {
//!         println!("Local time: {time}");
//!         break;
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! ```

use ntptime::{DatagramTransport, Error, Result};

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};

#[cfg(feature = "log")]
use log::debug;

/// Large enough to peek at any sane SNTP reply
const PEEK_BUF_SIZE: usize = 512;

/// A wrapper around [`std::net::UdpSocket`] that implements [`DatagramTransport`].
///
/// The socket is created by [`DatagramTransport::open`] unless one has been
/// handed over with [`From<UdpSocket>`]. It is only used for I/O once it is
/// in non-blocking mode.
#[derive(Debug, Default)]
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    nonblocking: bool,
    resolved: Option<(String, u16, SocketAddr)>,
}

impl UdpTransport {
    /// Creates a transport without a socket, it gets bound on the first request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Local address of the underlying socket once it is open
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn ready_socket(&self) -> Option<&UdpSocket> {
        self.socket.as_ref().filter(|_| self.nonblocking)
    }

    fn resolve(&mut self, host: &str, port: u16) -> Result<SocketAddr> {
        if let Some((cached_host, cached_port, addr)) = &self.resolved {
            if cached_host == host && *cached_port == port {
                return Ok(*addr);
            }
        }

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|_| Error::AddressResolve)?
            .find(SocketAddr::is_ipv4)
            .ok_or(Error::AddressResolve)?;

        #[cfg(feature = "log")]
        debug!("{}:{} resolved to {}", host, port, addr);

        self.resolved = Some((host.to_owned(), port, addr));
        Ok(addr)
    }

    fn discard(socket: &UdpSocket) {
        let mut buf = [0u8; PEEK_BUF_SIZE];
        let _ = socket.recv_from(&mut buf);
    }
}

impl From<UdpSocket> for UdpTransport {
    /// Wraps an already bound socket and switches it to non-blocking mode.
    /// Should that fail, the transport stays idle until
    /// [`DatagramTransport::open`] succeeds.
    fn from(socket: UdpSocket) -> Self {
        let nonblocking = socket.set_nonblocking(true).is_ok();

        UdpTransport {
            socket: Some(socket),
            nonblocking,
            resolved: None,
        }
    }
}

impl DatagramTransport for UdpTransport {
    fn open(&mut self, local_port: u16) -> Result<()> {
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => UdpSocket::bind((Ipv4Addr::UNSPECIFIED, local_port))
                .map_err(|_| Error::Network)?,
        };

        let result = socket.set_nonblocking(true).map_err(|_| Error::Network);
        self.nonblocking = result.is_ok();
        self.socket = Some(socket);
        result
    }

    fn send_to(&mut self, buf: &[u8], host: &str, port: u16) -> Result<usize> {
        let addr = self.resolve(host, port)?;
        let socket = self.ready_socket().ok_or(Error::Network)?;

        match socket.send_to(buf, addr) {
            Ok(size) => Ok(size),
            Err(_) => {
                self.resolved = None;
                Err(Error::Network)
            }
        }
    }

    fn available(&mut self) -> usize {
        let Some(socket) = self.ready_socket() else {
            return 0;
        };
        let mut buf = [0u8; PEEK_BUF_SIZE];

        match socket.peek_from(&mut buf) {
            Ok((0, _)) => {
                Self::discard(socket);
                0
            }
            Ok((size, _)) => size,
            Err(e) if e.kind() == ErrorKind::WouldBlock => 0,
            Err(_e) => {
                #[cfg(feature = "log")]
                debug!("Datagram dropped: {:?}", _e);
                Self::discard(socket);
                0
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.ready_socket()
            .and_then(|socket| socket.recv_from(buf).ok())
            .map_or(0, |(size, _)| size)
    }
}
