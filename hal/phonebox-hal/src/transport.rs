//! Server connection abstraction
//!
//! The node talks to the central server over a reliable, ordered,
//! connection-oriented byte stream (a TCP socket on the real board).
//! Byte transfer reuses the `embedded-io` traits; this module only adds
//! the connection lifecycle on top.

use embedded_io::{Read, ReadReady, Write};

/// Connected byte stream to the central server
///
/// - [`Read::read`] blocks until at least one byte is available and
///   returns how many were copied; `Ok(0)` means the peer closed.
/// - [`ReadReady::read_ready`] reports whether bytes are buffered, so a
///   read would not block.
/// - [`Write::write_all`] sends a complete reply.
pub trait Transport: Read + Write + ReadReady {
    /// Check whether the connection is currently up
    fn connected(&mut self) -> bool;

    /// Open a connection to `host:port`
    ///
    /// Blocks until the attempt succeeds or fails. Link bring-up (e.g.
    /// Wi-Fi association) is the implementation's concern.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), Self::Error>;
}

/// Server endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Endpoint<'a> {
    /// Host name or dotted address
    pub host: &'a str,
    /// TCP port
    pub port: u16,
}

impl<'a> Endpoint<'a> {
    /// Create an endpoint
    pub const fn new(host: &'a str, port: u16) -> Self {
        Self { host, port }
    }

    /// Connect `transport` to this endpoint
    pub fn connect<T: Transport>(&self, transport: &mut T) -> Result<(), T::Error> {
        transport.connect(self.host, self.port)
    }
}
