//! Transport Module
//!
//! The byte-stream boundary the driver depends on.
//!
//! ## Contract
//! - `write` may send only part of the slice; the driver retries the rest
//! - `wait_readable` blocks until bytes are available or the timeout passes
//! - `read_available` appends what is available without blocking
//!   (0 bytes appended means the peer closed the stream)

mod tcp;
mod memory;

pub use tcp::TcpTransport;
pub use memory::MemoryTransport;

use std::io;
use std::time::Duration;

use bytes::BytesMut;

/// Blocking byte stream with explicit timeouts
pub trait Transport {
    /// Write some prefix of `bytes`, returning how many were sent
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Wait up to `timeout` for readable bytes; false on timeout
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Append currently available bytes to `buf`, returning the count
    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize>;

    /// Release the stream; further calls fail with `NotConnected`
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Whether an I/O error is a timeout rather than a broken stream
///
/// Platforms report socket timeouts as either `WouldBlock` or `TimedOut`.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

pub(crate) fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is closed")
}
