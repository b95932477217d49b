//! TCP Transport
//!
//! Blocking `std::net` socket with per-call read timeouts.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::BytesMut;

use crate::config::Config;
use crate::error::{DriverError, Result};
use super::{is_timeout, not_connected, Transport};

/// Transport over a TCP connection
pub struct TcpTransport {
    /// None once closed
    stream: Option<TcpStream>,

    /// Bytes requested from the socket per read
    read_chunk_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpTransport {
    /// Connect to the endpoint named by the config
    ///
    /// Tries every resolved address in turn with the connect timeout.
    pub fn connect(config: &Config) -> Result<Self> {
        let addr = config.addr();
        let timeout = config.connect_timeout();

        let mut last_err = None;
        for sock_addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&sock_addr, timeout) {
                Ok(stream) => {
                    let mut transport = Self::from_stream(stream)?;
                    transport.read_chunk_size = config.read_chunk_size;
                    transport.set_write_timeout(config.write_timeout())?;
                    return Ok(transport);
                }
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", sock_addr, e);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if is_timeout(&e) => Err(DriverError::Timeout(format!(
                "connect to {} timed out after {} ms",
                addr, config.connect_timeout_ms
            ))),
            Some(e) => Err(DriverError::Transport(e)),
            None => Err(DriverError::Transport(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{} did not resolve to any address", addr),
            ))),
        }
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm; requests are small and latency bound
        stream.set_nodelay(true)?;

        Ok(Self {
            stream: Some(stream),
            read_chunk_size: Config::default().read_chunk_size,
            peer_addr,
        })
    }

    /// Bound how long a single write may block
    pub fn set_write_timeout(&mut self, timeout: Duration) -> Result<()> {
        let stream = self.stream.as_ref().ok_or(DriverError::NotConnected)?;
        stream.set_write_timeout(Some(nonzero(timeout)))?;
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    fn stream_mut(&mut self) -> io::Result<&mut TcpStream> {
        self.stream.as_mut().ok_or_else(not_connected)
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.stream_mut()?.write(bytes)
    }

    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let stream = self.stream_mut()?;
        stream.set_read_timeout(Some(nonzero(timeout)))?;

        let mut probe = [0u8; 1];
        loop {
            // peek returns Ok(0) at end of stream; read_available reports it
            match stream.peek(&mut probe) {
                Ok(_) => return Ok(true),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_timeout(&e) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
    }

    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        let chunk = self.read_chunk_size;
        let stream = self.stream_mut()?;

        let start = buf.len();
        buf.resize(start + chunk, 0);
        loop {
            match stream.read(&mut buf[start..]) {
                Ok(n) => {
                    buf.truncate(start + n);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    buf.truncate(start);
                    return Err(e);
                }
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            tracing::debug!("Closing connection to {}", self.peer_addr);
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Socket timeouts reject a zero duration
fn nonzero(timeout: Duration) -> Duration {
    timeout.max(Duration::from_millis(1))
}
