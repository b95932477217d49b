//! Driver Module
//!
//! The request/response loop over one connection.
//!
//! ## Responsibilities
//! - Encode a command and write it out completely
//! - Read until one whole reply is buffered, then trim exactly its bytes
//! - Separate server errors (connection fine) from transport, timeout and
//!   protocol failures (connection broken)

use std::io;

use bytes::{Buf, BytesMut};

use crate::config::Config;
use crate::error::{DriverError, Result};
use crate::protocol::{Command, Limits, ParseOutcome, Protocol, Reply, Resp};
use crate::transport::{is_timeout, TcpTransport, Transport};

/// A synchronous client connection
///
/// ## Usage Model
///
/// - One request in flight at a time; no pipelining
/// - Not internally synchronized; hand each instance to one thread at a time
/// - After a connection-fatal error (see [`DriverError::is_connection_fatal`])
///   the driver refuses requests until `close()` and a fresh `open()`
pub struct Driver<T: Transport = TcpTransport, P: Protocol = Resp> {
    /// Driver configuration
    config: Config,

    /// None while closed
    transport: Option<T>,

    /// Request framing and reply decoding state
    protocol: P,

    /// Received bytes not yet consumed by a reply
    buffer: BytesMut,

    /// Scratch space for encoded requests
    out: BytesMut,

    /// Set by a connection-fatal error
    broken: bool,
}

impl Driver<TcpTransport, Resp> {
    /// Create a closed driver for the configured endpoint
    pub fn new(config: Config) -> Self {
        let protocol = Resp::with_limits(Limits::from(&config));
        Self::build(config, None, protocol)
    }

    /// Create a driver and open its TCP connection
    pub fn connect(config: Config) -> Result<Self> {
        let mut driver = Self::new(config);
        driver.open()?;
        Ok(driver)
    }

    /// Establish the TCP connection, replacing any previous one
    pub fn open(&mut self) -> Result<()> {
        self.config.validate()?;
        self.close();

        let transport = TcpTransport::connect(&self.config)?;
        tracing::debug!(
            "Connected to {} backend at {}",
            self.config.backend,
            transport.peer_addr()
        );
        self.attach(transport);
        Ok(())
    }
}

impl<T: Transport> Driver<T, Resp> {
    /// Create an open driver over an existing transport
    pub fn with_transport(config: Config, transport: T) -> Self {
        let protocol = Resp::with_limits(Limits::from(&config));
        Self::build(config, Some(transport), protocol)
    }
}

impl<T: Transport, P: Protocol> Driver<T, P> {
    /// Create an open driver with explicit framing
    pub fn with_protocol(config: Config, transport: T, protocol: P) -> Self {
        Self::build(config, Some(transport), protocol)
    }

    fn build(config: Config, transport: Option<T>, protocol: P) -> Self {
        Self {
            config,
            transport,
            protocol,
            buffer: BytesMut::new(),
            out: BytesMut::new(),
            broken: false,
        }
    }

    /// Swap in a fresh transport, closing the old one and clearing all state
    pub fn attach(&mut self, transport: T) {
        self.close();
        self.transport = Some(transport);
        self.broken = false;
    }

    /// Release the transport and drop buffered bytes; idempotent
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            tracing::debug!("Closed {} connection to {}", self.config.backend, self.config.addr());
        }
        self.clear_state();
        self.broken = false;
    }

    /// True while the transport is open and no fatal error has occurred
    pub fn is_open(&self) -> bool {
        !self.broken && self.transport.as_ref().is_some_and(|t| t.is_open())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Bytes received but not yet consumed by a reply
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Send a command and wait for its reply
    ///
    /// An error reply comes back as `DriverError::Server`; the connection
    /// stays usable.
    pub fn request(&mut self, command: &Command) -> Result<Reply> {
        match self.request_raw(command)? {
            Reply::Error(message) => Err(DriverError::server(&message)),
            reply => Ok(reply),
        }
    }

    /// Send a command and return whatever reply arrives, error replies included
    pub fn request_raw(&mut self, command: &Command) -> Result<Reply> {
        if !self.is_open() {
            return Err(DriverError::NotConnected);
        }

        tracing::trace!(
            "Request {} ({} args)",
            String::from_utf8_lossy(command.name()),
            command.len()
        );

        let result = self.send(command).and_then(|()| self.receive());
        if let Err(e) = &result {
            if e.is_connection_fatal() {
                tracing::warn!("Connection to {} broken: {}", self.config.addr(), e);
                self.clear_state();
                self.broken = true;
            }
        }
        result
    }

    /// Write the whole encoded command, retrying short writes
    fn send(&mut self, command: &Command) -> Result<()> {
        self.out.clear();
        self.protocol.encode(command, &mut self.out)?;

        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;
        let mut written = 0;
        while written < self.out.len() {
            match transport.write(&self.out[written..]) {
                Ok(0) => {
                    return Err(DriverError::Transport(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "transport accepted no bytes",
                    )))
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_timeout(&e) => {
                    return Err(DriverError::Timeout(format!(
                        "write stalled after {} of {} bytes",
                        written,
                        self.out.len()
                    )))
                }
                Err(e) => return Err(DriverError::Transport(e)),
            }
        }
        Ok(())
    }

    /// Read until one reply decodes, then trim its bytes from the buffer
    fn receive(&mut self) -> Result<Reply> {
        loop {
            match self.protocol.decode(&self.buffer) {
                ParseOutcome::Complete(reply, consumed) => {
                    self.buffer.advance(consumed);
                    if !self.buffer.is_empty() {
                        tracing::debug!("{} bytes left buffered after reply", self.buffer.len());
                    }
                    return Ok(reply);
                }
                ParseOutcome::Malformed(reason) => {
                    return Err(DriverError::Protocol(reason));
                }
                ParseOutcome::Incomplete => {
                    if self.buffer.len() >= self.config.max_buffer_len {
                        return Err(DriverError::Protocol(format!(
                            "reply exceeds {} buffered bytes",
                            self.config.max_buffer_len
                        )));
                    }
                    self.fill_buffer()?;
                }
            }
        }
    }

    /// Block for more bytes and append them to the buffer
    fn fill_buffer(&mut self) -> Result<()> {
        let timeout = self.config.read_timeout();
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;

        let ready = match transport.wait_readable(timeout) {
            Ok(ready) => ready,
            Err(e) if is_timeout(&e) => false,
            Err(e) => return Err(DriverError::Transport(e)),
        };
        if !ready {
            return Err(DriverError::Timeout(format!(
                "no reply bytes within {} ms",
                self.config.read_timeout_ms
            )));
        }

        let n = match transport.read_available(&mut self.buffer) {
            Ok(n) => n,
            Err(e) if is_timeout(&e) => {
                return Err(DriverError::Timeout(format!(
                    "read stalled after {} buffered bytes",
                    self.buffer.len()
                )))
            }
            Err(e) => return Err(DriverError::Transport(e)),
        };
        if n == 0 {
            return Err(DriverError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by peer",
            )));
        }

        tracing::trace!("Read {} bytes, {} buffered", n, self.buffer.len());
        Ok(())
    }

    fn clear_state(&mut self) {
        self.buffer.clear();
        self.protocol.reset();
    }
}

impl<T: Transport, P: Protocol> Drop for Driver<T, P> {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
    }
}
