//! In-memory Transport
//!
//! A scripted transport: inbound bytes are queued up front and handed out one
//! chunk per read, outbound bytes are captured for inspection. Useful for
//! exercising the driver without a server.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::protocol::{encode_reply, Reply};
use super::{not_connected, Transport};

/// A scripted inbound event
#[derive(Debug)]
enum Inbound {
    Chunk(Bytes),
    Stall,
    Eof,
    Fail(io::ErrorKind),
}

/// Transport backed by in-memory queues
#[derive(Debug)]
pub struct MemoryTransport {
    inbound: VecDeque<Inbound>,
    written: Vec<u8>,
    /// Max bytes accepted per write call
    write_limit: Option<usize>,
    write_failure: Option<io::ErrorKind>,
    open: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            written: Vec::new(),
            write_limit: None,
            write_failure: None,
            open: true,
        }
    }

    /// Queue bytes that one read will return in full
    pub fn push_chunk(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        self.inbound
            .push_back(Inbound::Chunk(Bytes::copy_from_slice(chunk.as_ref())));
        self
    }

    /// Queue bytes split into reads of at most `size` bytes each
    pub fn push_chunked(&mut self, data: impl AsRef<[u8]>, size: usize) -> &mut Self {
        for chunk in data.as_ref().chunks(size.max(1)) {
            self.push_chunk(chunk);
        }
        self
    }

    /// Queue the wire form of a reply as a single read
    pub fn push_reply(&mut self, reply: &Reply) -> &mut Self {
        let mut out = BytesMut::new();
        encode_reply(reply, &mut out);
        self.inbound.push_back(Inbound::Chunk(out.freeze()));
        self
    }

    /// Queue a wait that times out
    pub fn push_stall(&mut self) -> &mut Self {
        self.inbound.push_back(Inbound::Stall);
        self
    }

    /// Queue the peer closing the stream
    pub fn push_eof(&mut self) -> &mut Self {
        self.inbound.push_back(Inbound::Eof);
        self
    }

    /// Queue a read error
    pub fn push_read_error(&mut self, kind: io::ErrorKind) -> &mut Self {
        self.inbound.push_back(Inbound::Fail(kind));
        self
    }

    /// Accept at most `limit` bytes per write call
    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Fail the next write with `kind`
    pub fn fail_next_write(&mut self, kind: io::ErrorKind) -> &mut Self {
        self.write_failure = Some(kind);
        self
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Take and clear the captured writes
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Scripted inbound events not yet consumed
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if !self.open {
            return Err(not_connected());
        }
        if let Some(kind) = self.write_failure.take() {
            return Err(io::Error::new(kind, "scripted write failure"));
        }
        let n = self.write_limit.map_or(bytes.len(), |limit| limit.min(bytes.len()));
        self.written.extend_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn wait_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
        if !self.open {
            return Err(not_connected());
        }
        match self.inbound.front() {
            None => Ok(false),
            Some(Inbound::Stall) => {
                self.inbound.pop_front();
                Ok(false)
            }
            Some(Inbound::Fail(kind)) => {
                let kind = *kind;
                self.inbound.pop_front();
                Err(io::Error::new(kind, "scripted read failure"))
            }
            Some(_) => Ok(true),
        }
    }

    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        if !self.open {
            return Err(not_connected());
        }
        match self.inbound.pop_front() {
            Some(Inbound::Chunk(chunk)) => {
                buf.extend_from_slice(&chunk);
                Ok(chunk.len())
            }
            Some(Inbound::Eof) | None => Ok(0),
            Some(Inbound::Stall) => Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "no bytes available",
            )),
            Some(Inbound::Fail(kind)) => Err(io::Error::new(kind, "scripted read failure")),
        }
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
