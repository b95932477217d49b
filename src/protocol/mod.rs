//! Protocol Module
//!
//! Wire-level framing for RESP-style key-value stores.
//!
//! ## Request Format
//! ```text
//! *<N>\r\n
//! $<len>\r\n<arg>\r\n    (N times)
//! ```
//!
//! ### Reply Lead Bytes
//! - `+` status
//! - `-` error
//! - `:` integer
//! - `$` bulk string (length -1 = null)
//! - `*` array (count -1 = null array)
//!
//! The driver talks to the wire only through the [`Protocol`] trait, so the
//! framing is a parameter of the driver rather than baked into it.

mod command;
mod reply;
mod encoder;
mod decoder;

pub use command::Command;
pub use reply::Reply;
pub use encoder::{encode_command, encode_reply, encoded_len, CRLF};
pub use decoder::{try_parse, try_parse_with, Limits, ParseOutcome, ReplyDecoder};

use bytes::BytesMut;

use crate::error::Result;

/// Framing used by a driver to encode requests and decode replies
pub trait Protocol {
    /// Short protocol name for logs
    fn name(&self) -> &'static str;

    /// Append the wire form of `command` to `out`
    fn encode(&self, command: &Command, out: &mut BytesMut) -> Result<()>;

    /// Try to decode one reply from the start of `buf`
    ///
    /// May keep state between `Incomplete` outcomes; `buf` then has to start
    /// with the same bytes on the next call.
    fn decode(&mut self, buf: &[u8]) -> ParseOutcome;

    /// Forget any partially decoded reply
    fn reset(&mut self);
}

/// RESP2 framing with resumable reply decoding
#[derive(Debug, Default)]
pub struct Resp {
    decoder: ReplyDecoder,
}

impl Resp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            decoder: ReplyDecoder::new(limits),
        }
    }
}

impl Protocol for Resp {
    fn name(&self) -> &'static str {
        "resp"
    }

    fn encode(&self, command: &Command, out: &mut BytesMut) -> Result<()> {
        encode_command(command.as_args(), out)
    }

    fn decode(&mut self, buf: &[u8]) -> ParseOutcome {
        self.decoder.decode(buf)
    }

    fn reset(&mut self) {
        self.decoder.reset();
    }
}
