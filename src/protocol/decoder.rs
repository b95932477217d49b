//! Reply decoder
//!
//! Parses replies out of an accumulating receive buffer.
//!
//! ## Reply Grammar
//! ```text
//! +<line>\r\n                status
//! -<line>\r\n                error
//! :<i64>\r\n                 integer
//! $<len>\r\n<len bytes>\r\n  bulk string    ($-1\r\n is the null bulk)
//! *<count>\r\n<element>...   array          (*-1\r\n is the null array)
//! ```
//!
//! Running out of bytes is never an error: the outcome is `Incomplete` and the
//! caller retries once more bytes have arrived. Anything that breaks the
//! grammar is `Malformed`, after which the stream cannot be resynchronized.
//!
//! Two entry points share one frame parser:
//! - [`try_parse`] is stateless and re-parses from the first byte each call.
//! - [`ReplyDecoder`] keeps the elements of partially received arrays, so a
//!   retry resumes where the previous attempt stalled.

use bytes::Bytes;

use crate::config::{Config, DEFAULT_MAX_BULK_LEN, DEFAULT_MAX_DEPTH};
use super::Reply;

/// Result of one parse attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A whole reply and the number of bytes it occupied
    Complete(Reply, usize),

    /// Well-formed so far; more bytes are needed
    Incomplete,

    /// The bytes do not follow the reply grammar
    Malformed(String),
}

/// Hardening limits applied while decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Max number of arrays enclosing any element
    pub max_depth: usize,

    /// Max declared bulk length
    pub max_bulk_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
        }
    }
}

impl From<&Config> for Limits {
    fn from(config: &Config) -> Self {
        Self {
            max_depth: config.max_depth,
            max_bulk_len: config.max_bulk_len,
        }
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Read position over a borrowed buffer; every access is bounds-checked
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Bytes up to the next CRLF, moving past the terminator
    fn read_line(&mut self) -> Option<&'a [u8]> {
        let rest = self.buf.get(self.pos..)?;
        let end = rest.windows(2).position(|w| w == b"\r\n")?;
        self.pos += end + 2;
        Some(&rest[..end])
    }

    /// Exactly `n` bytes, or None if fewer are buffered
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }
}

// =============================================================================
// Frame parsing
// =============================================================================

/// Why a parse attempt stopped short
enum Stall {
    Incomplete,
    Malformed(String),
}

type Parse<T> = std::result::Result<T, Stall>;

/// One unit read off the wire: a finished value or the header of a
/// non-empty array whose elements follow
enum Frame {
    Value(Reply),
    ArrayHeader(usize),
}

fn malformed<T>(reason: impl Into<String>) -> Parse<T> {
    Err(Stall::Malformed(reason.into()))
}

fn line<'a>(cur: &mut Cursor<'a>) -> Parse<&'a [u8]> {
    cur.read_line().ok_or(Stall::Incomplete)
}

fn number(line: &[u8], what: &str) -> Parse<i64> {
    std::str::from_utf8(line)
        .ok()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            Stall::Malformed(format!(
                "invalid {}: {:?}",
                what,
                String::from_utf8_lossy(line)
            ))
        })
}

/// Parse one frame at the cursor
///
/// On `Incomplete` the cursor may have moved; callers restart from their own
/// saved position.
fn parse_frame(cur: &mut Cursor<'_>, limits: &Limits) -> Parse<Frame> {
    let tag = cur.next_byte().ok_or(Stall::Incomplete)?;

    match tag {
        b'+' => Ok(Frame::Value(Reply::Status(Bytes::copy_from_slice(line(cur)?)))),
        b'-' => Ok(Frame::Value(Reply::Error(Bytes::copy_from_slice(line(cur)?)))),
        b':' => Ok(Frame::Value(Reply::Integer(number(line(cur)?, "integer")?))),
        b'$' => {
            let len = number(line(cur)?, "bulk length")?;
            if len == -1 {
                return Ok(Frame::Value(Reply::Bulk(None)));
            }
            if len < -1 {
                return malformed(format!("negative bulk length {}", len));
            }
            let len = usize::try_from(len)
                .map_err(|_| Stall::Malformed(format!("bulk length {} out of range", len)))?;
            if len > limits.max_bulk_len {
                return malformed(format!(
                    "bulk length {} exceeds limit {}",
                    len, limits.max_bulk_len
                ));
            }

            let payload = cur.take(len).ok_or(Stall::Incomplete)?;
            let terminator = cur.take(2).ok_or(Stall::Incomplete)?;
            if terminator != b"\r\n" {
                return malformed("bulk payload not terminated by CRLF");
            }
            Ok(Frame::Value(Reply::Bulk(Some(Bytes::copy_from_slice(payload)))))
        }
        b'*' => {
            let count = number(line(cur)?, "array length")?;
            match count {
                -1 => Ok(Frame::Value(Reply::NullArray)),
                0 => Ok(Frame::Value(Reply::Array(Vec::new()))),
                n if n < -1 => malformed(format!("negative array length {}", n)),
                n => usize::try_from(n)
                    .map(Frame::ArrayHeader)
                    .map_err(|_| Stall::Malformed(format!("array length {} out of range", n))),
            }
        }
        other => malformed(format!("unexpected type byte 0x{:02x}", other)),
    }
}

/// Cap on up-front allocation for a declared array length
fn initial_capacity(count: usize) -> usize {
    count.min(1024)
}

// =============================================================================
// Stateless recursive decoder
// =============================================================================

/// Try to parse one reply from the start of `buf` with default limits
pub fn try_parse(buf: &[u8]) -> ParseOutcome {
    try_parse_with(buf, &Limits::default())
}

/// Try to parse one reply from the start of `buf`
///
/// An array whose elements have not all arrived yields `Incomplete` and keeps
/// nothing; the next call parses it again from its first byte.
pub fn try_parse_with(buf: &[u8], limits: &Limits) -> ParseOutcome {
    let mut cur = Cursor::at(buf, 0);
    match parse_value(&mut cur, limits, 0) {
        Ok(reply) => ParseOutcome::Complete(reply, cur.position()),
        Err(Stall::Incomplete) => ParseOutcome::Incomplete,
        Err(Stall::Malformed(reason)) => ParseOutcome::Malformed(reason),
    }
}

fn parse_value(cur: &mut Cursor<'_>, limits: &Limits, depth: usize) -> Parse<Reply> {
    match parse_frame(cur, limits)? {
        Frame::Value(reply) => Ok(reply),
        Frame::ArrayHeader(count) => {
            if depth >= limits.max_depth {
                return malformed(format!("array nesting exceeds {}", limits.max_depth));
            }
            let mut items = Vec::with_capacity(initial_capacity(count));
            for _ in 0..count {
                items.push(parse_value(cur, limits, depth + 1)?);
            }
            Ok(Reply::Array(items))
        }
    }
}

// =============================================================================
// Resumable decoder
// =============================================================================

/// An array whose elements are still arriving
#[derive(Debug)]
struct PartialArray {
    expected: usize,
    items: Vec<Reply>,
}

/// Decoder that resumes a stalled reply instead of re-parsing it
///
/// Each call to [`decode`](ReplyDecoder::decode) must pass a buffer that starts
/// with the same bytes as the previous call (it may only have grown), until a
/// `Complete` or `Malformed` outcome resets the decoder.
#[derive(Debug)]
pub struct ReplyDecoder {
    limits: Limits,
    /// Arrays opened but not yet filled, innermost last
    stack: Vec<PartialArray>,
    /// End of the last fully parsed frame
    offset: usize,
}

impl ReplyDecoder {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            stack: Vec::new(),
            offset: 0,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// True while part of a reply has been parsed and retained
    pub fn in_progress(&self) -> bool {
        self.offset > 0
    }

    /// Drop any retained progress
    pub fn reset(&mut self) {
        self.stack.clear();
        self.offset = 0;
    }

    /// Continue parsing the reply at the start of `buf`
    pub fn decode(&mut self, buf: &[u8]) -> ParseOutcome {
        if self.offset > buf.len() {
            // buffer was replaced underneath us; start over
            self.reset();
        }

        let mut cur = Cursor::at(buf, self.offset);
        loop {
            let mut value = match parse_frame(&mut cur, &self.limits) {
                Ok(Frame::Value(reply)) => reply,
                Ok(Frame::ArrayHeader(count)) => {
                    if self.stack.len() >= self.limits.max_depth {
                        self.reset();
                        return ParseOutcome::Malformed(format!(
                            "array nesting exceeds {}",
                            self.limits.max_depth
                        ));
                    }
                    self.stack.push(PartialArray {
                        expected: count,
                        items: Vec::with_capacity(initial_capacity(count)),
                    });
                    self.offset = cur.position();
                    continue;
                }
                Err(Stall::Incomplete) => return ParseOutcome::Incomplete,
                Err(Stall::Malformed(reason)) => {
                    self.reset();
                    return ParseOutcome::Malformed(reason);
                }
            };
            self.offset = cur.position();

            // Fold the finished value into its enclosing arrays
            loop {
                let Some(top) = self.stack.last_mut() else {
                    let consumed = self.offset;
                    self.reset();
                    return ParseOutcome::Complete(value, consumed);
                };
                top.items.push(value);
                if top.items.len() < top.expected {
                    break;
                }
                let items = std::mem::take(&mut top.items);
                self.stack.pop();
                value = Reply::Array(items);
            }
        }
    }
}

impl Default for ReplyDecoder {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}
