//! Command encoder
//!
//! ## Wire Format
//!
//! A request is a multi-bulk array: an array header declaring the argument
//! count, then one bulk string per argument.
//! ```text
//! *<N>\r\n
//! $<len>\r\n<raw bytes>\r\n     (repeated N times)
//! ```
//! Lengths are explicit, so arguments are never escaped and may contain any
//! byte, CR LF included.

use bytes::{BufMut, BytesMut};

use crate::error::{DriverError, Result};
use super::Reply;

/// Line terminator after every header line and bulk payload
pub const CRLF: &[u8] = b"\r\n";

/// Encode an argument list into `out` as a multi-bulk request
///
/// Fails with `InvalidArgument` on an empty list; nothing is written then.
pub fn encode_command<A: AsRef<[u8]>>(args: &[A], out: &mut BytesMut) -> Result<()> {
    if args.is_empty() {
        return Err(DriverError::InvalidArgument(
            "cannot encode an empty command".to_string(),
        ));
    }
    out.reserve(encoded_len(args));
    put_multi_bulk(args, out);
    Ok(())
}

/// Exact number of bytes `encode_command` produces for `args`
pub fn encoded_len<A: AsRef<[u8]>>(args: &[A]) -> usize {
    let header = 1 + decimal_len(args.len()) + CRLF.len();
    args.iter().fold(header, |total, arg| {
        let len = arg.as_ref().len();
        total + 1 + decimal_len(len) + CRLF.len() + len + CRLF.len()
    })
}

pub(crate) fn put_multi_bulk<A: AsRef<[u8]>>(args: &[A], out: &mut BytesMut) {
    put_header(out, b'*', args.len() as i64);
    for arg in args {
        put_bulk(out, arg.as_ref());
    }
}

/// Encode a reply the way a conforming server would send it
///
/// The driver never sends replies; this serves test servers, scripted
/// transports and benchmarks.
pub fn encode_reply(reply: &Reply, out: &mut BytesMut) {
    match reply {
        Reply::Status(text) => put_line(out, b'+', text),
        Reply::Error(message) => put_line(out, b'-', message),
        Reply::Integer(n) => put_header(out, b':', *n),
        Reply::Bulk(Some(data)) => put_bulk(out, data),
        Reply::Bulk(None) => put_header(out, b'$', -1),
        Reply::Array(items) => {
            put_header(out, b'*', items.len() as i64);
            for item in items {
                encode_reply(item, out);
            }
        }
        Reply::NullArray => put_header(out, b'*', -1),
    }
}

fn put_bulk(out: &mut BytesMut, data: &[u8]) {
    put_header(out, b'$', data.len() as i64);
    out.put_slice(data);
    out.put_slice(CRLF);
}

fn put_header(out: &mut BytesMut, tag: u8, n: i64) {
    out.put_u8(tag);
    out.put_slice(n.to_string().as_bytes());
    out.put_slice(CRLF);
}

fn put_line(out: &mut BytesMut, tag: u8, line: &[u8]) {
    out.put_u8(tag);
    out.put_slice(line);
    out.put_slice(CRLF);
}

fn decimal_len(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}
