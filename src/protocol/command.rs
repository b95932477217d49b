//! Command definitions
//!
//! A command is the verb plus its arguments, each an opaque byte string.

use bytes::{Bytes, BytesMut};

use crate::error::{DriverError, Result};
use super::encoder::{encoded_len, put_multi_bulk};

/// A command ready to be sent to the server
///
/// Always holds at least one argument (the verb).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    args: Vec<Bytes>,
}

impl Command {
    /// Start a command with its verb
    pub fn new(verb: impl AsRef<[u8]>) -> Self {
        Self {
            args: vec![Bytes::copy_from_slice(verb.as_ref())],
        }
    }

    /// Build a command from a full argument list (verb first)
    ///
    /// Fails with `InvalidArgument` when the list is empty.
    pub fn from_args<I, A>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        let args: Vec<Bytes> = args
            .into_iter()
            .map(|a| Bytes::copy_from_slice(a.as_ref()))
            .collect();

        if args.is_empty() {
            return Err(DriverError::InvalidArgument(
                "command must have at least one argument".to_string(),
            ));
        }
        Ok(Self { args })
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    /// Append an integer argument in its decimal form
    pub fn arg_int(self, n: i64) -> Self {
        self.arg(n.to_string())
    }

    /// Append several arguments
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args
            .extend(args.into_iter().map(|a| Bytes::copy_from_slice(a.as_ref())));
        self
    }

    /// The verb (first argument)
    pub fn name(&self) -> &[u8] {
        &self.args[0]
    }

    /// All arguments, verb first
    pub fn as_args(&self) -> &[Bytes] {
        &self.args
    }

    /// Number of arguments including the verb
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Encode to the multi-bulk wire form
    pub fn encode(&self) -> BytesMut {
        let mut out = BytesMut::with_capacity(encoded_len(self.args.as_slice()));
        put_multi_bulk(self.args.as_slice(), &mut out);
        out
    }
}
