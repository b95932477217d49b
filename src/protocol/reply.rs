//! Reply definitions
//!
//! Represents decoded server replies.

use std::fmt;

use bytes::Bytes;

/// A decoded server reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Short status line (`+OK`)
    Status(Bytes),

    /// Server-reported error (`-ERR ...`)
    Error(Bytes),

    /// Signed integer (`:42`)
    Integer(i64),

    /// Length-prefixed byte string; `None` is the null bulk string (`$-1`)
    Bulk(Option<Bytes>),

    /// Ordered sequence of replies (`*N`)
    Array(Vec<Reply>),

    /// Null array (`*-1`)
    NullArray,
}

impl Reply {
    /// Build a status reply
    pub fn status(text: impl AsRef<[u8]>) -> Self {
        Reply::Status(Bytes::copy_from_slice(text.as_ref()))
    }

    /// Build an error reply
    pub fn error(message: impl AsRef<[u8]>) -> Self {
        Reply::Error(Bytes::copy_from_slice(message.as_ref()))
    }

    /// Build a non-null bulk reply
    pub fn bulk(data: impl AsRef<[u8]>) -> Self {
        Reply::Bulk(Some(Bytes::copy_from_slice(data.as_ref())))
    }

    /// The null bulk reply
    pub fn nil() -> Self {
        Reply::Bulk(None)
    }

    /// Returns true if this is an error reply
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Returns true for the null bulk string and the null array
    pub fn is_null(&self) -> bool {
        matches!(self, Reply::Bulk(None) | Reply::NullArray)
    }

    /// Raw bytes of a status, error or non-null bulk reply
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Status(b) | Reply::Error(b) => Some(b),
            Reply::Bulk(Some(b)) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Elements of an array reply
    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Consume into array elements, handing the reply back if it is not an array
    pub fn into_array(self) -> Result<Vec<Reply>, Reply> {
        match self {
            Reply::Array(items) => Ok(items),
            other => Err(other),
        }
    }

    /// Lossy text of the reply payload, if it has one
    pub fn to_string_lossy(&self) -> Option<String> {
        self.as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Short name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(Some(_)) => "bulk",
            Reply::Bulk(None) => "nil",
            Reply::Array(_) => "array",
            Reply::NullArray => "null array",
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::Status(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Reply::Error(b) => write!(f, "(error) {}", String::from_utf8_lossy(b)),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(Some(b)) => write!(f, "{:?}", String::from_utf8_lossy(b)),
            Reply::Bulk(None) | Reply::NullArray => write!(f, "(nil)"),
            Reply::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(items) => {
                let width = items.len().to_string().len();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                        write!(f, "{:indent$}", "", indent = indent)?;
                    }
                    write!(f, "{:>width$}) ", i + 1, width = width)?;
                    item.fmt_nested(f, indent + width + 2)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders the reply the way redis-cli prints it
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0)
    }
}
