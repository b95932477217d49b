//! Typed command helpers
//!
//! Thin argument-list builders over [`Driver::request`]. `Ok` means the
//! command succeeded; `Err(DriverError::Server)` means the server refused it
//! and the connection is still fine; connection-fatal errors pass through.

use bytes::Bytes;

use crate::driver::Driver;
use crate::error::{DriverError, Result};
use crate::protocol::{Command, Protocol, Reply};
use crate::transport::Transport;

impl<T: Transport, P: Protocol> Driver<T, P> {
    /// PING; returns the status text (normally `PONG`)
    pub fn ping(&mut self) -> Result<String> {
        match self.request(&Command::new("PING"))? {
            Reply::Status(text) => Ok(String::from_utf8_lossy(&text).into_owned()),
            Reply::Bulk(Some(data)) => Ok(String::from_utf8_lossy(&data).into_owned()),
            other => Err(unexpected("PING", &other)),
        }
    }

    /// GET; `None` when the key is absent
    pub fn get(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let reply = self.request(&Command::new("GET").arg(key))?;
        expect_bulk("GET", reply)
    }

    /// SET without expiry
    pub fn set(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let reply = self.request(&Command::new("SET").arg(key).arg(value))?;
        expect_ok("SET", reply)
    }

    /// SET with an expiry in seconds
    pub fn set_ex(
        &mut self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        ttl_seconds: u64,
    ) -> Result<()> {
        if ttl_seconds == 0 {
            return Err(DriverError::InvalidArgument(
                "expiry must be at least one second".to_string(),
            ));
        }
        let command = Command::new("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds.to_string());
        expect_ok("SET", self.request(&command)?)
    }

    /// DEL; returns the number of keys removed
    pub fn del<I, K>(&mut self, keys: I) -> Result<i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let command = Command::new("DEL").args(keys);
        require_keys(&command, "DEL")?;
        expect_integer("DEL", self.request(&command)?)
    }

    /// EXISTS for a single key
    pub fn exists(&mut self, key: impl AsRef<[u8]>) -> Result<bool> {
        let count = expect_integer("EXISTS", self.request(&Command::new("EXISTS").arg(key))?)?;
        Ok(count > 0)
    }

    /// INCR; returns the new value
    pub fn incr(&mut self, key: impl AsRef<[u8]>) -> Result<i64> {
        expect_integer("INCR", self.request(&Command::new("INCR").arg(key))?)
    }

    /// INCRBY; returns the new value
    pub fn incr_by(&mut self, key: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        let command = Command::new("INCRBY").arg(key).arg_int(delta);
        expect_integer("INCRBY", self.request(&command)?)
    }

    /// EXPIRE; false when the key does not exist
    pub fn expire(&mut self, key: impl AsRef<[u8]>, seconds: i64) -> Result<bool> {
        let command = Command::new("EXPIRE").arg(key).arg_int(seconds);
        Ok(expect_integer("EXPIRE", self.request(&command)?)? == 1)
    }

    /// HSET of one field; true when the field is new
    pub fn hset(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<bool> {
        let command = Command::new("HSET").arg(key).arg(field).arg(value);
        Ok(expect_integer("HSET", self.request(&command)?)? > 0)
    }

    /// HGET; `None` when the key or field is absent
    pub fn hget(&mut self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        let reply = self.request(&Command::new("HGET").arg(key).arg(field))?;
        expect_bulk("HGET", reply)
    }

    /// HDEL; returns the number of fields removed
    pub fn hdel<I, F>(&mut self, key: impl AsRef<[u8]>, fields: I) -> Result<i64>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        let command = Command::new("HDEL").arg(key).args(fields);
        if command.len() < 3 {
            return Err(DriverError::InvalidArgument(
                "HDEL needs at least one field".to_string(),
            ));
        }
        expect_integer("HDEL", self.request(&command)?)
    }

    /// MGET; one entry per key, `None` for absent keys
    pub fn mget<I, K>(&mut self, keys: I) -> Result<Vec<Option<Bytes>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let command = Command::new("MGET").args(keys);
        require_keys(&command, "MGET")?;
        let items = match self.request(&command)? {
            Reply::Array(items) => items,
            other => return Err(unexpected("MGET", &other)),
        };
        items
            .into_iter()
            .map(|item| expect_bulk("MGET", item))
            .collect()
    }

    /// KEYS matching a glob pattern
    pub fn keys(&mut self, pattern: impl AsRef<[u8]>) -> Result<Vec<Bytes>> {
        let items = match self.request(&Command::new("KEYS").arg(pattern))? {
            Reply::Array(items) => items,
            Reply::NullArray => return Ok(Vec::new()),
            other => return Err(unexpected("KEYS", &other)),
        };
        items
            .into_iter()
            .map(|item| match item {
                Reply::Bulk(Some(key)) => Ok(key),
                other => Err(unexpected("KEYS", &other)),
            })
            .collect()
    }
}

// =============================================================================
// Reply shape checks
// =============================================================================

fn unexpected(verb: &str, reply: &Reply) -> DriverError {
    DriverError::UnexpectedReply(format!("{} returned {} reply", verb, reply.kind()))
}

fn require_keys(command: &Command, verb: &str) -> Result<()> {
    if command.len() < 2 {
        return Err(DriverError::InvalidArgument(format!(
            "{} needs at least one key",
            verb
        )));
    }
    Ok(())
}

fn expect_ok(verb: &str, reply: Reply) -> Result<()> {
    match reply {
        Reply::Status(ref text) if &text[..] == b"OK" => Ok(()),
        other => Err(unexpected(verb, &other)),
    }
}

fn expect_integer(verb: &str, reply: Reply) -> Result<i64> {
    match reply {
        Reply::Integer(n) => Ok(n),
        other => Err(unexpected(verb, &other)),
    }
}

fn expect_bulk(verb: &str, reply: Reply) -> Result<Option<Bytes>> {
    match reply {
        Reply::Bulk(data) => Ok(data),
        other => Err(unexpected(verb, &other)),
    }
}
