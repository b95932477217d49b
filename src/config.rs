//! Configuration for kvwire
//!
//! Centralized driver configuration with sensible defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{DriverError, Result};

/// Default nesting limit for array replies
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default largest accepted bulk payload (512 MB, Redis' proto-max-bulk-len)
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Main configuration for a driver instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Server host name or address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Which kind of store sits behind the endpoint.
    /// Both speak the RESP grammar; the backend only picks the default port
    /// and labels log output.
    pub backend: Backend,

    // -------------------------------------------------------------------------
    // Timeout Configuration
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Reply read timeout (milliseconds), applied per wait for more bytes
    pub read_timeout_ms: u64,

    /// Request write timeout (milliseconds)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Decoder Limits
    // -------------------------------------------------------------------------
    /// Max array nesting accepted in a reply
    pub max_depth: usize,

    /// Max declared bulk string length (bytes)
    pub max_bulk_len: usize,

    /// Max bytes buffered while waiting for a single reply to complete
    pub max_buffer_len: usize,

    /// Bytes reserved in the receive buffer before each transport read
    pub read_chunk_size: usize,
}

/// Store flavour behind a RESP endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Redis,

    /// A Memcached endpoint fronted by a RESP-compatible proxy.
    /// Classic memcached text protocol is not spoken.
    Memcached,
}

impl Backend {
    /// Conventional port for this backend
    pub fn default_port(self) -> u16 {
        match self {
            Backend::Redis => 6379,
            Backend::Memcached => 11211,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Redis => write!(f, "redis"),
            Backend::Memcached => write!(f, "memcached"),
        }
    }
}

impl FromStr for Backend {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Backend::Redis),
            "memcached" | "memcache" => Ok(Backend::Memcached),
            other => Err(DriverError::Config(format!("unknown backend: {}", other))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: Backend::Redis.default_port(),
            backend: Backend::Redis,
            connect_timeout_ms: 3000,
            read_timeout_ms: 3000,
            write_timeout_ms: 3000,
            max_depth: DEFAULT_MAX_DEPTH,
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
            max_buffer_len: DEFAULT_MAX_BULK_LEN + 64 * 1024,
            read_chunk_size: 16 * 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` string used for connecting and logging
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Check the settings for values the driver cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(DriverError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(DriverError::Config("port must not be 0".to_string()));
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 || self.write_timeout_ms == 0
        {
            return Err(DriverError::Config(
                "timeouts must be greater than 0 ms".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(DriverError::Config("max_depth must be at least 1".to_string()));
        }
        if self.read_chunk_size == 0 {
            return Err(DriverError::Config(
                "read_chunk_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    port_set: bool,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self.port_set = true;
        self
    }

    /// Set the backend; also picks its default port unless one was set
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        if !self.port_set {
            self.config.port = backend.default_port();
        }
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set read, write and connect timeouts at once (in milliseconds)
    pub fn timeout_ms(self, ms: u64) -> Self {
        self.connect_timeout_ms(ms).read_timeout_ms(ms).write_timeout_ms(ms)
    }

    /// Set the maximum reply nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the maximum declared bulk length (in bytes)
    pub fn max_bulk_len(mut self, len: usize) -> Self {
        self.config.max_bulk_len = len;
        self
    }

    /// Set the maximum receive buffer size (in bytes)
    pub fn max_buffer_len(mut self, len: usize) -> Self {
        self.config.max_buffer_len = len;
        self
    }

    /// Set the per-read buffer reservation (in bytes)
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
