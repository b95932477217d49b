//! # kvwire
//!
//! A synchronous client driver for RESP-style key-value stores with:
//! - Binary-safe multi-bulk command encoding
//! - A reply decoder that copes with replies split across many reads
//! - Resumable decoding of partially received arrays
//! - A pluggable transport boundary (TCP or in-memory)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Typed Commands                             │
//! │             (GET / SET / HSET / DEL ...)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Driver                                  │
//! │       (encode → write → read/decode loop → trim)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │  Transport  │
//!   │ (RESP codec)│          │ (TCP / mem) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kvwire::{Config, Driver};
//!
//! let config = Config::builder().host("127.0.0.1").port(6379).build();
//! let mut driver = Driver::connect(config)?;
//! driver.set("greeting", "hello")?;
//! assert_eq!(driver.get("greeting")?.as_deref(), Some(&b"hello"[..]));
//! # Ok::<(), kvwire::DriverError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transport;
pub mod driver;
pub mod commands;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DriverError, Result};
pub use config::{Backend, Config};
pub use driver::Driver;
pub use protocol::{Command, Reply};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
