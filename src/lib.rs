//! # k2hdkc
//!
//! Rust binding for the k2hdkc clustered key-value store client:
//! - Typed commands for values, subkeys, CAS integers, queues and attributes
//! - Canonical key encodings (text gets a trailing NUL, bytes go verbatim)
//! - Results carrying the native success flag and status code pair
//! - Instance-scoped logging, no global state
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Client                              │
//! │           (config, logger, convenience methods)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ opens
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         Session                              │
//! │                (one chmpx handle, Send + !Sync)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command::execute
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │   Library   │          │ MemoryCluster │
//!   │  (dlopen)   │          │ (in-process)  │
//!   └─────────────┘          └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use k2hdkc::Client;
//!
//! let client = Client::new("/etc/k2hdkc/slave.yaml", 8031)?;
//! client.set("hello", "world")?;
//! assert_eq!(client.get("hello")?.string(), "world");
//! # Ok::<(), k2hdkc::K2hdkcError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod status;
pub mod data;
pub mod logger;

pub mod native;
pub mod session;
pub mod command;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{K2hdkcError, Result};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use status::{ResCode, Status, SubCode};
pub use data::{CasOperand, CasValue, CasWidth, Data};
pub use logger::{LibLogLevel, Logger, Severity};
pub use session::Session;
pub use command::{
    AddSubKey, Attr, CasGet, CasIncDec, CasInit, CasSet, ClearSubKeys, Command, CommandResult,
    CommandState, Get, GetAttrs, GetSubKeys, QueueItem, QueuePop, QueuePush, QueueRemove,
    Remove, RemoveSubKey, Rename, Set, SetAll, SetSubKeys,
};
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the k2hdkc crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
