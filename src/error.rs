//! Error types for k2hdkc
//!
//! Provides a unified error type for all operations.
//!
//! ## Taxonomy
//! - Validation errors: detected before any native call, never retried
//! - Native call failures: the C entry point returned false
//! - Session errors: platform, library loading, open/close of a chmpx handle
//! - Configuration errors

use std::path::PathBuf;

use thiserror::Error;

use crate::status::Status;

/// Result type alias using K2hdkcError
pub type Result<T> = std::result::Result<T, K2hdkcError>;

/// Unified error type for k2hdkc operations
#[derive(Debug, Error)]
pub enum K2hdkcError {
    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("len({field}) is zero")]
    ZeroLength { field: &'static str },

    #[error("len(old) {old} len(new) {new} must be same")]
    CasLengthMismatch { old: usize, new: usize },

    #[error("unsupported cas value length {len}, want 1, 2, 4 or 8 bytes")]
    UnsupportedCasWidth { len: usize },

    #[error("cas type {0} must be any of 8, 16, 32 or 64")]
    InvalidCasType(u8),

    #[error("password must not contain a NUL byte")]
    InvalidPassword,

    #[error("queue remove count {0} must be between 1 and {max}", max = i32::MAX)]
    InvalidCount(i64),

    #[error("{0} has already been executed")]
    AlreadyExecuted(&'static str),

    // -------------------------------------------------------------------------
    // Native Call Errors
    // -------------------------------------------------------------------------
    #[error("{call} returned false ({status})")]
    NativeCall { call: &'static str, status: Status },

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("k2hdkc currently works on {0} only")]
    UnsupportedPlatform(&'static str),

    #[error("{name} could not be loaded: {reason}. Please install the k2hdkc package at first")]
    LibraryNotFound { name: String, reason: String },

    #[error("symbol {0} not found in the k2hdkc library")]
    MissingSymbol(String),

    #[error("no {} exists", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("k2hdkc_open_chmpx_full() = {handle}")]
    OpenFailed { handle: u64 },

    #[error("session is already closed")]
    SessionClosed,

    #[error("k2hdkc_close_chmpx_ex({handle}) = false")]
    CloseFailed { handle: u64 },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl K2hdkcError {
    /// True for errors raised before any native call was issued
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            K2hdkcError::ZeroLength { .. }
                | K2hdkcError::CasLengthMismatch { .. }
                | K2hdkcError::UnsupportedCasWidth { .. }
                | K2hdkcError::InvalidCasType(_)
                | K2hdkcError::InvalidPassword
                | K2hdkcError::InvalidCount(_)
                | K2hdkcError::AlreadyExecuted(_)
        )
    }

    /// Status codes of a failed native call, if that is what this error is
    pub fn status(&self) -> Option<&Status> {
        match self {
            K2hdkcError::NativeCall { status, .. } => Some(status),
            _ => None,
        }
    }
}
