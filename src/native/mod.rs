//! Native Module
//!
//! The foreign-call seam between commands and the k2hdkc C client library.
//!
//! ## Responsibilities
//! - One trait method per C entry point used by the commands
//! - Success reported as `bool` (or `Option` for calls with output buffers)
//! - Status codes of the last call stay queryable per handle
//!
//! ## Implementations
//! - [`Library`]: `libk2hdkc.so.0` loaded at runtime with `dlopen`
//! - [`MemoryCluster`]: in-process double of the call contract, used by tests
//!   and by tooling that runs without a cluster
//!
//! A handle is not reentrant: callers must not issue calls on the same handle
//! from several threads at once. [`crate::Session`] enforces this by being
//! `!Sync`.

#[cfg(unix)]
mod library;
mod memory;

use std::ffi::CStr;

use bytes::Bytes;

use crate::data::{CasValue, CasWidth};
use crate::logger::{NativeLib, Severity};
use crate::status::RawCode;

#[cfg(unix)]
pub use library::Library;
pub use memory::MemoryCluster;

/// `k2hdkc_chmpx_h`
pub type Handle = u64;

/// `K2HDKC_INVALID_HANDLE`
pub const INVALID_HANDLE: Handle = 0;

/// Soname loaded by [`Library::load`]
pub const DEFAULT_LIBRARY: &str = "libk2hdkc.so.0";

/// Arguments of `k2hdkc_open_chmpx_full`
#[derive(Debug, Clone, Copy)]
pub struct OpenParams<'a> {
    pub config: &'a CStr,
    pub port: u16,
    pub cuk: &'a CStr,
    pub auto_rejoin: bool,
    pub rejoin_retry: bool,
    pub cleanup: bool,
}

/// Optional password and expiry of a write call; `None` becomes a null pointer
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions<'a> {
    pub pass: Option<&'a CStr>,
    pub expire: Option<i64>,
}

/// Queue ordering and attribute checking of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueMode {
    pub fifo: bool,
    pub check_attr: bool,
}

/// Entry points of the k2hdkc C client used by this crate
pub trait Native: Send + Sync {
    // -------------------------------------------------------------------------
    // Handle lifecycle
    // -------------------------------------------------------------------------

    /// `k2hdkc_open_chmpx_full`; returns [`INVALID_HANDLE`] on failure
    fn open(&self, params: &OpenParams<'_>) -> Handle;

    /// `k2hdkc_close_chmpx_ex`
    fn close(&self, handle: Handle, cleanup: bool) -> bool;

    /// `k2hdkc_get_res_code`
    fn res_code(&self, handle: Handle) -> RawCode;

    /// `k2hdkc_get_res_subcode`
    fn res_subcode(&self, handle: Handle) -> RawCode;

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------

    fn get_value(&self, handle: Handle, key: &[u8], pass: Option<&CStr>) -> Option<Bytes>;

    fn set_value(
        &self,
        handle: Handle,
        key: &[u8],
        value: &[u8],
        rm_subkeys: bool,
        opts: CallOptions<'_>,
    ) -> bool;

    fn remove(&self, handle: Handle, key: &[u8]) -> bool;

    fn rename(
        &self,
        handle: Handle,
        old: &[u8],
        new: &[u8],
        parent: Option<&[u8]>,
        check_attr: bool,
        opts: CallOptions<'_>,
    ) -> bool;

    fn get_attrs(&self, handle: Handle, key: &[u8]) -> Option<Vec<(Bytes, Bytes)>>;

    // -------------------------------------------------------------------------
    // Subkeys
    // -------------------------------------------------------------------------

    fn set_subkey(
        &self,
        handle: Handle,
        key: &[u8],
        subkey: &[u8],
        subval: &[u8],
        check_attr: bool,
        opts: CallOptions<'_>,
    ) -> bool;

    fn remove_subkey(&self, handle: Handle, key: &[u8], subkey: &[u8], nest: bool) -> bool;

    fn get_subkeys(&self, handle: Handle, key: &[u8]) -> Option<Vec<Bytes>>;

    /// An empty list clears the subkeys
    fn set_subkeys(&self, handle: Handle, key: &[u8], subkeys: &[Bytes]) -> bool;

    fn set_all(
        &self,
        handle: Handle,
        key: &[u8],
        value: &[u8],
        subkeys: &[Bytes],
        opts: CallOptions<'_>,
    ) -> bool;

    // -------------------------------------------------------------------------
    // CAS
    // -------------------------------------------------------------------------

    fn cas_init(&self, handle: Handle, key: &[u8], value: CasValue, opts: CallOptions<'_>) -> bool;

    fn cas_get(
        &self,
        handle: Handle,
        key: &[u8],
        width: CasWidth,
        pass: Option<&CStr>,
    ) -> Option<CasValue>;

    fn cas_set(
        &self,
        handle: Handle,
        key: &[u8],
        old: CasValue,
        new: CasValue,
        opts: CallOptions<'_>,
    ) -> bool;

    fn cas_increment(&self, handle: Handle, key: &[u8], opts: CallOptions<'_>) -> bool;

    fn cas_decrement(&self, handle: Handle, key: &[u8], opts: CallOptions<'_>) -> bool;

    // -------------------------------------------------------------------------
    // Queues
    // -------------------------------------------------------------------------

    fn queue_push(
        &self,
        handle: Handle,
        prefix: &[u8],
        value: &[u8],
        mode: QueueMode,
        opts: CallOptions<'_>,
    ) -> bool;

    fn key_queue_push(
        &self,
        handle: Handle,
        prefix: &[u8],
        key: &[u8],
        value: &[u8],
        mode: QueueMode,
        opts: CallOptions<'_>,
    ) -> bool;

    fn queue_pop(
        &self,
        handle: Handle,
        prefix: &[u8],
        fifo: bool,
        pass: Option<&CStr>,
    ) -> Option<Bytes>;

    fn key_queue_pop(
        &self,
        handle: Handle,
        prefix: &[u8],
        fifo: bool,
        pass: Option<&CStr>,
    ) -> Option<(Bytes, Bytes)>;

    fn queue_remove(
        &self,
        handle: Handle,
        prefix: &[u8],
        count: i32,
        fifo: bool,
        pass: Option<&CStr>,
    ) -> bool;

    fn key_queue_remove(
        &self,
        handle: Handle,
        prefix: &[u8],
        count: i32,
        fifo: bool,
        pass: Option<&CStr>,
    ) -> bool;

    // -------------------------------------------------------------------------
    // Native log switches (no-ops unless the backend has them)
    // -------------------------------------------------------------------------

    fn set_debug_level(&self, _lib: NativeLib, _severity: Severity) {}

    fn set_comlog(&self, _enable: bool) {}

    /// `None` sends native logs back to stderr
    fn set_debug_file(&self, _path: Option<&CStr>) {}
}
