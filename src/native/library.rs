//! Runtime-loaded k2hdkc client library
//!
//! `libk2hdkc.so.0` is opened with `dlopen` and every entry point is resolved
//! into a typed function table. Loading fails up front when the library or a
//! required symbol is missing, so no call ever reaches an unresolved symbol.
//!
//! ## Marshalling
//! - Input buffers are borrowed Rust slices, valid for the duration of a call
//! - Absent optional arguments are null pointers
//! - Output buffers are copied into owned memory, then released with the
//!   allocator the library used (`free`, `k2h_free_keypack`, `k2h_free_attrpack`)

use std::ffi::{c_char, c_int, c_short, c_uchar, c_void, CStr, CString};
use std::ptr::{self, NonNull};

use bytes::Bytes;
use libc::{size_t, time_t};

use super::{CallOptions, Handle, Native, OpenParams, QueueMode, DEFAULT_LIBRARY};
use crate::data::{CasValue, CasWidth};
use crate::error::{K2hdkcError, Result};
use crate::logger::{NativeLib, Severity};
use crate::status::RawCode;

// =============================================================================
// C Types
// =============================================================================

/// `K2HKEYPCK`
#[repr(C)]
struct KeyPack {
    pkey: *mut c_uchar,
    length: size_t,
}

/// `K2HATTRPCK`
#[repr(C)]
struct AttrPack {
    pkey: *mut c_uchar,
    keylength: size_t,
    pval: *mut c_uchar,
    vallength: size_t,
}

type Key = *const c_uchar;
type Pass = *const c_char;
type Expire = *const time_t;

// =============================================================================
// dlopen Handle
// =============================================================================

struct DlHandle(NonNull<c_void>);

// SAFETY: a dlopen handle may be used and closed from any thread.
unsafe impl Send for DlHandle {}
unsafe impl Sync for DlHandle {}

impl DlHandle {
    fn open(name: &str) -> Result<Self> {
        let c_name = CString::new(name)
            .map_err(|_| K2hdkcError::Config(format!("library name {name:?} contains NUL")))?;
        // SAFETY: c_name is a valid NUL-terminated string.
        let raw = unsafe {
            libc::dlerror();
            libc::dlopen(c_name.as_ptr(), libc::RTLD_LAZY)
        };
        NonNull::new(raw).map(DlHandle).ok_or_else(|| K2hdkcError::LibraryNotFound {
            name: name.to_string(),
            reason: last_dl_error(),
        })
    }

    /// `name` must be NUL-terminated
    fn symbol(&self, name: &'static str) -> Result<*mut c_void> {
        // SAFETY: the handle is open and name is NUL-terminated.
        let raw = unsafe {
            libc::dlerror();
            libc::dlsym(self.0.as_ptr(), name.as_ptr().cast())
        };
        if raw.is_null() {
            return Err(K2hdkcError::MissingSymbol(name.trim_end_matches('\0').to_string()));
        }
        Ok(raw)
    }
}

impl Drop for DlHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from dlopen and is closed once.
        unsafe {
            libc::dlclose(self.0.as_ptr());
        }
    }
}

fn last_dl_error() -> String {
    // SAFETY: dlerror returns null or a NUL-terminated thread-local string.
    let raw = unsafe { libc::dlerror() };
    if raw.is_null() {
        return "unknown dlopen error".to_string();
    }
    // SAFETY: checked non-null above.
    unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned()
}

// =============================================================================
// Symbol Tables
// =============================================================================

macro_rules! symbol_table {
    ($(#[$meta:meta])* struct $table:ident { $($name:ident: fn($($arg:ty),*) $(-> $ret:ty)?;)* }) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        struct $table {
            $($name: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)*
        }

        impl $table {
            fn resolve(lib: &DlHandle) -> Result<Self> {
                Ok(Self {
                    $(
                        // SAFETY: the symbol has this signature in k2hdkc.h / k2hash.h.
                        $name: unsafe {
                            std::mem::transmute::<*mut c_void, unsafe extern "C" fn($($arg),*) $(-> $ret)?>(
                                lib.symbol(concat!(stringify!($name), "\0"))?,
                            )
                        },
                    )*
                })
            }
        }
    };
}

symbol_table! {
    /// Entry points every command depends on
    struct Api {
        k2hdkc_open_chmpx_full: fn(Pass, c_short, Pass, bool, bool, bool) -> Handle;
        k2hdkc_close_chmpx_ex: fn(Handle, bool) -> bool;
        k2hdkc_get_res_code: fn(Handle) -> RawCode;
        k2hdkc_get_res_subcode: fn(Handle) -> RawCode;

        k2hdkc_pm_get_value_wp: fn(Handle, Key, size_t, Pass, *mut *mut c_uchar, *mut size_t) -> bool;
        k2hdkc_pm_set_value_wa: fn(Handle, Key, size_t, Key, size_t, bool, Pass, Expire) -> bool;
        k2hdkc_pm_remove: fn(Handle, Key, size_t) -> bool;
        k2hdkc_pm_rename_with_parent_wa: fn(Handle, Key, size_t, Key, size_t, Key, size_t, bool, Pass, Expire) -> bool;
        k2hdkc_pm_get_attrs: fn(Handle, Key, size_t, *mut *mut AttrPack, *mut c_int) -> bool;

        k2hdkc_pm_set_subkey_wa: fn(Handle, Key, size_t, Key, size_t, Key, size_t, bool, Pass, Expire) -> bool;
        k2hdkc_pm_remove_subkey: fn(Handle, Key, size_t, Key, size_t, bool) -> bool;
        k2hdkc_pm_get_subkeys: fn(Handle, Key, size_t, *mut *mut KeyPack, *mut c_int) -> bool;
        k2hdkc_pm_set_subkeys: fn(Handle, Key, size_t, *const KeyPack, c_int) -> bool;
        k2hdkc_pm_set_all_wa: fn(Handle, Key, size_t, Key, size_t, *const KeyPack, c_int, Pass, Expire) -> bool;

        k2hdkc_pm_cas8_init_wa: fn(Handle, Key, size_t, u8, Pass, Expire) -> bool;
        k2hdkc_pm_cas16_init_wa: fn(Handle, Key, size_t, u16, Pass, Expire) -> bool;
        k2hdkc_pm_cas32_init_wa: fn(Handle, Key, size_t, u32, Pass, Expire) -> bool;
        k2hdkc_pm_cas64_init_wa: fn(Handle, Key, size_t, u64, Pass, Expire) -> bool;
        k2hdkc_pm_cas8_get_wa: fn(Handle, Key, size_t, Pass, *mut u8) -> bool;
        k2hdkc_pm_cas16_get_wa: fn(Handle, Key, size_t, Pass, *mut u16) -> bool;
        k2hdkc_pm_cas32_get_wa: fn(Handle, Key, size_t, Pass, *mut u32) -> bool;
        k2hdkc_pm_cas64_get_wa: fn(Handle, Key, size_t, Pass, *mut u64) -> bool;
        k2hdkc_pm_cas8_set_wa: fn(Handle, Key, size_t, u8, u8, Pass, Expire) -> bool;
        k2hdkc_pm_cas16_set_wa: fn(Handle, Key, size_t, u16, u16, Pass, Expire) -> bool;
        k2hdkc_pm_cas32_set_wa: fn(Handle, Key, size_t, u32, u32, Pass, Expire) -> bool;
        k2hdkc_pm_cas64_set_wa: fn(Handle, Key, size_t, u64, u64, Pass, Expire) -> bool;
        k2hdkc_pm_cas_increment_wa: fn(Handle, Key, size_t, Pass, Expire) -> bool;
        k2hdkc_pm_cas_decrement_wa: fn(Handle, Key, size_t, Pass, Expire) -> bool;

        k2hdkc_pm_q_push_wa: fn(Handle, Key, size_t, Key, size_t, bool, bool, Pass, Expire) -> bool;
        k2hdkc_pm_keyq_push_wa: fn(Handle, Key, size_t, Key, size_t, Key, size_t, bool, bool, Pass, Expire) -> bool;
        k2hdkc_pm_q_pop_wp: fn(Handle, Key, size_t, bool, Pass, *mut *mut c_uchar, *mut size_t) -> bool;
        k2hdkc_pm_keyq_pop_wp: fn(Handle, Key, size_t, bool, Pass, *mut *mut c_uchar, *mut size_t, *mut *mut c_uchar, *mut size_t) -> bool;
        k2hdkc_pm_q_remove_wp: fn(Handle, Key, size_t, c_int, bool, Pass) -> bool;
        k2hdkc_pm_keyq_remove_wp: fn(Handle, Key, size_t, c_int, bool, Pass) -> bool;

        k2h_free_keypack: fn(*mut KeyPack, c_int) -> bool;
        k2h_free_attrpack: fn(*mut AttrPack, c_int) -> bool;
    }
}

symbol_table! {
    /// Debug switches of k2hdkc and the libraries it links (chmpx, k2hash)
    struct LogApi {
        k2hdkc_set_debug_level_silent: fn();
        k2hdkc_set_debug_level_error: fn();
        k2hdkc_set_debug_level_warning: fn();
        k2hdkc_set_debug_level_message: fn();
        k2hdkc_set_debug_level_dump: fn();
        k2hdkc_set_debug_file: fn(Pass) -> bool;
        k2hdkc_unset_debug_file: fn() -> bool;
        k2hdkc_enable_comlog: fn();
        k2hdkc_disable_comlog: fn();

        chmpx_set_debug_level_silent: fn();
        chmpx_set_debug_level_error: fn();
        chmpx_set_debug_level_warning: fn();
        chmpx_set_debug_level_message: fn();
        chmpx_set_debug_level_dump: fn();
        chmpx_set_debug_file: fn(Pass) -> bool;
        chmpx_unset_debug_file: fn() -> bool;

        k2h_set_debug_level_silent: fn();
        k2h_set_debug_level_error: fn();
        k2h_set_debug_level_warning: fn();
        k2h_set_debug_level_message: fn();
        k2h_set_debug_file: fn(Pass) -> bool;
        k2h_unset_debug_file: fn() -> bool;
    }
}

// =============================================================================
// Marshalling Helpers
// =============================================================================

fn pass_ptr(pass: Option<&CStr>) -> Pass {
    pass.map_or(ptr::null(), CStr::as_ptr)
}

/// Keeps a `time_t` alive for the duration of a call
struct ExpireArg(Option<time_t>);

impl ExpireArg {
    fn new(expire: Option<i64>) -> Self {
        ExpireArg(expire.map(|secs| secs as time_t))
    }

    fn as_ptr(&self) -> Expire {
        self.0.as_ref().map_or(ptr::null(), |t| t as *const time_t)
    }
}

/// Copies a malloc'ed output buffer and frees it
///
/// # Safety
/// `buf` must be null or point to `len` bytes allocated with `malloc`.
unsafe fn take_buffer(buf: *mut c_uchar, len: size_t) -> Bytes {
    if buf.is_null() {
        return Bytes::new();
    }
    let owned = copy_raw(buf, len);
    libc::free(buf.cast());
    owned
}

/// Copies `len` bytes from a library-owned buffer
///
/// # Safety
/// `buf` must be null or valid for reads of `len` bytes.
unsafe fn copy_raw(buf: *const c_uchar, len: size_t) -> Bytes {
    if buf.is_null() || len == 0 {
        return Bytes::new();
    }
    Bytes::copy_from_slice(std::slice::from_raw_parts(buf, len))
}

/// Contiguous `K2HKEYPCK` array borrowing the given subkeys
fn key_packs(subkeys: &[Bytes]) -> Vec<KeyPack> {
    subkeys
        .iter()
        .map(|sk| KeyPack {
            pkey: sk.as_ptr() as *mut c_uchar,
            length: sk.len(),
        })
        .collect()
}

fn pack_ptr(packs: &[KeyPack]) -> *const KeyPack {
    if packs.is_empty() {
        ptr::null()
    } else {
        packs.as_ptr()
    }
}

// =============================================================================
// Library
// =============================================================================

/// `libk2hdkc.so.0` loaded at runtime
pub struct Library {
    api: Api,
    log: Option<LogApi>,
    _lib: DlHandle,
}

impl Library {
    /// Load the default soname
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_LIBRARY)
    }

    /// Load a library by soname or path
    ///
    /// Fails on non-Linux and big-endian hosts: the C client and the CAS
    /// encodings are only defined there.
    pub fn load_from(name: &str) -> Result<Self> {
        if !cfg!(target_os = "linux") {
            return Err(K2hdkcError::UnsupportedPlatform("linux"));
        }
        if !cfg!(target_endian = "little") {
            return Err(K2hdkcError::UnsupportedPlatform("little endian alignment"));
        }

        let lib = DlHandle::open(name)?;
        let api = Api::resolve(&lib)?;
        let log = match LogApi::resolve(&lib) {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::debug!("native log switches unavailable: {}", e);
                None
            }
        };
        tracing::debug!("loaded {}", name);

        Ok(Self { api, log, _lib: lib })
    }
}

impl Native for Library {
    fn open(&self, params: &OpenParams<'_>) -> Handle {
        // SAFETY: both strings are NUL-terminated and outlive the call.
        unsafe {
            (self.api.k2hdkc_open_chmpx_full)(
                params.config.as_ptr(),
                params.port as c_short,
                params.cuk.as_ptr(),
                params.auto_rejoin,
                params.rejoin_retry,
                params.cleanup,
            )
        }
    }

    fn close(&self, handle: Handle, cleanup: bool) -> bool {
        // SAFETY: plain value arguments.
        unsafe { (self.api.k2hdkc_close_chmpx_ex)(handle, cleanup) }
    }

    fn res_code(&self, handle: Handle) -> RawCode {
        // SAFETY: plain value arguments.
        unsafe { (self.api.k2hdkc_get_res_code)(handle) }
    }

    fn res_subcode(&self, handle: Handle) -> RawCode {
        // SAFETY: plain value arguments.
        unsafe { (self.api.k2hdkc_get_res_subcode)(handle) }
    }

    fn get_value(&self, handle: Handle, key: &[u8], pass: Option<&CStr>) -> Option<Bytes> {
        let mut val: *mut c_uchar = ptr::null_mut();
        let mut len: size_t = 0;
        // SAFETY: inputs are borrowed for the call; outputs are written by the library.
        unsafe {
            let ok = (self.api.k2hdkc_pm_get_value_wp)(
                handle,
                key.as_ptr(),
                key.len(),
                pass_ptr(pass),
                &mut val,
                &mut len,
            );
            let owned = take_buffer(val, len);
            ok.then_some(owned)
        }
    }

    fn set_value(
        &self,
        handle: Handle,
        key: &[u8],
        value: &[u8],
        rm_subkeys: bool,
        opts: CallOptions<'_>,
    ) -> bool {
        let expire = ExpireArg::new(opts.expire);
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_set_value_wa)(
                handle,
                key.as_ptr(),
                key.len(),
                value.as_ptr(),
                value.len(),
                rm_subkeys,
                pass_ptr(opts.pass),
                expire.as_ptr(),
            )
        }
    }

    fn remove(&self, handle: Handle, key: &[u8]) -> bool {
        // SAFETY: inputs are borrowed for the call.
        unsafe { (self.api.k2hdkc_pm_remove)(handle, key.as_ptr(), key.len()) }
    }

    fn rename(
        &self,
        handle: Handle,
        old: &[u8],
        new: &[u8],
        parent: Option<&[u8]>,
        check_attr: bool,
        opts: CallOptions<'_>,
    ) -> bool {
        let expire = ExpireArg::new(opts.expire);
        let (parent_ptr, parent_len) = parent.map_or((ptr::null(), 0), |p| (p.as_ptr(), p.len()));
        // SAFETY: inputs are borrowed for the call; a null parent is accepted.
        unsafe {
            (self.api.k2hdkc_pm_rename_with_parent_wa)(
                handle,
                old.as_ptr(),
                old.len(),
                new.as_ptr(),
                new.len(),
                parent_ptr,
                parent_len,
                check_attr,
                pass_ptr(opts.pass),
                expire.as_ptr(),
            )
        }
    }

    fn get_attrs(&self, handle: Handle, key: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        let mut packs: *mut AttrPack = ptr::null_mut();
        let mut count: c_int = 0;
        // SAFETY: the returned array holds `count` packs and is freed below.
        unsafe {
            let ok = (self.api.k2hdkc_pm_get_attrs)(handle, key.as_ptr(), key.len(), &mut packs, &mut count);
            let attrs = if packs.is_null() || count <= 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(packs, count as usize)
                    .iter()
                    .map(|a| {
                        (
                            copy_raw(a.pkey, a.keylength),
                            copy_raw(a.pval, a.vallength),
                        )
                    })
                    .collect()
            };
            if !packs.is_null() {
                (self.api.k2h_free_attrpack)(packs, count);
            }
            ok.then_some(attrs)
        }
    }

    fn set_subkey(
        &self,
        handle: Handle,
        key: &[u8],
        subkey: &[u8],
        subval: &[u8],
        check_attr: bool,
        opts: CallOptions<'_>,
    ) -> bool {
        let expire = ExpireArg::new(opts.expire);
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_set_subkey_wa)(
                handle,
                key.as_ptr(),
                key.len(),
                subkey.as_ptr(),
                subkey.len(),
                subval.as_ptr(),
                subval.len(),
                check_attr,
                pass_ptr(opts.pass),
                expire.as_ptr(),
            )
        }
    }

    fn remove_subkey(&self, handle: Handle, key: &[u8], subkey: &[u8], nest: bool) -> bool {
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_remove_subkey)(
                handle,
                key.as_ptr(),
                key.len(),
                subkey.as_ptr(),
                subkey.len(),
                nest,
            )
        }
    }

    fn get_subkeys(&self, handle: Handle, key: &[u8]) -> Option<Vec<Bytes>> {
        let mut packs: *mut KeyPack = ptr::null_mut();
        let mut count: c_int = 0;
        // SAFETY: the returned array holds `count` packs and is freed below.
        unsafe {
            let ok = (self.api.k2hdkc_pm_get_subkeys)(handle, key.as_ptr(), key.len(), &mut packs, &mut count);
            let subkeys = if packs.is_null() || count <= 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(packs, count as usize)
                    .iter()
                    .map(|p| copy_raw(p.pkey, p.length))
                    .collect()
            };
            if !packs.is_null() {
                (self.api.k2h_free_keypack)(packs, count);
            }
            ok.then_some(subkeys)
        }
    }

    fn set_subkeys(&self, handle: Handle, key: &[u8], subkeys: &[Bytes]) -> bool {
        let packs = key_packs(subkeys);
        // SAFETY: packs borrow `subkeys`, which outlive the call; the library
        // only reads them.
        unsafe {
            (self.api.k2hdkc_pm_set_subkeys)(
                handle,
                key.as_ptr(),
                key.len(),
                pack_ptr(&packs),
                packs.len() as c_int,
            )
        }
    }

    fn set_all(
        &self,
        handle: Handle,
        key: &[u8],
        value: &[u8],
        subkeys: &[Bytes],
        opts: CallOptions<'_>,
    ) -> bool {
        let packs = key_packs(subkeys);
        let expire = ExpireArg::new(opts.expire);
        // SAFETY: as in set_subkeys.
        unsafe {
            (self.api.k2hdkc_pm_set_all_wa)(
                handle,
                key.as_ptr(),
                key.len(),
                value.as_ptr(),
                value.len(),
                pack_ptr(&packs),
                packs.len() as c_int,
                pass_ptr(opts.pass),
                expire.as_ptr(),
            )
        }
    }

    fn cas_init(&self, handle: Handle, key: &[u8], value: CasValue, opts: CallOptions<'_>) -> bool {
        let expire = ExpireArg::new(opts.expire);
        let (k, kl, p, e) = (key.as_ptr(), key.len(), pass_ptr(opts.pass), expire.as_ptr());
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            match value {
                CasValue::U8(v) => (self.api.k2hdkc_pm_cas8_init_wa)(handle, k, kl, v, p, e),
                CasValue::U16(v) => (self.api.k2hdkc_pm_cas16_init_wa)(handle, k, kl, v, p, e),
                CasValue::U32(v) => (self.api.k2hdkc_pm_cas32_init_wa)(handle, k, kl, v, p, e),
                CasValue::U64(v) => (self.api.k2hdkc_pm_cas64_init_wa)(handle, k, kl, v, p, e),
            }
        }
    }

    fn cas_get(
        &self,
        handle: Handle,
        key: &[u8],
        width: CasWidth,
        pass: Option<&CStr>,
    ) -> Option<CasValue> {
        let (k, kl, p) = (key.as_ptr(), key.len(), pass_ptr(pass));
        // SAFETY: inputs are borrowed; the output is a stack value.
        unsafe {
            match width {
                CasWidth::W8 => {
                    let mut v = 0u8;
                    (self.api.k2hdkc_pm_cas8_get_wa)(handle, k, kl, p, &mut v).then_some(CasValue::U8(v))
                }
                CasWidth::W16 => {
                    let mut v = 0u16;
                    (self.api.k2hdkc_pm_cas16_get_wa)(handle, k, kl, p, &mut v).then_some(CasValue::U16(v))
                }
                CasWidth::W32 => {
                    let mut v = 0u32;
                    (self.api.k2hdkc_pm_cas32_get_wa)(handle, k, kl, p, &mut v).then_some(CasValue::U32(v))
                }
                CasWidth::W64 => {
                    let mut v = 0u64;
                    (self.api.k2hdkc_pm_cas64_get_wa)(handle, k, kl, p, &mut v).then_some(CasValue::U64(v))
                }
            }
        }
    }

    fn cas_set(
        &self,
        handle: Handle,
        key: &[u8],
        old: CasValue,
        new: CasValue,
        opts: CallOptions<'_>,
    ) -> bool {
        let expire = ExpireArg::new(opts.expire);
        let (k, kl, p, e) = (key.as_ptr(), key.len(), pass_ptr(opts.pass), expire.as_ptr());
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            match (old, new) {
                (CasValue::U8(o), CasValue::U8(n)) => (self.api.k2hdkc_pm_cas8_set_wa)(handle, k, kl, o, n, p, e),
                (CasValue::U16(o), CasValue::U16(n)) => (self.api.k2hdkc_pm_cas16_set_wa)(handle, k, kl, o, n, p, e),
                (CasValue::U32(o), CasValue::U32(n)) => (self.api.k2hdkc_pm_cas32_set_wa)(handle, k, kl, o, n, p, e),
                (CasValue::U64(o), CasValue::U64(n)) => (self.api.k2hdkc_pm_cas64_set_wa)(handle, k, kl, o, n, p, e),
                // Commands reject mismatched widths before reaching here.
                _ => false,
            }
        }
    }

    fn cas_increment(&self, handle: Handle, key: &[u8], opts: CallOptions<'_>) -> bool {
        let expire = ExpireArg::new(opts.expire);
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_cas_increment_wa)(handle, key.as_ptr(), key.len(), pass_ptr(opts.pass), expire.as_ptr())
        }
    }

    fn cas_decrement(&self, handle: Handle, key: &[u8], opts: CallOptions<'_>) -> bool {
        let expire = ExpireArg::new(opts.expire);
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_cas_decrement_wa)(handle, key.as_ptr(), key.len(), pass_ptr(opts.pass), expire.as_ptr())
        }
    }

    fn queue_push(
        &self,
        handle: Handle,
        prefix: &[u8],
        value: &[u8],
        mode: QueueMode,
        opts: CallOptions<'_>,
    ) -> bool {
        let expire = ExpireArg::new(opts.expire);
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_q_push_wa)(
                handle,
                prefix.as_ptr(),
                prefix.len(),
                value.as_ptr(),
                value.len(),
                mode.fifo,
                mode.check_attr,
                pass_ptr(opts.pass),
                expire.as_ptr(),
            )
        }
    }

    fn key_queue_push(
        &self,
        handle: Handle,
        prefix: &[u8],
        key: &[u8],
        value: &[u8],
        mode: QueueMode,
        opts: CallOptions<'_>,
    ) -> bool {
        let expire = ExpireArg::new(opts.expire);
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_keyq_push_wa)(
                handle,
                prefix.as_ptr(),
                prefix.len(),
                key.as_ptr(),
                key.len(),
                value.as_ptr(),
                value.len(),
                mode.fifo,
                mode.check_attr,
                pass_ptr(opts.pass),
                expire.as_ptr(),
            )
        }
    }

    fn queue_pop(
        &self,
        handle: Handle,
        prefix: &[u8],
        fifo: bool,
        pass: Option<&CStr>,
    ) -> Option<Bytes> {
        let mut val: *mut c_uchar = ptr::null_mut();
        let mut len: size_t = 0;
        // SAFETY: inputs are borrowed; the output buffer is freed by take_buffer.
        unsafe {
            let ok = (self.api.k2hdkc_pm_q_pop_wp)(
                handle,
                prefix.as_ptr(),
                prefix.len(),
                fifo,
                pass_ptr(pass),
                &mut val,
                &mut len,
            );
            let owned = take_buffer(val, len);
            ok.then_some(owned)
        }
    }

    fn key_queue_pop(
        &self,
        handle: Handle,
        prefix: &[u8],
        fifo: bool,
        pass: Option<&CStr>,
    ) -> Option<(Bytes, Bytes)> {
        let mut key: *mut c_uchar = ptr::null_mut();
        let mut key_len: size_t = 0;
        let mut val: *mut c_uchar = ptr::null_mut();
        let mut val_len: size_t = 0;
        // SAFETY: inputs are borrowed; both output buffers are freed by take_buffer.
        unsafe {
            let ok = (self.api.k2hdkc_pm_keyq_pop_wp)(
                handle,
                prefix.as_ptr(),
                prefix.len(),
                fifo,
                pass_ptr(pass),
                &mut key,
                &mut key_len,
                &mut val,
                &mut val_len,
            );
            let key = take_buffer(key, key_len);
            let val = take_buffer(val, val_len);
            ok.then_some((key, val))
        }
    }

    fn queue_remove(
        &self,
        handle: Handle,
        prefix: &[u8],
        count: i32,
        fifo: bool,
        pass: Option<&CStr>,
    ) -> bool {
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_q_remove_wp)(handle, prefix.as_ptr(), prefix.len(), count, fifo, pass_ptr(pass))
        }
    }

    fn key_queue_remove(
        &self,
        handle: Handle,
        prefix: &[u8],
        count: i32,
        fifo: bool,
        pass: Option<&CStr>,
    ) -> bool {
        // SAFETY: inputs are borrowed for the call.
        unsafe {
            (self.api.k2hdkc_pm_keyq_remove_wp)(handle, prefix.as_ptr(), prefix.len(), count, fifo, pass_ptr(pass))
        }
    }

    fn set_debug_level(&self, lib: NativeLib, severity: Severity) {
        let Some(log) = &self.log else { return };
        let switch = match (lib, severity) {
            (NativeLib::K2hdkc, Severity::Silent) => log.k2hdkc_set_debug_level_silent,
            (NativeLib::K2hdkc, Severity::Error) => log.k2hdkc_set_debug_level_error,
            (NativeLib::K2hdkc, Severity::Warning) => log.k2hdkc_set_debug_level_warning,
            (NativeLib::K2hdkc, Severity::Info) => log.k2hdkc_set_debug_level_message,
            (NativeLib::K2hdkc, Severity::Dump) => log.k2hdkc_set_debug_level_dump,
            (NativeLib::Chmpx, Severity::Silent) => log.chmpx_set_debug_level_silent,
            (NativeLib::Chmpx, Severity::Error) => log.chmpx_set_debug_level_error,
            (NativeLib::Chmpx, Severity::Warning) => log.chmpx_set_debug_level_warning,
            (NativeLib::Chmpx, Severity::Info) => log.chmpx_set_debug_level_message,
            (NativeLib::Chmpx, Severity::Dump) => log.chmpx_set_debug_level_dump,
            (NativeLib::K2hash, Severity::Silent) => log.k2h_set_debug_level_silent,
            (NativeLib::K2hash, Severity::Error) => log.k2h_set_debug_level_error,
            (NativeLib::K2hash, Severity::Warning) => log.k2h_set_debug_level_warning,
            // k2hash has no dump level
            (NativeLib::K2hash, Severity::Info | Severity::Dump) => log.k2h_set_debug_level_message,
        };
        // SAFETY: no arguments.
        unsafe { switch() }
    }

    fn set_comlog(&self, enable: bool) {
        let Some(log) = &self.log else { return };
        // SAFETY: no arguments.
        unsafe {
            if enable {
                (log.k2hdkc_enable_comlog)();
            } else {
                (log.k2hdkc_disable_comlog)();
            }
        }
    }

    fn set_debug_file(&self, path: Option<&CStr>) {
        let Some(log) = &self.log else { return };
        // SAFETY: path is NUL-terminated and outlives the calls.
        let ok = unsafe {
            match path {
                Some(path) => {
                    (log.k2hdkc_set_debug_file)(path.as_ptr())
                        & (log.chmpx_set_debug_file)(path.as_ptr())
                        & (log.k2h_set_debug_file)(path.as_ptr())
                }
                None => {
                    (log.k2hdkc_unset_debug_file)()
                        & (log.chmpx_unset_debug_file)()
                        & (log.k2h_unset_debug_file)()
                }
            }
        };
        if !ok {
            tracing::warn!("native debug file switch to {:?} failed", path);
        }
    }
}
