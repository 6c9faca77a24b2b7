//! In-process double of the k2hdkc call contract
//!
//! Behaves like a single-node cluster behind the [`Native`] trait: every call
//! reports success as a flag and leaves a status pair on the calling handle.
//! Failures use the subcodes the C client reports for the same condition
//! (`NODATA` for an empty queue or missing subkeys, `DATACHANGED` for a lost
//! CAS race, `PARAMETER` for malformed arguments).
//!
//! Reading a missing value is not a failure: the call succeeds with an empty
//! value and `DKC_RES_SUCCESS DKC_RES_SUBCODE_NODATA`. Removing a missing key
//! succeeds with no detail.

use std::collections::{HashMap, VecDeque};
use std::ffi::CStr;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::Mutex;

use super::{CallOptions, Handle, Native, OpenParams, QueueMode, INVALID_HANDLE};
use crate::data::{CasValue, CasWidth};
use crate::status::{RawCode, ResCode, Status, SubCode};

/// Attribute names as k2hash stores them (NUL-terminated)
const ATTR_MTIME: &[u8] = b"mtime\0";
const ATTR_EXPIRE: &[u8] = b"expire\0";

type Outcome<T> = std::result::Result<T, SubCode>;

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    subkeys: Vec<Bytes>,
    pass: Option<Vec<u8>>,
    expire_at: Option<i64>,
    mtime: i64,
}

impl Entry {
    fn new(value: Bytes, opts: &CallOptions<'_>) -> Self {
        let now = now();
        Self {
            value,
            subkeys: Vec::new(),
            pass: opts.pass.map(|p| p.to_bytes().to_vec()),
            expire_at: opts.expire.map(|secs| now + secs),
            mtime: now,
        }
    }

    fn readable_with(&self, pass: Option<&CStr>) -> bool {
        pass_matches(self.pass.as_deref(), pass)
    }
}

/// One queued value; `key` is empty on plain queues
#[derive(Debug, Clone)]
struct Element {
    key: Bytes,
    value: Bytes,
    pass: Option<Vec<u8>>,
    expire_at: Option<i64>,
}

impl Element {
    fn new(key: &[u8], value: &[u8], opts: &CallOptions<'_>) -> Self {
        Self {
            key: Bytes::copy_from_slice(key),
            value: Bytes::copy_from_slice(value),
            pass: opts.pass.map(|p| p.to_bytes().to_vec()),
            expire_at: opts.expire.map(|secs| now() + secs),
        }
    }

    fn expired(&self, now: i64) -> bool {
        self.expire_at.is_some_and(|at| at <= now)
    }
}

fn pass_matches(stored: Option<&[u8]>, given: Option<&CStr>) -> bool {
    stored == given.map(CStr::to_bytes)
}

#[derive(Default)]
struct Store {
    entries: HashMap<Bytes, Entry>,
    queues: HashMap<Bytes, VecDeque<Element>>,
    key_queues: HashMap<Bytes, VecDeque<Element>>,
}

impl Store {
    /// Live entry for `key`; expired entries are dropped on access
    fn live(&mut self, key: &[u8]) -> Outcome<&mut Entry> {
        let expired = match self.entries.get(key) {
            None => return Err(SubCode::NODATA),
            Some(entry) => entry.expire_at.is_some_and(|at| at <= now()),
        };
        if expired {
            self.entries.remove(key);
            return Err(SubCode::NODATA);
        }
        self.entries.get_mut(key).ok_or(SubCode::NODATA)
    }

    fn readable(&mut self, key: &[u8], pass: Option<&CStr>) -> Outcome<&mut Entry> {
        let entry = self.live(key)?;
        if !entry.readable_with(pass) {
            return Err(SubCode::NODATA);
        }
        Ok(entry)
    }

    fn put(&mut self, key: &[u8], value: Bytes, opts: &CallOptions<'_>) -> &mut Entry {
        let subkeys = self
            .entries
            .remove(key)
            .map(|old| old.subkeys)
            .unwrap_or_default();
        let entry = self
            .entries
            .entry(Bytes::copy_from_slice(key))
            .or_insert_with(|| Entry::new(value, opts));
        entry.subkeys = subkeys;
        entry
    }

    fn cas(&mut self, key: &[u8], pass: Option<&CStr>) -> Outcome<CasValue> {
        let entry = self.readable(key, pass)?;
        CasValue::from_le_bytes(&entry.value).map_err(|_| SubCode::INVAL)
    }
}

#[derive(Default)]
struct State {
    next_handle: Handle,
    handles: HashMap<Handle, Status>,
    close_calls: usize,
    fail_open: bool,
    store: Store,
}

/// In-memory [`Native`] backend
#[derive(Default)]
pub struct MemoryCluster {
    state: Mutex<State>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently open
    pub fn open_handles(&self) -> usize {
        self.state.lock().handles.len()
    }

    /// Number of `close` calls received, including failed ones
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }

    /// Make subsequent `open` calls return the invalid handle
    pub fn fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    /// Run `op` against the store and record its outcome on `handle`
    fn call<T>(&self, handle: Handle, op: impl FnOnce(&mut Store) -> Outcome<T>) -> Option<T> {
        self.call_with_detail(handle, |store| op(store).map(|out| (out, SubCode::NOTHING)))
    }

    /// Like [`call`](Self::call), but a successful `op` also picks the subcode
    fn call_with_detail<T>(
        &self,
        handle: Handle,
        op: impl FnOnce(&mut Store) -> Outcome<(T, SubCode)>,
    ) -> Option<T> {
        let mut state = self.state.lock();
        if !state.handles.contains_key(&handle) {
            return None;
        }
        let (output, status) = match op(&mut state.store) {
            Ok((out, subcode)) => (Some(out), Status::new(ResCode::SUCCESS, subcode)),
            Err(subcode) => (None, Status::error(subcode)),
        };
        state.handles.insert(handle, status);
        output
    }

    /// Status of the last call on `handle`
    pub fn last_status(&self, handle: Handle) -> Status {
        self.state
            .lock()
            .handles
            .get(&handle)
            .copied()
            .unwrap_or(Status::error(SubCode::PARAMETER))
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn pop_end<T>(queue: &mut VecDeque<T>, fifo: bool) -> Option<T> {
    if fifo {
        queue.pop_front()
    } else {
        queue.pop_back()
    }
}

/// Take the next element from the chosen end
///
/// Expired elements are discarded on the way. An element sealed with another
/// password stays queued and the pop reports `NODATA`.
fn take_next(queue: &mut VecDeque<Element>, fifo: bool, pass: Option<&CStr>) -> Outcome<Element> {
    let now = now();
    loop {
        let next = if fifo { queue.front() } else { queue.back() };
        let expired = match next {
            None => return Err(SubCode::NODATA),
            Some(el) if el.expired(now) => true,
            Some(el) if !pass_matches(el.pass.as_deref(), pass) => return Err(SubCode::NODATA),
            Some(_) => false,
        };
        if !expired {
            return pop_end(queue, fifo).ok_or(SubCode::NODATA);
        }
        pop_end(queue, fifo);
    }
}

fn remove_items(
    queue: Option<&mut VecDeque<Element>>,
    count: i32,
    fifo: bool,
    pass: Option<&CStr>,
) -> Outcome<()> {
    if count <= 0 {
        return Err(SubCode::PARAMETER);
    }
    let queue = queue.ok_or(SubCode::NODATA)?;
    for _ in 0..count {
        if take_next(queue, fifo, pass).is_err() {
            break;
        }
    }
    Ok(())
}

impl Native for MemoryCluster {
    fn open(&self, _params: &OpenParams<'_>) -> Handle {
        let mut state = self.state.lock();
        if state.fail_open {
            return INVALID_HANDLE;
        }
        state.next_handle += 1;
        let handle = state.next_handle;
        state.handles.insert(handle, Status::success());
        handle
    }

    fn close(&self, handle: Handle, _cleanup: bool) -> bool {
        let mut state = self.state.lock();
        state.close_calls += 1;
        state.handles.remove(&handle).is_some()
    }

    fn res_code(&self, handle: Handle) -> RawCode {
        self.last_status(handle).code.0
    }

    fn res_subcode(&self, handle: Handle) -> RawCode {
        self.last_status(handle).subcode.0
    }

    // -------------------------------------------------------------------------
    // Values
    // -------------------------------------------------------------------------

    fn get_value(&self, handle: Handle, key: &[u8], pass: Option<&CStr>) -> Option<Bytes> {
        self.call_with_detail(handle, |store| {
            Ok(match store.readable(key, pass) {
                Ok(entry) => (entry.value.clone(), SubCode::NOTHING),
                Err(subcode) => (Bytes::new(), subcode),
            })
        })
    }

    fn set_value(
        &self,
        handle: Handle,
        key: &[u8],
        value: &[u8],
        rm_subkeys: bool,
        opts: CallOptions<'_>,
    ) -> bool {
        self.call(handle, |store| {
            let entry = store.put(key, Bytes::copy_from_slice(value), &opts);
            if rm_subkeys {
                entry.subkeys.clear();
            }
            Ok(())
        })
        .is_some()
    }

    fn remove(&self, handle: Handle, key: &[u8]) -> bool {
        self.call(handle, |store| {
            store.entries.remove(key);
            Ok(())
        })
        .is_some()
    }

    fn rename(
        &self,
        handle: Handle,
        old: &[u8],
        new: &[u8],
        parent: Option<&[u8]>,
        _check_attr: bool,
        opts: CallOptions<'_>,
    ) -> bool {
        self.call(handle, |store| {
            store.live(old)?;
            if let Some(parent) = parent {
                store.live(parent)?;
            }
            let mut entry = store.entries.remove(old).ok_or(SubCode::NODATA)?;
            if opts.pass.is_some() {
                entry.pass = opts.pass.map(|p| p.to_bytes().to_vec());
            }
            if let Some(secs) = opts.expire {
                entry.expire_at = Some(now() + secs);
            }
            entry.mtime = now();
            store.entries.insert(Bytes::copy_from_slice(new), entry);

            if let Some(parent) = parent {
                let parent = store.live(parent)?;
                for sk in parent.subkeys.iter_mut().filter(|sk| sk.as_ref() == old) {
                    *sk = Bytes::copy_from_slice(new);
                }
            }
            Ok(())
        })
        .is_some()
    }

    fn get_attrs(&self, handle: Handle, key: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        self.call(handle, |store| {
            let entry = store.live(key)?;
            let mut attrs = vec![(
                Bytes::from_static(ATTR_MTIME),
                Bytes::copy_from_slice(&entry.mtime.to_le_bytes()),
            )];
            if let Some(at) = entry.expire_at {
                attrs.push((
                    Bytes::from_static(ATTR_EXPIRE),
                    Bytes::copy_from_slice(&at.to_le_bytes()),
                ));
            }
            Ok(attrs)
        })
    }

    // -------------------------------------------------------------------------
    // Subkeys
    // -------------------------------------------------------------------------

    fn set_subkey(
        &self,
        handle: Handle,
        key: &[u8],
        subkey: &[u8],
        subval: &[u8],
        _check_attr: bool,
        opts: CallOptions<'_>,
    ) -> bool {
        self.call(handle, |store| {
            store.put(subkey, Bytes::copy_from_slice(subval), &opts);
            if store.live(key).is_err() {
                store.put(key, Bytes::new(), &CallOptions::default());
            }
            let parent = store.live(key)?;
            if !parent.subkeys.iter().any(|sk| sk.as_ref() == subkey) {
                parent.subkeys.push(Bytes::copy_from_slice(subkey));
            }
            Ok(())
        })
        .is_some()
    }

    fn remove_subkey(&self, handle: Handle, key: &[u8], subkey: &[u8], nest: bool) -> bool {
        self.call(handle, |store| {
            let parent = store.live(key)?;
            let before = parent.subkeys.len();
            parent.subkeys.retain(|sk| sk.as_ref() != subkey);
            if parent.subkeys.len() == before {
                return Err(SubCode::NODATA);
            }
            if nest {
                store.entries.remove(subkey);
            }
            Ok(())
        })
        .is_some()
    }

    fn get_subkeys(&self, handle: Handle, key: &[u8]) -> Option<Vec<Bytes>> {
        self.call(handle, |store| {
            let entry = store.live(key)?;
            if entry.subkeys.is_empty() {
                return Err(SubCode::NODATA);
            }
            Ok(entry.subkeys.clone())
        })
    }

    fn set_subkeys(&self, handle: Handle, key: &[u8], subkeys: &[Bytes]) -> bool {
        self.call(handle, |store| {
            store.live(key)?.subkeys = subkeys.to_vec();
            Ok(())
        })
        .is_some()
    }

    fn set_all(
        &self,
        handle: Handle,
        key: &[u8],
        value: &[u8],
        subkeys: &[Bytes],
        opts: CallOptions<'_>,
    ) -> bool {
        self.call(handle, |store| {
            store.put(key, Bytes::copy_from_slice(value), &opts).subkeys = subkeys.to_vec();
            Ok(())
        })
        .is_some()
    }

    // -------------------------------------------------------------------------
    // CAS
    // -------------------------------------------------------------------------

    fn cas_init(&self, handle: Handle, key: &[u8], value: CasValue, opts: CallOptions<'_>) -> bool {
        self.call(handle, |store| {
            store.put(key, Bytes::from(value.to_le_bytes()), &opts);
            Ok(())
        })
        .is_some()
    }

    fn cas_get(
        &self,
        handle: Handle,
        key: &[u8],
        width: CasWidth,
        pass: Option<&CStr>,
    ) -> Option<CasValue> {
        self.call(handle, |store| {
            let value = store.cas(key, pass)?;
            if value.width() != width {
                return Err(SubCode::INVAL);
            }
            Ok(value)
        })
    }

    fn cas_set(
        &self,
        handle: Handle,
        key: &[u8],
        old: CasValue,
        new: CasValue,
        opts: CallOptions<'_>,
    ) -> bool {
        self.call(handle, |store| {
            if old.width() != new.width() {
                return Err(SubCode::PARAMETER);
            }
            let current = store.cas(key, opts.pass)?;
            if current.width() != old.width() {
                return Err(SubCode::INVAL);
            }
            if current != old {
                return Err(SubCode::DATACHANGED);
            }
            store.put(key, Bytes::from(new.to_le_bytes()), &opts);
            Ok(())
        })
        .is_some()
    }

    fn cas_increment(&self, handle: Handle, key: &[u8], opts: CallOptions<'_>) -> bool {
        self.call(handle, |store| {
            let next = store.cas(key, opts.pass)?.wrapping_step(true);
            store.put(key, Bytes::from(next.to_le_bytes()), &opts);
            Ok(())
        })
        .is_some()
    }

    fn cas_decrement(&self, handle: Handle, key: &[u8], opts: CallOptions<'_>) -> bool {
        self.call(handle, |store| {
            let next = store.cas(key, opts.pass)?.wrapping_step(false);
            store.put(key, Bytes::from(next.to_le_bytes()), &opts);
            Ok(())
        })
        .is_some()
    }

    // -------------------------------------------------------------------------
    // Queues
    // -------------------------------------------------------------------------

    fn queue_push(
        &self,
        handle: Handle,
        prefix: &[u8],
        value: &[u8],
        _mode: QueueMode,
        opts: CallOptions<'_>,
    ) -> bool {
        self.call(handle, |store| {
            store
                .queues
                .entry(Bytes::copy_from_slice(prefix))
                .or_default()
                .push_back(Element::new(&[], value, &opts));
            Ok(())
        })
        .is_some()
    }

    fn key_queue_push(
        &self,
        handle: Handle,
        prefix: &[u8],
        key: &[u8],
        value: &[u8],
        _mode: QueueMode,
        opts: CallOptions<'_>,
    ) -> bool {
        self.call(handle, |store| {
            store
                .key_queues
                .entry(Bytes::copy_from_slice(prefix))
                .or_default()
                .push_back(Element::new(key, value, &opts));
            Ok(())
        })
        .is_some()
    }

    fn queue_pop(
        &self,
        handle: Handle,
        prefix: &[u8],
        fifo: bool,
        pass: Option<&CStr>,
    ) -> Option<Bytes> {
        self.call(handle, |store| {
            let queue = store.queues.get_mut(prefix).ok_or(SubCode::NODATA)?;
            Ok(take_next(queue, fifo, pass)?.value)
        })
    }

    fn key_queue_pop(
        &self,
        handle: Handle,
        prefix: &[u8],
        fifo: bool,
        pass: Option<&CStr>,
    ) -> Option<(Bytes, Bytes)> {
        self.call(handle, |store| {
            let queue = store.key_queues.get_mut(prefix).ok_or(SubCode::NODATA)?;
            let el = take_next(queue, fifo, pass)?;
            Ok((el.key, el.value))
        })
    }

    fn queue_remove(
        &self,
        handle: Handle,
        prefix: &[u8],
        count: i32,
        fifo: bool,
        pass: Option<&CStr>,
    ) -> bool {
        self.call(handle, |store| remove_items(store.queues.get_mut(prefix), count, fifo, pass))
            .is_some()
    }

    fn key_queue_remove(
        &self,
        handle: Handle,
        prefix: &[u8],
        count: i32,
        fifo: bool,
        pass: Option<&CStr>,
    ) -> bool {
        self.call(handle, |store| remove_items(store.key_queues.get_mut(prefix), count, fifo, pass))
            .is_some()
    }
}
