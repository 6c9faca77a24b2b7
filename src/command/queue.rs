//! Queue operations: QueuePush, QueuePop, QueueRemove
//!
//! A queue is named by a prefix. Plain queues hold values; key queues hold
//! (key, value) pairs. Pushing with a key targets the key queue of the prefix.

use bytes::Bytes;

use super::{command_impl, flag, require, Core};
use crate::data::{strip_terminator, Data, Protection};
use crate::error::{K2hdkcError, Result};
use crate::native::{CallOptions, QueueMode};
use crate::session::Session;

/// A popped queue element
///
/// `key` is set only for elements popped from a key queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueItem {
    pub key: Option<Bytes>,
    pub value: Bytes,
}

impl QueueItem {
    pub fn key_bytes(&self) -> Option<&Bytes> {
        self.key.as_ref()
    }

    /// Key without its trailing NUL, empty for plain queue elements
    pub fn key_string(&self) -> String {
        self.key.as_deref().map(strip_terminator).unwrap_or_default()
    }

    pub fn value_bytes(&self) -> &Bytes {
        &self.value
    }

    /// Value without its trailing NUL
    pub fn value_string(&self) -> String {
        strip_terminator(&self.value)
    }
}

// =============================================================================
// QueuePush
// =============================================================================

/// `k2hdkc_pm_q_push_wa`, or `k2hdkc_pm_keyq_push_wa` when a key is set
#[derive(Debug)]
pub struct QueuePush {
    prefix: Bytes,
    value: Bytes,
    key: Option<Bytes>,
    fifo: bool,
    check_attr: bool,
    protection: Protection,
    core: Core<()>,
}

impl QueuePush {
    pub fn new(prefix: impl Into<Data>, value: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            prefix: prefix.into().encode_required("prefix")?,
            value: value.into().encode_required("val")?,
            key: None,
            fifo: true,
            check_attr: true,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    /// Push a (key, value) pair onto the prefix's key queue
    pub fn with_key(
        prefix: impl Into<Data>,
        value: impl Into<Data>,
        key: impl Into<Data>,
    ) -> Result<Self> {
        let mut cmd = Self::new(prefix, value)?;
        cmd.set_key(key)?;
        Ok(cmd)
    }

    pub fn set_key(&mut self, key: impl Into<Data>) -> Result<&mut Self> {
        self.key = Some(key.into().encode_required("key")?);
        Ok(self)
    }

    pub fn use_fifo(&mut self, fifo: bool) -> &mut Self {
        self.fifo = fifo;
        self
    }

    pub fn set_attr(&mut self, check: bool) -> &mut Self {
        self.check_attr = check;
        self
    }

    pub fn set_enc_pass(&mut self, pass: impl Into<String>) -> &mut Self {
        self.protection.set_pass(pass);
        self
    }

    pub fn set_expire(&mut self, secs: i64) -> &mut Self {
        self.protection.set_expire(secs);
        self
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("prefix", &self.prefix))?;
        self.core.check(require("val", &self.value))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let opts = CallOptions {
            pass: pass.as_deref(),
            expire: self.protection.expire(),
        };
        let mode = QueueMode {
            fifo: self.fifo,
            check_attr: self.check_attr,
        };
        let (prefix, value) = (&self.prefix, &self.value);
        match &self.key {
            Some(key) => self.core.run(
                session,
                "k2hdkc_pm_keyq_push_wa",
                |native, h| flag(native.key_queue_push(h, prefix, key, value, mode, opts)),
                |_| (),
            ),
            None => self.core.run(
                session,
                "k2hdkc_pm_q_push_wa",
                |native, h| flag(native.queue_push(h, prefix, value, mode, opts)),
                |_| (),
            ),
        }
    }
}

command_impl!(QueuePush, (), "QueuePush");

// =============================================================================
// QueuePop
// =============================================================================

/// `k2hdkc_pm_q_pop_wp`, or `k2hdkc_pm_keyq_pop_wp` on a key queue
#[derive(Debug)]
pub struct QueuePop {
    prefix: Bytes,
    fifo: bool,
    key_queue: bool,
    protection: Protection,
    core: Core<QueueItem>,
}

impl QueuePop {
    pub fn new(prefix: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            prefix: prefix.into().encode_required("prefix")?,
            fifo: true,
            key_queue: false,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    pub fn with_key_queue(prefix: impl Into<Data>, key_queue: bool) -> Result<Self> {
        let mut cmd = Self::new(prefix)?;
        cmd.use_key_queue(key_queue);
        Ok(cmd)
    }

    pub fn use_key_queue(&mut self, key_queue: bool) -> &mut Self {
        self.key_queue = key_queue;
        self
    }

    pub fn use_fifo(&mut self, fifo: bool) -> &mut Self {
        self.fifo = fifo;
        self
    }

    pub fn set_enc_pass(&mut self, pass: impl Into<String>) -> &mut Self {
        self.protection.set_pass(pass);
        self
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("prefix", &self.prefix))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let (prefix, fifo) = (&self.prefix, self.fifo);
        if self.key_queue {
            self.core.run(
                session,
                "k2hdkc_pm_keyq_pop_wp",
                |native, h| native.key_queue_pop(h, prefix, fifo, pass.as_deref()),
                |(key, value)| QueueItem {
                    key: Some(key),
                    value,
                },
            )
        } else {
            self.core.run(
                session,
                "k2hdkc_pm_q_pop_wp",
                |native, h| native.queue_pop(h, prefix, fifo, pass.as_deref()),
                |value| QueueItem { key: None, value },
            )
        }
    }
}

command_impl!(QueuePop, QueueItem, "QueuePop");

// =============================================================================
// QueueRemove
// =============================================================================

/// `k2hdkc_pm_q_remove_wp`, or `k2hdkc_pm_keyq_remove_wp` on a key queue
///
/// Removes up to `count` elements from the head (FIFO) or tail (LIFO).
#[derive(Debug)]
pub struct QueueRemove {
    prefix: Bytes,
    count: i32,
    fifo: bool,
    key_queue: bool,
    protection: Protection,
    core: Core<()>,
}

impl QueueRemove {
    /// `count` must be between 1 and `i32::MAX`
    pub fn new(prefix: impl Into<Data>, count: i64) -> Result<Self> {
        let prefix = prefix.into().encode_required("prefix")?;
        let count = i32::try_from(count)
            .ok()
            .filter(|c| *c > 0)
            .ok_or(K2hdkcError::InvalidCount(count))?;
        Ok(Self {
            prefix,
            count,
            fifo: true,
            key_queue: false,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    pub fn with_key_queue(prefix: impl Into<Data>, count: i64, key_queue: bool) -> Result<Self> {
        let mut cmd = Self::new(prefix, count)?;
        cmd.use_key_queue(key_queue);
        Ok(cmd)
    }

    pub fn use_key_queue(&mut self, key_queue: bool) -> &mut Self {
        self.key_queue = key_queue;
        self
    }

    pub fn use_fifo(&mut self, fifo: bool) -> &mut Self {
        self.fifo = fifo;
        self
    }

    pub fn set_enc_pass(&mut self, pass: impl Into<String>) -> &mut Self {
        self.protection.set_pass(pass);
        self
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("prefix", &self.prefix))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let (prefix, count, fifo, key_queue) = (&self.prefix, self.count, self.fifo, self.key_queue);
        let call = if key_queue {
            "k2hdkc_pm_keyq_remove_wp"
        } else {
            "k2hdkc_pm_q_remove_wp"
        };
        self.core.run(
            session,
            call,
            |native, h| {
                let removed = if key_queue {
                    native.key_queue_remove(h, prefix, count, fifo, pass.as_deref())
                } else {
                    native.queue_remove(h, prefix, count, fifo, pass.as_deref())
                };
                flag(removed)
            },
            |_| (),
        )
    }
}

command_impl!(QueueRemove, (), "QueueRemove");
