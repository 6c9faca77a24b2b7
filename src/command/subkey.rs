//! Single-subkey operations: AddSubKey, RemoveSubKey

use bytes::Bytes;

use super::{command_impl, flag, require, Core};
use crate::data::{Data, Protection};
use crate::error::Result;
use crate::native::CallOptions;
use crate::session::Session;

// =============================================================================
// AddSubKey
// =============================================================================

/// `k2hdkc_pm_set_subkey_wa`: store a subkey with its value and link it
/// under a parent key
#[derive(Debug)]
pub struct AddSubKey {
    key: Bytes,
    subkey: Bytes,
    subval: Bytes,
    check_attr: bool,
    protection: Protection,
    core: Core<()>,
}

impl AddSubKey {
    /// The subkey value may be empty.
    pub fn new(
        key: impl Into<Data>,
        subkey: impl Into<Data>,
        subval: impl Into<Data>,
    ) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            subkey: subkey.into().encode_required("skey")?,
            subval: subval.into().encode(),
            check_attr: true,
            protection: Protection::default(),
            core: Core::default(),
        })
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

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn subkey(&self) -> &Bytes {
        &self.subkey
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        self.core.check(require("skey", &self.subkey))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let opts = CallOptions {
            pass: pass.as_deref(),
            expire: self.protection.expire(),
        };
        let (key, subkey, subval, attr) = (&self.key, &self.subkey, &self.subval, self.check_attr);
        self.core.run(
            session,
            "k2hdkc_pm_set_subkey_wa",
            |native, h| flag(native.set_subkey(h, key, subkey, subval, attr, opts)),
            |_| (),
        )
    }
}

command_impl!(AddSubKey, (), "AddSubKey");

// =============================================================================
// RemoveSubKey
// =============================================================================

/// `k2hdkc_pm_remove_subkey`: unlink a subkey from its parent
///
/// With `nest`, the subkey's own entry is removed as well.
#[derive(Debug)]
pub struct RemoveSubKey {
    key: Bytes,
    subkey: Bytes,
    nest: bool,
    core: Core<()>,
}

impl RemoveSubKey {
    pub fn new(key: impl Into<Data>, subkey: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            subkey: subkey.into().encode_required("skey")?,
            nest: false,
            core: Core::default(),
        })
    }

    pub fn set_nest(&mut self, nest: bool) -> &mut Self {
        self.nest = nest;
        self
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        self.core.check(require("skey", &self.subkey))?;
        let (key, subkey, nest) = (&self.key, &self.subkey, self.nest);
        self.core.run(
            session,
            "k2hdkc_pm_remove_subkey",
            |native, h| flag(native.remove_subkey(h, key, subkey, nest)),
            |_| (),
        )
    }
}

command_impl!(RemoveSubKey, (), "RemoveSubKey");
