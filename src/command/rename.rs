//! Rename: move a key's value to a new key

use bytes::Bytes;

use super::{command_impl, flag, require, Core};
use crate::data::{Data, Protection};
use crate::error::Result;
use crate::native::CallOptions;
use crate::session::Session;

/// `k2hdkc_pm_rename_with_parent_wa`
///
/// With a parent key, the parent's subkey list has the old key replaced by
/// the new one.
#[derive(Debug)]
pub struct Rename {
    old_key: Bytes,
    new_key: Bytes,
    parent_key: Option<Bytes>,
    check_attr: bool,
    protection: Protection,
    core: Core<()>,
}

impl Rename {
    pub fn new(old_key: impl Into<Data>, new_key: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            old_key: old_key.into().encode_required("oldKey")?,
            new_key: new_key.into().encode_required("newKey")?,
            parent_key: None,
            check_attr: true,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    pub fn set_parent_key(&mut self, parent: impl Into<Data>) -> Result<&mut Self> {
        self.parent_key = Some(parent.into().encode_required("parentKey")?);
        Ok(self)
    }

    /// Check attributes of the old key (default true)
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

    pub fn old_key(&self) -> &Bytes {
        &self.old_key
    }

    pub fn new_key(&self) -> &Bytes {
        &self.new_key
    }

    pub fn parent_key(&self) -> Option<&Bytes> {
        self.parent_key.as_ref()
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("oldKey", &self.old_key))?;
        self.core.check(require("newKey", &self.new_key))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let opts = CallOptions {
            pass: pass.as_deref(),
            expire: self.protection.expire(),
        };
        let (old, new, parent, attr) = (
            &self.old_key,
            &self.new_key,
            self.parent_key.as_deref(),
            self.check_attr,
        );
        self.core.run(
            session,
            "k2hdkc_pm_rename_with_parent_wa",
            |native, h| flag(native.rename(h, old, new, parent, attr, opts)),
            |_| (),
        )
    }
}

command_impl!(Rename, (), "Rename");
