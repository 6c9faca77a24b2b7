//! Set: store a value under a key

use bytes::Bytes;

use super::{command_impl, flag, require, Core};
use crate::data::{Data, Protection};
use crate::error::Result;
use crate::native::CallOptions;
use crate::session::Session;

/// `k2hdkc_pm_set_value_wa`
#[derive(Debug)]
pub struct Set {
    key: Bytes,
    value: Bytes,
    rm_subkeys: bool,
    protection: Protection,
    core: Core<()>,
}

impl Set {
    /// The value may be empty; empty text is stored as a lone NUL.
    pub fn new(key: impl Into<Data>, value: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            value: value.into().encode(),
            rm_subkeys: false,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    pub fn set_key(&mut self, key: impl Into<Data>) -> Result<&mut Self> {
        self.key = key.into().encode_required("key")?;
        Ok(self)
    }

    pub fn set_value(&mut self, value: impl Into<Data>) -> &mut Self {
        self.value = value.into().encode();
        self
    }

    /// Drop the key's subkey list when overwriting
    pub fn set_rm_subkey_list(&mut self, rm: bool) -> &mut Self {
        self.rm_subkeys = rm;
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

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let opts = CallOptions {
            pass: pass.as_deref(),
            expire: self.protection.expire(),
        };
        let (key, value, rm) = (&self.key, &self.value, self.rm_subkeys);
        self.core.run(
            session,
            "k2hdkc_pm_set_value_wa",
            |native, h| flag(native.set_value(h, key, value, rm, opts)),
            |_| (),
        )
    }
}

command_impl!(Set, (), "Set");
