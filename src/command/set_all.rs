//! SetAll: store a value and its subkey list in one call

use bytes::Bytes;

use super::{command_impl, flag, require, Core};
use crate::data::{encode_list, Data, Protection};
use crate::error::Result;
use crate::native::CallOptions;
use crate::session::Session;

/// `k2hdkc_pm_set_all_wa`
#[derive(Debug)]
pub struct SetAll {
    key: Bytes,
    value: Bytes,
    subkeys: Vec<Bytes>,
    protection: Protection,
    core: Core<()>,
}

impl SetAll {
    pub fn new<I, D>(key: impl Into<Data>, value: impl Into<Data>, subkeys: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<Data>,
    {
        Ok(Self {
            key: key.into().encode_required("key")?,
            value: value.into().encode_required("val")?,
            subkeys: encode_list(subkeys, "skeys")?,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    pub fn set_enc_pass(&mut self, pass: impl Into<String>) -> &mut Self {
        self.protection.set_pass(pass);
        self
    }

    pub fn set_expire(&mut self, secs: i64) -> &mut Self {
        self.protection.set_expire(secs);
        self
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        self.core.check(require("val", &self.value))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let opts = CallOptions {
            pass: pass.as_deref(),
            expire: self.protection.expire(),
        };
        let (key, value, subkeys) = (&self.key, &self.value, &self.subkeys);
        self.core.run(
            session,
            "k2hdkc_pm_set_all_wa",
            |native, h| flag(native.set_all(h, key, value, subkeys, opts)),
            |_| (),
        )
    }
}

command_impl!(SetAll, (), "SetAll");
