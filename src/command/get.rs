//! Get: read the value of a key

use bytes::Bytes;

use super::{command_impl, require, Core};
use crate::data::{Data, Protection};
use crate::error::Result;
use crate::session::Session;

/// `k2hdkc_pm_get_value_wp`
///
/// The payload is the stored buffer; [`crate::CommandResult::string`] drops
/// its trailing NUL.
#[derive(Debug)]
pub struct Get {
    key: Bytes,
    protection: Protection,
    core: Core<Bytes>,
}

impl Get {
    pub fn new(key: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    pub fn set_enc_pass(&mut self, pass: impl Into<String>) -> &mut Self {
        self.protection.set_pass(pass);
        self
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let key = &self.key;
        self.core.run(
            session,
            "k2hdkc_pm_get_value_wp",
            |native, h| native.get_value(h, key, pass.as_deref()),
            |value| value,
        )
    }
}

command_impl!(Get, Bytes, "Get");
