//! Remove: delete a key

use bytes::Bytes;

use super::{command_impl, flag, require, Core};
use crate::data::Data;
use crate::error::Result;
use crate::session::Session;

/// `k2hdkc_pm_remove`
#[derive(Debug)]
pub struct Remove {
    key: Bytes,
    core: Core<()>,
}

impl Remove {
    pub fn new(key: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            core: Core::default(),
        })
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        let key = &self.key;
        self.core.run(
            session,
            "k2hdkc_pm_remove",
            |native, h| flag(native.remove(h, key)),
            |_| (),
        )
    }
}

command_impl!(Remove, (), "Remove");
