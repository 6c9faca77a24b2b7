//! Subkey-list operations: GetSubKeys, SetSubKeys, ClearSubKeys

use bytes::Bytes;

use super::{command_impl, flag, require, Core};
use crate::data::{encode_list, Data};
use crate::error::Result;
use crate::session::Session;

// =============================================================================
// GetSubKeys
// =============================================================================

/// `k2hdkc_pm_get_subkeys`
#[derive(Debug)]
pub struct GetSubKeys {
    key: Bytes,
    core: Core<Vec<Bytes>>,
}

impl GetSubKeys {
    pub fn new(key: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            core: Core::default(),
        })
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        let key = &self.key;
        self.core.run(
            session,
            "k2hdkc_pm_get_subkeys",
            |native, h| native.get_subkeys(h, key),
            |subkeys| subkeys,
        )
    }
}

command_impl!(GetSubKeys, Vec<Bytes>, "GetSubKeys");

// =============================================================================
// SetSubKeys
// =============================================================================

/// `k2hdkc_pm_set_subkeys`: replace a key's subkey list
///
/// The list must not be empty; use [`ClearSubKeys`] to drop every subkey.
#[derive(Debug)]
pub struct SetSubKeys {
    key: Bytes,
    subkeys: Vec<Bytes>,
    core: Core<()>,
}

impl SetSubKeys {
    pub fn new<I, D>(key: impl Into<Data>, subkeys: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<Data>,
    {
        Ok(Self {
            key: key.into().encode_required("key")?,
            subkeys: encode_list(subkeys, "skeys")?,
            core: Core::default(),
        })
    }

    pub fn subkeys(&self) -> &[Bytes] {
        &self.subkeys
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        let (key, subkeys) = (&self.key, &self.subkeys);
        self.core.run(
            session,
            "k2hdkc_pm_set_subkeys",
            |native, h| flag(native.set_subkeys(h, key, subkeys)),
            |_| (),
        )
    }
}

command_impl!(SetSubKeys, (), "SetSubKeys");

// =============================================================================
// ClearSubKeys
// =============================================================================

/// `k2hdkc_pm_set_subkeys` with an empty list
#[derive(Debug)]
pub struct ClearSubKeys {
    key: Bytes,
    core: Core<()>,
}

impl ClearSubKeys {
    pub fn new(key: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            core: Core::default(),
        })
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        let key = &self.key;
        self.core.run(
            session,
            "k2hdkc_pm_set_subkeys",
            |native, h| flag(native.set_subkeys(h, key, &[])),
            |_| (),
        )
    }
}

command_impl!(ClearSubKeys, (), "ClearSubKeys");
