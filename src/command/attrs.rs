//! GetAttrs: read the attributes k2hash keeps for a key

use std::collections::HashMap;

use bytes::Bytes;

use super::{command_impl, require, CommandResult, Core};
use crate::data::Data;
use crate::error::Result;
use crate::session::Session;

/// Attributes holding an 8-byte little-endian Unix time
const TIME_ATTRS: [&str; 2] = ["expire", "mtime"];

/// One (name, value) attribute pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attr {
    pub key: Bytes,
    pub value: Bytes,
}

impl Attr {
    /// Name without a trailing NUL
    pub fn key_string(&self) -> String {
        let key = self.key.strip_suffix(b"\0").unwrap_or(&self.key);
        String::from_utf8_lossy(key).into_owned()
    }

    /// Value as text; time attributes render as decimal seconds
    pub fn value_string(&self) -> String {
        let key = self.key_string();
        if TIME_ATTRS.contains(&key.as_str()) {
            if let Some(secs) = unix_time(&self.value) {
                return secs.to_string();
            }
        }
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

/// First 8 bytes as a little-endian `u64`
fn unix_time(value: &[u8]) -> Option<u64> {
    let head: [u8; 8] = value.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(head))
}

/// `k2hdkc_pm_get_attrs`
#[derive(Debug)]
pub struct GetAttrs {
    key: Bytes,
    core: Core<Vec<Attr>>,
}

impl GetAttrs {
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
            "k2hdkc_pm_get_attrs",
            |native, h| native.get_attrs(h, key),
            |attrs| {
                attrs
                    .into_iter()
                    .map(|(key, value)| Attr { key, value })
                    .collect()
            },
        )
    }
}

command_impl!(GetAttrs, Vec<Attr>, "GetAttrs");

impl CommandResult<Vec<Attr>> {
    pub fn attrs(&self) -> &[Attr] {
        self.payload()
    }

    /// Attributes keyed by name, with time attributes in decimal seconds
    pub fn to_string_map(&self) -> HashMap<String, String> {
        self.payload()
            .iter()
            .map(|attr| (attr.key_string(), attr.value_string()))
            .collect()
    }
}
