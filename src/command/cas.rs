//! Compare-and-swap operations on fixed-width integers
//!
//! The operand width (8, 16, 32 or 64 bits) selects the native function
//! variant. Values are stored little-endian.

use bytes::Bytes;

use super::{command_impl, flag, require, CommandResult, Core};
use crate::data::{CasOperand, CasValue, CasWidth, Data, Protection};
use crate::error::{K2hdkcError, Result};
use crate::native::CallOptions;
use crate::session::Session;

fn decode(operand: impl Into<CasOperand>) -> Result<CasValue> {
    CasValue::from_le_bytes(&operand.into().encode())
}

fn cas_init_call(width: CasWidth) -> &'static str {
    match width {
        CasWidth::W8 => "k2hdkc_pm_cas8_init_wa",
        CasWidth::W16 => "k2hdkc_pm_cas16_init_wa",
        CasWidth::W32 => "k2hdkc_pm_cas32_init_wa",
        CasWidth::W64 => "k2hdkc_pm_cas64_init_wa",
    }
}

fn cas_get_call(width: CasWidth) -> &'static str {
    match width {
        CasWidth::W8 => "k2hdkc_pm_cas8_get_wa",
        CasWidth::W16 => "k2hdkc_pm_cas16_get_wa",
        CasWidth::W32 => "k2hdkc_pm_cas32_get_wa",
        CasWidth::W64 => "k2hdkc_pm_cas64_get_wa",
    }
}

fn cas_set_call(width: CasWidth) -> &'static str {
    match width {
        CasWidth::W8 => "k2hdkc_pm_cas8_set_wa",
        CasWidth::W16 => "k2hdkc_pm_cas16_set_wa",
        CasWidth::W32 => "k2hdkc_pm_cas32_set_wa",
        CasWidth::W64 => "k2hdkc_pm_cas64_set_wa",
    }
}

// =============================================================================
// CasInit
// =============================================================================

/// Initialize a CAS value (default: 64-bit zero)
#[derive(Debug)]
pub struct CasInit {
    key: Bytes,
    value: CasValue,
    protection: Protection,
    core: Core<()>,
}

impl CasInit {
    pub fn new(key: impl Into<Data>) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            value: CasValue::U64(0),
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    /// The operand's byte length (1, 2, 4 or 8) selects the width
    pub fn with_value(key: impl Into<Data>, value: impl Into<CasOperand>) -> Result<Self> {
        let mut cmd = Self::new(key)?;
        cmd.set_value(value)?;
        Ok(cmd)
    }

    pub fn set_value(&mut self, value: impl Into<CasOperand>) -> Result<&mut Self> {
        self.value = decode(value)?;
        Ok(self)
    }

    pub fn set_enc_pass(&mut self, pass: impl Into<String>) -> &mut Self {
        self.protection.set_pass(pass);
        self
    }

    pub fn set_expire(&mut self, secs: i64) -> &mut Self {
        self.protection.set_expire(secs);
        self
    }

    pub fn value(&self) -> CasValue {
        self.value
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let opts = CallOptions {
            pass: pass.as_deref(),
            expire: self.protection.expire(),
        };
        let (key, value) = (&self.key, self.value);
        self.core.run(
            session,
            cas_init_call(value.width()),
            |native, h| flag(native.cas_init(h, key, value, opts)),
            |_| (),
        )
    }
}

command_impl!(CasInit, (), "CasInit");

// =============================================================================
// CasGet
// =============================================================================

/// Read a CAS value (default width: 32 bits)
#[derive(Debug)]
pub struct CasGet {
    key: Bytes,
    width: CasWidth,
    protection: Protection,
    core: Core<Option<CasValue>>,
}

impl CasGet {
    pub fn new(key: impl Into<Data>) -> Result<Self> {
        Self::with_width(key, CasWidth::default())
    }

    pub fn with_width(key: impl Into<Data>, width: CasWidth) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            width,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    pub fn set_width(&mut self, width: CasWidth) -> &mut Self {
        self.width = width;
        self
    }

    /// Width from a value length in bytes (1, 2, 4 or 8)
    pub fn set_value_len(&mut self, len: usize) -> Result<&mut Self> {
        self.width = CasWidth::from_len(len)?;
        Ok(self)
    }

    pub fn set_enc_pass(&mut self, pass: impl Into<String>) -> &mut Self {
        self.protection.set_pass(pass);
        self
    }

    pub fn width(&self) -> CasWidth {
        self.width
    }

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let (key, width) = (&self.key, self.width);
        self.core.run(
            session,
            cas_get_call(width),
            |native, h| native.cas_get(h, key, width, pass.as_deref()),
            Some,
        )
    }
}

command_impl!(CasGet, Option<CasValue>, "CasGet");

impl CommandResult<Option<CasValue>> {
    pub fn value(&self) -> Option<CasValue> {
        *self.payload()
    }

    /// Little-endian bytes of the value, empty if the call failed
    pub fn bytes(&self) -> Vec<u8> {
        self.value().map(CasValue::to_le_bytes).unwrap_or_default()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.value().map(CasValue::as_u64)
    }
}

// =============================================================================
// CasSet
// =============================================================================

/// Replace a CAS value if it still equals `old`
///
/// `old` and `new` must have the same byte length.
#[derive(Debug)]
pub struct CasSet {
    key: Bytes,
    old: CasValue,
    new: CasValue,
    protection: Protection,
    core: Core<()>,
}

impl CasSet {
    pub fn new(
        key: impl Into<Data>,
        old: impl Into<CasOperand>,
        new: impl Into<CasOperand>,
    ) -> Result<Self> {
        let key = key.into().encode_required("key")?;
        let (old, new) = (old.into().encode(), new.into().encode());
        if old.len() != new.len() {
            return Err(K2hdkcError::CasLengthMismatch {
                old: old.len(),
                new: new.len(),
            });
        }
        Ok(Self {
            key,
            old: CasValue::from_le_bytes(&old)?,
            new: CasValue::from_le_bytes(&new)?,
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

    fn run(&mut self, session: &Session) -> Result<()> {
        self.core.check(require("key", &self.key))?;
        if self.old.width() != self.new.width() {
            return self.core.check(Err(K2hdkcError::CasLengthMismatch {
                old: self.old.width().byte_len(),
                new: self.new.width().byte_len(),
            }));
        }
        let pass = self.core.check(self.protection.c_pass())?;
        let opts = CallOptions {
            pass: pass.as_deref(),
            expire: self.protection.expire(),
        };
        let (key, old, new) = (&self.key, self.old, self.new);
        self.core.run(
            session,
            cas_set_call(old.width()),
            |native, h| flag(native.cas_set(h, key, old, new, opts)),
            |_| (),
        )
    }
}

command_impl!(CasSet, (), "CasSet");

// =============================================================================
// CasIncDec
// =============================================================================

/// Increment or decrement a CAS value by one
#[derive(Debug)]
pub struct CasIncDec {
    key: Bytes,
    increment: bool,
    protection: Protection,
    core: Core<()>,
}

impl CasIncDec {
    pub fn new(key: impl Into<Data>, increment: bool) -> Result<Self> {
        Ok(Self {
            key: key.into().encode_required("key")?,
            increment,
            protection: Protection::default(),
            core: Core::default(),
        })
    }

    pub fn increment(key: impl Into<Data>) -> Result<Self> {
        Self::new(key, true)
    }

    pub fn decrement(key: impl Into<Data>) -> Result<Self> {
        Self::new(key, false)
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
        self.core.check(require("key", &self.key))?;
        let pass = self.core.check(self.protection.c_pass())?;
        let opts = CallOptions {
            pass: pass.as_deref(),
            expire: self.protection.expire(),
        };
        let key = &self.key;
        if self.increment {
            self.core.run(
                session,
                "k2hdkc_pm_cas_increment_wa",
                |native, h| flag(native.cas_increment(h, key, opts)),
                |_| (),
            )
        } else {
            self.core.run(
                session,
                "k2hdkc_pm_cas_decrement_wa",
                |native, h| flag(native.cas_decrement(h, key, opts)),
                |_| (),
            )
        }
    }
}

command_impl!(CasIncDec, (), "CasIncDec");
