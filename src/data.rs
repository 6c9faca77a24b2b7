//! Input data and canonical encodings
//!
//! Every key-like argument (key, subkey, prefix, parent key, value) is either
//! text or raw bytes:
//!
//! ```text
//! Text("abc")     -> [b'a', b'b', b'c', 0x00]   (UTF-8 + one NUL)
//! Bytes([1, 2])   -> [1, 2]                     (verbatim)
//! ```
//!
//! CAS operands are fixed-width integers encoded little-endian byte by byte,
//! independent of the host byte order.

use std::ffi::CString;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{K2hdkcError, Result};

// =============================================================================
// Key / Value Data
// =============================================================================

/// A key-like argument in text or binary form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    /// Encoded as UTF-8 with a trailing NUL
    Text(String),

    /// Transmitted verbatim
    Bytes(Bytes),
}

impl Data {
    /// Canonical encoding, without any length check
    pub fn encode(&self) -> Bytes {
        match self {
            Data::Text(text) => {
                let mut buf = BytesMut::with_capacity(text.len() + 1);
                buf.put_slice(text.as_bytes());
                buf.put_u8(0);
                buf.freeze()
            }
            Data::Bytes(bytes) => bytes.clone(),
        }
    }

    /// Encode a required field; empty input is rejected
    pub fn encode_required(&self, field: &'static str) -> Result<Bytes> {
        if self.is_empty() {
            return Err(K2hdkcError::ZeroLength { field });
        }
        Ok(self.encode())
    }

    /// True when the caller supplied nothing (empty text or empty bytes)
    pub fn is_empty(&self) -> bool {
        match self {
            Data::Text(text) => text.is_empty(),
            Data::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::Text(s.to_string())
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::Text(s)
    }
}

impl From<&String> for Data {
    fn from(s: &String) -> Self {
        Data::Text(s.clone())
    }
}

impl From<&[u8]> for Data {
    fn from(b: &[u8]) -> Self {
        Data::Bytes(Bytes::copy_from_slice(b))
    }
}

impl<const N: usize> From<&[u8; N]> for Data {
    fn from(b: &[u8; N]) -> Self {
        Data::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Data {
    fn from(b: Vec<u8>) -> Self {
        Data::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Data {
    fn from(b: Bytes) -> Self {
        Data::Bytes(b)
    }
}

/// Encode a list of required key-like fields, preserving order and duplicates
pub fn encode_list<I, D>(items: I, field: &'static str) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = D>,
    D: Into<Data>,
{
    let encoded = items
        .into_iter()
        .map(|item| item.into().encode_required(field))
        .collect::<Result<Vec<_>>>()?;
    if encoded.is_empty() {
        return Err(K2hdkcError::ZeroLength { field });
    }
    Ok(encoded)
}

/// Text form of a returned buffer: drops exactly one trailing byte (the NUL)
pub fn strip_terminator(buf: &[u8]) -> String {
    match buf.split_last() {
        Some((_, head)) => String::from_utf8_lossy(head).into_owned(),
        None => String::new(),
    }
}

// =============================================================================
// Password / Expiry
// =============================================================================

/// Password and expiry shared by the write-style commands
///
/// An empty password and a zero expiry both mean "not set" and reach the
/// native layer as null pointers. Zero cannot be used as a literal expiry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Protection {
    pass: String,
    expire: i64,
}

impl Protection {
    pub fn set_pass(&mut self, pass: impl Into<String>) {
        self.pass = pass.into();
    }

    pub fn set_expire(&mut self, secs: i64) {
        self.expire = secs;
    }

    pub fn pass(&self) -> &str {
        &self.pass
    }

    /// Expiry in seconds, `None` when unset
    pub fn expire(&self) -> Option<i64> {
        (self.expire != 0).then_some(self.expire)
    }

    /// Password as a C string, `None` when unset
    pub fn c_pass(&self) -> Result<Option<CString>> {
        if self.pass.is_empty() {
            return Ok(None);
        }
        CString::new(self.pass.as_str())
            .map(Some)
            .map_err(|_| K2hdkcError::InvalidPassword)
    }
}

// =============================================================================
// CAS Values
// =============================================================================

/// Width of a CAS value in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CasWidth {
    W8,
    W16,
    #[default]
    W32,
    W64,
}

impl CasWidth {
    /// Width selected by an encoded operand length
    pub fn from_len(len: usize) -> Result<Self> {
        match len {
            1 => Ok(CasWidth::W8),
            2 => Ok(CasWidth::W16),
            4 => Ok(CasWidth::W32),
            8 => Ok(CasWidth::W64),
            _ => Err(K2hdkcError::UnsupportedCasWidth { len }),
        }
    }

    /// Width from a bit count of 8, 16, 32 or 64
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            8 => Ok(CasWidth::W8),
            16 => Ok(CasWidth::W16),
            32 => Ok(CasWidth::W32),
            64 => Ok(CasWidth::W64),
            _ => Err(K2hdkcError::InvalidCasType(bits)),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            CasWidth::W8 => 8,
            CasWidth::W16 => 16,
            CasWidth::W32 => 32,
            CasWidth::W64 => 64,
        }
    }

    pub fn byte_len(self) -> usize {
        usize::from(self.bits() / 8)
    }
}

/// A CAS value of one of the four native widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CasValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl CasValue {
    /// Zero of the given width
    pub fn zero(width: CasWidth) -> Self {
        match width {
            CasWidth::W8 => CasValue::U8(0),
            CasWidth::W16 => CasValue::U16(0),
            CasWidth::W32 => CasValue::U32(0),
            CasWidth::W64 => CasValue::U64(0),
        }
    }

    pub fn width(self) -> CasWidth {
        match self {
            CasValue::U8(_) => CasWidth::W8,
            CasValue::U16(_) => CasWidth::W16,
            CasValue::U32(_) => CasWidth::W32,
            CasValue::U64(_) => CasWidth::W64,
        }
    }

    /// Little-endian reassembly; the slice length selects the width
    pub fn from_le_bytes(buf: &[u8]) -> Result<Self> {
        let width = CasWidth::from_len(buf.len())?;
        let wide = buf
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | (u64::from(*b) << (8 * i)));
        Ok(match width {
            CasWidth::W8 => CasValue::U8(wide as u8),
            CasWidth::W16 => CasValue::U16(wide as u16),
            CasWidth::W32 => CasValue::U32(wide as u32),
            CasWidth::W64 => CasValue::U64(wide),
        })
    }

    /// Little-endian bytes, `width / 8` long
    pub fn to_le_bytes(self) -> Vec<u8> {
        let wide = self.as_u64();
        (0..self.width().byte_len())
            .map(|i| (wide >> (8 * i)) as u8)
            .collect()
    }

    pub fn as_u64(self) -> u64 {
        match self {
            CasValue::U8(v) => u64::from(v),
            CasValue::U16(v) => u64::from(v),
            CasValue::U32(v) => u64::from(v),
            CasValue::U64(v) => v,
        }
    }

    pub(crate) fn wrapping_step(self, increment: bool) -> Self {
        match (self, increment) {
            (CasValue::U8(v), true) => CasValue::U8(v.wrapping_add(1)),
            (CasValue::U8(v), false) => CasValue::U8(v.wrapping_sub(1)),
            (CasValue::U16(v), true) => CasValue::U16(v.wrapping_add(1)),
            (CasValue::U16(v), false) => CasValue::U16(v.wrapping_sub(1)),
            (CasValue::U32(v), true) => CasValue::U32(v.wrapping_add(1)),
            (CasValue::U32(v), false) => CasValue::U32(v.wrapping_sub(1)),
            (CasValue::U64(v), true) => CasValue::U64(v.wrapping_add(1)),
            (CasValue::U64(v), false) => CasValue::U64(v.wrapping_sub(1)),
        }
    }
}

/// A CAS argument: a typed integer or its raw little-endian bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOperand {
    Value(CasValue),
    Bytes(Vec<u8>),
}

impl CasOperand {
    /// Little-endian encoding; the width is checked by the caller
    pub fn encode(&self) -> Vec<u8> {
        match self {
            CasOperand::Value(v) => v.to_le_bytes(),
            CasOperand::Bytes(b) => b.clone(),
        }
    }
}

impl From<u8> for CasOperand {
    fn from(v: u8) -> Self {
        CasOperand::Value(CasValue::U8(v))
    }
}

impl From<u16> for CasOperand {
    fn from(v: u16) -> Self {
        CasOperand::Value(CasValue::U16(v))
    }
}

impl From<u32> for CasOperand {
    fn from(v: u32) -> Self {
        CasOperand::Value(CasValue::U32(v))
    }
}

impl From<u64> for CasOperand {
    fn from(v: u64) -> Self {
        CasOperand::Value(CasValue::U64(v))
    }
}

impl From<CasValue> for CasOperand {
    fn from(v: CasValue) -> Self {
        CasOperand::Value(v)
    }
}

impl From<Vec<u8>> for CasOperand {
    fn from(b: Vec<u8>) -> Self {
        CasOperand::Bytes(b)
    }
}

impl From<&[u8]> for CasOperand {
    fn from(b: &[u8]) -> Self {
        CasOperand::Bytes(b.to_vec())
    }
}
