//! Status codes
//!
//! Every native call leaves two codes on its handle: a primary result code and
//! a secondary (detail) subcode. Both render to the fixed names of the C
//! header, and the pair renders as `"<primary> <subcode>"`, e.g.
//! `"DKC_RES_SUCCESS DKC_RES_SUBCODE_NOTHING"`.

use std::fmt;

/// `dkcres_type_t` value as returned by the native layer
///
/// The primary result lives in the upper 32 bits and the subcode in the lower
/// 32 bits. `k2hdkc_get_res_code` and `k2hdkc_get_res_subcode` may each hand
/// back the whole composed value, so names are always read from the masked
/// half.
pub type RawCode = u64;

const RESULT_MASK: RawCode = 0xFFFF_FFFF_0000_0000;
const SUBCODE_MASK: RawCode = 0x0000_0000_FFFF_FFFF;

/// Primary result code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResCode(pub RawCode);

/// Secondary (detail) result code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubCode(pub RawCode);

impl ResCode {
    pub const SUCCESS: ResCode = ResCode(0);
    pub const ERROR: ResCode = ResCode(1 << 32);

    /// Keep only the result half of a value read from the native layer
    pub fn from_raw(raw: RawCode) -> Self {
        ResCode(raw & RESULT_MASK)
    }

    /// The result half of the raw value
    pub fn result(self) -> RawCode {
        self.0 & RESULT_MASK
    }

    /// Fixed text name of this code
    pub fn name(self) -> &'static str {
        match self.result() {
            r if r == Self::SUCCESS.0 => "DKC_RES_SUCCESS",
            r if r == Self::ERROR.0 => "DKC_RES_ERROR",
            _ => "DKC_RES_UNKNOWN",
        }
    }

    pub fn is_success(self) -> bool {
        self.result() == Self::SUCCESS.0
    }
}

/// Subcode values and their C names, in one place
const SUBCODE_NAMES: &[(RawCode, &str)] = &[
    (0, "DKC_RES_SUBCODE_NOTHING"),
    (1, "DKC_RES_SUBCODE_PARAMETER"),
    (2, "DKC_RES_SUBCODE_INVAL"),
    (3, "DKC_RES_SUBCODE_ALREADYEXIST"),
    (4, "DKC_RES_SUBCODE_NODATA"),
    (5, "DKC_RES_SUBCODE_NOMEM"),
    (6, "DKC_RES_SUBCODE_DATACHANGED"),
    (7, "DKC_RES_SUBCODE_INTERNAL"),
];

impl SubCode {
    pub const NOTHING: SubCode = SubCode(0);
    pub const PARAMETER: SubCode = SubCode(1);
    pub const INVAL: SubCode = SubCode(2);
    pub const ALREADYEXIST: SubCode = SubCode(3);
    pub const NODATA: SubCode = SubCode(4);
    pub const NOMEM: SubCode = SubCode(5);
    pub const DATACHANGED: SubCode = SubCode(6);
    pub const INTERNAL: SubCode = SubCode(7);

    /// Keep only the subcode half of a value read from the native layer
    pub fn from_raw(raw: RawCode) -> Self {
        SubCode(raw & SUBCODE_MASK)
    }

    /// The subcode half of the raw value
    pub fn detail(self) -> RawCode {
        self.0 & SUBCODE_MASK
    }

    /// Fixed text name of this subcode
    pub fn name(self) -> &'static str {
        let detail = self.detail();
        SUBCODE_NAMES
            .iter()
            .find(|(code, _)| *code == detail)
            .map_or("DKC_RES_SUBCODE_UNKNOWN", |(_, name)| name)
    }
}

impl fmt::Display for ResCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for SubCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primary and secondary code of the last native call on a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Status {
    pub code: ResCode,
    pub subcode: SubCode,
}

impl Status {
    /// Composite text of a successful call
    pub const SUCCESS_TEXT: &'static str = "DKC_RES_SUCCESS DKC_RES_SUBCODE_NOTHING";

    pub fn new(code: ResCode, subcode: SubCode) -> Self {
        Self { code, subcode }
    }

    /// Successful call with no detail
    pub fn success() -> Self {
        Self::new(ResCode::SUCCESS, SubCode::NOTHING)
    }

    /// Failed call with the given detail
    pub fn error(subcode: SubCode) -> Self {
        Self::new(ResCode::ERROR, subcode)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.subcode)
    }
}
