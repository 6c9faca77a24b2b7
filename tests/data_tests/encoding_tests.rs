//! Tests for argument encoding
//!
//! These tests verify:
//! - Text keys gain exactly one NUL, binary keys travel verbatim
//! - Required fields reject empty input with the field's name
//! - Subkey lists keep order and duplicates
//! - CAS operands are little-endian and their length selects the width
//! - Status codes render to the fixed C header names

use bytes::Bytes;
use k2hdkc::data::{encode_list, strip_terminator};
use k2hdkc::{CasOperand, CasValue, CasWidth, Data, K2hdkcError, ResCode, Status, SubCode};

// =============================================================================
// Key / Value Encoding Tests
// =============================================================================

#[test]
fn test_text_and_binary_forms_differ() {
    let text = Data::from("key").encode();
    let binary = Data::from(b"key").encode();
    assert_eq!(text.as_ref(), b"key\0");
    assert_eq!(binary.as_ref(), b"key");
    assert_ne!(text, binary);
}

#[test]
fn test_multibyte_text_is_utf8() {
    let encoded = Data::from("キー").encode();
    assert_eq!(encoded.len(), "キー".len() + 1);
    assert_eq!(encoded.last(), Some(&0));
}

#[test]
fn test_binary_with_interior_nul_is_kept() {
    let raw = vec![0x00u8, 0x01, 0x00, 0xff];
    assert_eq!(Data::from(raw.clone()).encode().as_ref(), raw.as_slice());
}

#[test]
fn test_empty_text_is_empty() {
    assert!(Data::from("").is_empty());
    assert!(Data::from(Bytes::new()).is_empty());
    assert!(!Data::from("\0").is_empty());
}

#[test]
fn test_required_field_names() {
    for field in ["key", "prefix", "val", "skey"] {
        let err = Data::from("").encode_required(field).unwrap_err();
        assert!(matches!(err, K2hdkcError::ZeroLength { field: f } if f == field));
        assert_eq!(err.to_string(), format!("len({field}) is zero"));
    }
}

#[test]
fn test_strip_terminator_drops_one_byte() {
    assert_eq!(strip_terminator(b"value\0"), "value");
    assert_eq!(strip_terminator(b"value\0\0"), "value\0");
}

// =============================================================================
// List Encoding Tests
// =============================================================================

#[test]
fn test_list_keeps_order_and_duplicates() {
    let list = encode_list(["b", "a", "b"], "skeys").unwrap();
    assert_eq!(
        list,
        vec![
            Bytes::from_static(b"b\0"),
            Bytes::from_static(b"a\0"),
            Bytes::from_static(b"b\0"),
        ]
    );
}

#[test]
fn test_list_mixes_text_and_binary() {
    let list = encode_list(vec![Data::from("t"), Data::from(vec![1u8, 2])], "skeys").unwrap();
    assert_eq!(list[0].as_ref(), b"t\0");
    assert_eq!(list[1], Bytes::from_static(&[1, 2]));
}

#[test]
fn test_empty_list_rejected() {
    let err = encode_list(Vec::<String>::new(), "skeys").unwrap_err();
    assert_eq!(err.to_string(), "len(skeys) is zero");
}

#[test]
fn test_list_with_empty_element_rejected() {
    assert!(encode_list(["a", ""], "skeys").is_err());
}

// =============================================================================
// CAS Encoding Tests
// =============================================================================

#[test]
fn test_cas_widths_by_type() {
    assert_eq!(CasOperand::from(1u8).encode(), vec![1]);
    assert_eq!(CasOperand::from(0x0201u16).encode(), vec![1, 2]);
    assert_eq!(CasOperand::from(0x0403_0201u32).encode(), vec![1, 2, 3, 4]);
    assert_eq!(
        CasOperand::from(0x0807_0605_0403_0201u64).encode(),
        vec![1, 2, 3, 4, 5, 6, 7, 8]
    );
}

#[test]
fn test_cas_raw_bytes_select_width() {
    let value = CasValue::from_le_bytes(&CasOperand::from(vec![0x10u8, 0x00]).encode()).unwrap();
    assert_eq!(value, CasValue::U16(0x10));
    assert_eq!(value.width(), CasWidth::W16);
}

#[test]
fn test_cas_odd_length_rejected() {
    let err = CasValue::from_le_bytes(&[1, 2, 3]).unwrap_err();
    assert!(matches!(err, K2hdkcError::UnsupportedCasWidth { len: 3 }));
}

#[test]
fn test_cas_zero_of_each_width() {
    for bits in [8u8, 16, 32, 64] {
        let width = CasWidth::from_bits(bits).unwrap();
        let zero = CasValue::zero(width);
        assert_eq!(zero.as_u64(), 0);
        assert_eq!(zero.to_le_bytes().len(), usize::from(bits / 8));
        assert_eq!(width.bits(), bits);
    }
}

// =============================================================================
// Status Tests
// =============================================================================

#[test]
fn test_status_names() {
    assert_eq!(ResCode::SUCCESS.to_string(), "DKC_RES_SUCCESS");
    assert_eq!(ResCode::ERROR.to_string(), "DKC_RES_ERROR");
    assert_eq!(SubCode::DATACHANGED.to_string(), "DKC_RES_SUBCODE_DATACHANGED");
    assert_eq!(
        Status::error(SubCode::PARAMETER).to_string(),
        "DKC_RES_ERROR DKC_RES_SUBCODE_PARAMETER"
    );
    assert!(Status::success().code.is_success());
}
