//! QR token codec tests
//!
//! Properties tested:
//! - every record id and target survives an encode/decode round trip
//! - arbitrary input never panics and anything without a target is invalid
//! - labels from earlier releases still decode

use proptest::prelude::*;
use shared::qr::{decode, encode, needs_regeneration, QrTarget};

fn target() -> impl Strategy<Value = QrTarget> {
    prop::sample::select(QrTarget::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_round_trip(id in 1i64..i64::MAX, target in target()) {
        let payload = decode(&encode(id, target));
        prop_assert!(payload.is_valid);
        prop_assert_eq!(payload.target(), Some((target, id)));
    }

    #[test]
    fn prop_decode_never_panics(content in ".{0,64}") {
        let payload = decode(&content);
        if payload.is_valid {
            prop_assert!(payload.document_type.is_some());
            prop_assert!(payload.document_id.is_some_and(|id| id > 0));
        } else {
            prop_assert_eq!(payload.target(), None);
        }
    }

    #[test]
    fn prop_unknown_type_code_is_invalid(id in 1i64..1_000_000, code in 4i64..1000) {
        let payload = decode(&format!("{}.{}", id, code));
        prop_assert!(!payload.is_valid);
        prop_assert_eq!(payload.document_id, Some(id));
        prop_assert_eq!(payload.document_type, None);
    }

    #[test]
    fn prop_regeneration_is_idempotent(id in 1i64..1_000_000, target in target()) {
        let token = encode(id, target);
        prop_assert!(needs_regeneration(None, false, &token));
        prop_assert!(!needs_regeneration(Some(&token), true, &token));
        prop_assert!(needs_regeneration(Some(&token), false, &token));
    }
}

#[test]
fn test_compact_tokens() {
    assert_eq!(encode(42, QrTarget::Transfer), "42.1");
    assert_eq!(encode(7, QrTarget::Location), "7.2");
    assert_eq!(encode(15, QrTarget::PurchaseIntake), "15.3");
    assert_eq!(decode(" 42.1\n").target(), Some((QrTarget::Transfer, 42)));
}

#[test]
fn test_malformed_tokens_are_invalid() {
    for content in ["", "   ", "abc", "42", "42.", ".1", "x.1", "0.1", "-5.1", "1.2.3"] {
        assert!(!decode(content).is_valid, "{:?}", content);
    }
}

#[test]
fn test_legacy_payloads() {
    let picking = decode("Picking: WH/OUT/00042\nID: 42\nModel: stock.picking");
    assert_eq!(picking.target(), Some((QrTarget::Transfer, 42)));

    let location = decode("Location: WH/Stock/Kệ A\nID: 7\nModel: stock.location");
    assert_eq!(location.target(), Some((QrTarget::Location, 7)));

    let intake = decode("Kiện hàng: KH-0015\nID: 15");
    assert_eq!(intake.target(), Some((QrTarget::PurchaseIntake, 15)));

    let without_model = decode("Picking: WH/OUT/00042\nID: 42");
    assert_eq!(without_model.target(), Some((QrTarget::Transfer, 42)));

    assert!(!decode("Model: stock.picking\nID: abc").is_valid);
    assert!(!decode("Model: res.partner\nID: 3").is_valid);
}
