//! QR token codec
//!
//! Printed labels carry a compact `<id>.<type_code>` token. Labels printed by
//! earlier releases carry a multi-line `Key: value` block; those still decode.
//! Decoding never fails hard: anything unreadable yields `is_valid == false`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Record kinds that can be addressed by a QR token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrTarget {
    Transfer,
    Location,
    PurchaseIntake,
}

impl QrTarget {
    pub const ALL: [QrTarget; 3] = [QrTarget::Transfer, QrTarget::Location, QrTarget::PurchaseIntake];

    pub fn code(&self) -> u8 {
        match self {
            QrTarget::Transfer => 1,
            QrTarget::Location => 2,
            QrTarget::PurchaseIntake => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        QrTarget::ALL.into_iter().find(|t| i64::from(t.code()) == code)
    }

    /// Host model name used by legacy payloads
    pub fn legacy_model(&self) -> &'static str {
        match self {
            QrTarget::Transfer => "stock.picking",
            QrTarget::Location => "stock.location",
            QrTarget::PurchaseIntake => "product.order.china",
        }
    }

    fn from_legacy_model(model: &str) -> Option<Self> {
        QrTarget::ALL
            .into_iter()
            .find(|t| t.legacy_model().eq_ignore_ascii_case(model))
    }
}

/// Decoded token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub document_type: Option<QrTarget>,
    pub document_id: Option<i64>,
    pub is_valid: bool,
}

impl QrPayload {
    fn invalid() -> Self {
        Self {
            document_type: None,
            document_id: None,
            is_valid: false,
        }
    }

    fn resolved(document_type: Option<QrTarget>, document_id: Option<i64>) -> Self {
        let is_valid = document_type.is_some() && document_id.is_some_and(|id| id > 0);
        Self {
            document_type,
            document_id,
            is_valid,
        }
    }

    /// Target and id, only when the payload is valid
    pub fn target(&self) -> Option<(QrTarget, i64)> {
        match (self.is_valid, self.document_type, self.document_id) {
            (true, Some(target), Some(id)) => Some((target, id)),
            _ => None,
        }
    }
}

/// Build the compact token for a record
pub fn encode(id: i64, target: QrTarget) -> String {
    format!("{}.{}", id, target.code())
}

/// Decode a scanned token
pub fn decode(content: &str) -> QrPayload {
    let content = content.trim();
    if content.is_empty() {
        return QrPayload::invalid();
    }

    if content.contains('.') && !content.contains(':') {
        return decode_compact(content);
    }

    if content.contains(':') {
        return decode_legacy(content);
    }

    QrPayload::invalid()
}

fn decode_compact(content: &str) -> QrPayload {
    let Some((id_part, code_part)) = content.split_once('.') else {
        return QrPayload::invalid();
    };

    match (id_part.trim().parse::<i64>(), code_part.trim().parse::<i64>()) {
        (Ok(id), Ok(code)) => QrPayload::resolved(QrTarget::from_code(code), Some(id)),
        _ => QrPayload::invalid(),
    }
}

fn decode_legacy(content: &str) -> QrPayload {
    let fields: HashMap<String, &str> = content
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_lowercase(), value.trim()))
        .collect();

    let target = match fields.get("model") {
        Some(model) => QrTarget::from_legacy_model(model),
        None if fields.contains_key("picking") => Some(QrTarget::Transfer),
        None if fields.contains_key("kiện hàng") => Some(QrTarget::PurchaseIntake),
        None => None,
    };

    let id = fields
        .get("id")
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
        .and_then(|value| value.parse::<i64>().ok());

    QrPayload::resolved(target, id)
}

/// Whether a stored QR image must be (re)rendered for `current`
pub fn needs_regeneration(stored_token: Option<&str>, has_image: bool, current: &str) -> bool {
    !has_image || stored_token != Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_compact() {
        assert_eq!(encode(42, QrTarget::Transfer), "42.1");
        assert_eq!(encode(7, QrTarget::Location), "7.2");
        assert_eq!(encode(3, QrTarget::PurchaseIntake), "3.3");
    }

    #[test]
    fn test_decode_compact() {
        let payload = decode(" 42.1 ");
        assert!(payload.is_valid);
        assert_eq!(payload.target(), Some((QrTarget::Transfer, 42)));
    }

    #[test]
    fn test_decode_unknown_code_keeps_id() {
        let payload = decode("42.9");
        assert!(!payload.is_valid);
        assert_eq!(payload.document_id, Some(42));
        assert_eq!(payload.document_type, None);
    }

    #[test]
    fn test_decode_non_positive_id_is_invalid() {
        assert!(!decode("0.1").is_valid);
        assert!(!decode("-5.1").is_valid);
    }

    #[test]
    fn test_decode_legacy_block() {
        let payload = decode("Model: stock.location\nID: 15\nName: A-01");
        assert_eq!(payload.target(), Some((QrTarget::Location, 15)));

        let payload = decode("Picking: WH/OUT/0001\nid: 8");
        assert_eq!(payload.target(), Some((QrTarget::Transfer, 8)));

        let payload = decode("Kiện hàng: PO-CN-12\nID: 3");
        assert_eq!(payload.target(), Some((QrTarget::PurchaseIntake, 3)));
    }

    #[test]
    fn test_decode_legacy_rejects_bad_id() {
        assert!(!decode("Model: stock.picking\nID: 1a").is_valid);
        assert!(!decode("Model: stock.picking").is_valid);
        assert!(!decode("Model: res.partner\nID: 4").is_valid);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(!decode("").is_valid);
        assert!(!decode("hello").is_valid);
        assert!(!decode("abc.def").is_valid);
    }

    #[test]
    fn test_needs_regeneration() {
        assert!(needs_regeneration(None, false, "1.1"));
        assert!(needs_regeneration(Some("1.1"), false, "1.1"));
        assert!(needs_regeneration(Some("Model: stock.picking\nID: 1"), true, "1.1"));
        assert!(!needs_regeneration(Some("1.1"), true, "1.1"));
    }
}
