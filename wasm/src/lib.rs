//! WebAssembly module for the QR Warehouse Scan Platform
//!
//! Lets the handheld client work out what a scan will do before it is sent:
//! - QR token decoding and encoding
//! - FIFO preview of a confirmed quantity over grouped lines
//! - Line grouping and localized labels
//! - Shipping phone validation
//!
//! Results cross the boundary as JSON strings.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use shared::allocation::{allocate_fifo, Allocation, LineDemand};
use shared::ledger::group_demand_lines;
use shared::qr::{self, QrTarget};
use shared::validation::validate_vietnamese_phone;
use shared::{DemandLine, DocumentState, Language, ScanType, ShippingType};

/// Line demand as sent by the client
#[derive(Debug, Deserialize)]
struct DemandInput {
    line_id: i64,
    demand: Decimal,
}

#[derive(Debug, Serialize, PartialEq)]
struct AllocationPreview {
    line_id: i64,
    quantity: Decimal,
}

impl From<Allocation> for AllocationPreview {
    fn from(allocation: Allocation) -> Self {
        Self {
            line_id: allocation.line_id,
            quantity: allocation.quantity,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Cannot serialize result: {}", e))
}

fn language(code: &str) -> Language {
    Language::from_header(code)
}

fn decode_token_json(content: &str) -> Result<String, String> {
    to_json(&qr::decode(content))
}

fn encode_token(id: i64, target: &str) -> Result<String, String> {
    let target = match target {
        "transfer" => QrTarget::Transfer,
        "location" => QrTarget::Location,
        "purchase_intake" => QrTarget::PurchaseIntake,
        other => return Err(format!("Unknown QR target: {}", other)),
    };
    if id <= 0 {
        return Err(format!("Record id must be positive, got {}", id));
    }
    Ok(qr::encode(id, target))
}

fn preview_allocation_json(lines_json: &str, confirmed: &str) -> Result<String, String> {
    let lines: Vec<DemandInput> =
        serde_json::from_str(lines_json).map_err(|e| format!("Invalid lines JSON: {}", e))?;
    let confirmed = Decimal::from_str(confirmed.trim())
        .map_err(|e| format!("Invalid quantity '{}': {}", confirmed, e))?;

    let demands: Vec<LineDemand> = lines
        .into_iter()
        .map(|line| LineDemand {
            line_id: line.line_id,
            demand: line.demand,
        })
        .collect();

    let preview: Vec<AllocationPreview> = allocate_fifo(&demands, confirmed)
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(AllocationPreview::from)
        .collect();
    to_json(&preview)
}

fn group_lines_json(lines_json: &str) -> Result<String, String> {
    let lines: Vec<DemandLine> =
        serde_json::from_str(lines_json).map_err(|e| format!("Invalid lines JSON: {}", e))?;
    to_json(&group_demand_lines(&lines))
}

fn label_for(kind: &str, value: &str, language: Language) -> Option<&'static str> {
    match kind {
        "scan_type" => ScanType::from_str(value).ok().map(|t| t.label(language)),
        "state" => DocumentState::from_str(value).ok().map(|s| s.label(language)),
        "shipping_type" => ShippingType::from_str(value).ok().map(|s| s.label(language)),
        _ => None,
    }
}

fn reject(message: String) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(&message));
    js_sys::Error::new(&message).into()
}

/// Decode a scanned QR token. Never fails: unreadable tokens come back with `is_valid: false`.
#[wasm_bindgen]
pub fn decode_qr(content: &str) -> Result<String, JsValue> {
    decode_token_json(content).map_err(reject)
}

/// Compact token for a record, e.g. `encode_qr(42, "transfer") == "42.1"`
#[wasm_bindgen]
pub fn encode_qr(id: i64, target: &str) -> Result<String, JsValue> {
    encode_token(id, target).map_err(reject)
}

/// How a confirmed quantity will be spread over `[{line_id, demand}]`
#[wasm_bindgen]
pub fn preview_allocation(lines_json: &str, confirmed: &str) -> Result<String, JsValue> {
    preview_allocation_json(lines_json, confirmed).map_err(reject)
}

/// Group demand lines the way the detail view does
#[wasm_bindgen]
pub fn group_lines(lines_json: &str) -> Result<String, JsValue> {
    group_lines_json(lines_json).map_err(reject)
}

/// Localized label for a scan type, document state or shipping type.
/// Unknown values are echoed back.
#[wasm_bindgen]
pub fn label(kind: &str, value: &str, language_code: &str) -> String {
    label_for(kind, value, language(language_code))
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

#[wasm_bindgen]
pub fn is_valid_shipping_phone(phone: &str) -> bool {
    validate_vietnamese_phone(phone).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_token_json() {
        let json: serde_json::Value = serde_json::from_str(&decode_token_json("42.1").unwrap()).unwrap();
        assert_eq!(json["document_type"], "transfer");
        assert_eq!(json["document_id"], 42);
        assert_eq!(json["is_valid"], true);

        let json: serde_json::Value = serde_json::from_str(&decode_token_json("hello").unwrap()).unwrap();
        assert_eq!(json["is_valid"], false);
    }

    #[test]
    fn test_encode_token() {
        assert_eq!(encode_token(42, "transfer").unwrap(), "42.1");
        assert_eq!(encode_token(7, "location").unwrap(), "7.2");
        assert!(encode_token(7, "partner").is_err());
        assert!(encode_token(0, "location").is_err());
    }

    #[test]
    fn test_preview_allocation() {
        let lines = r#"[{"line_id": 2, "demand": "5"}, {"line_id": 1, "demand": "5"}]"#;
        let json: serde_json::Value = serde_json::from_str(&preview_allocation_json(lines, "8").unwrap()).unwrap();
        assert_eq!(json[0]["line_id"], 1);
        assert_eq!(json[0]["quantity"], "5");
        assert_eq!(json[1]["line_id"], 2);
        assert_eq!(json[1]["quantity"], "3");

        assert!(preview_allocation_json(lines, "11").is_err());
        assert!(preview_allocation_json(lines, "abc").is_err());
        assert!(preview_allocation_json("not json", "1").is_err());
    }

    #[test]
    fn test_group_lines() {
        let lines = r#"[
            {"id": 3, "document_id": 1, "product_id": 10, "product_name": "Ốc vít", "uom": "Cái",
             "location_id": 5, "location_name": "WH/Stock", "demand_qty": "2", "quantity_done": "0", "cancelled": false},
            {"id": 1, "document_id": 1, "product_id": 10, "product_name": "Ốc vít", "uom": "Cái",
             "location_id": 5, "location_name": "WH/Stock", "demand_qty": "4", "quantity_done": "0", "cancelled": false}
        ]"#;
        let json: serde_json::Value = serde_json::from_str(&group_lines_json(lines).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["line_ids"], serde_json::json!([1, 3]));
        assert_eq!(json[0]["demand_qty"], "6");
    }

    #[test]
    fn test_labels() {
        assert_eq!(label("scan_type", "prepare", "vi"), "Chuẩn bị hàng");
        assert_eq!(label("scan_type", "kiemke", "en-US"), "Inventory count");
        assert_eq!(label("state", "assigned", "en"), "Ready");
        assert_eq!(label("shipping_type", "viettelpost", "vi"), "Viettel Post");
        assert_eq!(label("state", "mystery", "vi"), "mystery");
    }

    #[test]
    fn test_shipping_phone() {
        assert!(is_valid_shipping_phone("0912345678"));
        assert!(is_valid_shipping_phone("+84 912 345 678"));
        assert!(!is_valid_shipping_phone("12345"));
    }
}
