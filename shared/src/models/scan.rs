//! Scan history, attachments and quantity confirmations

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ParseEnumError;
use crate::ledger::WorkflowStatus;
use crate::types::Language;

/// Type of scan recorded against a document or location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Prepare,
    Shipping,
    Receive,
    Checking,
    #[serde(alias = "kiemke")]
    InventoryCount,
}

impl ScanType {
    pub const ALL: [ScanType; 5] = [
        ScanType::Prepare,
        ScanType::Shipping,
        ScanType::Receive,
        ScanType::Checking,
        ScanType::InventoryCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Prepare => "prepare",
            ScanType::Shipping => "shipping",
            ScanType::Receive => "receive",
            ScanType::Checking => "checking",
            ScanType::InventoryCount => "inventory_count",
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match language {
            Language::Vietnamese => match self {
                ScanType::Prepare => "Chuẩn bị hàng",
                ScanType::Shipping => "Đóng gói",
                ScanType::Receive => "Nhận hàng",
                ScanType::Checking => "Nhập kho",
                ScanType::InventoryCount => "Kiểm kê",
            },
            Language::English => match self {
                ScanType::Prepare => "Prepared",
                ScanType::Shipping => "Shipped",
                ScanType::Receive => "Received",
                ScanType::Checking => "Checked",
                ScanType::InventoryCount => "Inventory count",
            },
        }
    }

    /// Dashboard sort weight. Unlisted types sort last.
    pub fn dashboard_priority(scan_type: Option<ScanType>) -> i32 {
        match scan_type {
            Some(ScanType::Prepare) => 2,
            Some(ScanType::Shipping) => 3,
            _ => 99,
        }
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prepare" => Ok(ScanType::Prepare),
            "shipping" => Ok(ScanType::Shipping),
            "receive" => Ok(ScanType::Receive),
            "checking" => Ok(ScanType::Checking),
            "inventory_count" | "kiemke" => Ok(ScanType::InventoryCount),
            other => Err(ParseEnumError::new("scan type", other)),
        }
    }
}

/// Carrier chosen at shipping time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingType {
    Pickup,
    Viettelpost,
    Delivery,
    Other,
    /// Finalize without recording a carrier
    ValidateOnly,
}

impl ShippingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingType::Pickup => "pickup",
            ShippingType::Viettelpost => "viettelpost",
            ShippingType::Delivery => "delivery",
            ShippingType::Other => "other",
            ShippingType::ValidateOnly => "validate_only",
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (ShippingType::Pickup, Language::Vietnamese) => "Khách tự lấy",
            (ShippingType::Pickup, Language::English) => "Customer pickup",
            (ShippingType::Viettelpost, _) => "Viettel Post",
            (ShippingType::Delivery, Language::Vietnamese) => "Giao hàng",
            (ShippingType::Delivery, Language::English) => "Delivery",
            (ShippingType::Other, Language::Vietnamese) => "Khác",
            (ShippingType::Other, Language::English) => "Other",
            (ShippingType::ValidateOnly, Language::Vietnamese) => "Chỉ xác nhận",
            (ShippingType::ValidateOnly, Language::English) => "Validate only",
        }
    }
}

impl FromStr for ShippingType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(ShippingType::Pickup),
            "viettelpost" => Ok(ShippingType::Viettelpost),
            "delivery" => Ok(ShippingType::Delivery),
            "other" => Ok(ShippingType::Other),
            "validate_only" => Ok(ShippingType::ValidateOnly),
            other => Err(ParseEnumError::new("shipping type", other)),
        }
    }
}

/// Carrier metadata, only present on shipping entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub shipping_type: ShippingType,
    pub phone: Option<String>,
    pub company: Option<String>,
}

/// One immutable scan event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanHistoryEntry {
    pub id: i64,
    pub document_id: i64,
    pub scan_type: ScanType,
    pub scan_date: DateTime<Utc>,
    pub user_id: Option<i64>,
    pub note: Option<String>,
    pub shipping: Option<ShippingInfo>,
}

/// Values a processor hands to the store when appending a scan event
#[derive(Debug, Clone, PartialEq)]
pub struct NewScanEntry {
    pub document_id: i64,
    pub scan_type: ScanType,
    pub user_id: Option<i64>,
    pub note: Option<String>,
    pub shipping: Option<ShippingInfo>,
}

/// Image uploaded with a scan, base64 encoded
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImagePayload {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub data: String,
    pub description: Option<String>,
}

/// Stored attachment metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub scan_history_id: i64,
    pub name: String,
    pub mimetype: String,
    /// SHA-256 of the decoded bytes, lowercase hex
    pub checksum: String,
    pub file_size: i64,
    pub description: Option<String>,
}

/// A persisted reconciliation row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationEntry {
    pub id: i64,
    pub scan_history_id: i64,
    pub line_id: i64,
    pub product_id: i64,
    pub quantity_confirmed: Decimal,
    pub note: Option<String>,
    pub confirmed_at: DateTime<Utc>,
    pub confirmed_by: Option<i64>,
}

/// Confirmation row before it is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConfirmation {
    pub scan_history_id: i64,
    pub line_id: i64,
    pub product_id: i64,
    pub quantity_confirmed: Decimal,
    pub note: Option<String>,
}

/// Operator-confirmed quantity for one group of demand lines
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmationRequest {
    #[serde(alias = "move_ids")]
    #[validate(length(min = 1))]
    pub line_ids: Vec<i64>,
    pub product_id: Option<i64>,
    #[serde(alias = "quantity_confirmed")]
    pub confirmed_qty: Decimal,
    #[serde(alias = "confirm_note")]
    pub note: Option<String>,
}

/// Optional inputs to a scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanParams {
    #[serde(alias = "scan_note")]
    pub note: Option<String>,
    pub images: Option<Vec<ImagePayload>>,
    #[serde(default, alias = "move_line_confirms")]
    pub confirmations: Vec<ConfirmationRequest>,
    pub shipping_type: Option<ShippingType>,
    pub shipping_phone: Option<String>,
    pub shipping_company: Option<String>,
    /// Overrides the processor's finalize default
    pub auto_validate: Option<bool>,
}

/// Result of a successful document scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub entry: ScanHistoryEntry,
    pub attachments: Vec<Attachment>,
    pub confirmations: Vec<ConfirmationEntry>,
    pub status: WorkflowStatus,
    pub finalized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_type_accepts_legacy_alias() {
        assert_eq!("kiemke".parse::<ScanType>(), Ok(ScanType::InventoryCount));
        let parsed: ScanType = serde_json::from_str("\"kiemke\"").unwrap();
        assert_eq!(parsed, ScanType::InventoryCount);
        assert_eq!(ScanType::InventoryCount.as_str(), "inventory_count");
    }

    #[test]
    fn test_dashboard_priority() {
        assert_eq!(ScanType::dashboard_priority(Some(ScanType::Prepare)), 2);
        assert_eq!(ScanType::dashboard_priority(Some(ScanType::Shipping)), 3);
        assert_eq!(ScanType::dashboard_priority(Some(ScanType::Receive)), 99);
        assert_eq!(ScanType::dashboard_priority(None), 99);
    }

    #[test]
    fn test_confirmation_request_accepts_move_ids() {
        let req: ConfirmationRequest =
            serde_json::from_str(r#"{"move_ids":[3,1],"confirmed_qty":"8"}"#).unwrap();
        assert_eq!(req.line_ids, vec![3, 1]);
        assert_eq!(req.confirmed_qty, Decimal::from(8));
        assert!(req.product_id.is_none());
    }

    #[test]
    fn test_scan_params_accept_mobile_client_keys() {
        let params: ScanParams = serde_json::from_str(
            r#"{
                "scan_note": "ghi chu",
                "move_line_confirms": [
                    {"move_ids": [1, 2], "product_id": 7, "quantity_confirmed": 8, "confirm_note": "ok"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(params.note.as_deref(), Some("ghi chu"));
        assert_eq!(params.confirmations.len(), 1);
        let confirmation = &params.confirmations[0];
        assert_eq!(confirmation.line_ids, vec![1, 2]);
        assert_eq!(confirmation.product_id, Some(7));
        assert_eq!(confirmation.confirmed_qty, Decimal::from(8));
        assert_eq!(confirmation.note.as_deref(), Some("ok"));
    }
}
