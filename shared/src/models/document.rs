//! Warehouse documents: transfers and purchase intakes

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ParseEnumError;
use crate::types::Language;

/// Kind of ERP document a scan targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Stock transfer (picking): outbound delivery, inbound receipt or internal move
    Transfer,
    /// Purchase-order intake from a supplier
    PurchaseIntake,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Transfer => "transfer",
            DocumentKind::PurchaseIntake => "purchase_intake",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(DocumentKind::Transfer),
            "purchase_intake" => Ok(DocumentKind::PurchaseIntake),
            other => Err(ParseEnumError::new("document kind", other)),
        }
    }
}

/// Lifecycle state of a document, owned by the host ERP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    Draft,
    Waiting,
    Confirmed,
    Assigned,
    Done,
    Cancel,
}

impl DocumentState {
    pub const ALL: [DocumentState; 6] = [
        DocumentState::Draft,
        DocumentState::Waiting,
        DocumentState::Confirmed,
        DocumentState::Assigned,
        DocumentState::Done,
        DocumentState::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentState::Draft => "draft",
            DocumentState::Waiting => "waiting",
            DocumentState::Confirmed => "confirmed",
            DocumentState::Assigned => "assigned",
            DocumentState::Done => "done",
            DocumentState::Cancel => "cancel",
        }
    }

    /// Done and cancelled documents accept no more scans
    pub fn is_closed(&self) -> bool {
        matches!(self, DocumentState::Done | DocumentState::Cancel)
    }

    pub fn label(&self, language: Language) -> &'static str {
        match language {
            Language::Vietnamese => match self {
                DocumentState::Draft => "Nháp",
                DocumentState::Waiting => "Đang chờ",
                DocumentState::Confirmed => "Đã xác nhận",
                DocumentState::Assigned => "Sẵn sàng",
                DocumentState::Done => "Hoàn tất",
                DocumentState::Cancel => "Đã hủy",
            },
            Language::English => match self {
                DocumentState::Draft => "Draft",
                DocumentState::Waiting => "Waiting",
                DocumentState::Confirmed => "Confirmed",
                DocumentState::Assigned => "Ready",
                DocumentState::Done => "Done",
                DocumentState::Cancel => "Cancelled",
            },
        }
    }
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("document state", s))
    }
}

/// Direction of goods for a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickingDirection {
    Incoming,
    Outgoing,
    Internal,
}

impl PickingDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickingDirection::Incoming => "incoming",
            PickingDirection::Outgoing => "outgoing",
            PickingDirection::Internal => "internal",
        }
    }
}

impl FromStr for PickingDirection {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(PickingDirection::Incoming),
            "outgoing" => Ok(PickingDirection::Outgoing),
            "internal" => Ok(PickingDirection::Internal),
            other => Err(ParseEnumError::new("picking direction", other)),
        }
    }
}

/// A document undergoing scan-based workflow tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub kind: DocumentKind,
    /// Reference shown to users, e.g. "WH/OUT/00042"
    pub name: String,
    pub state: DocumentState,
    pub direction: PickingDirection,
    pub partner_name: Option<String>,
    pub origin: Option<String>,
    pub sale_order: Option<String>,
    pub salesperson: Option<String>,
    pub shipping_method: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Token currently embedded in the stored QR image
    pub qr_code_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Effective direction. Purchase intakes only ever bring goods in.
    pub fn effective_direction(&self) -> PickingDirection {
        match self.kind {
            DocumentKind::PurchaseIntake => PickingDirection::Incoming,
            DocumentKind::Transfer => self.direction,
        }
    }

    pub fn is_inbound(&self) -> bool {
        self.effective_direction() == PickingDirection::Incoming
    }
}
