//! Storage locations, quants and inventory counting

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Location usage as the host classifies it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationUsage {
    Internal,
    /// Counterpart of inventory adjustments
    Inventory,
    Supplier,
    Customer,
    Transit,
    View,
}

impl LocationUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationUsage::Internal => "internal",
            LocationUsage::Inventory => "inventory",
            LocationUsage::Supplier => "supplier",
            LocationUsage::Customer => "customer",
            LocationUsage::Transit => "transit",
            LocationUsage::View => "view",
        }
    }
}

impl FromStr for LocationUsage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(LocationUsage::Internal),
            "inventory" => Ok(LocationUsage::Inventory),
            "supplier" => Ok(LocationUsage::Supplier),
            "customer" => Ok(LocationUsage::Customer),
            "transit" => Ok(LocationUsage::Transit),
            "view" => Ok(LocationUsage::View),
            other => Err(ParseEnumError::new("location usage", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub complete_name: String,
    pub usage: LocationUsage,
    pub active: bool,
    /// Printed label id, used in the QR token instead of `id` when set
    pub qr_id: Option<i64>,
    pub qr_code_data: Option<String>,
}

impl Location {
    pub fn qr_token_id(&self) -> i64 {
        self.qr_id.unwrap_or(self.id)
    }
}

/// On-hand quantity of one product in one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quant {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub location_id: i64,
    pub quantity: Decimal,
    pub reserved_quantity: Decimal,
}

impl Quant {
    pub fn available_quantity(&self) -> Decimal {
        self.quantity - self.reserved_quantity
    }
}

/// One line of an inventory count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryCountItem {
    pub product_id: i64,
    pub counted_quantity: Decimal,
    #[serde(default)]
    pub is_new: bool,
    pub quant_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentAction {
    Created,
    Updated,
    NoChange,
}

/// Log record of one applied (or unchanged) count item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    pub product: String,
    pub from: Decimal,
    pub to: Decimal,
    pub action: AdjustmentAction,
    pub changed: bool,
}

impl InventoryAdjustment {
    pub fn difference(&self) -> Decimal {
        self.to - self.from
    }
}

/// Per-item outcome reported back to the client
#[derive(Debug, Clone, Serialize)]
pub struct CountItemOutcome {
    pub product_id: i64,
    pub success: bool,
    pub adjustment: Option<InventoryAdjustment>,
    pub error: Option<String>,
}

/// Aggregate statistics stored on the location scan entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountSummary {
    pub total_products: i32,
    pub products_with_changes: i32,
    pub total_quantity_added: Decimal,
    pub total_quantity_removed: Decimal,
    pub product_changes_summary: String,
}

impl CountSummary {
    pub fn from_adjustments(adjustments: &[InventoryAdjustment]) -> Self {
        let mut added = Decimal::ZERO;
        let mut removed = Decimal::ZERO;
        let mut lines = Vec::new();

        for adjustment in adjustments.iter().filter(|a| a.changed) {
            let diff = adjustment.difference();
            if diff > Decimal::ZERO {
                added += diff;
                lines.push(format!("+ {}: +{}", adjustment.product, diff.normalize()));
            } else if diff < Decimal::ZERO {
                removed += diff.abs();
                lines.push(format!("- {}: {}", adjustment.product, diff.normalize()));
            }
        }

        Self {
            total_products: adjustments.len() as i32,
            products_with_changes: adjustments.iter().filter(|a| a.changed).count() as i32,
            total_quantity_added: added,
            total_quantity_removed: removed,
            product_changes_summary: if lines.is_empty() {
                "Không có thay đổi".to_string()
            } else {
                lines.join("\n")
            },
        }
    }
}

/// Result of a whole inventory count batch
#[derive(Debug, Clone, Serialize)]
pub struct InventoryCountResult {
    pub location_scan_id: i64,
    pub items: Vec<CountItemOutcome>,
    pub summary: CountSummary,
}

impl InventoryCountResult {
    pub fn adjusted_count(&self) -> usize {
        self.items.iter().filter(|i| i.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|i| !i.success).count()
    }
}

/// Count session as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationScanEntry {
    pub id: i64,
    pub location_id: i64,
    pub scan_date: DateTime<Utc>,
    pub user_id: Option<i64>,
    pub note: Option<String>,
    pub total_products: i32,
    pub products_with_changes: i32,
    pub total_quantity_added: Decimal,
    pub total_quantity_removed: Decimal,
    pub product_changes_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLocationScan {
    pub location_id: i64,
    pub user_id: Option<i64>,
    pub note: Option<String>,
}

/// Balancing move written when a count is applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMove {
    pub id: i64,
    pub product_id: i64,
    pub location_id: i64,
    pub location_dest_id: i64,
    pub quantity: Decimal,
    pub reference: String,
}

/// Quant row as listed for a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationProduct {
    pub quant_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub default_code: Option<String>,
    pub uom: String,
    pub quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub available_quantity: Decimal,
}

/// Another internal location holding a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLocation {
    pub location_id: i64,
    pub location_name: String,
    pub uom: String,
    pub quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub available_quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSearchResult {
    pub id: i64,
    pub name: String,
    pub default_code: Option<String>,
    pub barcode: Option<String>,
    pub uom: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(product: &str, from: i64, to: i64, action: AdjustmentAction) -> InventoryAdjustment {
        InventoryAdjustment {
            product: product.to_string(),
            from: Decimal::from(from),
            to: Decimal::from(to),
            action,
            changed: from != to,
        }
    }

    #[test]
    fn test_count_summary_totals() {
        let summary = CountSummary::from_adjustments(&[
            adj("Bolt", 10, 12, AdjustmentAction::Updated),
            adj("Nut", 5, 5, AdjustmentAction::NoChange),
            adj("Washer", 8, 3, AdjustmentAction::Updated),
            adj("Screw", 0, 4, AdjustmentAction::Created),
        ]);

        assert_eq!(summary.total_products, 4);
        assert_eq!(summary.products_with_changes, 3);
        assert_eq!(summary.total_quantity_added, Decimal::from(6));
        assert_eq!(summary.total_quantity_removed, Decimal::from(5));
        assert_eq!(
            summary.product_changes_summary,
            "+ Bolt: +2\n- Washer: -5\n+ Screw: +4"
        );
    }

    #[test]
    fn test_count_summary_without_changes() {
        let summary = CountSummary::from_adjustments(&[adj("Nut", 5, 5, AdjustmentAction::NoChange)]);
        assert_eq!(summary.products_with_changes, 0);
        assert_eq!(summary.product_changes_summary, "Không có thay đổi");
    }

    #[test]
    fn test_location_qr_token_id() {
        let mut location = Location {
            id: 4,
            name: "A-01".to_string(),
            complete_name: "WH/Stock/A-01".to_string(),
            usage: LocationUsage::Internal,
            active: true,
            qr_id: None,
            qr_code_data: None,
        };
        assert_eq!(location.qr_token_id(), 4);
        location.qr_id = Some(9001);
        assert_eq!(location.qr_token_id(), 9001);
    }
}
