//! Demand lines (stock moves) and their grouped view

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Expected movement of one product on a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandLine {
    pub id: i64,
    pub document_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub uom: String,
    pub location_id: i64,
    pub location_name: String,
    pub demand_qty: Decimal,
    pub quantity_done: Decimal,
    pub cancelled: bool,
}

/// Lines sharing product, unit and source location, merged for the handheld client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineGroup {
    pub product_id: i64,
    pub product_name: String,
    pub uom: String,
    pub location_id: i64,
    pub location_name: String,
    /// Member line ids in ascending order
    pub line_ids: Vec<i64>,
    pub demand_qty: Decimal,
    pub quantity_done: Decimal,
}
