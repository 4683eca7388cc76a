//! Persistence seam between the scan processors and the host ERP
//!
//! Processors only talk to these traits. Every call made during one scan is
//! expected to run inside the same host transaction; an error returned from
//! any step aborts the whole scan.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::ScanResult;
use crate::models::{
    Attachment, ConfirmationEntry, CountSummary, DemandLine, ImagePayload, InventoryAdjustment,
    LocationScanEntry, NewConfirmation, NewLocationScan, NewScanEntry, Quant, ScanHistoryEntry,
    StockMove,
};
use crate::types::Actor;

/// Document-side storage used by the document scan processors
#[async_trait]
pub trait ScanStore: Send {
    /// Ledger rows for a document, newest first
    async fn scan_history(&mut self, document_id: i64) -> ScanResult<Vec<ScanHistoryEntry>>;

    async fn demand_lines(&mut self, document_id: i64) -> ScanResult<Vec<DemandLine>>;

    async fn insert_scan_entry(&mut self, entry: NewScanEntry) -> ScanResult<ScanHistoryEntry>;

    async fn attach_images(
        &mut self,
        scan_history_id: i64,
        images: &[ImagePayload],
    ) -> ScanResult<Vec<Attachment>>;

    async fn insert_confirmations(
        &mut self,
        rows: Vec<NewConfirmation>,
        confirmed_by: Option<i64>,
    ) -> ScanResult<Vec<ConfirmationEntry>>;

    /// Overwrite `quantity_done` of the given lines. Demand is left untouched.
    async fn set_quantity_done(&mut self, quantities: &BTreeMap<i64, Decimal>) -> ScanResult<()>;

    /// Run the host's finalize action on the document
    async fn finalize_document(&mut self, document_id: i64, actor: &Actor) -> ScanResult<()>;
}

/// Location-side storage used by the inventory count processor
#[async_trait]
pub trait InventoryStore: Send {
    async fn insert_location_scan(&mut self, scan: NewLocationScan) -> ScanResult<LocationScanEntry>;

    /// Display name of a product, `None` when it does not exist
    async fn product_name(&mut self, product_id: i64) -> ScanResult<Option<String>>;

    async fn quant(&mut self, quant_id: i64) -> ScanResult<Option<Quant>>;

    /// New quant with zero on hand
    async fn create_quant(&mut self, location_id: i64, product_id: i64) -> ScanResult<Quant>;

    /// Set the quant's on-hand to `counted`, booking the difference against the
    /// inventory adjustment location. Returns `None` when nothing moved.
    async fn apply_inventory(
        &mut self,
        quant: &Quant,
        counted: Decimal,
        reference: &str,
    ) -> ScanResult<Option<StockMove>>;

    async fn save_count_summary(
        &mut self,
        location_scan_id: i64,
        summary: &CountSummary,
        adjustments: &[InventoryAdjustment],
    ) -> ScanResult<()>;

    /// Items of a count batch commit or roll back independently through these
    async fn savepoint(&mut self, name: &str) -> ScanResult<()>;

    async fn release_savepoint(&mut self, name: &str) -> ScanResult<()>;

    async fn rollback_to_savepoint(&mut self, name: &str) -> ScanResult<()>;
}
