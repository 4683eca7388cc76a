//! In-memory host store shared by the integration tests
//!
//! Implements both store traits over plain collections. Savepoints snapshot
//! the whole state so per-item rollback behaves like the database.

#![allow(dead_code)]

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use shared::store::{InventoryStore, ScanStore};
use shared::{
    Actor, Attachment, ConfirmationEntry, CountSummary, DemandLine, Document, DocumentKind, DocumentState,
    ImagePayload, InventoryAdjustment, Location, LocationScanEntry, LocationUsage, NewConfirmation,
    NewLocationScan, NewScanEntry, PickingDirection, Quant, ScanError, ScanHistoryEntry, ScanResult,
    ScanType, StockMove,
};

/// Id of the inventory adjustment location used as move counterpart
pub const INVENTORY_LOCATION_ID: i64 = 900;

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

pub fn document(id: i64, kind: DocumentKind, state: DocumentState, direction: PickingDirection) -> Document {
    Document {
        id,
        kind,
        name: format!("WH/DOC/{:05}", id),
        state,
        direction,
        partner_name: Some("Công ty Minh Phát".to_string()),
        origin: None,
        sale_order: Some(format!("SO{:04}", id)),
        salesperson: None,
        shipping_method: Some("Xe tải".to_string()),
        scheduled_date: Some(base_time()),
        qr_code_data: None,
        created_at: base_time(),
    }
}

pub fn outgoing_transfer(id: i64) -> Document {
    document(id, DocumentKind::Transfer, DocumentState::Assigned, PickingDirection::Outgoing)
}

pub fn purchase_intake(id: i64) -> Document {
    document(id, DocumentKind::PurchaseIntake, DocumentState::Confirmed, PickingDirection::Incoming)
}

pub fn line(id: i64, document_id: i64, product_id: i64, demand: &str) -> DemandLine {
    DemandLine {
        id,
        document_id,
        product_id,
        product_name: format!("Sản phẩm {}", product_id),
        uom: "Cái".to_string(),
        location_id: 10,
        location_name: "WH/Stock".to_string(),
        demand_qty: dec(demand),
        quantity_done: Decimal::ZERO,
        cancelled: false,
    }
}

pub fn location(id: i64) -> Location {
    Location {
        id,
        name: format!("Kệ {}", id),
        complete_name: format!("WH/Stock/Kệ {}", id),
        usage: LocationUsage::Internal,
        active: true,
        qr_id: None,
        qr_code_data: None,
    }
}

pub fn operator() -> Actor {
    Actor::user(7, vec!["stock:operate".to_string()])
}

pub fn viewer() -> Actor {
    Actor::user(8, Vec::new())
}

/// Everything the store has written
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub history: Vec<ScanHistoryEntry>,
    pub lines: Vec<DemandLine>,
    pub attachments: Vec<Attachment>,
    pub confirmations: Vec<ConfirmationEntry>,
    pub finalized: Vec<i64>,
    pub products: BTreeMap<i64, String>,
    pub quants: BTreeMap<i64, Quant>,
    pub moves: Vec<StockMove>,
    pub location_scans: Vec<LocationScanEntry>,
    pub summaries: Vec<(i64, CountSummary, Vec<InventoryAdjustment>)>,
    next_id: i64,
    clock: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        1000 + self.next_id
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        base_time() + Duration::minutes(self.clock)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub state: MemoryState,
    savepoints: Vec<(String, MemoryState)>,
    /// Makes `finalize_document` fail
    pub fail_finalize: bool,
    /// Products whose inventory apply fails
    pub failing_products: Vec<i64>,
}

impl MemoryStore {
    pub fn with_lines(lines: Vec<DemandLine>) -> Self {
        let mut store = Self::default();
        store.state.lines = lines;
        store
    }

    /// Append a past scan directly, bypassing any processor
    pub fn seed_scan(&mut self, document_id: i64, scan_type: ScanType) {
        let id = self.state.next_id();
        let scan_date = self.state.tick();
        self.state.history.push(ScanHistoryEntry {
            id,
            document_id,
            scan_type,
            scan_date,
            user_id: Some(7),
            note: None,
            shipping: None,
        });
    }

    pub fn add_product(&mut self, product_id: i64, name: &str) {
        self.state.products.insert(product_id, name.to_string());
    }

    pub fn add_quant(&mut self, quant_id: i64, product_id: i64, location_id: i64, quantity: &str) {
        let product_name = self.state.products.get(&product_id).cloned().unwrap_or_default();
        self.state.quants.insert(
            quant_id,
            Quant {
                id: quant_id,
                product_id,
                product_name,
                location_id,
                quantity: dec(quantity),
                reserved_quantity: Decimal::ZERO,
            },
        );
    }

    pub fn line_done(&self, line_id: i64) -> Decimal {
        self.state
            .lines
            .iter()
            .find(|l| l.id == line_id)
            .map(|l| l.quantity_done)
            .unwrap_or_default()
    }

    /// Number of rows written by scans, counts and finalization
    pub fn writes(&self) -> usize {
        self.state.history.len()
            + self.state.attachments.len()
            + self.state.confirmations.len()
            + self.state.finalized.len()
            + self.state.moves.len()
            + self.state.location_scans.len()
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn scan_history(&mut self, document_id: i64) -> ScanResult<Vec<ScanHistoryEntry>> {
        let mut history: Vec<_> = self
            .state
            .history
            .iter()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.scan_date.cmp(&a.scan_date).then(b.id.cmp(&a.id)));
        Ok(history)
    }

    async fn demand_lines(&mut self, document_id: i64) -> ScanResult<Vec<DemandLine>> {
        Ok(self
            .state
            .lines
            .iter()
            .filter(|l| l.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn insert_scan_entry(&mut self, entry: NewScanEntry) -> ScanResult<ScanHistoryEntry> {
        let stored = ScanHistoryEntry {
            id: self.state.next_id(),
            document_id: entry.document_id,
            scan_type: entry.scan_type,
            scan_date: self.state.tick(),
            user_id: entry.user_id,
            note: entry.note,
            shipping: entry.shipping,
        };
        self.state.history.push(stored.clone());
        Ok(stored)
    }

    async fn attach_images(
        &mut self,
        scan_history_id: i64,
        images: &[ImagePayload],
    ) -> ScanResult<Vec<Attachment>> {
        let mut attachments = Vec::new();
        for image in images {
            let attachment = Attachment {
                id: self.state.next_id(),
                scan_history_id,
                name: image.name.clone(),
                mimetype: "image/png".to_string(),
                checksum: format!("{:064x}", image.data.len()),
                file_size: image.data.len() as i64,
                description: image.description.clone(),
            };
            self.state.attachments.push(attachment.clone());
            attachments.push(attachment);
        }
        Ok(attachments)
    }

    async fn insert_confirmations(
        &mut self,
        rows: Vec<NewConfirmation>,
        confirmed_by: Option<i64>,
    ) -> ScanResult<Vec<ConfirmationEntry>> {
        let mut entries = Vec::new();
        for row in rows {
            let entry = ConfirmationEntry {
                id: self.state.next_id(),
                scan_history_id: row.scan_history_id,
                line_id: row.line_id,
                product_id: row.product_id,
                quantity_confirmed: row.quantity_confirmed,
                note: row.note,
                confirmed_at: self.state.tick(),
                confirmed_by,
            };
            self.state.confirmations.push(entry.clone());
            entries.push(entry);
        }
        Ok(entries)
    }

    async fn set_quantity_done(&mut self, quantities: &BTreeMap<i64, Decimal>) -> ScanResult<()> {
        for line in self.state.lines.iter_mut() {
            if let Some(quantity) = quantities.get(&line.id) {
                line.quantity_done = *quantity;
            }
        }
        Ok(())
    }

    async fn finalize_document(&mut self, document_id: i64, _actor: &Actor) -> ScanResult<()> {
        if self.fail_finalize {
            return Err(ScanError::Finalize("no quantity has been done on any line".to_string()));
        }
        self.state.finalized.push(document_id);
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn insert_location_scan(&mut self, scan: NewLocationScan) -> ScanResult<LocationScanEntry> {
        let entry = LocationScanEntry {
            id: self.state.next_id(),
            location_id: scan.location_id,
            scan_date: self.state.tick(),
            user_id: scan.user_id,
            note: scan.note,
            total_products: 0,
            products_with_changes: 0,
            total_quantity_added: Decimal::ZERO,
            total_quantity_removed: Decimal::ZERO,
            product_changes_summary: None,
        };
        self.state.location_scans.push(entry.clone());
        Ok(entry)
    }

    async fn product_name(&mut self, product_id: i64) -> ScanResult<Option<String>> {
        Ok(self.state.products.get(&product_id).cloned())
    }

    async fn quant(&mut self, quant_id: i64) -> ScanResult<Option<Quant>> {
        Ok(self.state.quants.get(&quant_id).cloned())
    }

    async fn create_quant(&mut self, location_id: i64, product_id: i64) -> ScanResult<Quant> {
        // Mirrors UNIQUE (product_id, location_id) on quants
        let duplicate = self
            .state
            .quants
            .values()
            .any(|q| q.product_id == product_id && q.location_id == location_id);
        if duplicate {
            return Err(ScanError::Storage(format!(
                "stock record for product {} already exists in location {}",
                product_id, location_id
            )));
        }

        let quant = Quant {
            id: self.state.next_id(),
            product_id,
            product_name: self.state.products.get(&product_id).cloned().unwrap_or_default(),
            location_id,
            quantity: Decimal::ZERO,
            reserved_quantity: Decimal::ZERO,
        };
        self.state.quants.insert(quant.id, quant.clone());
        Ok(quant)
    }

    async fn apply_inventory(
        &mut self,
        quant: &Quant,
        counted: Decimal,
        reference: &str,
    ) -> ScanResult<Option<StockMove>> {
        if self.failing_products.contains(&quant.product_id) {
            return Err(ScanError::Storage(format!("cannot move product {}", quant.product_id)));
        }

        let difference = counted - quant.quantity;
        if difference == Decimal::ZERO {
            return Ok(None);
        }
        let (from, to) = if difference > Decimal::ZERO {
            (INVENTORY_LOCATION_ID, quant.location_id)
        } else {
            (quant.location_id, INVENTORY_LOCATION_ID)
        };
        let stock_move = StockMove {
            id: self.state.next_id(),
            product_id: quant.product_id,
            location_id: from,
            location_dest_id: to,
            quantity: difference.abs(),
            reference: reference.to_string(),
        };
        self.state.moves.push(stock_move.clone());
        if let Some(stored) = self.state.quants.get_mut(&quant.id) {
            stored.quantity = counted;
        }
        Ok(Some(stock_move))
    }

    async fn save_count_summary(
        &mut self,
        location_scan_id: i64,
        summary: &CountSummary,
        adjustments: &[InventoryAdjustment],
    ) -> ScanResult<()> {
        self.state
            .summaries
            .push((location_scan_id, summary.clone(), adjustments.to_vec()));
        Ok(())
    }

    async fn savepoint(&mut self, name: &str) -> ScanResult<()> {
        self.savepoints.push((name.to_string(), self.state.clone()));
        Ok(())
    }

    async fn release_savepoint(&mut self, name: &str) -> ScanResult<()> {
        match self.savepoints.iter().rposition(|(n, _)| n == name) {
            Some(index) => {
                self.savepoints.truncate(index);
                Ok(())
            }
            None => Err(ScanError::Storage(format!("no savepoint {}", name))),
        }
    }

    async fn rollback_to_savepoint(&mut self, name: &str) -> ScanResult<()> {
        match self.savepoints.iter().rposition(|(n, _)| n == name) {
            Some(index) => {
                let (_, snapshot) = self.savepoints.remove(index);
                self.savepoints.truncate(index);
                self.state = snapshot;
                Ok(())
            }
            None => Err(ScanError::Storage(format!("no savepoint {}", name))),
        }
    }
}
