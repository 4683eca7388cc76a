//! Transaction-backed implementation of the scan store traits
//!
//! One `PgScanStore` wraps one sqlx transaction. Dropping it without calling
//! `commit` rolls every write back.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use shared::store::{InventoryStore, ScanStore};
use shared::{
    Actor, Attachment, ConfirmationEntry, CountSummary, DemandLine, Document, ImagePayload,
    InventoryAdjustment, Location, LocationScanEntry, NewConfirmation, NewLocationScan, NewScanEntry,
    Quant, ScanError, ScanHistoryEntry, ScanResult, ShippingInfo, StockMove,
};

use super::attachment::decode_image;

fn storage(err: sqlx::Error) -> ScanError {
    ScanError::Storage(err.to_string())
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> ScanError {
    ScanError::Storage(format!("invalid {} in database: {}", what, err))
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct DocumentRow {
    id: i64,
    kind: String,
    name: String,
    state: String,
    direction: String,
    partner_name: Option<String>,
    origin: Option<String>,
    sale_order: Option<String>,
    salesperson: Option<String>,
    shipping_method: Option<String>,
    scheduled_date: Option<DateTime<Utc>>,
    qr_code_data: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = ScanError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: row.id,
            kind: row.kind.parse().map_err(|e| corrupt("document kind", e))?,
            name: row.name,
            state: row.state.parse().map_err(|e| corrupt("document state", e))?,
            direction: row.direction.parse().map_err(|e| corrupt("direction", e))?,
            partner_name: row.partner_name,
            origin: row.origin,
            sale_order: row.sale_order,
            salesperson: row.salesperson,
            shipping_method: row.shipping_method,
            scheduled_date: row.scheduled_date,
            qr_code_data: row.qr_code_data,
            created_at: row.created_at,
        })
    }
}

pub(crate) const DOCUMENT_COLUMNS: &str = "id, kind, name, state, direction, partner_name, origin, \
     sale_order, salesperson, shipping_method, scheduled_date, qr_code_data, created_at";

#[derive(Debug, FromRow)]
struct DemandLineRow {
    id: i64,
    document_id: i64,
    product_id: i64,
    product_name: String,
    uom: String,
    location_id: i64,
    location_name: String,
    demand_qty: Decimal,
    quantity_done: Decimal,
    cancelled: bool,
}

impl From<DemandLineRow> for DemandLine {
    fn from(row: DemandLineRow) -> Self {
        DemandLine {
            id: row.id,
            document_id: row.document_id,
            product_id: row.product_id,
            product_name: row.product_name,
            uom: row.uom,
            location_id: row.location_id,
            location_name: row.location_name,
            demand_qty: row.demand_qty,
            quantity_done: row.quantity_done,
            cancelled: row.cancelled,
        }
    }
}

#[derive(Debug, FromRow)]
struct ScanHistoryRow {
    id: i64,
    document_id: i64,
    scan_type: String,
    scan_date: DateTime<Utc>,
    user_id: Option<i64>,
    note: Option<String>,
    shipping_type: Option<String>,
    shipping_phone: Option<String>,
    shipping_company: Option<String>,
}

impl TryFrom<ScanHistoryRow> for ScanHistoryEntry {
    type Error = ScanError;

    fn try_from(row: ScanHistoryRow) -> Result<Self, Self::Error> {
        let shipping = match row.shipping_type {
            Some(shipping_type) => Some(ShippingInfo {
                shipping_type: shipping_type.parse().map_err(|e| corrupt("shipping type", e))?,
                phone: row.shipping_phone,
                company: row.shipping_company,
            }),
            None => None,
        };

        Ok(ScanHistoryEntry {
            id: row.id,
            document_id: row.document_id,
            scan_type: row.scan_type.parse().map_err(|e| corrupt("scan type", e))?,
            scan_date: row.scan_date,
            user_id: row.user_id,
            note: row.note,
            shipping,
        })
    }
}

#[derive(Debug, FromRow)]
struct ConfirmationRow {
    id: i64,
    scan_history_id: i64,
    line_id: i64,
    product_id: i64,
    quantity_confirmed: Decimal,
    note: Option<String>,
    confirmed_at: DateTime<Utc>,
    confirmed_by: Option<i64>,
}

impl From<ConfirmationRow> for ConfirmationEntry {
    fn from(row: ConfirmationRow) -> Self {
        ConfirmationEntry {
            id: row.id,
            scan_history_id: row.scan_history_id,
            line_id: row.line_id,
            product_id: row.product_id,
            quantity_confirmed: row.quantity_confirmed,
            note: row.note,
            confirmed_at: row.confirmed_at,
            confirmed_by: row.confirmed_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct LocationRow {
    id: i64,
    name: String,
    complete_name: String,
    usage: String,
    active: bool,
    qr_id: Option<i64>,
    qr_code_data: Option<String>,
}

impl TryFrom<LocationRow> for Location {
    type Error = ScanError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        Ok(Location {
            id: row.id,
            name: row.name,
            complete_name: row.complete_name,
            usage: row.usage.parse().map_err(|e| corrupt("location usage", e))?,
            active: row.active,
            qr_id: row.qr_id,
            qr_code_data: row.qr_code_data,
        })
    }
}

pub(crate) const LOCATION_COLUMNS: &str = "id, name, complete_name, usage, active, qr_id, qr_code_data";

#[derive(Debug, FromRow)]
struct QuantRow {
    id: i64,
    product_id: i64,
    product_name: String,
    location_id: i64,
    quantity: Decimal,
    reserved_quantity: Decimal,
}

impl From<QuantRow> for Quant {
    fn from(row: QuantRow) -> Self {
        Quant {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            location_id: row.location_id,
            quantity: row.quantity,
            reserved_quantity: row.reserved_quantity,
        }
    }
}

#[derive(Debug, FromRow)]
struct LocationScanRow {
    id: i64,
    location_id: i64,
    scan_date: DateTime<Utc>,
    user_id: Option<i64>,
    note: Option<String>,
    total_products: i32,
    products_with_changes: i32,
    total_quantity_added: Decimal,
    total_quantity_removed: Decimal,
    product_changes_summary: Option<String>,
}

impl From<LocationScanRow> for LocationScanEntry {
    fn from(row: LocationScanRow) -> Self {
        LocationScanEntry {
            id: row.id,
            location_id: row.location_id,
            scan_date: row.scan_date,
            user_id: row.user_id,
            note: row.note,
            total_products: row.total_products,
            products_with_changes: row.products_with_changes,
            total_quantity_added: row.total_quantity_added,
            total_quantity_removed: row.total_quantity_removed,
            product_changes_summary: row.product_changes_summary,
        }
    }
}

#[derive(Debug, FromRow)]
struct StockMoveRow {
    id: i64,
    product_id: i64,
    location_id: i64,
    location_dest_id: i64,
    quantity: Decimal,
    reference: String,
}

impl From<StockMoveRow> for StockMove {
    fn from(row: StockMoveRow) -> Self {
        StockMove {
            id: row.id,
            product_id: row.product_id,
            location_id: row.location_id,
            location_dest_id: row.location_dest_id,
            quantity: row.quantity,
            reference: row.reference,
        }
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct PgScanStore {
    tx: Transaction<'static, Postgres>,
}

impl PgScanStore {
    pub async fn begin(db: &PgPool) -> ScanResult<Self> {
        let tx = db.begin().await.map_err(storage)?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> ScanResult<()> {
        self.tx.commit().await.map_err(storage)
    }

    /// Load a document and lock its row until the transaction ends
    pub async fn lock_document(&mut self, document_id: i64) -> ScanResult<Document> {
        self.fetch_document(document_id, true).await
    }

    pub async fn document(&mut self, document_id: i64) -> ScanResult<Document> {
        self.fetch_document(document_id, false).await
    }

    async fn fetch_document(&mut self, document_id: i64, for_update: bool) -> ScanResult<Document> {
        let query = format!(
            "SELECT {} FROM documents WHERE id = $1{}",
            DOCUMENT_COLUMNS,
            if for_update { " FOR UPDATE" } else { "" }
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(document_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(storage)?
            .ok_or_else(|| ScanError::not_found(format!("Document {}", document_id)))?
            .try_into()
    }

    pub async fn lock_location(&mut self, location_id: i64) -> ScanResult<Location> {
        let query = format!("SELECT {} FROM locations WHERE id = $1 FOR UPDATE", LOCATION_COLUMNS);
        sqlx::query_as::<_, LocationRow>(&query)
            .bind(location_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(storage)?
            .ok_or_else(|| ScanError::not_found(format!("Location {}", location_id)))?
            .try_into()
    }

    async fn inventory_location_id(&mut self) -> ScanResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM locations WHERE usage = 'inventory' AND active ORDER BY id LIMIT 1",
        )
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(storage)?
        .ok_or_else(|| ScanError::not_found("Inventory adjustment location"))
    }

    /// Savepoint names are generated internally; anything else is refused
    fn checked_savepoint(name: &str) -> ScanResult<&str> {
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(name)
        } else {
            Err(ScanError::Storage(format!("invalid savepoint name: {}", name)))
        }
    }

    async fn execute_raw(&mut self, statement: String) -> ScanResult<()> {
        sqlx::query(&statement)
            .execute(&mut *self.tx)
            .await
            .map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl ScanStore for PgScanStore {
    async fn scan_history(&mut self, document_id: i64) -> ScanResult<Vec<ScanHistoryEntry>> {
        let rows = sqlx::query_as::<_, ScanHistoryRow>(
            r#"
            SELECT id, document_id, scan_type, scan_date, user_id, note,
                   shipping_type, shipping_phone, shipping_company
            FROM scan_history
            WHERE document_id = $1
            ORDER BY scan_date DESC, id DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(storage)?;

        rows.into_iter().map(ScanHistoryEntry::try_from).collect()
    }

    async fn demand_lines(&mut self, document_id: i64) -> ScanResult<Vec<DemandLine>> {
        let rows = sqlx::query_as::<_, DemandLineRow>(
            r#"
            SELECT dl.id, dl.document_id, dl.product_id, p.name AS product_name, p.uom,
                   dl.location_id, l.complete_name AS location_name,
                   dl.demand_qty, dl.quantity_done, dl.cancelled
            FROM demand_lines dl
            JOIN products p ON p.id = dl.product_id
            JOIN locations l ON l.id = dl.location_id
            WHERE dl.document_id = $1
            ORDER BY dl.id
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(storage)?;

        Ok(rows.into_iter().map(DemandLine::from).collect())
    }

    async fn insert_scan_entry(&mut self, entry: NewScanEntry) -> ScanResult<ScanHistoryEntry> {
        let shipping = entry.shipping.as_ref();
        let row = sqlx::query_as::<_, ScanHistoryRow>(
            r#"
            INSERT INTO scan_history
                (document_id, scan_type, user_id, note, shipping_type, shipping_phone, shipping_company)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, document_id, scan_type, scan_date, user_id, note,
                      shipping_type, shipping_phone, shipping_company
            "#,
        )
        .bind(entry.document_id)
        .bind(entry.scan_type.as_str())
        .bind(entry.user_id)
        .bind(&entry.note)
        .bind(shipping.map(|s| s.shipping_type.as_str()))
        .bind(shipping.and_then(|s| s.phone.as_deref()))
        .bind(shipping.and_then(|s| s.company.as_deref()))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(storage)?;

        row.try_into()
    }

    async fn attach_images(
        &mut self,
        scan_history_id: i64,
        images: &[ImagePayload],
    ) -> ScanResult<Vec<Attachment>> {
        let mut attachments = Vec::with_capacity(images.len());
        for payload in images {
            let image = decode_image(payload)?;
            let file_size = image.bytes.len() as i64;

            let id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO scan_attachments
                    (scan_history_id, name, mimetype, checksum, file_size, description, data)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(scan_history_id)
            .bind(&image.name)
            .bind(image.mimetype)
            .bind(&image.checksum)
            .bind(file_size)
            .bind(&image.description)
            .bind(&image.bytes)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(storage)?;

            attachments.push(Attachment {
                id,
                scan_history_id,
                name: image.name,
                mimetype: image.mimetype.to_string(),
                checksum: image.checksum,
                file_size,
                description: image.description,
            });
        }
        Ok(attachments)
    }

    async fn insert_confirmations(
        &mut self,
        rows: Vec<NewConfirmation>,
        confirmed_by: Option<i64>,
    ) -> ScanResult<Vec<ConfirmationEntry>> {
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let inserted = sqlx::query_as::<_, ConfirmationRow>(
                r#"
                INSERT INTO confirmations
                    (scan_history_id, line_id, product_id, quantity_confirmed, note, confirmed_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, scan_history_id, line_id, product_id, quantity_confirmed,
                          note, confirmed_at, confirmed_by
                "#,
            )
            .bind(row.scan_history_id)
            .bind(row.line_id)
            .bind(row.product_id)
            .bind(row.quantity_confirmed)
            .bind(&row.note)
            .bind(confirmed_by)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(storage)?;
            entries.push(inserted.into());
        }
        Ok(entries)
    }

    async fn set_quantity_done(&mut self, quantities: &BTreeMap<i64, Decimal>) -> ScanResult<()> {
        for (line_id, quantity) in quantities {
            sqlx::query("UPDATE demand_lines SET quantity_done = $2 WHERE id = $1")
                .bind(line_id)
                .bind(quantity)
                .execute(&mut *self.tx)
                .await
                .map_err(storage)?;
        }
        Ok(())
    }

    async fn finalize_document(&mut self, document_id: i64, actor: &Actor) -> ScanResult<()> {
        let lines: Vec<DemandLine> = self
            .demand_lines(document_id)
            .await?
            .into_iter()
            .filter(|line| !line.cancelled)
            .collect();

        if !lines.iter().any(|line| line.quantity_done > Decimal::ZERO) {
            return Err(ScanError::Finalize(
                "no quantity has been done on any line".to_string(),
            ));
        }

        let remainders: Vec<&DemandLine> = lines
            .iter()
            .filter(|line| line.quantity_done < line.demand_qty)
            .collect();

        if !remainders.is_empty() {
            let backorder_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO documents
                    (kind, name, state, direction, partner_name, origin, sale_order,
                     salesperson, shipping_method, scheduled_date, backorder_id)
                SELECT kind, name || '-BO', 'confirmed', direction, partner_name, origin, sale_order,
                       salesperson, shipping_method, scheduled_date, id
                FROM documents
                WHERE id = $1
                RETURNING id
                "#,
            )
            .bind(document_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(storage)?;

            for line in &remainders {
                sqlx::query(
                    r#"
                    INSERT INTO demand_lines (document_id, product_id, location_id, demand_qty)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(backorder_id)
                .bind(line.product_id)
                .bind(line.location_id)
                .bind(line.demand_qty - line.quantity_done)
                .execute(&mut *self.tx)
                .await
                .map_err(storage)?;

                sqlx::query("UPDATE demand_lines SET demand_qty = quantity_done WHERE id = $1")
                    .bind(line.id)
                    .execute(&mut *self.tx)
                    .await
                    .map_err(storage)?;
            }

            tracing::info!(document_id, backorder_id, lines = remainders.len(), "Back-order created");
        }

        sqlx::query("UPDATE documents SET state = 'done', date_done = NOW() WHERE id = $1")
            .bind(document_id)
            .execute(&mut *self.tx)
            .await
            .map_err(storage)?;

        tracing::debug!(document_id, user_id = ?actor.user_id(), "Document marked done");
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PgScanStore {
    async fn insert_location_scan(&mut self, scan: NewLocationScan) -> ScanResult<LocationScanEntry> {
        let row = sqlx::query_as::<_, LocationScanRow>(
            r#"
            INSERT INTO location_scans (location_id, user_id, note)
            VALUES ($1, $2, $3)
            RETURNING id, location_id, scan_date, user_id, note, total_products,
                      products_with_changes, total_quantity_added, total_quantity_removed,
                      product_changes_summary
            "#,
        )
        .bind(scan.location_id)
        .bind(scan.user_id)
        .bind(&scan.note)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(storage)?;

        Ok(row.into())
    }

    async fn product_name(&mut self, product_id: i64) -> ScanResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT name FROM products WHERE id = $1 AND active")
            .bind(product_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(storage)
    }

    async fn quant(&mut self, quant_id: i64) -> ScanResult<Option<Quant>> {
        let row = sqlx::query_as::<_, QuantRow>(
            r#"
            SELECT q.id, q.product_id, p.name AS product_name, q.location_id,
                   q.quantity, q.reserved_quantity
            FROM quants q
            JOIN products p ON p.id = q.product_id
            WHERE q.id = $1
            FOR UPDATE OF q
            "#,
        )
        .bind(quant_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(storage)?;

        Ok(row.map(Quant::from))
    }

    async fn create_quant(&mut self, location_id: i64, product_id: i64) -> ScanResult<Quant> {
        let row = sqlx::query_as::<_, QuantRow>(
            r#"
            WITH inserted AS (
                INSERT INTO quants (product_id, location_id, quantity)
                VALUES ($1, $2, 0)
                RETURNING id, product_id, location_id, quantity, reserved_quantity
            )
            SELECT i.id, i.product_id, p.name AS product_name, i.location_id,
                   i.quantity, i.reserved_quantity
            FROM inserted i
            JOIN products p ON p.id = i.product_id
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(storage)?;

        Ok(row.into())
    }

    async fn apply_inventory(
        &mut self,
        quant: &Quant,
        counted: Decimal,
        reference: &str,
    ) -> ScanResult<Option<StockMove>> {
        let difference = counted - quant.quantity;
        if difference == Decimal::ZERO {
            return Ok(None);
        }

        let inventory_location = self.inventory_location_id().await?;
        let (source, destination) = if difference > Decimal::ZERO {
            (inventory_location, quant.location_id)
        } else {
            (quant.location_id, inventory_location)
        };

        let row = sqlx::query_as::<_, StockMoveRow>(
            r#"
            INSERT INTO stock_moves (product_id, location_id, location_dest_id, quantity, reference)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, product_id, location_id, location_dest_id, quantity, reference
            "#,
        )
        .bind(quant.product_id)
        .bind(source)
        .bind(destination)
        .bind(difference.abs())
        .bind(reference)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(storage)?;

        sqlx::query("UPDATE quants SET quantity = $2 WHERE id = $1")
            .bind(quant.id)
            .bind(counted)
            .execute(&mut *self.tx)
            .await
            .map_err(storage)?;

        Ok(Some(row.into()))
    }

    async fn save_count_summary(
        &mut self,
        location_scan_id: i64,
        summary: &CountSummary,
        adjustments: &[InventoryAdjustment],
    ) -> ScanResult<()> {
        let inventory_data = serde_json::to_value(adjustments)
            .map_err(|e| ScanError::Storage(format!("could not serialize adjustments: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE location_scans
            SET total_products = $2,
                products_with_changes = $3,
                total_quantity_added = $4,
                total_quantity_removed = $5,
                product_changes_summary = $6,
                inventory_data = $7
            WHERE id = $1
            "#,
        )
        .bind(location_scan_id)
        .bind(summary.total_products)
        .bind(summary.products_with_changes)
        .bind(summary.total_quantity_added)
        .bind(summary.total_quantity_removed)
        .bind(&summary.product_changes_summary)
        .bind(inventory_data)
        .execute(&mut *self.tx)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn savepoint(&mut self, name: &str) -> ScanResult<()> {
        let name = Self::checked_savepoint(name)?;
        self.execute_raw(format!("SAVEPOINT {}", name)).await
    }

    async fn release_savepoint(&mut self, name: &str) -> ScanResult<()> {
        let name = Self::checked_savepoint(name)?;
        self.execute_raw(format!("RELEASE SAVEPOINT {}", name)).await
    }

    async fn rollback_to_savepoint(&mut self, name: &str) -> ScanResult<()> {
        let name = Self::checked_savepoint(name)?;
        self.execute_raw(format!("ROLLBACK TO SAVEPOINT {}", name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_savepoint_names_are_checked() {
        assert!(PgScanStore::checked_savepoint("inventory_item_3").is_ok());
        assert!(PgScanStore::checked_savepoint("x; DROP TABLE quants").is_err());
        assert!(PgScanStore::checked_savepoint("").is_err());
    }

    #[test]
    fn test_document_row_with_unknown_state_is_storage_error() {
        let row = DocumentRow {
            id: 1,
            kind: "transfer".to_string(),
            name: "WH/OUT/00001".to_string(),
            state: "archived".to_string(),
            direction: "outgoing".to_string(),
            partner_name: None,
            origin: None,
            sale_order: None,
            salesperson: None,
            shipping_method: None,
            scheduled_date: None,
            qr_code_data: None,
            created_at: Utc::now(),
        };
        assert!(matches!(Document::try_from(row), Err(ScanError::Storage(_))));
    }
}
