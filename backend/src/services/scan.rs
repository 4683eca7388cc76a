//! Scan service: runs processors inside one database transaction

use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use shared::processor::{Processor, ProcessorFactory, ScanProcessor, ScanSubject};
use shared::{Actor, InventoryCountItem, InventoryCountResult, ScanOutcome, ScanParams, ScanType};

use super::store::PgScanStore;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ScanService {
    db: PgPool,
}

impl ScanService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a scan on a document.
    ///
    /// The document row stays locked until commit; on any error the
    /// transaction is dropped and nothing is written.
    pub async fn scan_document(
        &self,
        document_id: i64,
        scan_type: ScanType,
        actor: &Actor,
        params: ScanParams,
    ) -> AppResult<ScanOutcome> {
        let span = tracing::info_span!(
            "scan",
            request_id = %Uuid::new_v4(),
            document_id,
            scan_type = %scan_type,
        );

        async move {
            let mut store = PgScanStore::begin(&self.db).await?;
            let document = store.lock_document(document_id).await?;
            let processor = ScanProcessor::for_document(document.kind, scan_type)?;

            tracing::debug!(state = %document.state, "Processing scan");
            let outcome = processor.process_scan(&mut store, &document, actor, params).await?;

            store.commit().await?;
            Ok::<_, AppError>(outcome)
        }
        .instrument(span)
        .await
    }

    /// Count the stock of one location. Individual items may fail without
    /// aborting the batch.
    pub async fn count_location(
        &self,
        location_id: i64,
        actor: &Actor,
        items: Vec<InventoryCountItem>,
        note: Option<String>,
    ) -> AppResult<InventoryCountResult> {
        let span = tracing::info_span!(
            "inventory_count",
            request_id = %Uuid::new_v4(),
            location_id,
            items = items.len(),
        );

        async move {
            let Processor::InventoryCount(processor) =
                ProcessorFactory::resolve(ScanSubject::Location, ScanType::InventoryCount)?
            else {
                return Err(AppError::Internal("inventory count resolved to a document processor".into()));
            };

            let mut store = PgScanStore::begin(&self.db).await?;
            let location = store.lock_location(location_id).await?;
            let result = processor.process(&mut store, &location, actor, items, note).await?;
            store.commit().await?;

            tracing::info!(
                location_scan_id = result.location_scan_id,
                adjusted = result.adjusted_count(),
                failed = result.failed_count(),
                "Inventory count recorded"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }
}
