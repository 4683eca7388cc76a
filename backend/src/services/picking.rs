//! Document detail for the handheld client

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use shared::ledger::{self, WorkflowStatus};
use shared::store::ScanStore;
use shared::{DocumentKind, DocumentState, Language, LineGroup, PickingDirection, ScanHistoryEntry};

use super::store::PgScanStore;
use crate::error::AppResult;

#[derive(Debug, Serialize)]
pub struct PickingDetail {
    pub id: i64,
    pub name: String,
    pub kind: DocumentKind,
    pub state: DocumentState,
    pub state_label: String,
    pub direction: PickingDirection,
    pub partner_name: Option<String>,
    pub origin: Option<String>,
    pub sale_order: Option<String>,
    pub shipping_method: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub status: WorkflowStatus,
    /// Demand lines merged by product, unit and source location
    pub groups: Vec<LineGroup>,
    pub history: Vec<ScanHistoryEntry>,
}

#[derive(Clone)]
pub struct PickingService {
    db: PgPool,
}

impl PickingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn detail(&self, document_id: i64, language: Language) -> AppResult<PickingDetail> {
        // Read-only; the transaction only gives a consistent snapshot and is
        // rolled back on drop.
        let mut store = PgScanStore::begin(&self.db).await?;
        let document = store.document(document_id).await?;
        let history = store.scan_history(document_id).await?;
        let lines = store.demand_lines(document_id).await?;

        Ok(PickingDetail {
            id: document.id,
            state_label: document.state.label(language).to_string(),
            direction: document.effective_direction(),
            name: document.name,
            kind: document.kind,
            state: document.state,
            partner_name: document.partner_name,
            origin: document.origin,
            sale_order: document.sale_order,
            shipping_method: document.shipping_method,
            scheduled_date: document.scheduled_date,
            status: WorkflowStatus::from_history(&history),
            groups: ledger::group_demand_lines(&lines),
            history,
        })
    }
}
