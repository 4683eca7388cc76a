//! Queries over the scan history ledger
//!
//! Workflow markers are never stored. They are recomputed from ledger rows
//! whenever they are needed, so they cannot drift from the history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{DemandLine, LineGroup, ScanHistoryEntry, ScanType};

/// Most recent entry of a given type
pub fn latest_of_type(history: &[ScanHistoryEntry], scan_type: ScanType) -> Option<&ScanHistoryEntry> {
    history
        .iter()
        .filter(|entry| entry.scan_type == scan_type)
        .max_by_key(|entry| (entry.scan_date, entry.id))
}

pub fn has_scan(history: &[ScanHistoryEntry], scan_type: ScanType) -> bool {
    history.iter().any(|entry| entry.scan_type == scan_type)
}

pub fn is_prepared(history: &[ScanHistoryEntry]) -> bool {
    has_scan(history, ScanType::Prepare)
}

pub fn is_shipped(history: &[ScanHistoryEntry]) -> bool {
    has_scan(history, ScanType::Shipping)
}

pub fn is_received(history: &[ScanHistoryEntry]) -> bool {
    has_scan(history, ScanType::Receive)
}

pub fn is_checked(history: &[ScanHistoryEntry]) -> bool {
    has_scan(history, ScanType::Checking)
}

pub fn last_scan_date(history: &[ScanHistoryEntry]) -> Option<DateTime<Utc>> {
    history.iter().map(|entry| entry.scan_date).max()
}

/// Type of the newest entry; ties on date resolve to the higher id
pub fn latest_scan_type(history: &[ScanHistoryEntry]) -> Option<ScanType> {
    history
        .iter()
        .max_by_key(|entry| (entry.scan_date, entry.id))
        .map(|entry| entry.scan_type)
}

/// Coarse position of a document in its workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Unscanned,
    Prepared,
    Shipped,
    Received,
    Checked,
}

/// Derived workflow markers for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStatus {
    pub is_prepared: bool,
    pub is_shipped: bool,
    pub is_received: bool,
    pub is_checked: bool,
    pub latest_scan_type: Option<ScanType>,
    pub last_scan_date: Option<DateTime<Utc>>,
    pub stage: WorkflowStage,
}

impl WorkflowStatus {
    pub fn from_history(history: &[ScanHistoryEntry]) -> Self {
        let is_prepared = is_prepared(history);
        let is_shipped = is_shipped(history);
        let is_received = is_received(history);
        let is_checked = is_checked(history);

        let stage = if is_shipped {
            WorkflowStage::Shipped
        } else if is_prepared {
            WorkflowStage::Prepared
        } else if is_checked {
            WorkflowStage::Checked
        } else if is_received {
            WorkflowStage::Received
        } else {
            WorkflowStage::Unscanned
        };

        Self {
            is_prepared,
            is_shipped,
            is_received,
            is_checked,
            latest_scan_type: latest_scan_type(history),
            last_scan_date: last_scan_date(history),
            stage,
        }
    }
}

/// Merge non-cancelled lines sharing product, unit and location
pub fn group_demand_lines(lines: &[DemandLine]) -> Vec<LineGroup> {
    let mut groups: BTreeMap<(i64, String, i64), LineGroup> = BTreeMap::new();

    for line in lines.iter().filter(|line| !line.cancelled) {
        let key = (line.product_id, line.uom.clone(), line.location_id);
        let group = groups.entry(key).or_insert_with(|| LineGroup {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            uom: line.uom.clone(),
            location_id: line.location_id,
            location_name: line.location_name.clone(),
            line_ids: Vec::new(),
            demand_qty: Decimal::ZERO,
            quantity_done: Decimal::ZERO,
        });
        group.line_ids.push(line.id);
        group.demand_qty += line.demand_qty;
        group.quantity_done += line.quantity_done;
    }

    let mut groups: Vec<LineGroup> = groups.into_values().collect();
    for group in &mut groups {
        group.line_ids.sort_unstable();
    }
    groups.sort_by_key(|group| group.line_ids.first().copied());
    groups
}
