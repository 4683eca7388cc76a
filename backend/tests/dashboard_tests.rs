//! Dashboard and detail view tests
//!
//! Cover the read side: request parsing, labels, sort weights and the
//! grouped line view the handheld client confirms against.

mod common;

use common::*;
use shared::ledger::{group_demand_lines, WorkflowStage, WorkflowStatus};
use shared::store::ScanStore;
use shared::{
    DashboardListParams, DashboardRow, DocumentState, FilterOptions, Language, ScanType, SearchField,
    SortBy, SortOrder, SuggestionParams,
};
use tokio_test::block_on;
use validator::Validate;

fn row(id: i64, latest_scan_type: Option<ScanType>) -> DashboardRow {
    DashboardRow {
        id,
        name: format!("WH/OUT/{:05}", id),
        scheduled_date: Some(base_time()),
        sale_order: Some(format!("SO{:04}", id)),
        customer: Some("Công ty Minh Phát".to_string()),
        salesperson: None,
        shipping_method: Some("Xe tải".to_string()),
        latest_scan_type,
        state: DocumentState::Assigned,
        origin: None,
    }
}

#[test]
fn test_list_params_from_client_body() {
    let params: DashboardListParams = serde_json::from_str(
        r#"{
            "filters": {"scan_type": "prepare", "state": "assigned", "date_from": "2024-06-01"},
            "search": "  SO0012 ",
            "search_field": "sale_order",
            "page": 2,
            "limit": 50,
            "sort_by": "scan_type",
            "sort_order": "asc"
        }"#,
    )
    .unwrap();

    assert_eq!(params.filters.scan_type, Some(ScanType::Prepare));
    assert_eq!(params.filters.state, Some(DocumentState::Assigned));
    assert!(params.filters.date_to.is_none());
    assert_eq!(params.search_term(), Some("SO0012"));
    assert_eq!(params.search_field, SearchField::SaleOrder);
    assert_eq!(params.sort_by, SortBy::ScanType);
    assert_eq!(params.sort_order, SortOrder::Asc);
    assert!(params.validate().is_ok());

    let zero_page: DashboardListParams = serde_json::from_str(r#"{"page": 0}"#).unwrap();
    assert!(zero_page.validate().is_err());
}

#[test]
fn test_legacy_scan_type_alias() {
    let params: DashboardListParams =
        serde_json::from_str(r#"{"filters": {"scan_type": "kiemke"}}"#).unwrap();
    assert_eq!(params.filters.scan_type, Some(ScanType::InventoryCount));
}

#[test]
fn test_rows_sort_by_scan_priority() {
    let mut items: Vec<_> = [None, Some(ScanType::Shipping), Some(ScanType::Prepare)]
        .into_iter()
        .enumerate()
        .map(|(i, scan_type)| row(i as i64 + 1, scan_type).into_item(Language::Vietnamese))
        .collect();
    items.sort_by_key(|item| item.scan_type_priority);

    let order: Vec<_> = items.iter().map(|item| item.scan_type).collect();
    assert_eq!(order, vec![Some(ScanType::Prepare), Some(ScanType::Shipping), None]);
    assert_eq!(items[1].scan_type_label, "Đóng gói");
}

#[test]
fn test_filter_options_in_both_languages() {
    let vi = FilterOptions::localized(Language::Vietnamese);
    let en = FilterOptions::localized(Language::English);

    assert_eq!(vi.scan_types.len(), 4);
    assert_eq!(vi.scan_types[0].value, "prepare");
    assert_eq!(en.scan_types[0].label, "Prepared");
    let cancel = en.states.iter().find(|s| s.value == "cancel").unwrap();
    assert_eq!(cancel.label, "Cancelled");
}

#[test]
fn test_suggestion_limit_is_bounded() {
    let ok: SuggestionParams =
        serde_json::from_str(r#"{"search_field": "customer", "search_term": "Minh", "limit": 10}"#).unwrap();
    assert!(ok.validate().is_ok());

    let too_many: SuggestionParams = serde_json::from_str(r#"{"limit": 500}"#).unwrap();
    assert_eq!(too_many.search_field, SearchField::All);
    assert!(too_many.validate().is_err());
}

#[test]
fn test_detail_groups_and_status_from_store() {
    let mut cancelled = line(34, 3, 100, "9");
    cancelled.cancelled = true;
    let mut store = MemoryStore::with_lines(vec![
        line(33, 3, 100, "4"),
        line(31, 3, 100, "5"),
        line(32, 3, 200, "1"),
        cancelled,
    ]);
    store.seed_scan(3, ScanType::Prepare);

    let lines = block_on(store.demand_lines(3)).unwrap();
    let history = block_on(store.scan_history(3)).unwrap();

    let groups = group_demand_lines(&lines);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].line_ids, vec![31, 33]);
    assert_eq!(groups[0].demand_qty, dec("9"));
    assert_eq!(groups[1].line_ids, vec![32]);

    let status = WorkflowStatus::from_history(&history);
    assert_eq!(status.stage, WorkflowStage::Prepared);
    assert_eq!(status.latest_scan_type, Some(ScanType::Prepare));
    assert!(status.last_scan_date.is_some());
}
