//! Outbound dashboard listing models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{DocumentState, ScanType};
use crate::types::{Language, LabeledValue};

/// Which column a free-text search matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    #[default]
    All,
    Date,
    SaleOrder,
    PickingName,
    Customer,
    ShippingMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Date,
    ScanType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardFilters {
    pub scan_type: Option<ScanType>,
    pub state: Option<DocumentState>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Listing request body
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DashboardListParams {
    #[serde(default)]
    pub filters: DashboardFilters,
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[serde(default)]
    pub search_field: SearchField,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1))]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl DashboardListParams {
    /// Search term with surrounding whitespace removed, if any is left
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// One row of the outbound listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardItem {
    pub id: i64,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
    pub sale_order: String,
    pub customer: String,
    pub salesperson: String,
    pub shipping_method: String,
    pub scan_type: Option<ScanType>,
    pub scan_type_label: String,
    pub scan_type_priority: i32,
    pub state: DocumentState,
    pub state_label: String,
    pub origin: String,
}

/// Raw listing row before labels are applied
#[derive(Debug, Clone)]
pub struct DashboardRow {
    pub id: i64,
    pub name: String,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub sale_order: Option<String>,
    pub customer: Option<String>,
    pub salesperson: Option<String>,
    pub shipping_method: Option<String>,
    pub latest_scan_type: Option<ScanType>,
    pub state: DocumentState,
    pub origin: Option<String>,
}

impl DashboardRow {
    pub fn into_item(self, language: Language) -> DashboardItem {
        DashboardItem {
            id: self.id,
            name: self.name,
            date: self.scheduled_date,
            sale_order: self.sale_order.unwrap_or_default(),
            customer: self.customer.unwrap_or_default(),
            salesperson: self.salesperson.unwrap_or_default(),
            shipping_method: self.shipping_method.unwrap_or_default(),
            scan_type: self.latest_scan_type,
            scan_type_label: self
                .latest_scan_type
                .map(|t| t.label(language).to_string())
                .unwrap_or_default(),
            scan_type_priority: ScanType::dashboard_priority(self.latest_scan_type),
            state: self.state,
            state_label: self.state.label(language).to_string(),
            origin: self.origin.unwrap_or_default(),
        }
    }
}

/// Fixed filter dropdown contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub scan_types: Vec<LabeledValue>,
    pub states: Vec<LabeledValue>,
}

impl FilterOptions {
    pub fn localized(language: Language) -> Self {
        let scan_types = [
            ScanType::Prepare,
            ScanType::Shipping,
            ScanType::Receive,
            ScanType::Checking,
        ]
        .into_iter()
        .map(|t| LabeledValue::new(t.as_str(), t.label(language)))
        .collect();

        let states = DocumentState::ALL
            .into_iter()
            .map(|s| LabeledValue::new(s.as_str(), s.label(language)))
            .collect();

        Self { scan_types, states }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SuggestionParams {
    #[serde(default)]
    pub search_field: SearchField,
    #[serde(default)]
    pub search_term: String,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,
}

/// Outbound document prepared for truck or bus dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedDelivery {
    pub id: i64,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
    pub sale_order: String,
    pub customer: String,
    pub salesperson: String,
    pub shipping_method: String,
    pub scan_date: Option<DateTime<Utc>>,
    pub scan_user: String,
}
