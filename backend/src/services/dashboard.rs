//! Outbound transfer dashboard read API

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use shared::validation::is_searchable_term;
use shared::{
    DashboardItem, DashboardListParams, DashboardRow, DocumentState, FilterOptions, Language, LabeledValue, Pagination,
    PaginationMeta, PreparedDelivery, ScanType, SearchField, SortBy, SuggestionParams,
};

use crate::config::DashboardConfig;
use crate::error::{AppError, AppResult};

/// Latest scan per document, joined onto `documents d`
const FROM_OUTBOUND: &str = r#"
    FROM documents d
    LEFT JOIN LATERAL (
        SELECT sh.scan_type
        FROM scan_history sh
        WHERE sh.document_id = d.id
        ORDER BY sh.scan_date DESC, sh.id DESC
        LIMIT 1
    ) ls ON TRUE
    WHERE d.kind = 'transfer' AND d.direction = 'outgoing'
"#;

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub data: Vec<DashboardItem>,
    #[serde(flatten)]
    pub meta: PaginationMeta,
}

#[derive(Debug, FromRow)]
struct ListRow {
    id: i64,
    name: String,
    scheduled_date: Option<DateTime<Utc>>,
    sale_order: Option<String>,
    partner_name: Option<String>,
    salesperson: Option<String>,
    shipping_method: Option<String>,
    latest_scan_type: Option<String>,
    state: String,
    origin: Option<String>,
}

impl TryFrom<ListRow> for DashboardRow {
    type Error = AppError;

    fn try_from(row: ListRow) -> Result<Self, Self::Error> {
        let latest_scan_type = row
            .latest_scan_type
            .map(|s| s.parse::<ScanType>())
            .transpose()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(DashboardRow {
            id: row.id,
            name: row.name,
            scheduled_date: row.scheduled_date,
            sale_order: row.sale_order,
            customer: row.partner_name,
            salesperson: row.salesperson,
            shipping_method: row.shipping_method,
            latest_scan_type,
            state: row
                .state
                .parse::<DocumentState>()
                .map_err(|e| AppError::Internal(e.to_string()))?,
            origin: row.origin,
        })
    }
}

#[derive(Debug, FromRow)]
struct PreparedRow {
    id: i64,
    name: String,
    scheduled_date: Option<DateTime<Utc>>,
    sale_order: Option<String>,
    partner_name: Option<String>,
    salesperson: Option<String>,
    shipping_method: Option<String>,
    scan_date: DateTime<Utc>,
    scan_user: Option<String>,
}

/// Column matched by a single-field search, `None` for `all`
fn search_column(field: SearchField) -> Option<&'static str> {
    match field {
        SearchField::All => None,
        SearchField::Date => Some("to_char(d.scheduled_date, 'YYYY-MM-DD')"),
        SearchField::SaleOrder => Some("d.sale_order"),
        SearchField::PickingName => Some("d.name"),
        SearchField::Customer => Some("d.partner_name"),
        SearchField::ShippingMethod => Some("d.shipping_method"),
    }
}

fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, params: &DashboardListParams) {
    let filters = &params.filters;

    if let Some(scan_type) = filters.scan_type {
        builder.push(" AND ls.scan_type = ").push_bind(scan_type.as_str());
    }
    if let Some(state) = filters.state {
        builder.push(" AND d.state = ").push_bind(state.as_str());
    }
    if let Some(date_from) = filters.date_from {
        builder.push(" AND d.scheduled_date >= ").push_bind(date_from).push("::DATE");
    }
    if let Some(date_to) = filters.date_to {
        // Inclusive of the whole last day
        builder
            .push(" AND d.scheduled_date < (")
            .push_bind(date_to)
            .push("::DATE + 1)");
    }

    if let Some(term) = params.search_term() {
        let pattern = format!("%{}%", term);
        match search_column(params.search_field) {
            Some(column) => {
                builder.push(format!(" AND {} ILIKE ", column)).push_bind(pattern);
            }
            None => {
                builder.push(" AND (");
                let columns = [
                    "d.name",
                    "d.origin",
                    "d.partner_name",
                    "d.sale_order",
                    "d.salesperson",
                    "d.shipping_method",
                ];
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        builder.push(" OR ");
                    }
                    builder.push(format!("{} ILIKE ", column)).push_bind(pattern.clone());
                }
                builder.push(")");
            }
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
    config: DashboardConfig,
}

impl DashboardService {
    pub fn new(db: PgPool, config: DashboardConfig) -> Self {
        Self { db, config }
    }

    /// Paginated outbound transfers with their latest scan
    pub async fn list(&self, params: &DashboardListParams, language: Language) -> AppResult<DashboardPage> {
        let pagination = Pagination::clamped(
            params.page,
            params.limit,
            self.config.default_page_size,
            self.config.max_page_size,
        );

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(FROM_OUTBOUND);
        push_conditions(&mut count, params);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT d.id, d.name, d.scheduled_date, d.sale_order, d.partner_name, d.salesperson, \
             d.shipping_method, ls.scan_type AS latest_scan_type, d.state, d.origin",
        );
        query.push(FROM_OUTBOUND);
        push_conditions(&mut query, params);

        let order = params.sort_order.as_sql();
        match params.sort_by {
            SortBy::Date => {
                query.push(format!(" ORDER BY d.scheduled_date {} NULLS LAST, d.id DESC", order));
            }
            SortBy::ScanType => {
                query.push(format!(
                    " ORDER BY CASE ls.scan_type WHEN 'prepare' THEN 2 WHEN 'shipping' THEN 3 ELSE 99 END {}, \
                     d.scheduled_date DESC NULLS LAST, d.id DESC",
                    order
                ));
            }
        }
        query
            .push(" LIMIT ")
            .push_bind(i64::from(pagination.per_page))
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows: Vec<ListRow> = query.build_query_as().fetch_all(&self.db).await?;
        let data = rows
            .into_iter()
            .map(|row| DashboardRow::try_from(row).map(|row| row.into_item(language)))
            .collect::<AppResult<Vec<_>>>()?;

        let total = total.max(0) as u64;
        Ok(DashboardPage {
            data,
            meta: PaginationMeta {
                page: pagination.page,
                limit: pagination.per_page,
                total,
                total_pages: pagination.total_pages(total),
            },
        })
    }

    pub fn filters(&self, language: Language) -> FilterOptions {
        FilterOptions::localized(language)
    }

    /// Distinct values of one field containing the term
    pub async fn suggestions(&self, params: &SuggestionParams) -> AppResult<Vec<LabeledValue>> {
        let term = params.search_term.trim();
        let Some(column) = search_column(params.search_field) else {
            return Ok(Vec::new());
        };
        if !is_searchable_term(term) {
            return Ok(Vec::new());
        }

        let limit = params
            .limit
            .unwrap_or(self.config.suggestion_limit)
            .clamp(1, self.config.suggestion_limit.max(1));

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT DISTINCT {} AS value", column));
        query.push(FROM_OUTBOUND);
        query
            .push(format!(" AND {} ILIKE ", column))
            .push_bind(format!("%{}%", term))
            .push(" ORDER BY value DESC LIMIT ")
            .push_bind(i64::from(limit));

        let values: Vec<String> = query.build_query_scalar().fetch_all(&self.db).await?;
        Ok(values.into_iter().map(LabeledValue::same).collect())
    }

    /// Prepared outbound transfers travelling by truck or bus
    pub async fn prepared_deliveries(&self) -> AppResult<Vec<PreparedDelivery>> {
        let rows = sqlx::query_as::<_, PreparedRow>(
            r#"
            SELECT d.id, d.name, d.scheduled_date, d.sale_order, d.partner_name, d.salesperson,
                   d.shipping_method, ps.scan_date, u.name AS scan_user
            FROM documents d
            JOIN LATERAL (
                SELECT sh.scan_date, sh.user_id
                FROM scan_history sh
                WHERE sh.document_id = d.id AND sh.scan_type = 'prepare'
                ORDER BY sh.scan_date DESC, sh.id DESC
                LIMIT 1
            ) ps ON TRUE
            LEFT JOIN users u ON u.id = ps.user_id
            WHERE d.kind = 'transfer'
              AND d.direction = 'outgoing'
              AND (d.shipping_method ILIKE '%xe tải%' OR d.shipping_method ILIKE '%xe bus%')
            ORDER BY d.scheduled_date DESC NULLS LAST, d.id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PreparedDelivery {
                id: row.id,
                name: row.name,
                date: row.scheduled_date,
                sale_order: row.sale_order.unwrap_or_default(),
                customer: row.partner_name.unwrap_or_default(),
                salesperson: row.salesperson.unwrap_or_default(),
                shipping_method: row.shipping_method.unwrap_or_default(),
                scan_date: Some(row.scan_date),
                scan_user: row.scan_user.unwrap_or_default(),
            })
            .collect())
    }
}
