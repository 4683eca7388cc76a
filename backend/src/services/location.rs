//! Read helpers for location inventory counting

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use shared::validation::{is_searchable_term, MIN_SEARCH_TERM_CHARS};
use shared::{LocationProduct, ProductLocation, ProductSearchResult};

use crate::error::{AppError, AppResult};

#[derive(Debug, FromRow)]
struct LocationProductRow {
    quant_id: i64,
    product_id: i64,
    product_name: String,
    default_code: Option<String>,
    uom: String,
    quantity: Decimal,
    reserved_quantity: Decimal,
}

#[derive(Debug, FromRow)]
struct ProductLocationRow {
    location_id: i64,
    location_name: String,
    uom: String,
    quantity: Decimal,
    reserved_quantity: Decimal,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    default_code: Option<String>,
    barcode: Option<String>,
    uom: String,
}

#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

impl LocationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn ensure_location(&self, location_id: i64) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1)")
            .bind(location_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Location {}", location_id)));
        }
        Ok(())
    }

    /// Quants currently stored in a location
    pub async fn products(&self, location_id: i64) -> AppResult<Vec<LocationProduct>> {
        self.ensure_location(location_id).await?;

        let rows = sqlx::query_as::<_, LocationProductRow>(
            r#"
            SELECT q.id AS quant_id, q.product_id, p.name AS product_name, p.default_code, p.uom,
                   q.quantity, q.reserved_quantity
            FROM quants q
            JOIN products p ON p.id = q.product_id
            WHERE q.location_id = $1 AND q.quantity <> 0
            ORDER BY p.name, q.id
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LocationProduct {
                available_quantity: row.quantity - row.reserved_quantity,
                quant_id: row.quant_id,
                product_id: row.product_id,
                product_name: row.product_name,
                default_code: row.default_code,
                uom: row.uom,
                quantity: row.quantity,
                reserved_quantity: row.reserved_quantity,
            })
            .collect())
    }

    /// Other internal locations holding stock of a product
    pub async fn other_locations(
        &self,
        product_id: i64,
        exclude_location_id: Option<i64>,
    ) -> AppResult<Vec<ProductLocation>> {
        let rows = sqlx::query_as::<_, ProductLocationRow>(
            r#"
            SELECT q.location_id, l.complete_name AS location_name, p.uom,
                   q.quantity, q.reserved_quantity
            FROM quants q
            JOIN locations l ON l.id = q.location_id
            JOIN products p ON p.id = q.product_id
            WHERE q.product_id = $1
              AND q.quantity > 0
              AND l.usage = 'internal'
              AND l.active
              AND ($2::BIGINT IS NULL OR q.location_id <> $2)
            ORDER BY q.quantity DESC, l.complete_name
            "#,
        )
        .bind(product_id)
        .bind(exclude_location_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductLocation {
                available_quantity: row.quantity - row.reserved_quantity,
                location_id: row.location_id,
                location_name: row.location_name,
                uom: row.uom,
                quantity: row.quantity,
                reserved_quantity: row.reserved_quantity,
            })
            .collect())
    }

    /// Products matching a name, internal reference or barcode
    pub async fn search_products(&self, term: &str, limit: u32) -> AppResult<Vec<ProductSearchResult>> {
        let term = term.trim();
        if !is_searchable_term(term) {
            return Err(AppError::validation(
                "search_term",
                format!("Search term must have at least {} characters", MIN_SEARCH_TERM_CHARS),
                format!("Từ khóa tìm kiếm phải có ít nhất {} ký tự", MIN_SEARCH_TERM_CHARS),
            ));
        }

        let pattern = format!("%{}%", term);
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, default_code, barcode, uom
            FROM products
            WHERE active
              AND (name ILIKE $1 OR default_code ILIKE $1 OR barcode ILIKE $1)
            ORDER BY COALESCE(barcode = $2 OR default_code = $2, FALSE) DESC, name
            LIMIT $3
            "#,
        )
        .bind(&pattern)
        .bind(term)
        .bind(i64::from(limit))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductSearchResult {
                id: row.id,
                name: row.name,
                default_code: row.default_code,
                barcode: row.barcode,
                uom: row.uom,
            })
            .collect())
    }
}
