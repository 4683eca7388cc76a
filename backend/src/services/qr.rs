//! QR label service
//!
//! Tokens come from `shared::qr`; this module renders them to PNG and keeps
//! the stored token/image pair of documents and locations in sync.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use serde::Serialize;
use sqlx::PgPool;

use shared::qr::{self, QrPayload, QrTarget};
use shared::{Document, DocumentKind, Location};

use super::store::{DocumentRow, LocationRow, DOCUMENT_COLUMNS, LOCATION_COLUMNS};

use crate::config::QrConfig;
use crate::error::{AppError, AppResult};

/// Modules of blank border around the symbol
const QUIET_ZONE_MODULES: u32 = 4;

#[derive(Debug, Clone, Serialize)]
pub struct QrLabel {
    pub token: String,
    /// Base64 encoded PNG
    pub image: String,
    pub regenerated: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct StoredQr {
    id: i64,
    qr_code_data: Option<String>,
    qr_code_image: Option<String>,
}

/// Render a token as a base64 PNG
pub fn render_png(token: &str, config: &QrConfig) -> AppResult<String> {
    let code = QrCode::with_error_correction_level(token.as_bytes(), EcLevel::L)
        .map_err(|e| AppError::Internal(format!("QR encoding failed: {}", e)))?;

    let width = code.width() as u32;
    let colors = code.to_colors();
    let module = config.module_size.max(1);
    let quiet = if config.quiet_zone { QUIET_ZONE_MODULES } else { 0 };
    let side = (width + 2 * quiet) * module;

    let image = GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / module, y / module);
        if mx < quiet || my < quiet || mx >= quiet + width || my >= quiet + width {
            return Luma([255]);
        }
        match colors[((my - quiet) * width + (mx - quiet)) as usize] {
            Color::Dark => Luma([0]),
            Color::Light => Luma([255]),
        }
    });

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("PNG encoding failed: {}", e)))?;

    Ok(STANDARD.encode(png.into_inner()))
}

#[derive(Clone)]
pub struct QrService {
    db: PgPool,
    config: QrConfig,
}

impl QrService {
    pub fn new(db: PgPool, config: QrConfig) -> Self {
        Self { db, config }
    }

    pub fn decode(&self, token: &str) -> QrPayload {
        qr::decode(token)
    }

    /// Make sure a transfer or purchase intake carries an up to date label
    pub async fn ensure_document_qr(&self, document_id: i64) -> AppResult<QrLabel> {
        let query = format!("SELECT {} FROM documents WHERE id = $1", DOCUMENT_COLUMNS);
        let document: Document = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(document_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {}", document_id)))?
            .try_into()?;
        let target = match document.kind {
            DocumentKind::Transfer => QrTarget::Transfer,
            DocumentKind::PurchaseIntake => QrTarget::PurchaseIntake,
        };

        let stored = sqlx::query_as::<_, StoredQr>(
            "SELECT id, qr_code_data, qr_code_image FROM documents WHERE id = $1",
        )
        .bind(document_id)
        .fetch_one(&self.db)
        .await?;

        let token = qr::encode(document_id, target);
        self.refresh("documents", stored, token).await
    }

    /// Same for a storage location; the token uses the printed label id when set
    pub async fn ensure_location_qr(&self, location_id: i64) -> AppResult<QrLabel> {
        let query = format!("SELECT {} FROM locations WHERE id = $1", LOCATION_COLUMNS);
        let location: Location = sqlx::query_as::<_, LocationRow>(&query)
            .bind(location_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location {}", location_id)))?
            .try_into()?;

        let stored = sqlx::query_as::<_, StoredQr>(
            "SELECT id, qr_code_data, qr_code_image FROM locations WHERE id = $1",
        )
        .bind(location_id)
        .fetch_one(&self.db)
        .await?;

        let token = qr::encode(location.qr_token_id(), QrTarget::Location);
        self.refresh("locations", stored, token).await
    }

    async fn refresh(&self, table: &'static str, stored: StoredQr, token: String) -> AppResult<QrLabel> {
        let has_image = stored.qr_code_image.as_deref().is_some_and(|i| !i.is_empty());
        if !qr::needs_regeneration(stored.qr_code_data.as_deref(), has_image, &token) {
            return Ok(QrLabel {
                token,
                image: stored.qr_code_image.unwrap_or_default(),
                regenerated: false,
            });
        }

        let image = render_png(&token, &self.config)?;
        let statement = format!(
            "UPDATE {} SET qr_code_data = $2, qr_code_image = $3 WHERE id = $1",
            table
        );
        sqlx::query(&statement)
            .bind(stored.id)
            .bind(&token)
            .bind(&image)
            .execute(&self.db)
            .await?;

        tracing::info!(table, id = stored.id, token = %token, "QR label regenerated");

        Ok(QrLabel {
            token,
            image,
            regenerated: true,
        })
    }
}
