//! QR label handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use shared::qr::QrPayload;

use crate::error::{rpc, RpcResponse};
use crate::middleware::{CurrentUser, RequestLanguage};
use crate::services::qr::QrLabel;
use crate::services::QrService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    pub token: String,
}

fn service(state: &AppState) -> QrService {
    QrService::new(state.db.clone(), state.config.qr.clone())
}

/// Decode a scanned token. Unreadable tokens are not an error: the payload
/// comes back with `is_valid: false`.
pub async fn decode_qr(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Json(body): Json<DecodeRequest>,
) -> Json<RpcResponse<QrPayload>> {
    rpc(language, Ok(service(&state).decode(&body.token)))
}

pub async fn transfer_qr(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Path(document_id): Path<i64>,
) -> Json<RpcResponse<QrLabel>> {
    rpc(language, service(&state).ensure_document_qr(document_id).await)
}

pub async fn location_qr(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Path(location_id): Path<i64>,
) -> Json<RpcResponse<QrLabel>> {
    rpc(language, service(&state).ensure_location_qr(location_id).await)
}
