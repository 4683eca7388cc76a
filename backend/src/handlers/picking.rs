//! Document detail and scan handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use shared::{Language, ScanOutcome, ScanParams, ScanType};

use crate::error::{rpc, AppResult, RpcResponse};
use crate::middleware::{CurrentUser, RequestLanguage};
use crate::services::picking::PickingDetail;
use crate::services::{PickingService, ScanService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PickingRequest {
    pub picking_id: i64,
}

/// Prepare and package scans always target a transfer
#[derive(Debug, Deserialize)]
pub struct PickingScanRequest {
    pub picking_id: i64,
    #[serde(flatten)]
    pub params: ScanParams,
}

#[derive(Debug, Deserialize)]
pub struct DocumentScanRequest {
    #[serde(alias = "picking_id")]
    pub document_id: i64,
    pub scan_type: ScanType,
    #[serde(flatten)]
    pub params: ScanParams,
}

fn validate_params(params: &ScanParams) -> AppResult<()> {
    for image in params.images.iter().flatten() {
        image.validate()?;
    }
    for confirmation in &params.confirmations {
        confirmation.validate()?;
    }
    Ok(())
}

fn success_message(scan_type: ScanType, language: Language) -> String {
    match language {
        Language::English => format!("Scan recorded: {}", scan_type.label(language)),
        Language::Vietnamese => format!("Đã ghi nhận: {}", scan_type.label(language)),
    }
}

async fn run_scan(
    state: &AppState,
    user: &CurrentUser,
    document_id: i64,
    scan_type: ScanType,
    params: ScanParams,
) -> AppResult<ScanOutcome> {
    validate_params(&params)?;
    ScanService::new(state.db.clone())
        .scan_document(document_id, scan_type, &user.0.actor(), params)
        .await
}

fn scan_response(
    language: Language,
    scan_type: ScanType,
    result: AppResult<ScanOutcome>,
) -> Json<RpcResponse<ScanOutcome>> {
    match result {
        Ok(outcome) => Json(RpcResponse::success_with_message(
            outcome,
            success_message(scan_type, language),
        )),
        Err(e) => e.into_rpc(language),
    }
}

/// Document summary with workflow status and grouped lines
pub async fn picking_detail(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Json(body): Json<PickingRequest>,
) -> Json<RpcResponse<PickingDetail>> {
    let service = PickingService::new(state.db.clone());
    rpc(language, service.detail(body.picking_id, language).await)
}

pub async fn prepare_scan(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    user: CurrentUser,
    Json(body): Json<PickingScanRequest>,
) -> Json<RpcResponse<ScanOutcome>> {
    let result = run_scan(&state, &user, body.picking_id, ScanType::Prepare, body.params).await;
    scan_response(language, ScanType::Prepare, result)
}

/// Shipping scan; finalizes the transfer unless the client opts out
pub async fn package_scan(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    user: CurrentUser,
    Json(body): Json<PickingScanRequest>,
) -> Json<RpcResponse<ScanOutcome>> {
    let result = run_scan(&state, &user, body.picking_id, ScanType::Shipping, body.params).await;
    scan_response(language, ScanType::Shipping, result)
}

/// Any supported (document kind, scan type) pair
pub async fn document_scan(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    user: CurrentUser,
    Json(body): Json<DocumentScanRequest>,
) -> Json<RpcResponse<ScanOutcome>> {
    let result = run_scan(&state, &user, body.document_id, body.scan_type, body.params).await;
    scan_response(language, body.scan_type, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_package_request_flattens_scan_params() {
        let body: PickingScanRequest = serde_json::from_str(
            r#"{
                "picking_id": 12,
                "shipping_type": "viettelpost",
                "shipping_phone": "0912345678",
                "note": "Giao buổi sáng"
            }"#,
        )
        .unwrap();
        assert_eq!(body.picking_id, 12);
        assert_eq!(body.params.shipping_phone.as_deref(), Some("0912345678"));
        assert!(body.params.confirmations.is_empty());
    }

    #[test]
    fn test_document_scan_accepts_picking_id_and_move_ids() {
        let body: DocumentScanRequest = serde_json::from_str(
            r#"{
                "picking_id": 4,
                "scan_type": "checking",
                "confirmations": [{"move_ids": [1, 2], "confirmed_qty": "8"}]
            }"#,
        )
        .unwrap();
        assert_eq!(body.document_id, 4);
        assert_eq!(body.scan_type, ScanType::Checking);
        assert_eq!(body.params.confirmations[0].line_ids, vec![1, 2]);
        assert_eq!(body.params.confirmations[0].confirmed_qty, Decimal::from(8));
    }

    #[test]
    fn test_prepare_request_from_mobile_client() {
        let body: PickingScanRequest = serde_json::from_str(
            r#"{
                "picking_id": 9,
                "scan_note": "Đủ hàng",
                "move_line_confirms": [
                    {"move_ids": [51, 52], "product_id": 100, "quantity_confirmed": 8, "confirm_note": "thiếu 2"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(body.picking_id, 9);
        assert_eq!(body.params.note.as_deref(), Some("Đủ hàng"));
        assert_eq!(body.params.confirmations.len(), 1);
        let confirmation = &body.params.confirmations[0];
        assert_eq!(confirmation.line_ids, vec![51, 52]);
        assert_eq!(confirmation.product_id, Some(100));
        assert_eq!(confirmation.confirmed_qty, Decimal::from(8));
        assert_eq!(confirmation.note.as_deref(), Some("thiếu 2"));
        assert!(validate_params(&body.params).is_ok());
    }

    #[test]
    fn test_empty_confirmation_lines_are_rejected() {
        let params: ScanParams = serde_json::from_str(
            r#"{"confirmations": [{"line_ids": [], "confirmed_qty": "1"}]}"#,
        )
        .unwrap();
        assert!(validate_params(&params).is_err());
    }
}
