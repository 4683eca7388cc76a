//! Error handling for the QR Warehouse Scan Platform
//!
//! Provides consistent error responses in Vietnamese and English, either as
//! REST-style `{error: {...}}` bodies or as `{status: "error", message}` RPC
//! envelopes for the handheld client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use shared::{Language, ScanError};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, message_vi: String },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_vi: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Scan workflow errors
    #[error(transparent)]
    Scan(#[from] ScanError),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_vi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: impl Into<String>, message_vi: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message_en: message_en.into(),
            message_vi: message_vi.into(),
            field: None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>, message_vi: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
            message_vi: message_vi.into(),
        }
    }

    /// System failures are logged and never shown to users in detail
    pub fn is_system(&self) -> bool {
        match self {
            AppError::Scan(err) => !err.is_user_facing(),
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => true,
            _ => false,
        }
    }

    fn detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_CREDENTIALS",
                    "Invalid login or password",
                    "Tên đăng nhập hoặc mật khẩu không đúng",
                ),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired", "Phiên đăng nhập đã hết hạn"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token", "Mã xác thực không hợp lệ"),
            ),
            AppError::Unauthorized { message, message_vi } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone(), message_vi.clone()),
            ),
            AppError::Validation {
                field,
                message,
                message_vi,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_vi.clone())
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "VALIDATION_ERROR",
                    msg.clone(),
                    format!("Dữ liệu không hợp lệ: {}", msg),
                ),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("Không tìm thấy {}", resource),
                ),
            ),
            AppError::Scan(err) => {
                let (status, code) = match err {
                    ScanError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "SCAN_REJECTED"),
                    ScanError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    ScanError::PermissionDenied { .. } => (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSIONS"),
                    ScanError::Finalize(_) => (StatusCode::UNPROCESSABLE_ENTITY, "FINALIZE_FAILED"),
                    ScanError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
                };
                (
                    status,
                    ErrorDetail::new(
                        code,
                        err.localized(Language::English),
                        err.localized(Language::Vietnamese),
                    ),
                )
            }
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred",
                    "Đã xảy ra lỗi cơ sở dữ liệu",
                ),
            ),
            AppError::Internal(_) | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred",
                    "Đã xảy ra lỗi hệ thống",
                ),
            ),
        }
    }

    /// User-facing message in the requested language
    pub fn message(&self, language: Language) -> String {
        let (_, detail) = self.detail();
        match language {
            Language::English => detail.message_en,
            Language::Vietnamese => detail.message_vi,
        }
    }

    /// Convert into the `{status: "error", message}` envelope
    pub fn into_rpc<T: Serialize>(self, language: Language) -> Json<RpcResponse<T>> {
        if self.is_system() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Rejected: {}", self);
        }
        Json(RpcResponse::error(self.message(language)))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.detail();

        // Log the error for debugging
        if self.is_system() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Error: {:?}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcStatus {
    Success,
    Error,
}

/// JSON-RPC style envelope used by the handheld and dashboard clients
#[derive(Debug, Serialize)]
pub struct RpcResponse<T> {
    pub status: RpcStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> RpcResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: RpcStatus::Success,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: RpcStatus::Success,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RpcStatus::Error,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Wrap a handler result in the RPC envelope
pub fn rpc<T: Serialize>(language: Language, result: AppResult<T>) -> Json<RpcResponse<T>> {
    match result {
        Ok(data) => Json(RpcResponse::success(data)),
        Err(err) => err.into_rpc(language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_validation_message_is_localized() {
        let err = AppError::from(ScanError::validation("Already shipped", "Đã vận chuyển"));
        assert_eq!(err.message(Language::English), "Already shipped");
        assert_eq!(err.message(Language::Vietnamese), "Đã vận chuyển");
        assert!(!err.is_system());
    }

    #[test]
    fn test_storage_error_is_hidden() {
        let err = AppError::from(ScanError::Storage("relation does not exist".to_string()));
        assert!(err.is_system());
        assert!(!err.message(Language::English).contains("relation"));
    }

    #[test]
    fn test_rpc_envelope_shape() {
        #[derive(Serialize)]
        struct Body {
            picking_id: i64,
        }

        let ok = serde_json::to_value(RpcResponse::success(Body { picking_id: 4 })).unwrap();
        assert_eq!(ok, serde_json::json!({"status": "success", "picking_id": 4}));

        let err = serde_json::to_value(RpcResponse::<Body>::error("Không tìm thấy")).unwrap();
        assert_eq!(err, serde_json::json!({"status": "error", "message": "Không tìm thấy"}));
    }
}
