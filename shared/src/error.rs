//! Error taxonomy for the scan core
//!
//! Validation and permission errors carry user-facing messages in English and
//! Vietnamese. They are meant to abort the enclosing transaction, so nothing in
//! the processors catches them.

use thiserror::Error;

use crate::types::Language;

/// Errors raised by processors and store implementations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    /// A precondition failed (wrong state, missing parameter, over-confirmation, ...)
    #[error("{message}")]
    Validation { message: String, message_vi: String },

    /// A referenced record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The actor lacks a required `resource:action` permission
    #[error("Permission denied: requires {permission}")]
    PermissionDenied { permission: String },

    /// The host refused to finalize the document
    #[error("Could not validate document: {0}")]
    Finalize(String),

    /// The host store failed
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type ScanResult<T> = Result<T, ScanError>;

impl ScanError {
    pub fn validation(message: impl Into<String>, message_vi: impl Into<String>) -> Self {
        ScanError::Validation {
            message: message.into(),
            message_vi: message_vi.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ScanError::NotFound(resource.into())
    }

    pub fn permission_denied(resource: &str, action: &str) -> Self {
        ScanError::PermissionDenied {
            permission: format!("{}:{}", resource, action),
        }
    }

    /// Whether the message is meant for the end user.
    ///
    /// Storage failures are system errors and must not leak their details.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ScanError::Storage(_))
    }

    /// Message in the requested language
    pub fn localized(&self, language: Language) -> String {
        match (self, language) {
            (ScanError::Validation { message, .. }, Language::English) => message.clone(),
            (ScanError::Validation { message_vi, .. }, Language::Vietnamese) => message_vi.clone(),
            (ScanError::NotFound(resource), Language::English) => format!("{} not found", resource),
            (ScanError::NotFound(resource), Language::Vietnamese) => {
                format!("Không tìm thấy {}", resource)
            }
            (ScanError::PermissionDenied { permission }, Language::English) => {
                format!("You do not have permission to perform this action ({})", permission)
            }
            (ScanError::PermissionDenied { permission }, Language::Vietnamese) => {
                format!("Bạn không có quyền thực hiện chức năng này ({})", permission)
            }
            (ScanError::Finalize(reason), Language::English) => {
                format!("Could not validate document: {}", reason)
            }
            (ScanError::Finalize(reason), Language::Vietnamese) => {
                format!("Không thể hoàn tất phiếu: {}", reason)
            }
            (ScanError::Storage(_), Language::English) => "A system error occurred".to_string(),
            (ScanError::Storage(_), Language::Vietnamese) => "Đã xảy ra lỗi hệ thống".to_string(),
        }
    }
}
