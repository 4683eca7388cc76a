//! Domain models for the QR Warehouse Scan Platform

mod dashboard;
mod demand;
mod document;
mod location;
mod scan;

pub use dashboard::*;
pub use demand::*;
pub use document::*;
pub use location::*;
pub use scan::*;

/// Error returned when a stored enum value is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
