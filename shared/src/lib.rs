//! Shared domain core for the QR Warehouse Scan Platform
//!
//! This crate holds everything that does not touch I/O: the QR token codec,
//! scan ledger queries, FIFO quantity reconciliation, the scan processors and
//! the store traits the host ERP implements for them. The backend, the WASM
//! client module and the integration tests all build on it.

pub mod allocation;
pub mod error;
pub mod ledger;
pub mod models;
pub mod processor;
pub mod qr;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{ScanError, ScanResult};
pub use models::*;
pub use types::*;
