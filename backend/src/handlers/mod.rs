//! HTTP handlers
//!
//! Every API handler answers with the `{status, message?, ...}` envelope the
//! handheld and dashboard clients expect, even on failure.

use serde::Serialize;

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod location;
pub mod picking;
pub mod qr;

pub use auth::login;
pub use dashboard::{filter_options, list_pickings, prepared_deliveries, search_suggestions};
pub use health::health_check;
pub use location::{inventory_count, location_products, other_locations, search_products};
pub use picking::{document_scan, package_scan, picking_detail, prepare_scan};
pub use qr::{decode_qr, location_qr, transfer_qr};

/// Payload under a `data` key, for results that are not objects themselves
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
