//! Business logic services for the QR Warehouse Scan Platform

pub mod attachment;
pub mod auth;
pub mod dashboard;
pub mod location;
pub mod picking;
pub mod qr;
pub mod scan;
pub mod store;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use location::LocationService;
pub use picking::PickingService;
pub use qr::QrService;
pub use scan::ScanService;
