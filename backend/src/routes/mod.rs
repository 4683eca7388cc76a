//! Route definitions for the QR Warehouse Scan Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Login (public)
        .route("/login", post(handlers::login))
        // Protected routes
        .merge(picking_routes())
        .merge(qr_routes())
        .merge(location_routes())
        .nest("/dashboard/stock_picking", dashboard_routes())
}

/// Document detail and scans for the handheld client
fn picking_routes() -> Router<AppState> {
    Router::new()
        .route("/picking/detail", post(handlers::picking_detail))
        .route("/picking/prepare", post(handlers::prepare_scan))
        .route("/picking/package", post(handlers::package_scan))
        .route("/document/scan", post(handlers::document_scan))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn qr_routes() -> Router<AppState> {
    Router::new()
        .route("/qr/decode", post(handlers::decode_qr))
        .route("/qr/transfer/:id", get(handlers::transfer_qr))
        .route("/qr/location/:id", get(handlers::location_qr))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Location inventory counting
fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/location/products", post(handlers::location_products))
        .route("/location/inventory_count", post(handlers::inventory_count))
        .route("/product/search", post(handlers::search_products))
        .route("/product/other_locations", post(handlers::other_locations))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Outbound dashboard
fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/list", post(handlers::list_pickings))
        .route("/filters", post(handlers::filter_options))
        .route("/search_suggestions", post(handlers::search_suggestions))
        .route("/prepared_deliveries", post(handlers::prepared_deliveries))
        .route_layer(middleware::from_fn(auth_middleware))
}
