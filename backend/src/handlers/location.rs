//! Location inventory handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use shared::{
    InventoryCountItem, InventoryCountResult, LocationProduct, ProductLocation, ProductSearchResult,
};

use super::Data;
use crate::error::{rpc, AppError, RpcResponse};
use crate::middleware::{CurrentUser, RequestLanguage};
use crate::services::{LocationService, ScanService};
use crate::AppState;

const DEFAULT_PRODUCT_SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub location_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InventoryCountRequest {
    pub location_id: i64,
    #[validate(length(min = 1))]
    pub items: Vec<InventoryCountItem>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductSearchRequest {
    #[validate(length(max = 100))]
    pub search_term: String,
    #[validate(range(min = 1))]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OtherLocationsRequest {
    pub product_id: i64,
    /// Usually the location being counted
    pub location_id: Option<i64>,
}

pub async fn location_products(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Json(body): Json<LocationRequest>,
) -> Json<RpcResponse<Data<Vec<LocationProduct>>>> {
    let service = LocationService::new(state.db.clone());
    rpc(language, service.products(body.location_id).await.map(Data::new))
}

/// Apply a batch of counted quantities; failed items are reported per item
pub async fn inventory_count(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    user: CurrentUser,
    Json(body): Json<InventoryCountRequest>,
) -> Json<RpcResponse<InventoryCountResult>> {
    let result = async move {
        body.validate()?;
        ScanService::new(state.db.clone())
            .count_location(body.location_id, &user.0.actor(), body.items, body.note)
            .await
    }
    .await;
    rpc(language, result)
}

pub async fn search_products(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Json(body): Json<ProductSearchRequest>,
) -> Json<RpcResponse<Data<Vec<ProductSearchResult>>>> {
    let result = async move {
        body.validate()?;
        let limit = body
            .limit
            .unwrap_or(DEFAULT_PRODUCT_SEARCH_LIMIT)
            .min(state.config.dashboard.max_page_size);
        let products = LocationService::new(state.db.clone())
            .search_products(&body.search_term, limit)
            .await?;
        Ok::<_, AppError>(Data::new(products))
    }
    .await;
    rpc(language, result)
}

pub async fn other_locations(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Json(body): Json<OtherLocationsRequest>,
) -> Json<RpcResponse<Data<Vec<ProductLocation>>>> {
    let service = LocationService::new(state.db.clone());
    rpc(
        language,
        service
            .other_locations(body.product_id, body.location_id)
            .await
            .map(Data::new),
    )
}
