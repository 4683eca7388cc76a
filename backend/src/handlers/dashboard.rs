//! Dashboard handlers for outbound transfers

use axum::{extract::State, Json};
use serde::Serialize;
use validator::Validate;

use shared::{DashboardListParams, FilterOptions, LabeledValue, PreparedDelivery, SuggestionParams};

use super::Data;
use crate::error::{rpc, AppError, RpcResponse};
use crate::middleware::{CurrentUser, RequestLanguage};
use crate::services::dashboard::DashboardPage;
use crate::services::DashboardService;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PreparedDeliveries {
    pub data: Vec<PreparedDelivery>,
    pub total: usize,
}

fn service(state: &AppState) -> DashboardService {
    DashboardService::new(state.db.clone(), state.config.dashboard.clone())
}

pub async fn list_pickings(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Json(params): Json<DashboardListParams>,
) -> Json<RpcResponse<DashboardPage>> {
    let result = async move {
        params.validate()?;
        service(&state).list(&params, language).await
    }
    .await;
    rpc(language, result)
}

pub async fn filter_options(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
) -> Json<RpcResponse<Data<FilterOptions>>> {
    rpc(language, Ok(Data::new(service(&state).filters(language))))
}

/// Terms shorter than two characters yield an empty list, not an error
pub async fn search_suggestions(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
    Json(params): Json<SuggestionParams>,
) -> Json<RpcResponse<Data<Vec<LabeledValue>>>> {
    let result = async move {
        params.validate()?;
        let suggestions = service(&state).suggestions(&params).await?;
        Ok::<_, AppError>(Data::new(suggestions))
    }
    .await;
    rpc(language, result)
}

pub async fn prepared_deliveries(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    _user: CurrentUser,
) -> Json<RpcResponse<PreparedDeliveries>> {
    let result = service(&state).prepared_deliveries().await.map(|data| PreparedDeliveries {
        total: data.len(),
        data,
    });
    rpc(language, result)
}
