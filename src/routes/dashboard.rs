//! Dashboard routes: franchise-wide and per-center statistics.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::{RequireCenterAdmin, RequireSuperAdmin};
use crate::services::dashboard::{
    self, CenterDashboard, DashboardStats, StockOverview, TopCenter,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TopCentersQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/dashboard/global
pub async fn global(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> Result<Json<ApiResponse<DashboardStats>>, AppError> {
    let stats = dashboard::global_dashboard(state.collections.as_ref()).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/v1/dashboard/top-centers?limit=
pub async fn top_centers(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Query(query): Query<TopCentersQuery>,
) -> Result<Json<ApiResponse<Vec<TopCenter>>>, AppError> {
    let limit = dashboard::clamp_top_limit(query.limit);
    let ranked = dashboard::top_centers_view(state.collections.as_ref(), limit).await?;
    Ok(ApiResponse::success(ranked))
}

/// GET /api/v1/dashboard/stock
pub async fn stock(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> Result<Json<ApiResponse<StockOverview>>, AppError> {
    let overview = dashboard::stock_overview(state.collections.as_ref()).await?;
    Ok(ApiResponse::success(overview))
}

/// GET /api/v1/dashboard/center. Statistics for the caller's own center.
pub async fn center(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
) -> Result<Json<ApiResponse<CenterDashboard>>, AppError> {
    let view = dashboard::center_dashboard(state.collections.as_ref(), admin.center_id).await?;
    Ok(ApiResponse::success(view))
}
