//! Center registry routes (super admin only).

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireSuperAdmin;
use crate::models::center::{Center, CreateCenter, SetCenterStatus, UpdateCenter};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::center::{self as center_service, CenterFilters};
use crate::AppState;

/// GET /api/v1/centers
pub async fn list(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<CenterFilters>,
) -> Result<Json<ApiResponse<PagedResult<Center>>>, AppError> {
    let result = center_service::list(state.collections.as_ref(), &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/centers
pub async fn create(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Json(body): Json<CreateCenter>,
) -> Result<Json<ApiResponse<Center>>, AppError> {
    let center = center_service::create(state.records.as_ref(), &body).await?;
    Ok(ApiResponse::success(center))
}

/// GET /api/v1/centers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Center>>, AppError> {
    let center = center_service::find_by_id(state.collections.as_ref(), id).await?;
    Ok(ApiResponse::success(center))
}

/// PUT /api/v1/centers/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCenter>,
) -> Result<Json<ApiResponse<Center>>, AppError> {
    let center = center_service::update(state.records.as_ref(), id, &body).await?;
    Ok(ApiResponse::success(center))
}

/// PATCH /api/v1/centers/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<SetCenterStatus>,
) -> Result<Json<ApiResponse<Center>>, AppError> {
    let center = center_service::set_status(state.records.as_ref(), id, body.status).await?;
    Ok(ApiResponse::success(center))
}
