//! Stock order routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentPrincipal;
use crate::middleware::rbac::{RequireCenterAdmin, RequireSuperAdmin};
use crate::models::order::{CreateOrder, Order, OrderWithItems, SetOrderStatus};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::order::{self as order_service, OrderFilters};
use crate::services::session::data_scope;
use crate::AppState;

/// GET /api/v1/orders. Super admins see every order, center admins their own.
pub async fn list(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<ApiResponse<PagedResult<Order>>>, AppError> {
    let scope = data_scope(&principal)?;
    let result =
        order_service::list(state.collections.as_ref(), scope, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/orders
pub async fn create(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
    Json(body): Json<CreateOrder>,
) -> Result<Json<ApiResponse<OrderWithItems>>, AppError> {
    let order = order_service::create(
        state.collections.as_ref(),
        state.records.as_ref(),
        admin.center_id,
        &body,
    )
    .await?;
    Ok(ApiResponse::success(order))
}

/// GET /api/v1/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderWithItems>>, AppError> {
    let scope = data_scope(&principal)?;
    let order = order_service::find_with_items(
        state.collections.as_ref(),
        state.records.as_ref(),
        scope,
        id,
    )
    .await?;
    Ok(ApiResponse::success(order))
}

/// PATCH /api/v1/orders/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<SetOrderStatus>,
) -> Result<Json<ApiResponse<Order>>, AppError> {
    let order = order_service::set_status(state.records.as_ref(), id, body.status).await?;
    Ok(ApiResponse::success(order))
}
