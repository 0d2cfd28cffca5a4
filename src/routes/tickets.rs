//! Support ticket routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentPrincipal;
use crate::middleware::rbac::{RequireCenterAdmin, RequireSuperAdmin};
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::ticket::{CreateReply, CreateTicket, SetTicketStatus, SupportTicket, TicketReply};
use crate::services::session::data_scope;
use crate::services::ticket::{self as ticket_service, TicketFilters, TicketThread};
use crate::AppState;

/// GET /api/v1/tickets
pub async fn list(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<TicketFilters>,
) -> Result<Json<ApiResponse<PagedResult<SupportTicket>>>, AppError> {
    let scope = data_scope(&principal)?;
    let result =
        ticket_service::list(state.collections.as_ref(), scope, &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/tickets
pub async fn create(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
    Json(body): Json<CreateTicket>,
) -> Result<Json<ApiResponse<SupportTicket>>, AppError> {
    let ticket = ticket_service::create(
        state.records.as_ref(),
        admin.center_id,
        admin.principal.id,
        &body,
    )
    .await?;
    Ok(ApiResponse::success(ticket))
}

/// PATCH /api/v1/tickets/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<SetTicketStatus>,
) -> Result<Json<ApiResponse<SupportTicket>>, AppError> {
    let ticket = ticket_service::set_status(state.records.as_ref(), id, body.status).await?;
    Ok(ApiResponse::success(ticket))
}

/// GET /api/v1/tickets/{id}/replies. The ticket with its reply thread.
pub async fn thread(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TicketThread>>, AppError> {
    let scope = data_scope(&principal)?;
    let thread = ticket_service::thread(
        state.collections.as_ref(),
        state.records.as_ref(),
        scope,
        id,
    )
    .await?;
    Ok(ApiResponse::success(thread))
}

/// POST /api/v1/tickets/{id}/replies
pub async fn reply(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateReply>,
) -> Result<Json<ApiResponse<TicketReply>>, AppError> {
    let scope = data_scope(&principal)?;
    let reply =
        ticket_service::reply(state.records.as_ref(), scope, id, principal.id, &body).await?;
    Ok(ApiResponse::success(reply))
}
