//! Enquiry routes for a center admin's own center.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireCenterAdmin;
use crate::models::enquiry::{CreateEnquiry, Enquiry, SetEnquiryStatus};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::enquiry::{self as enquiry_service, EnquiryFilters};
use crate::AppState;

/// GET /api/v1/enquiries
pub async fn list(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<EnquiryFilters>,
) -> Result<Json<ApiResponse<PagedResult<Enquiry>>>, AppError> {
    let result = enquiry_service::list(
        state.collections.as_ref(),
        admin.center_id,
        &filters,
        &pagination,
    )
    .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/enquiries
pub async fn create(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
    Json(body): Json<CreateEnquiry>,
) -> Result<Json<ApiResponse<Enquiry>>, AppError> {
    let enquiry = enquiry_service::create(state.records.as_ref(), admin.center_id, &body).await?;
    Ok(ApiResponse::success(enquiry))
}

/// PATCH /api/v1/enquiries/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<SetEnquiryStatus>,
) -> Result<Json<ApiResponse<Enquiry>>, AppError> {
    let enquiry = enquiry_service::set_status(
        state.records.as_ref(),
        admin.center_id,
        id,
        body.status,
        body.notes.as_deref(),
    )
    .await?;
    Ok(ApiResponse::success(enquiry))
}
