//! Student enrolment routes for a center admin's own center.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireCenterAdmin;
use crate::models::course::{CreateStudent, SetStudentStatus, Student};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::student::{self as student_service, StudentFilters};
use crate::AppState;

/// GET /api/v1/students
pub async fn list(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<StudentFilters>,
) -> Result<Json<ApiResponse<PagedResult<Student>>>, AppError> {
    let result = student_service::list(
        state.collections.as_ref(),
        admin.center_id,
        &filters,
        &pagination,
    )
    .await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/students
pub async fn enroll(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
    Json(body): Json<CreateStudent>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student = student_service::enroll(
        state.collections.as_ref(),
        state.records.as_ref(),
        admin.center_id,
        &body,
    )
    .await?;
    Ok(ApiResponse::success(student))
}

/// PATCH /api/v1/students/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    admin: RequireCenterAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<SetStudentStatus>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let student =
        student_service::set_status(state.records.as_ref(), admin.center_id, id, body.status)
            .await?;
    Ok(ApiResponse::success(student))
}
