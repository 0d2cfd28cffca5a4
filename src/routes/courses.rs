//! Course catalogue routes. Any signed-in admin may browse, head office edits.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentPrincipal;
use crate::middleware::rbac::RequireSuperAdmin;
use crate::models::course::{Course, CreateCourse, SetCourseStatus, UpdateCourse};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::course::{self as course_service, CourseFilters};
use crate::services::session::data_scope;
use crate::AppState;

/// GET /api/v1/courses
pub async fn list(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<CourseFilters>,
) -> Result<Json<ApiResponse<PagedResult<Course>>>, AppError> {
    data_scope(&principal)?;
    let result = course_service::list(state.collections.as_ref(), &filters, &pagination).await?;
    Ok(ApiResponse::success(result))
}

/// POST /api/v1/courses
pub async fn create(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Json(body): Json<CreateCourse>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = course_service::create(state.records.as_ref(), &body).await?;
    Ok(ApiResponse::success(course))
}

/// PUT /api/v1/courses/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCourse>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = course_service::update(state.records.as_ref(), id, &body).await?;
    Ok(ApiResponse::success(course))
}

/// PATCH /api/v1/courses/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<SetCourseStatus>,
) -> Result<Json<ApiResponse<Course>>, AppError> {
    let course = course_service::set_status(state.records.as_ref(), id, body.status).await?;
    Ok(ApiResponse::success(course))
}
