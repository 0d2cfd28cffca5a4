//! Privileged account administration routes.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireSuperAdmin;
use crate::models::user::{ActivateAccount, CreateCenterAdmin, ManagedAccount, ResetPassword};
use crate::AppState;

/// POST /api/v1/admin/center-admins
pub async fn create_center_admin(
    State(state): State<AppState>,
    RequireSuperAdmin(caller): RequireSuperAdmin,
    Json(body): Json<CreateCenterAdmin>,
) -> Result<Json<ApiResponse<ManagedAccount>>, AppError> {
    let account = state.admin.create_center_admin(&caller, &body).await?;
    Ok(ApiResponse::success(account))
}

/// POST /api/v1/admin/center-admins/{id}/password
pub async fn reset_password(
    State(state): State<AppState>,
    RequireSuperAdmin(caller): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<ResetPassword>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .admin
        .reset_center_admin_password(&caller, id, &body)
        .await?;
    Ok(ApiResponse::success(()))
}

/// POST /api/v1/admin/accounts/{id}/activate
pub async fn activate(
    State(state): State<AppState>,
    RequireSuperAdmin(caller): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<ActivateAccount>,
) -> Result<Json<ApiResponse<ManagedAccount>>, AppError> {
    let account = state.admin.activate_account(&caller, id, &body).await?;
    Ok(ApiResponse::success(account))
}
