//! Authentication routes: login, sign-up, logout, current principal.

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::{BearerToken, CurrentPrincipal};
use crate::models::principal::{Principal, Profile};
use crate::models::user::{LoginRequest, SignupRequest};
use crate::services::identity::IdentityProvider;
use crate::services::session::AuthenticatedSession;
use crate::AppState;

/// Sign-up result. The account cannot log in until an administrator
/// activates it.
#[derive(Debug, Serialize)]
pub struct PendingAccount {
    pub user_id: Uuid,
    pub email: String,
    pub status: &'static str,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthenticatedSession>>, AppError> {
    let session = state.sessions.login(&body.email, &body.password).await?;
    Ok(ApiResponse::success(session))
}

/// POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Json<ApiResponse<PendingAccount>>, AppError> {
    body.validate()?;
    let identity = state.identity.sign_up(&body.email, &body.password).await?;
    state
        .directory
        .upsert_profile(&Profile {
            user_id: identity.user_id,
            email: identity.email.clone(),
            full_name: body.full_name.as_deref().map(str::trim).map(str::to_string),
            center_id: None,
        })
        .await?;

    Ok(ApiResponse::success(PendingAccount {
        user_id: identity.user_id,
        email: identity.email,
        status: "pending_activation",
    }))
}

/// POST /api/v1/auth/logout. Revokes the session; repeat calls succeed.
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.sessions.logout(&token).await?;
    Ok(ApiResponse::success(()))
}

/// GET /api/v1/auth/me
pub async fn me(
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<ApiResponse<Principal>>, AppError> {
    Ok(ApiResponse::success(principal))
}
