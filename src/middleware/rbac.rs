//! Role-based access control extractors for Axum handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::auth::CurrentPrincipal;
use crate::models::principal::Principal;
use crate::models::role::AppRole;
use crate::services::session::is_route_allowed;
use crate::AppState;

/// Extractor that requires the super_admin role.
#[derive(Debug, Clone)]
pub struct RequireSuperAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) =
            CurrentPrincipal::from_request_parts(parts, state).await?;
        if !is_route_allowed(Some(&principal), &[AppRole::SuperAdmin]) {
            return Err(AppError::Forbidden(
                "Super admin access required".to_string(),
            ));
        }
        Ok(RequireSuperAdmin(principal))
    }
}

/// Extractor that requires the center_admin role and an assigned center.
#[derive(Debug, Clone)]
pub struct RequireCenterAdmin {
    pub principal: Principal,
    pub center_id: Uuid,
}

impl FromRequestParts<AppState> for RequireCenterAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) =
            CurrentPrincipal::from_request_parts(parts, state).await?;
        if !is_route_allowed(Some(&principal), &[AppRole::CenterAdmin]) {
            return Err(AppError::Forbidden(
                "Center admin access required".to_string(),
            ));
        }
        let center_id = principal.tenant_id.ok_or_else(|| {
            AppError::Forbidden("Center admin is not assigned to a center".to_string())
        })?;
        Ok(RequireCenterAdmin {
            principal,
            center_id,
        })
    }
}
