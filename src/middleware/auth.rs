//! Bearer-token authentication extractors for Axum handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::errors::AppError;
use crate::models::principal::Principal;
use crate::AppState;

/// Raw access token from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;
        Ok(BearerToken(bearer.token().to_string()))
    }
}

/// Principal re-derived from the bearer session on every request.
///
/// A live session whose identity no longer resolves to a role is revoked
/// and the request is rejected.
/// ```ignore
/// async fn handler(CurrentPrincipal(principal): CurrentPrincipal) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let session = state
            .sessions
            .restore(&token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(CurrentPrincipal(session.principal))
    }
}
