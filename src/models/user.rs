//! Identity-service records: password credentials and revocable sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::role::AppRole;

/// Credential row. Holds the password hash, so it is never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Session issued by the identity service. Access tokens carry its id.
#[derive(Debug, Clone, FromRow)]
pub struct AuthSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Raw identity returned by the identity service, before role resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Self-service sign-up payload. The account stays pending until activated.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 200, message = "full_name must not be empty"))]
    pub full_name: Option<String>,
}

/// Payload for creating a center admin.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCenterAdmin {
    pub center_id: Uuid,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 200, message = "full_name is required"))]
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPassword {
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub new_password: String,
}

/// Activation of a pending account.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivateAccount {
    pub role: AppRole,
    pub center_id: Option<Uuid>,
}

/// Account created or activated through an admin operation.
#[derive(Debug, Clone, Serialize)]
pub struct ManagedAccount {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: AppRole,
    pub center_id: Option<Uuid>,
}
