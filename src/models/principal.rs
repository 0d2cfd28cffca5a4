//! Resolved, role-bearing identity and the directory records it is built from.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::AppRole;

/// Identity used for every authorization decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: AppRole,
    pub tenant_id: Option<Uuid>,
    pub tenant_name: Option<String>,
}

impl Principal {
    pub fn is_super_admin(&self) -> bool {
        self.role == AppRole::SuperAdmin
    }
}

/// Profile row keyed by identity id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub center_id: Option<Uuid>,
}

/// Display name from the profile, falling back to the email local part.
pub fn display_name_for(profile: Option<&Profile>, email: &str) -> String {
    profile
        .and_then(|p| p.full_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}
