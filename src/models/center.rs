//! Franchise center (tenant) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "center_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CenterStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Center {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub status: CenterStatus,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Center {
    pub fn is_active(&self) -> bool {
        self.status == CenterStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCenter {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 2, max = 32, message = "code must be 2-32 characters"))]
    pub code: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct UpdateCenter {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub loyalty_points: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetCenterStatus {
    pub status: CenterStatus,
}
