//! Course catalogue and student enrolment models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "course_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub duration_months: Option<i32>,
    pub fee: Option<Decimal>,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "student_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,
    Inactive,
    Completed,
    Dropped,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub center_id: Uuid,
    pub course_id: Option<Uuid>,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: StudentStatus,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCourse {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 2, max = 32, message = "code must be 2-32 characters"))]
    pub code: String,
    #[validate(range(min = 1, max = 120, message = "duration must be 1-120 months"))]
    pub duration_months: Option<i32>,
    pub fee: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct UpdateCourse {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 120, message = "duration must be 1-120 months"))]
    pub duration_months: Option<i32>,
    pub fee: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetCourseStatus {
    pub status: CourseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStudent {
    #[validate(length(min = 1, max = 200, message = "full_name is required"))]
    pub full_name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 20, message = "phone must be 6-20 characters"))]
    pub phone: Option<String>,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetStudentStatus {
    pub status: StudentStatus,
}
