//! Franchise-wide course catalogue.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::{CollectionSource, RecordStore};
use crate::errors::AppError;
use crate::models::course::{Course, CourseStatus, CreateCourse, UpdateCourse};
use crate::models::pagination::{PagedResult, Pagination};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CourseFilters {
    pub status: Option<CourseStatus>,
    pub search: Option<String>,
}

impl CourseFilters {
    fn matches(&self, course: &Course) -> bool {
        if self.status.is_some_and(|s| s != course.status) {
            return false;
        }
        match &self.search {
            Some(search) => {
                let needle = search.trim().to_lowercase();
                needle.is_empty()
                    || course.name.to_lowercase().contains(&needle)
                    || course.code.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// List courses ordered by name.
pub async fn list(
    source: &dyn CollectionSource,
    filters: &CourseFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Course>, AppError> {
    let mut courses: Vec<Course> = source
        .list_courses()
        .await?
        .into_iter()
        .filter(|c| filters.matches(c))
        .collect();
    courses.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
    Ok(PagedResult::from_all(courses, pagination))
}

fn check_fee(fee: Option<Decimal>) -> Result<(), AppError> {
    if fee.is_some_and(|f| f.is_sign_negative()) {
        return Err(AppError::Validation("fee must not be negative".to_string()));
    }
    Ok(())
}

pub async fn create(store: &dyn RecordStore, input: &CreateCourse) -> Result<Course, AppError> {
    input.validate()?;
    check_fee(input.fee)?;
    let normalized = CreateCourse {
        code: input.code.trim().to_uppercase(),
        ..input.clone()
    };
    let course = store.insert_course(&normalized).await?;
    tracing::info!(course_id = %course.id, code = %course.code, "Course created");
    Ok(course)
}

pub async fn update(
    store: &dyn RecordStore,
    id: Uuid,
    input: &UpdateCourse,
) -> Result<Course, AppError> {
    input.validate()?;
    check_fee(input.fee)?;
    store.update_course(id, input).await
}

/// Toggle a course between active and inactive. Inactive courses accept no
/// new enrolments.
pub async fn set_status(
    store: &dyn RecordStore,
    id: Uuid,
    status: CourseStatus,
) -> Result<Course, AppError> {
    let course = store.set_course_status(id, status).await?;
    tracing::info!(course_id = %id, status = ?status, "Course status changed");
    Ok(course)
}
