//! Student enrolment for a single center.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::{CollectionSource, RecordStore, Scope};
use crate::errors::AppError;
use crate::models::course::{CourseStatus, CreateStudent, Student, StudentStatus};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::lifecycle::check_transition;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StudentFilters {
    pub status: Option<StudentStatus>,
    pub course_id: Option<Uuid>,
}

/// Most recent enrolments first.
pub async fn list(
    source: &dyn CollectionSource,
    center_id: Uuid,
    filters: &StudentFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Student>, AppError> {
    let mut students: Vec<Student> = source
        .list_students(Scope::Center(center_id))
        .await?
        .into_iter()
        .filter(|s| filters.status.map_or(true, |st| st == s.status))
        .filter(|s| filters.course_id.map_or(true, |c| s.course_id == Some(c)))
        .collect();
    students.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
    Ok(PagedResult::from_all(students, pagination))
}

/// Enrol a student at the center. A named course must exist and be active.
pub async fn enroll(
    source: &dyn CollectionSource,
    store: &dyn RecordStore,
    center_id: Uuid,
    input: &CreateStudent,
) -> Result<Student, AppError> {
    input.validate()?;
    if let Some(course_id) = input.course_id {
        let course = source
            .list_courses()
            .await?
            .into_iter()
            .find(|c| c.id == course_id)
            .ok_or_else(|| AppError::Validation("course_id does not name a course".to_string()))?;
        if course.status != CourseStatus::Active {
            return Err(AppError::Validation(format!(
                "Course {} is not open for enrolment",
                course.code
            )));
        }
    }

    let student = store.insert_student(center_id, input).await?;
    tracing::info!(student_id = %student.id, center_id = %center_id, "Student enrolled");
    Ok(student)
}

/// Move a student along the enrolment graph. Students of other centers are
/// reported as missing.
pub async fn set_status(
    store: &dyn RecordStore,
    center_id: Uuid,
    id: Uuid,
    status: StudentStatus,
) -> Result<Student, AppError> {
    let current = store
        .find_student(id)
        .await?
        .filter(|s| s.center_id == center_id)
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
    check_transition(current.status, status)?;
    let student = store.set_student_status(id, status).await?;
    tracing::info!(student_id = %id, from = ?current.status, to = ?status, "Student status changed");
    Ok(student)
}
