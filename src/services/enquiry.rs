//! Admission enquiries for a single center.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::{CollectionSource, RecordStore, Scope};
use crate::errors::AppError;
use crate::models::enquiry::{CreateEnquiry, Enquiry, EnquiryStatus};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::lifecycle::check_transition;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EnquiryFilters {
    pub status: Option<EnquiryStatus>,
}

/// Newest first.
pub async fn list(
    source: &dyn CollectionSource,
    center_id: Uuid,
    filters: &EnquiryFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Enquiry>, AppError> {
    let mut enquiries: Vec<Enquiry> = source
        .list_enquiries(Scope::Center(center_id))
        .await?
        .into_iter()
        .filter(|e| filters.status.map_or(true, |s| s == e.status))
        .collect();
    enquiries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(PagedResult::from_all(enquiries, pagination))
}

pub async fn create(
    store: &dyn RecordStore,
    center_id: Uuid,
    input: &CreateEnquiry,
) -> Result<Enquiry, AppError> {
    input.validate()?;
    let enquiry = store.insert_enquiry(center_id, input).await?;
    tracing::info!(enquiry_id = %enquiry.id, center_id = %center_id, "Enquiry recorded");
    Ok(enquiry)
}

/// Move an enquiry along its status graph. Enquiries of other centers are
/// reported as missing.
pub async fn set_status(
    store: &dyn RecordStore,
    center_id: Uuid,
    id: Uuid,
    status: EnquiryStatus,
    notes: Option<&str>,
) -> Result<Enquiry, AppError> {
    let current = store
        .find_enquiry(id)
        .await?
        .filter(|e| e.center_id == center_id)
        .ok_or_else(|| AppError::NotFound("Enquiry not found".to_string()))?;
    check_transition(current.status, status)?;
    let enquiry = store.set_enquiry_status(id, status, notes).await?;
    tracing::info!(enquiry_id = %id, from = ?current.status, to = ?status, "Enquiry status changed");
    Ok(enquiry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::center::CenterStatus;

    fn input(name: &str) -> CreateEnquiry {
        CreateEnquiry {
            name: name.to_string(),
            phone: Some("9876543210".to_string()),
            email: None,
            course_interest: Some("Abacus".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn created_enquiries_start_new() {
        let store = MemoryStore::new();
        let center = store.seed_center("North", "N1", CenterStatus::Active);
        let enquiry = create(&store, center.id, &input("Ravi")).await.unwrap();
        assert_eq!(enquiry.status, EnquiryStatus::New);
    }

    #[tokio::test]
    async fn conversion_requires_contact_first() {
        let store = MemoryStore::new();
        let center = store.seed_center("North", "N1", CenterStatus::Active);
        let enquiry = create(&store, center.id, &input("Ravi")).await.unwrap();

        let err = set_status(&store, center.id, enquiry.id, EnquiryStatus::Converted, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        set_status(&store, center.id, enquiry.id, EnquiryStatus::Contacted, Some("called"))
            .await
            .unwrap();
        let converted = set_status(&store, center.id, enquiry.id, EnquiryStatus::Converted, None)
            .await
            .unwrap();
        assert_eq!(converted.status, EnquiryStatus::Converted);
        assert_eq!(converted.notes.as_deref(), Some("called"));
    }

    #[tokio::test]
    async fn other_centers_enquiries_are_hidden() {
        let store = MemoryStore::new();
        let mine = store.seed_center("North", "N1", CenterStatus::Active);
        let theirs = store.seed_center("South", "S1", CenterStatus::Active);
        let enquiry = create(&store, theirs.id, &input("Meera")).await.unwrap();

        let err = set_status(&store, mine.id, enquiry.id, EnquiryStatus::Contacted, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let listed = list(&store, mine.id, &EnquiryFilters::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(listed.total, 0);
    }
}
