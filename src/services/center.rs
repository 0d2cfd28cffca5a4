//! Center registry: listing, creation, edits and activation toggling.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::{CollectionSource, RecordStore};
use crate::errors::AppError;
use crate::models::center::{Center, CenterStatus, CreateCenter, UpdateCenter};
use crate::models::pagination::{PagedResult, Pagination};

/// Filters for listing centers.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CenterFilters {
    pub status: Option<CenterStatus>,
    pub city: Option<String>,
    pub search: Option<String>,
}

impl CenterFilters {
    fn matches(&self, center: &Center) -> bool {
        if self.status.is_some_and(|s| s != center.status) {
            return false;
        }
        if let Some(city) = &self.city {
            if !center
                .city
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(city.trim()))
            {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty()
                && !center.name.to_lowercase().contains(&needle)
                && !center.code.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// List centers ordered by name.
pub async fn list(
    source: &dyn CollectionSource,
    filters: &CenterFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Center>, AppError> {
    let mut centers: Vec<Center> = source
        .list_centers()
        .await?
        .into_iter()
        .filter(|c| filters.matches(c))
        .collect();
    centers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
    Ok(PagedResult::from_all(centers, pagination))
}

pub async fn find_by_id(source: &dyn CollectionSource, id: Uuid) -> Result<Center, AppError> {
    source
        .find_center(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Center not found".to_string()))
}

pub async fn create(store: &dyn RecordStore, input: &CreateCenter) -> Result<Center, AppError> {
    input.validate()?;
    let normalized = CreateCenter {
        code: input.code.trim().to_uppercase(),
        ..input.clone()
    };
    let center = store.insert_center(&normalized).await?;
    tracing::info!(center_id = %center.id, code = %center.code, "Center created");
    Ok(center)
}

pub async fn update(
    store: &dyn RecordStore,
    id: Uuid,
    input: &UpdateCenter,
) -> Result<Center, AppError> {
    input.validate()?;
    if input.loyalty_points.is_some_and(|p| p < 0) {
        return Err(AppError::Validation(
            "loyalty_points must not be negative".to_string(),
        ));
    }
    store.update_center(id, input).await
}

/// Toggle a center between active and inactive.
pub async fn set_status(
    store: &dyn RecordStore,
    id: Uuid,
    status: CenterStatus,
) -> Result<Center, AppError> {
    let center = store.set_center_status(id, status).await?;
    tracing::info!(center_id = %id, status = ?status, "Center status changed");
    Ok(center)
}
