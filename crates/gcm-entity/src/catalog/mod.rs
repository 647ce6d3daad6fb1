//! Catalog entities that approval workflows mutate.
//!
//! Each entity has a `*Draft` used when content is added and a `*Patch`
//! whose `None` fields leave the stored value untouched.

pub mod city;
pub mod map;
pub mod site;
pub mod tour;

pub use city::{City, CityDraft, CityPatch};
pub use map::{Map, MapDraft, MapPatch};
pub use site::{Site, SiteDraft, SitePatch};
pub use tour::{Tour, TourDraft, TourPatch};

use gcm_core::{AppError, AppResult};

/// Reject blank names.
pub(crate) fn require_name(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Reject a patch that would change nothing.
pub(crate) fn require_change(changed: bool) -> AppResult<()> {
    if !changed {
        return Err(AppError::validation("Edit does not change any field"));
    }
    Ok(())
}
