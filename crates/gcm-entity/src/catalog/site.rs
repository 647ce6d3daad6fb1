//! Point-of-interest entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gcm_core::types::{CityId, SiteId};
use gcm_core::{AppError, AppResult};

/// A point of interest inside a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Site {
    /// Site ID.
    pub id: SiteId,
    /// Owning city.
    pub city_id: CityId,
    /// Site name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Category (museum, park, ...).
    pub category: String,
    /// Whether the site is wheelchair accessible.
    pub accessible: bool,
    /// Recommended visit duration in minutes.
    pub visit_minutes: i32,
}

/// Fields for a new site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDraft {
    /// Owning city.
    pub city_id: CityId,
    /// Site name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Category.
    pub category: String,
    /// Accessibility flag.
    #[serde(default)]
    pub accessible: bool,
    /// Recommended visit duration in minutes.
    pub visit_minutes: i32,
}

impl SiteDraft {
    /// Validate the draft.
    pub fn validate(&self) -> AppResult<()> {
        super::require_name("Site name", &self.name)?;
        validate_minutes(self.visit_minutes)
    }

    /// Build the entity with a fresh ID.
    pub fn into_site(self) -> Site {
        Site {
            id: SiteId::new(),
            city_id: self.city_id,
            name: self.name,
            description: self.description,
            category: self.category,
            accessible: self.accessible,
            visit_minutes: self.visit_minutes,
        }
    }
}

/// Partial update of a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitePatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New category.
    #[serde(default)]
    pub category: Option<String>,
    /// New accessibility flag.
    #[serde(default)]
    pub accessible: Option<bool>,
    /// New visit duration.
    #[serde(default)]
    pub visit_minutes: Option<i32>,
}

impl SitePatch {
    /// Validate the patch.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            super::require_name("Site name", name)?;
        }
        if let Some(minutes) = self.visit_minutes {
            validate_minutes(minutes)?;
        }
        super::require_change(
            self.name.is_some()
                || self.description.is_some()
                || self.category.is_some()
                || self.accessible.is_some()
                || self.visit_minutes.is_some(),
        )
    }

    /// Overwrite the fields present in the patch.
    pub fn apply_to(&self, site: &mut Site) {
        if let Some(name) = &self.name {
            site.name = name.clone();
        }
        if let Some(description) = &self.description {
            site.description = description.clone();
        }
        if let Some(category) = &self.category {
            site.category = category.clone();
        }
        if let Some(accessible) = self.accessible {
            site.accessible = accessible;
        }
        if let Some(minutes) = self.visit_minutes {
            site.visit_minutes = minutes;
        }
    }
}

fn validate_minutes(minutes: i32) -> AppResult<()> {
    if minutes <= 0 {
        return Err(AppError::validation("Visit duration must be positive"));
    }
    Ok(())
}
