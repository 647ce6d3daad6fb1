//! Tour entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gcm_core::types::{CityId, TourId};
use gcm_core::{AppError, AppResult};

/// A recommended route through a city's sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tour {
    /// Tour ID.
    pub id: TourId,
    /// Owning city.
    pub city_id: CityId,
    /// Tour name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Total duration in minutes.
    pub total_minutes: i32,
}

/// Fields for a new tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourDraft {
    /// Owning city.
    pub city_id: CityId,
    /// Tour name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Total duration in minutes.
    pub total_minutes: i32,
}

impl TourDraft {
    /// Validate the draft.
    pub fn validate(&self) -> AppResult<()> {
        super::require_name("Tour name", &self.name)?;
        if self.total_minutes <= 0 {
            return Err(AppError::validation("Tour duration must be positive"));
        }
        Ok(())
    }

    /// Build the entity with a fresh ID.
    pub fn into_tour(self) -> Tour {
        Tour {
            id: TourId::new(),
            city_id: self.city_id,
            name: self.name,
            description: self.description,
            total_minutes: self.total_minutes,
        }
    }
}

/// Partial update of a tour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New duration.
    #[serde(default)]
    pub total_minutes: Option<i32>,
}

impl TourPatch {
    /// Validate the patch.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            super::require_name("Tour name", name)?;
        }
        if matches!(self.total_minutes, Some(m) if m <= 0) {
            return Err(AppError::validation("Tour duration must be positive"));
        }
        super::require_change(
            self.name.is_some() || self.description.is_some() || self.total_minutes.is_some(),
        )
    }

    /// Overwrite the fields present in the patch.
    pub fn apply_to(&self, tour: &mut Tour) {
        if let Some(name) = &self.name {
            tour.name = name.clone();
        }
        if let Some(description) = &self.description {
            tour.description = description.clone();
        }
        if let Some(minutes) = self.total_minutes {
            tour.total_minutes = minutes;
        }
    }
}
