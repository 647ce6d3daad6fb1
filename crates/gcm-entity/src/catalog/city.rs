//! City entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gcm_core::AppResult;
use gcm_core::types::CityId;

/// A city in the catalog. Maps, sites, and tours belong to a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct City {
    /// City ID.
    pub id: CityId,
    /// City name.
    pub name: String,
    /// Free-text description.
    pub description: String,
}

/// Fields for a new city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDraft {
    /// City name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl CityDraft {
    /// Validate the draft.
    pub fn validate(&self) -> AppResult<()> {
        super::require_name("City name", &self.name)
    }

    /// Build the entity with a fresh ID.
    pub fn into_city(self) -> City {
        City {
            id: CityId::new(),
            name: self.name,
            description: self.description,
        }
    }
}

/// Partial update of a city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

impl CityPatch {
    /// Validate the patch.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            super::require_name("City name", name)?;
        }
        super::require_change(self.name.is_some() || self.description.is_some())
    }

    /// Overwrite the fields present in the patch.
    pub fn apply_to(&self, city: &mut City) {
        if let Some(name) = &self.name {
            city.name = name.clone();
        }
        if let Some(description) = &self.description {
            city.description = description.clone();
        }
    }
}
