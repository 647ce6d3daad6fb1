//! City map entity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gcm_core::types::{CityId, MapId};
use gcm_core::{AppError, AppResult};

/// A purchasable map of a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Map {
    /// Map ID.
    pub id: MapId,
    /// Owning city.
    pub city_id: CityId,
    /// Map name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Current price. Changed only through an approved price update.
    pub price: Decimal,
}

/// Fields for a new map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDraft {
    /// Owning city.
    pub city_id: CityId,
    /// Map name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Initial price.
    pub price: Decimal,
}

impl MapDraft {
    /// Validate the draft.
    pub fn validate(&self) -> AppResult<()> {
        super::require_name("Map name", &self.name)?;
        validate_price(self.price)
    }

    /// Build the entity with a fresh ID.
    pub fn into_map(self) -> Map {
        Map {
            id: MapId::new(),
            city_id: self.city_id,
            name: self.name,
            description: self.description,
            price: self.price,
        }
    }
}

/// Partial update of a map. Prices go through the price workflow instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

impl MapPatch {
    /// Validate the patch.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            super::require_name("Map name", name)?;
        }
        super::require_change(self.name.is_some() || self.description.is_some())
    }

    /// Overwrite the fields present in the patch.
    pub fn apply_to(&self, map: &mut Map) {
        if let Some(name) = &self.name {
            map.name = name.clone();
        }
        if let Some(description) = &self.description {
            map.description = description.clone();
        }
    }
}

/// Prices are positive with at most two decimal places.
pub fn validate_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::validation("Price must be greater than zero"));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::validation(
            "Price cannot have more than two decimal places",
        ));
    }
    Ok(())
}
