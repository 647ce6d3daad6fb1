//! Typed payload of a content change.
//!
//! Details are stored as a versioned JSON document so rows written by an
//! older server can be recognised.

use serde::{Deserialize, Serialize};

use gcm_core::{AppError, AppResult};

use super::content_request::{ContentAction, ContentType};
use crate::catalog::{
    CityDraft, CityPatch, MapDraft, MapPatch, SiteDraft, SitePatch, TourDraft, TourPatch,
};

/// Current document version.
pub const CONTENT_DETAILS_VERSION: u32 = 1;

/// One variant per (action, content type) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDetails {
    /// Create a city.
    AddCity(CityDraft),
    /// Edit a city.
    EditCity(CityPatch),
    /// Delete a city.
    DeleteCity,
    /// Create a map.
    AddMap(MapDraft),
    /// Edit a map.
    EditMap(MapPatch),
    /// Delete a map.
    DeleteMap,
    /// Create a site.
    AddSite(SiteDraft),
    /// Edit a site.
    EditSite(SitePatch),
    /// Delete a site.
    DeleteSite,
    /// Create a tour.
    AddTour(TourDraft),
    /// Edit a tour.
    EditTour(TourPatch),
    /// Delete a tour.
    DeleteTour,
}

impl ContentDetails {
    /// The action this variant performs.
    pub fn action_type(&self) -> ContentAction {
        match self {
            Self::AddCity(_) | Self::AddMap(_) | Self::AddSite(_) | Self::AddTour(_) => {
                ContentAction::Add
            }
            Self::EditCity(_) | Self::EditMap(_) | Self::EditSite(_) | Self::EditTour(_) => {
                ContentAction::Edit
            }
            Self::DeleteCity | Self::DeleteMap | Self::DeleteSite | Self::DeleteTour => {
                ContentAction::Delete
            }
        }
    }

    /// The entity kind this variant targets.
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::AddCity(_) | Self::EditCity(_) | Self::DeleteCity => ContentType::City,
            Self::AddMap(_) | Self::EditMap(_) | Self::DeleteMap => ContentType::Map,
            Self::AddSite(_) | Self::EditSite(_) | Self::DeleteSite => ContentType::Site,
            Self::AddTour(_) | Self::EditTour(_) | Self::DeleteTour => ContentType::Tour,
        }
    }

    /// Validate the embedded draft or patch.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::AddCity(d) => d.validate(),
            Self::EditCity(p) => p.validate(),
            Self::AddMap(d) => d.validate(),
            Self::EditMap(p) => p.validate(),
            Self::AddSite(d) => d.validate(),
            Self::EditSite(p) => p.validate(),
            Self::AddTour(d) => d.validate(),
            Self::EditTour(p) => p.validate(),
            Self::DeleteCity | Self::DeleteMap | Self::DeleteSite | Self::DeleteTour => Ok(()),
        }
    }
}

/// Envelope persisted in `content_requests.content_details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDetailsDocument {
    /// Document version.
    pub version: u32,
    /// The typed details.
    pub details: ContentDetails,
}

impl ContentDetailsDocument {
    /// Serialize details at the current version.
    pub fn encode(details: &ContentDetails) -> AppResult<String> {
        let doc = Self {
            version: CONTENT_DETAILS_VERSION,
            details: details.clone(),
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Parse a stored document, rejecting versions this server does not know.
    pub fn decode(raw: &str) -> AppResult<ContentDetails> {
        let doc: Self = serde_json::from_str(raw)?;
        if doc.version != CONTENT_DETAILS_VERSION {
            return Err(AppError::validation(format!(
                "Unsupported content details version {}",
                doc.version
            )));
        }
        Ok(doc.details)
    }
}
