//! Pending price change records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use gcm_core::types::{MapId, PriceUpdateId, UserId};

use super::status::{Decision, RequestStatus, Resolution};

/// A proposed new price for a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceUpdate {
    /// Record ID.
    pub id: PriceUpdateId,
    /// Map whose price would change.
    pub map_id: MapId,
    /// Who proposed the change.
    pub requested_by: Option<UserId>,
    /// Map price when the proposal was submitted.
    pub old_price: Decimal,
    /// Proposed price.
    pub new_price: Decimal,
    /// Current status.
    pub status: RequestStatus,
    /// Decision taken when the record was closed.
    pub resolution: Option<Decision>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Decision time.
    pub processed_at: Option<DateTime<Utc>>,
    /// Who decided.
    pub processed_by: Option<UserId>,
}

impl PriceUpdate {
    /// Build a fresh open record.
    pub fn open(
        map_id: MapId,
        requested_by: Option<UserId>,
        old_price: Decimal,
        new_price: Decimal,
    ) -> Self {
        Self {
            id: PriceUpdateId::new(),
            map_id,
            requested_by,
            old_price,
            new_price,
            status: RequestStatus::Open,
            resolution: None,
            created_at: Utc::now(),
            processed_at: None,
            processed_by: None,
        }
    }

    /// Stamp the record with its terminal state.
    pub fn resolve(&mut self, resolution: &Resolution) {
        self.status = resolution.status;
        self.resolution = Some(resolution.decision);
        self.processed_at = Some(resolution.processed_at);
        self.processed_by = Some(resolution.processed_by);
    }
}

/// An open price update with display data for approvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceUpdateView {
    /// Record ID.
    pub id: PriceUpdateId,
    /// Target map.
    pub map_id: MapId,
    /// Map name, absent if the map was deleted since submission.
    pub map_name: Option<String>,
    /// Name of the map's city.
    pub city_name: Option<String>,
    /// Who proposed the change.
    pub requested_by: Option<UserId>,
    /// Requester display name.
    pub requester_name: Option<String>,
    /// Price at submission.
    pub old_price: Decimal,
    /// Proposed price.
    pub new_price: Decimal,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}
