//! Storage traits used by the authentication and approval services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gcm_core::AppResult;
use gcm_core::types::{CityId, ContentRequestId, MapId, PriceUpdateId, SiteId, TourId, UserId};
use gcm_entity::approval::{
    ContentRequest, ContentRequestView, PriceUpdate, PriceUpdateView, Resolution,
};
use gcm_entity::catalog::{City, Map, Site, Tour};
use gcm_entity::user::{NewUser, SecurityState, User};

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Create a new account. Duplicate usernames are a conflict.
    async fn create(&self, data: &NewUser) -> AppResult<User>;

    /// Persist the lockout counters of one user.
    async fn save_security_state(&self, id: UserId, state: &SecurityState) -> AppResult<()>;

    /// Stamp a successful login.
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()>;

    /// All users whose account is currently blocked.
    async fn find_blocked(&self) -> AppResult<Vec<User>>;
}

/// Catalog and pending-record storage.
///
/// Reads outside a transaction see committed state only. Every mutation
/// goes through a [`CatalogTransaction`].
#[async_trait]
pub trait CatalogStore: Send + Sync + std::fmt::Debug {
    /// Open a transaction.
    async fn begin(&self) -> AppResult<Box<dyn CatalogTransaction>>;

    /// Find a city by ID.
    async fn find_city(&self, id: CityId) -> AppResult<Option<City>>;

    /// Find a map by ID.
    async fn find_map(&self, id: MapId) -> AppResult<Option<Map>>;

    /// Find a site by ID.
    async fn find_site(&self, id: SiteId) -> AppResult<Option<Site>>;

    /// Find a tour by ID.
    async fn find_tour(&self, id: TourId) -> AppResult<Option<Tour>>;

    /// Find a price update by ID.
    async fn find_price_update(&self, id: PriceUpdateId) -> AppResult<Option<PriceUpdate>>;

    /// Find a content request by ID.
    async fn find_content_request(&self, id: ContentRequestId)
    -> AppResult<Option<ContentRequest>>;

    /// Open price updates, newest first.
    async fn open_price_updates(&self) -> AppResult<Vec<PriceUpdateView>>;

    /// Open content requests, newest first.
    async fn open_content_requests(&self) -> AppResult<Vec<ContentRequestView>>;
}

/// A unit of work over the catalog.
///
/// Loads through a transaction lock the returned rows until the transaction
/// ends. Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Load and lock a price update.
    async fn lock_price_update(&mut self, id: PriceUpdateId) -> AppResult<Option<PriceUpdate>>;

    /// Load and lock a content request.
    async fn lock_content_request(
        &mut self,
        id: ContentRequestId,
    ) -> AppResult<Option<ContentRequest>>;

    /// Insert a new price update.
    async fn insert_price_update(&mut self, record: &PriceUpdate) -> AppResult<()>;

    /// Insert a new content request.
    async fn insert_content_request(&mut self, record: &ContentRequest) -> AppResult<()>;

    /// Move an open price update to its terminal state.
    ///
    /// Returns `false` when the record is missing or no longer open.
    async fn resolve_price_update(
        &mut self,
        id: PriceUpdateId,
        resolution: &Resolution,
    ) -> AppResult<bool>;

    /// Move an open content request to its terminal state.
    ///
    /// `target_id` fills in the record's target when it has none yet (an
    /// approved ADD). Returns `false` when the record is missing or no
    /// longer open.
    async fn resolve_content_request(
        &mut self,
        id: ContentRequestId,
        resolution: &Resolution,
        target_id: Option<Uuid>,
    ) -> AppResult<bool>;

    /// Load and lock a city.
    async fn find_city(&mut self, id: CityId) -> AppResult<Option<City>>;
    /// Insert a city.
    async fn insert_city(&mut self, city: &City) -> AppResult<()>;
    /// Overwrite a city. Returns `false` if it no longer exists.
    async fn update_city(&mut self, city: &City) -> AppResult<bool>;
    /// Delete a city. Returns `false` if it no longer exists.
    async fn delete_city(&mut self, id: CityId) -> AppResult<bool>;
    /// Number of maps, sites, and tours that belong to a city.
    async fn count_city_dependents(&mut self, id: CityId) -> AppResult<u64>;

    /// Load and lock a map.
    async fn find_map(&mut self, id: MapId) -> AppResult<Option<Map>>;
    /// Insert a map.
    async fn insert_map(&mut self, map: &Map) -> AppResult<()>;
    /// Overwrite a map. Returns `false` if it no longer exists.
    async fn update_map(&mut self, map: &Map) -> AppResult<bool>;
    /// Delete a map. Returns `false` if it no longer exists.
    async fn delete_map(&mut self, id: MapId) -> AppResult<bool>;

    /// Load and lock a site.
    async fn find_site(&mut self, id: SiteId) -> AppResult<Option<Site>>;
    /// Insert a site.
    async fn insert_site(&mut self, site: &Site) -> AppResult<()>;
    /// Overwrite a site. Returns `false` if it no longer exists.
    async fn update_site(&mut self, site: &Site) -> AppResult<bool>;
    /// Delete a site. Returns `false` if it no longer exists.
    async fn delete_site(&mut self, id: SiteId) -> AppResult<bool>;

    /// Load and lock a tour.
    async fn find_tour(&mut self, id: TourId) -> AppResult<Option<Tour>>;
    /// Insert a tour.
    async fn insert_tour(&mut self, tour: &Tour) -> AppResult<()>;
    /// Overwrite a tour. Returns `false` if it no longer exists.
    async fn update_tour(&mut self, tour: &Tour) -> AppResult<bool>;
    /// Delete a tour. Returns `false` if it no longer exists.
    async fn delete_tour(&mut self, id: TourId) -> AppResult<bool>;

    /// Make every change in the transaction visible atomically.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard every change in the transaction.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
