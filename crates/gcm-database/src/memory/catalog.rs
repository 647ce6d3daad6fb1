//! In-memory catalog store.
//!
//! A transaction takes the store-wide lock for its whole lifetime and works
//! on a private copy, so transactions are serialisable and a dropped
//! transaction leaves no trace.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;
use uuid::Uuid;

use gcm_core::types::{CityId, ContentRequestId, MapId, PriceUpdateId, SiteId, TourId};
use gcm_core::{AppError, AppResult};
use gcm_entity::approval::{
    ContentDetailsDocument, ContentRequest, ContentRequestView, PriceUpdate, PriceUpdateView,
    RequestStatus, Resolution,
};
use gcm_entity::catalog::{City, Map, Site, Tour};

use super::Availability;
use super::user::MemoryUserStore;
use crate::store::{CatalogStore, CatalogTransaction};

#[derive(Debug, Clone, Default)]
struct CatalogState {
    cities: HashMap<CityId, City>,
    maps: HashMap<MapId, Map>,
    sites: HashMap<SiteId, Site>,
    tours: HashMap<TourId, Tour>,
    price_updates: HashMap<PriceUpdateId, PriceUpdate>,
    content_requests: HashMap<ContentRequestId, ContentRequest>,
}

/// Catalog store held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<Mutex<CatalogState>>,
    users: Option<MemoryUserStore>,
    availability: Availability,
}

impl MemoryCatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve requester names in pending listings from `users`.
    pub fn with_user_directory(mut self, users: MemoryUserStore) -> Self {
        self.users = Some(users);
        self
    }

    /// Toggle simulated outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.availability.set_unavailable(unavailable);
    }

    async fn requester_name(&self, id: Option<gcm_core::types::UserId>) -> Option<String> {
        match (&self.users, id) {
            (Some(users), Some(id)) => users.display_name(id).await,
            _ => None,
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn begin(&self) -> AppResult<Box<dyn CatalogTransaction>> {
        self.availability.check()?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryCatalogTransaction {
            guard,
            working,
            availability: self.availability.clone(),
        }))
    }

    async fn find_city(&self, id: CityId) -> AppResult<Option<City>> {
        self.availability.check()?;
        Ok(self.state.lock().await.cities.get(&id).cloned())
    }

    async fn find_map(&self, id: MapId) -> AppResult<Option<Map>> {
        self.availability.check()?;
        Ok(self.state.lock().await.maps.get(&id).cloned())
    }

    async fn find_site(&self, id: SiteId) -> AppResult<Option<Site>> {
        self.availability.check()?;
        Ok(self.state.lock().await.sites.get(&id).cloned())
    }

    async fn find_tour(&self, id: TourId) -> AppResult<Option<Tour>> {
        self.availability.check()?;
        Ok(self.state.lock().await.tours.get(&id).cloned())
    }

    async fn find_price_update(&self, id: PriceUpdateId) -> AppResult<Option<PriceUpdate>> {
        self.availability.check()?;
        Ok(self.state.lock().await.price_updates.get(&id).cloned())
    }

    async fn find_content_request(
        &self,
        id: ContentRequestId,
    ) -> AppResult<Option<ContentRequest>> {
        self.availability.check()?;
        Ok(self.state.lock().await.content_requests.get(&id).cloned())
    }

    async fn open_price_updates(&self) -> AppResult<Vec<PriceUpdateView>> {
        self.availability.check()?;
        let mut open: Vec<(PriceUpdate, Option<Map>, Option<String>)> = {
            let state = self.state.lock().await;
            state
                .price_updates
                .values()
                .filter(|r| r.status == RequestStatus::Open)
                .map(|r| {
                    let map = state.maps.get(&r.map_id).cloned();
                    let city = map
                        .as_ref()
                        .and_then(|m| state.cities.get(&m.city_id))
                        .map(|c| c.name.clone());
                    (r.clone(), map, city)
                })
                .collect()
        };
        open.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));

        let mut views = Vec::with_capacity(open.len());
        for (record, map, city_name) in open {
            views.push(PriceUpdateView {
                id: record.id,
                map_id: record.map_id,
                map_name: map.map(|m| m.name),
                city_name,
                requested_by: record.requested_by,
                requester_name: self.requester_name(record.requested_by).await,
                old_price: record.old_price,
                new_price: record.new_price,
                created_at: record.created_at,
            });
        }
        Ok(views)
    }

    async fn open_content_requests(&self) -> AppResult<Vec<ContentRequestView>> {
        self.availability.check()?;
        let mut open: Vec<ContentRequest> = self
            .state
            .lock()
            .await
            .content_requests
            .values()
            .filter(|r| r.status == RequestStatus::Open)
            .cloned()
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut views = Vec::with_capacity(open.len());
        for record in open {
            let details = match ContentDetailsDocument::decode(&record.content_details) {
                Ok(details) => details,
                Err(e) => {
                    warn!(
                        record_id = %record.id,
                        error = %e,
                        "Skipping content request with unreadable details"
                    );
                    continue;
                }
            };
            views.push(ContentRequestView {
                id: record.id,
                action_type: record.action_type,
                content_type: record.content_type,
                target_id: record.target_id,
                target_name: record.target_name,
                requested_by: record.requested_by,
                requester_name: self.requester_name(record.requested_by).await,
                details,
                created_at: record.created_at,
            });
        }
        Ok(views)
    }
}

/// Transaction over a [`MemoryCatalogStore`].
pub struct MemoryCatalogTransaction {
    guard: OwnedMutexGuard<CatalogState>,
    working: CatalogState,
    availability: Availability,
}

impl MemoryCatalogTransaction {
    fn require_city(&self, id: CityId) -> AppResult<()> {
        if !self.working.cities.contains_key(&id) {
            return Err(AppError::conflict(format!("City {id} does not exist")));
        }
        Ok(())
    }
}

fn insert_new<K, V>(table: &mut HashMap<K, V>, key: K, value: V, what: &str) -> AppResult<()>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    if table.contains_key(&key) {
        return Err(AppError::conflict(format!("{what} {key} already exists")));
    }
    table.insert(key, value);
    Ok(())
}

fn replace_existing<K, V>(table: &mut HashMap<K, V>, key: K, value: V) -> bool
where
    K: std::hash::Hash + Eq,
{
    match table.get_mut(&key) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

#[async_trait]
impl CatalogTransaction for MemoryCatalogTransaction {
    async fn lock_price_update(&mut self, id: PriceUpdateId) -> AppResult<Option<PriceUpdate>> {
        self.availability.check()?;
        Ok(self.working.price_updates.get(&id).cloned())
    }

    async fn lock_content_request(
        &mut self,
        id: ContentRequestId,
    ) -> AppResult<Option<ContentRequest>> {
        self.availability.check()?;
        Ok(self.working.content_requests.get(&id).cloned())
    }

    async fn insert_price_update(&mut self, record: &PriceUpdate) -> AppResult<()> {
        self.availability.check()?;
        insert_new(
            &mut self.working.price_updates,
            record.id,
            record.clone(),
            "Price update",
        )
    }

    async fn insert_content_request(&mut self, record: &ContentRequest) -> AppResult<()> {
        self.availability.check()?;
        insert_new(
            &mut self.working.content_requests,
            record.id,
            record.clone(),
            "Content request",
        )
    }

    async fn resolve_price_update(
        &mut self,
        id: PriceUpdateId,
        resolution: &Resolution,
    ) -> AppResult<bool> {
        self.availability.check()?;
        match self.working.price_updates.get_mut(&id) {
            Some(record) if record.status == RequestStatus::Open => {
                record.resolve(resolution);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn resolve_content_request(
        &mut self,
        id: ContentRequestId,
        resolution: &Resolution,
        target_id: Option<Uuid>,
    ) -> AppResult<bool> {
        self.availability.check()?;
        match self.working.content_requests.get_mut(&id) {
            Some(record) if record.status == RequestStatus::Open => {
                record.target_id = record.target_id.or(target_id);
                record.resolve(resolution);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_city(&mut self, id: CityId) -> AppResult<Option<City>> {
        self.availability.check()?;
        Ok(self.working.cities.get(&id).cloned())
    }

    async fn insert_city(&mut self, city: &City) -> AppResult<()> {
        self.availability.check()?;
        insert_new(&mut self.working.cities, city.id, city.clone(), "City")
    }

    async fn update_city(&mut self, city: &City) -> AppResult<bool> {
        self.availability.check()?;
        Ok(replace_existing(&mut self.working.cities, city.id, city.clone()))
    }

    async fn delete_city(&mut self, id: CityId) -> AppResult<bool> {
        self.availability.check()?;
        if self.count_city_dependents(id).await? > 0 {
            return Err(AppError::conflict("City still has maps, sites, or tours"));
        }
        Ok(self.working.cities.remove(&id).is_some())
    }

    async fn count_city_dependents(&mut self, id: CityId) -> AppResult<u64> {
        self.availability.check()?;
        let w = &self.working;
        let count = w.maps.values().filter(|m| m.city_id == id).count()
            + w.sites.values().filter(|s| s.city_id == id).count()
            + w.tours.values().filter(|t| t.city_id == id).count();
        Ok(count as u64)
    }

    async fn find_map(&mut self, id: MapId) -> AppResult<Option<Map>> {
        self.availability.check()?;
        Ok(self.working.maps.get(&id).cloned())
    }

    async fn insert_map(&mut self, map: &Map) -> AppResult<()> {
        self.availability.check()?;
        self.require_city(map.city_id)?;
        insert_new(&mut self.working.maps, map.id, map.clone(), "Map")
    }

    async fn update_map(&mut self, map: &Map) -> AppResult<bool> {
        self.availability.check()?;
        Ok(replace_existing(&mut self.working.maps, map.id, map.clone()))
    }

    async fn delete_map(&mut self, id: MapId) -> AppResult<bool> {
        self.availability.check()?;
        Ok(self.working.maps.remove(&id).is_some())
    }

    async fn find_site(&mut self, id: SiteId) -> AppResult<Option<Site>> {
        self.availability.check()?;
        Ok(self.working.sites.get(&id).cloned())
    }

    async fn insert_site(&mut self, site: &Site) -> AppResult<()> {
        self.availability.check()?;
        self.require_city(site.city_id)?;
        insert_new(&mut self.working.sites, site.id, site.clone(), "Site")
    }

    async fn update_site(&mut self, site: &Site) -> AppResult<bool> {
        self.availability.check()?;
        Ok(replace_existing(&mut self.working.sites, site.id, site.clone()))
    }

    async fn delete_site(&mut self, id: SiteId) -> AppResult<bool> {
        self.availability.check()?;
        Ok(self.working.sites.remove(&id).is_some())
    }

    async fn find_tour(&mut self, id: TourId) -> AppResult<Option<Tour>> {
        self.availability.check()?;
        Ok(self.working.tours.get(&id).cloned())
    }

    async fn insert_tour(&mut self, tour: &Tour) -> AppResult<()> {
        self.availability.check()?;
        self.require_city(tour.city_id)?;
        insert_new(&mut self.working.tours, tour.id, tour.clone(), "Tour")
    }

    async fn update_tour(&mut self, tour: &Tour) -> AppResult<bool> {
        self.availability.check()?;
        Ok(replace_existing(&mut self.working.tours, tour.id, tour.clone()))
    }

    async fn delete_tour(&mut self, id: TourId) -> AppResult<bool> {
        self.availability.check()?;
        Ok(self.working.tours.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.availability.check()?;
        let Self {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
