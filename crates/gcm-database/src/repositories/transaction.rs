//! PostgreSQL catalog transaction.
//!
//! Loads use `SELECT ... FOR UPDATE` so concurrent approvals of one record
//! serialise on the row lock, and resolve statements only match rows that
//! are still open.

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use gcm_core::types::{CityId, ContentRequestId, MapId, PriceUpdateId, SiteId, TourId};
use gcm_core::{AppError, AppResult, ErrorKind};
use gcm_entity::approval::{ContentRequest, PriceUpdate, Resolution};
use gcm_entity::catalog::{City, Map, Site, Tour};

use crate::store::CatalogTransaction;

/// A catalog transaction over one pooled connection.
pub struct PgCatalogTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgCatalogTransaction {
    /// Wrap an open sqlx transaction.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// Foreign key violations on insert mean the parent city is gone.
fn insert_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match e {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            AppError::conflict("Parent city does not exist")
        }
        _ => AppError::with_source(ErrorKind::Database, context, e),
    }
}

#[async_trait]
impl CatalogTransaction for PgCatalogTransaction {
    async fn lock_price_update(&mut self, id: PriceUpdateId) -> AppResult<Option<PriceUpdate>> {
        sqlx::query_as::<_, PriceUpdate>("SELECT * FROM price_updates WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err("Failed to lock price update"))
    }

    async fn lock_content_request(
        &mut self,
        id: ContentRequestId,
    ) -> AppResult<Option<ContentRequest>> {
        sqlx::query_as::<_, ContentRequest>(
            "SELECT * FROM content_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("Failed to lock content request"))
    }

    async fn insert_price_update(&mut self, record: &PriceUpdate) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO price_updates \
             (id, map_id, requested_by, old_price, new_price, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.id)
        .bind(record.map_id)
        .bind(record.requested_by)
        .bind(record.old_price)
        .bind(record.new_price)
        .bind(record.status)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to insert price update"))?;
        Ok(())
    }

    async fn insert_content_request(&mut self, record: &ContentRequest) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO content_requests \
             (id, requested_by, action_type, content_type, target_id, target_name, \
              content_details, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(record.id)
        .bind(record.requested_by)
        .bind(record.action_type)
        .bind(record.content_type)
        .bind(record.target_id)
        .bind(&record.target_name)
        .bind(&record.content_details)
        .bind(record.status)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to insert content request"))?;
        Ok(())
    }

    async fn resolve_price_update(
        &mut self,
        id: PriceUpdateId,
        resolution: &Resolution,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE price_updates \
             SET status = $2, resolution = $3, processed_at = $4, processed_by = $5 \
             WHERE id = $1 AND status = 'open'",
        )
        .bind(id)
        .bind(resolution.status)
        .bind(resolution.decision)
        .bind(resolution.processed_at)
        .bind(resolution.processed_by)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to resolve price update"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn resolve_content_request(
        &mut self,
        id: ContentRequestId,
        resolution: &Resolution,
        target_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE content_requests \
             SET status = $2, processed_at = $3, processed_by = $4, \
                 target_id = COALESCE(target_id, $5) \
             WHERE id = $1 AND status = 'open'",
        )
        .bind(id)
        .bind(resolution.status)
        .bind(resolution.processed_at)
        .bind(resolution.processed_by)
        .bind(target_id)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to resolve content request"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_city(&mut self, id: CityId) -> AppResult<Option<City>> {
        sqlx::query_as::<_, City>("SELECT * FROM cities WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err("Failed to lock city"))
    }

    async fn insert_city(&mut self, city: &City) -> AppResult<()> {
        sqlx::query("INSERT INTO cities (id, name, description) VALUES ($1, $2, $3)")
            .bind(city.id)
            .bind(&city.name)
            .bind(&city.description)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("Failed to insert city"))?;
        Ok(())
    }

    async fn update_city(&mut self, city: &City) -> AppResult<bool> {
        let result = sqlx::query("UPDATE cities SET name = $2, description = $3 WHERE id = $1")
            .bind(city.id)
            .bind(&city.name)
            .bind(&city.description)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("Failed to update city"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_city(&mut self, id: CityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM cities WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::conflict("City still has maps, sites, or tours")
                }
                _ => AppError::with_source(ErrorKind::Database, "Failed to delete city", e),
            })?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_city_dependents(&mut self, id: CityId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM maps WHERE city_id = $1) \
                  + (SELECT COUNT(*) FROM sites WHERE city_id = $1) \
                  + (SELECT COUNT(*) FROM tours WHERE city_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err("Failed to count city dependents"))?;
        Ok(count.max(0) as u64)
    }

    async fn find_map(&mut self, id: MapId) -> AppResult<Option<Map>> {
        sqlx::query_as::<_, Map>("SELECT * FROM maps WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err("Failed to lock map"))
    }

    async fn insert_map(&mut self, map: &Map) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO maps (id, city_id, name, description, price) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(map.id)
        .bind(map.city_id)
        .bind(&map.name)
        .bind(&map.description)
        .bind(map.price)
        .execute(&mut *self.tx)
        .await
        .map_err(insert_err("Failed to insert map"))?;
        Ok(())
    }

    async fn update_map(&mut self, map: &Map) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE maps SET name = $2, description = $3, price = $4 WHERE id = $1",
        )
        .bind(map.id)
        .bind(&map.name)
        .bind(&map.description)
        .bind(map.price)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to update map"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_map(&mut self, id: MapId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM maps WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("Failed to delete map"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_site(&mut self, id: SiteId) -> AppResult<Option<Site>> {
        sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err("Failed to lock site"))
    }

    async fn insert_site(&mut self, site: &Site) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO sites (id, city_id, name, description, category, accessible, visit_minutes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(site.id)
        .bind(site.city_id)
        .bind(&site.name)
        .bind(&site.description)
        .bind(&site.category)
        .bind(site.accessible)
        .bind(site.visit_minutes)
        .execute(&mut *self.tx)
        .await
        .map_err(insert_err("Failed to insert site"))?;
        Ok(())
    }

    async fn update_site(&mut self, site: &Site) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE sites SET name = $2, description = $3, category = $4, accessible = $5, \
             visit_minutes = $6 WHERE id = $1",
        )
        .bind(site.id)
        .bind(&site.name)
        .bind(&site.description)
        .bind(&site.category)
        .bind(site.accessible)
        .bind(site.visit_minutes)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to update site"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_site(&mut self, id: SiteId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("Failed to delete site"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_tour(&mut self, id: TourId) -> AppResult<Option<Tour>> {
        sqlx::query_as::<_, Tour>("SELECT * FROM tours WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err("Failed to lock tour"))
    }

    async fn insert_tour(&mut self, tour: &Tour) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO tours (id, city_id, name, description, total_minutes) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(tour.id)
        .bind(tour.city_id)
        .bind(&tour.name)
        .bind(&tour.description)
        .bind(tour.total_minutes)
        .execute(&mut *self.tx)
        .await
        .map_err(insert_err("Failed to insert tour"))?;
        Ok(())
    }

    async fn update_tour(&mut self, tour: &Tour) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE tours SET name = $2, description = $3, total_minutes = $4 WHERE id = $1",
        )
        .bind(tour.id)
        .bind(&tour.name)
        .bind(&tour.description)
        .bind(tour.total_minutes)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to update tour"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_tour(&mut self, id: TourId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("Failed to delete tour"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(db_err("Failed to commit transaction"))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(db_err("Failed to roll back transaction"))
    }
}
