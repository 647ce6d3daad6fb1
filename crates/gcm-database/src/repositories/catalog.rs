//! Catalog repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use gcm_core::types::{CityId, ContentRequestId, MapId, PriceUpdateId, SiteId, TourId, UserId};
use gcm_core::{AppError, AppResult, ErrorKind};
use gcm_entity::approval::{
    ContentAction, ContentDetailsDocument, ContentRequest, ContentRequestView, ContentType,
    PriceUpdate, PriceUpdateView,
};
use gcm_entity::catalog::{City, Map, Site, Tour};

use super::transaction::PgCatalogTransaction;
use crate::store::{CatalogStore, CatalogTransaction};

/// PostgreSQL-backed catalog store.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new catalog repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Open content request joined with its requester.
#[derive(Debug, FromRow)]
struct PendingContentRow {
    id: ContentRequestId,
    action_type: ContentAction,
    content_type: ContentType,
    target_id: Option<Uuid>,
    target_name: String,
    content_details: String,
    requested_by: Option<UserId>,
    requester_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl PendingContentRow {
    fn into_view(self) -> AppResult<ContentRequestView> {
        Ok(ContentRequestView {
            id: self.id,
            action_type: self.action_type,
            content_type: self.content_type,
            target_id: self.target_id,
            target_name: self.target_name,
            requested_by: self.requested_by,
            requester_name: self.requester_name,
            details: ContentDetailsDocument::decode(&self.content_details)?,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    async fn begin(&self) -> AppResult<Box<dyn CatalogTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgCatalogTransaction::new(tx)))
    }

    async fn find_city(&self, id: CityId) -> AppResult<Option<City>> {
        sqlx::query_as::<_, City>("SELECT * FROM cities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find city", e))
    }

    async fn find_map(&self, id: MapId) -> AppResult<Option<Map>> {
        sqlx::query_as::<_, Map>("SELECT * FROM maps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find map", e))
    }

    async fn find_site(&self, id: SiteId) -> AppResult<Option<Site>> {
        sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find site", e))
    }

    async fn find_tour(&self, id: TourId) -> AppResult<Option<Tour>> {
        sqlx::query_as::<_, Tour>("SELECT * FROM tours WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tour", e))
    }

    async fn find_price_update(&self, id: PriceUpdateId) -> AppResult<Option<PriceUpdate>> {
        sqlx::query_as::<_, PriceUpdate>("SELECT * FROM price_updates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find price update", e)
            })
    }

    async fn find_content_request(
        &self,
        id: ContentRequestId,
    ) -> AppResult<Option<ContentRequest>> {
        sqlx::query_as::<_, ContentRequest>("SELECT * FROM content_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find content request", e)
            })
    }

    async fn open_price_updates(&self) -> AppResult<Vec<PriceUpdateView>> {
        sqlx::query_as::<_, PriceUpdateView>(
            "SELECT p.id, p.map_id, m.name AS map_name, c.name AS city_name, \
                    p.requested_by, u.display_name AS requester_name, \
                    p.old_price, p.new_price, p.created_at \
             FROM price_updates p \
             LEFT JOIN maps m ON m.id = p.map_id \
             LEFT JOIN cities c ON c.id = m.city_id \
             LEFT JOIN users u ON u.id = p.requested_by \
             WHERE p.status = 'open' \
             ORDER BY p.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list pending price updates", e)
        })
    }

    async fn open_content_requests(&self) -> AppResult<Vec<ContentRequestView>> {
        let rows = sqlx::query_as::<_, PendingContentRow>(
            "SELECT r.id, r.action_type, r.content_type, r.target_id, r.target_name, \
                    r.content_details, r.requested_by, u.display_name AS requester_name, \
                    r.created_at \
             FROM content_requests r \
             LEFT JOIN users u ON u.id = r.requested_by \
             WHERE r.status = 'open' \
             ORDER BY r.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to list pending content requests",
                e,
            )
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                row.into_view()
                    .inspect_err(|e| {
                        warn!(
                            record_id = %id,
                            error = %e,
                            "Skipping content request with unreadable details"
                        );
                    })
                    .ok()
            })
            .collect())
    }
}
