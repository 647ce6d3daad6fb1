//! Map price change workflow.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use gcm_core::types::{MapId, PriceUpdateId, UserId};
use gcm_database::{CatalogStore, CatalogTransaction};
use gcm_entity::approval::{Decision, PriceUpdate, PriceUpdateView, RequestStatus, Resolution};
use gcm_entity::catalog::map::validate_price;

use super::error::{ApprovalError, ApprovalResult};
use super::{finish, stamp};

/// Price records are closed either way; the decision is kept alongside.
fn terminal_status(_decision: Decision) -> RequestStatus {
    RequestStatus::Closed
}

/// Proposes and decides map price changes.
///
/// Submitting never touches the live price; only an approval does.
#[derive(Debug, Clone)]
pub struct PriceApprovalService {
    catalog: Arc<dyn CatalogStore>,
}

impl PriceApprovalService {
    /// Creates a new price approval service.
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Record a proposed price for a map.
    ///
    /// The map's current price is captured as the old price. Several open
    /// proposals for one map may coexist.
    pub async fn submit(
        &self,
        map_id: MapId,
        requested_by: Option<UserId>,
        new_price: Decimal,
    ) -> ApprovalResult<PriceUpdate> {
        validate_price(new_price)?;

        let mut tx = self.catalog.begin().await?;
        let result = Self::submit_in(tx.as_mut(), map_id, requested_by, new_price).await;
        let record = finish(tx, result).await?;

        info!(
            record_id = %record.id,
            map_id = %map_id,
            old_price = %record.old_price,
            new_price = %record.new_price,
            "Price change submitted"
        );
        Ok(record)
    }

    async fn submit_in(
        tx: &mut dyn CatalogTransaction,
        map_id: MapId,
        requested_by: Option<UserId>,
        new_price: Decimal,
    ) -> ApprovalResult<PriceUpdate> {
        let map = tx
            .find_map(map_id)
            .await?
            .ok_or_else(|| ApprovalError::TargetMissing(format!("Map {map_id}")))?;

        if map.price == new_price {
            return Err(ApprovalError::Validation(
                "New price equals the current price".into(),
            ));
        }

        let record = PriceUpdate::open(map.id, requested_by, map.price, new_price);
        tx.insert_price_update(&record).await?;
        Ok(record)
    }

    /// Open proposals, newest first.
    pub async fn list_pending(&self) -> ApprovalResult<Vec<PriceUpdateView>> {
        Ok(self.catalog.open_price_updates().await?)
    }

    /// Apply the proposed price and close the record.
    pub async fn approve(&self, id: PriceUpdateId, approver: UserId) -> ApprovalResult<PriceUpdate> {
        self.decide(id, Decision::Approve, approver).await
    }

    /// Close the record without touching the map.
    pub async fn deny(&self, id: PriceUpdateId, denier: UserId) -> ApprovalResult<PriceUpdate> {
        self.decide(id, Decision::Deny, denier).await
    }

    async fn decide(
        &self,
        id: PriceUpdateId,
        decision: Decision,
        actor: UserId,
    ) -> ApprovalResult<PriceUpdate> {
        let mut tx = self.catalog.begin().await?;
        let result = Self::decide_in(tx.as_mut(), id, decision, actor).await;
        let record = finish(tx, result).await?;

        info!(
            record_id = %id,
            map_id = %record.map_id,
            decision = %decision,
            processed_by = %actor,
            "Price change resolved"
        );
        Ok(record)
    }

    async fn decide_in(
        tx: &mut dyn CatalogTransaction,
        id: PriceUpdateId,
        decision: Decision,
        actor: UserId,
    ) -> ApprovalResult<PriceUpdate> {
        let mut record = tx
            .lock_price_update(id)
            .await?
            .ok_or_else(|| ApprovalError::NotFound(id.to_string()))?;

        if record.status.is_terminal() {
            return Err(ApprovalError::AlreadyResolved {
                id: id.to_string(),
                status: record.status,
            });
        }

        if decision == Decision::Approve {
            let target = || ApprovalError::TargetMissing(format!("Map {}", record.map_id));
            let mut map = tx.find_map(record.map_id).await?.ok_or_else(target)?;
            map.price = record.new_price;
            if !tx.update_map(&map).await? {
                return Err(target());
            }
        }

        let resolution = Resolution {
            decision,
            status: terminal_status(decision),
            processed_by: actor,
            processed_at: stamp(),
        };
        if !tx.resolve_price_update(id, &resolution).await? {
            return Err(ApprovalError::AlreadyResolved {
                id: id.to_string(),
                status: record.status,
            });
        }

        record.resolve(&resolution);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcm_database::memory::MemoryCatalogStore;
    use gcm_entity::catalog::{CityDraft, Map, MapDraft};

    async fn setup() -> (PriceApprovalService, MemoryCatalogStore, Map) {
        let store = MemoryCatalogStore::new();
        let city = CityDraft {
            name: "Haifa".into(),
            description: String::new(),
        }
        .into_city();
        let map = MapDraft {
            city_id: city.id,
            name: "Downtown".into(),
            description: String::new(),
            price: Decimal::new(10, 0),
        }
        .into_map();
        let mut tx = store.begin().await.unwrap();
        tx.insert_city(&city).await.unwrap();
        tx.insert_map(&map).await.unwrap();
        tx.commit().await.unwrap();

        (PriceApprovalService::new(Arc::new(store.clone())), store, map)
    }

    #[tokio::test]
    async fn test_submit_does_not_touch_price() {
        let (service, store, map) = setup().await;
        let record = service
            .submit(map.id, None, Decimal::new(15, 0))
            .await
            .unwrap();

        assert_eq!(record.status, RequestStatus::Open);
        assert_eq!(record.old_price, Decimal::new(10, 0));
        let live = store.find_map(map.id).await.unwrap().unwrap();
        assert_eq!(live.price, Decimal::new(10, 0));
        assert_eq!(service.list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_approve_applies_once() {
        let (service, store, map) = setup().await;
        let approver = UserId::new();
        let record = service
            .submit(map.id, None, Decimal::new(15, 0))
            .await
            .unwrap();

        let closed = service.approve(record.id, approver).await.unwrap();
        assert_eq!(closed.status, RequestStatus::Closed);
        assert_eq!(closed.resolution, Some(Decision::Approve));
        assert_eq!(closed.processed_by, Some(approver));
        assert!(closed.processed_at.is_some());
        let live = store.find_map(map.id).await.unwrap().unwrap();
        assert_eq!(live.price, Decimal::new(15, 0));

        let again = service.approve(record.id, approver).await.unwrap_err();
        assert_eq!(again.reason(), "already_resolved");
        let stored = store.find_price_update(record.id).await.unwrap().unwrap();
        assert_eq!(stored, closed);
    }

    #[tokio::test]
    async fn test_deny_leaves_price() {
        let (service, store, map) = setup().await;
        let record = service
            .submit(map.id, None, Decimal::new(25, 0))
            .await
            .unwrap();

        let closed = service.deny(record.id, UserId::new()).await.unwrap();
        assert_eq!(closed.status, RequestStatus::Closed);
        assert_eq!(closed.resolution, Some(Decision::Deny));
        let live = store.find_map(map.id).await.unwrap().unwrap();
        assert_eq!(live.price, Decimal::new(10, 0));
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let (service, _, map) = setup().await;
        let err = service
            .submit(map.id, None, Decimal::new(-5, 0))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "validation");

        let err = service
            .submit(MapId::new(), None, Decimal::new(5, 0))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "target_missing");
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let (service, _, _) = setup().await;
        let err = service
            .approve(PriceUpdateId::new(), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "not_found");
    }

    #[tokio::test]
    async fn test_outage_leaves_record_open() {
        let (service, store, map) = setup().await;
        let record = service
            .submit(map.id, None, Decimal::new(15, 0))
            .await
            .unwrap();

        store.set_unavailable(true);
        let err = service.approve(record.id, UserId::new()).await.unwrap_err();
        assert_eq!(err.reason(), "persistence");
        store.set_unavailable(false);

        let stored = store.find_price_update(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Open);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_approvals_single_winner() {
        let (service, store, map) = setup().await;
        let record = service
            .submit(map.id, None, Decimal::new(15, 0))
            .await
            .unwrap();

        let attempts = (0..8).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.approve(record.id, UserId::new()).await })
        });
        let results = futures::future::join_all(attempts).await;

        let winners = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();
        assert_eq!(winners, 1);
        let live = store.find_map(map.id).await.unwrap().unwrap();
        assert_eq!(live.price, Decimal::new(15, 0));
    }
}
