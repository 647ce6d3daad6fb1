//! Applying an approved content change to the catalog.

use tracing::debug;
use uuid::Uuid;

use gcm_core::types::{CityId, MapId, SiteId, TourId};
use gcm_database::CatalogTransaction;
use gcm_entity::approval::{ContentDetails, ContentDetailsDocument, ContentRequest};

use super::error::{ApprovalError, ApprovalResult};

fn missing(what: &str, id: impl std::fmt::Display) -> ApprovalError {
    ApprovalError::TargetMissing(format!("{what} {id}"))
}

fn target_of(request: &ContentRequest) -> ApprovalResult<Uuid> {
    request.target_id.ok_or_else(|| {
        ApprovalError::Validation(format!(
            "{} of {} requires a target id",
            request.action_type, request.content_type
        ))
    })
}

/// Decode the stored details and check they describe the record's action.
pub fn decode_details(request: &ContentRequest) -> ApprovalResult<ContentDetails> {
    let details = ContentDetailsDocument::decode(&request.content_details)?;
    if details.action_type() != request.action_type
        || details.content_type() != request.content_type
    {
        return Err(ApprovalError::Validation(format!(
            "Details describe {} {} but the request is {} {}",
            details.action_type(),
            details.content_type(),
            request.action_type,
            request.content_type
        )));
    }
    Ok(details)
}

/// Perform the change described by `request` inside `tx`.
///
/// Returns the id of the created, edited, or deleted entity.
pub async fn apply_content(
    tx: &mut dyn CatalogTransaction,
    request: &ContentRequest,
) -> ApprovalResult<Uuid> {
    let details = decode_details(request)?;
    details.validate()?;

    let affected = match details {
        ContentDetails::AddCity(draft) => {
            let city = draft.into_city();
            tx.insert_city(&city).await?;
            city.id.into_uuid()
        }
        ContentDetails::EditCity(patch) => {
            let id = CityId::from_uuid(target_of(request)?);
            let mut city = tx.find_city(id).await?.ok_or_else(|| missing("City", id))?;
            patch.apply_to(&mut city);
            if !tx.update_city(&city).await? {
                return Err(missing("City", id));
            }
            id.into_uuid()
        }
        ContentDetails::DeleteCity => {
            let id = CityId::from_uuid(target_of(request)?);
            tx.find_city(id).await?.ok_or_else(|| missing("City", id))?;
            let dependents = tx.count_city_dependents(id).await?;
            if dependents > 0 {
                return Err(ApprovalError::Conflict(format!(
                    "City {id} still has {dependents} map(s), site(s), or tour(s)"
                )));
            }
            if !tx.delete_city(id).await? {
                return Err(missing("City", id));
            }
            id.into_uuid()
        }

        ContentDetails::AddMap(draft) => {
            tx.find_city(draft.city_id)
                .await?
                .ok_or_else(|| missing("City", draft.city_id))?;
            let map = draft.into_map();
            tx.insert_map(&map).await?;
            map.id.into_uuid()
        }
        ContentDetails::EditMap(patch) => {
            let id = MapId::from_uuid(target_of(request)?);
            let mut map = tx.find_map(id).await?.ok_or_else(|| missing("Map", id))?;
            patch.apply_to(&mut map);
            if !tx.update_map(&map).await? {
                return Err(missing("Map", id));
            }
            id.into_uuid()
        }
        ContentDetails::DeleteMap => {
            let id = MapId::from_uuid(target_of(request)?);
            if !tx.delete_map(id).await? {
                return Err(missing("Map", id));
            }
            id.into_uuid()
        }

        ContentDetails::AddSite(draft) => {
            tx.find_city(draft.city_id)
                .await?
                .ok_or_else(|| missing("City", draft.city_id))?;
            let site = draft.into_site();
            tx.insert_site(&site).await?;
            site.id.into_uuid()
        }
        ContentDetails::EditSite(patch) => {
            let id = SiteId::from_uuid(target_of(request)?);
            let mut site = tx.find_site(id).await?.ok_or_else(|| missing("Site", id))?;
            patch.apply_to(&mut site);
            if !tx.update_site(&site).await? {
                return Err(missing("Site", id));
            }
            id.into_uuid()
        }
        ContentDetails::DeleteSite => {
            let id = SiteId::from_uuid(target_of(request)?);
            if !tx.delete_site(id).await? {
                return Err(missing("Site", id));
            }
            id.into_uuid()
        }

        ContentDetails::AddTour(draft) => {
            tx.find_city(draft.city_id)
                .await?
                .ok_or_else(|| missing("City", draft.city_id))?;
            let tour = draft.into_tour();
            tx.insert_tour(&tour).await?;
            tour.id.into_uuid()
        }
        ContentDetails::EditTour(patch) => {
            let id = TourId::from_uuid(target_of(request)?);
            let mut tour = tx.find_tour(id).await?.ok_or_else(|| missing("Tour", id))?;
            patch.apply_to(&mut tour);
            if !tx.update_tour(&tour).await? {
                return Err(missing("Tour", id));
            }
            id.into_uuid()
        }
        ContentDetails::DeleteTour => {
            let id = TourId::from_uuid(target_of(request)?);
            if !tx.delete_tour(id).await? {
                return Err(missing("Tour", id));
            }
            id.into_uuid()
        }
    };

    debug!(
        request_id = %request.id,
        action = %request.action_type,
        content_type = %request.content_type,
        entity_id = %affected,
        "Content change applied"
    );
    Ok(affected)
}
