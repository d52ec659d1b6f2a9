//! Purchase Status Fetching
//!
//! Fetches purchase-status payloads from the backend and rebuilds them into
//! domain snapshots with derived fields recomputed.

use std::time::{SystemTime, UNIX_EPOCH};

use paraworld_client::BackendClient;
use paraworld_core::{ClientError, ResourceType, UnixTime};

use crate::constants::endpoints;
use crate::snapshot::{PurchaseStatus, RawStatusPayload};

/// Fetch purchase status for all resources, or one when a filter is given
pub async fn fetch_purchase_status(
    client: &BackendClient,
    filter: Option<ResourceType>,
) -> Result<PurchaseStatus, ClientError> {
    let mut query: Vec<(&str, &str)> = Vec::new();
    if let Some(resource) = filter {
        query.push(("type", resource.as_str()));
    }

    let payload: RawStatusPayload = client
        .get_envelope(endpoints::RESOURCE_STATUS, &query)
        .await?;

    Ok(PurchaseStatus::from_raw(payload, now_unix()))
}

/// Fetch food purchase status via the legacy food-only route
pub async fn fetch_food_purchase_status(
    client: &BackendClient,
) -> Result<PurchaseStatus, ClientError> {
    let payload: RawStatusPayload = client.get_envelope(endpoints::FOOD_STATUS, &[]).await?;

    Ok(PurchaseStatus::from_raw(payload, now_unix()))
}

/// Current unix time in seconds (client clock)
pub(crate) fn now_unix() -> UnixTime {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as UnixTime
}
