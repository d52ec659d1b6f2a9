//! Purchase Execution and Reconciliation
//!
//! Orchestrates a purchase end-to-end: local validation, the remote buy
//! call, and the merge of the server's authoritative receipt into the
//! cached snapshot. Emits notifications for confirmed purchases and
//! one-time quota exhaustion.

use std::collections::HashSet;

use paraworld_core::{ClientError, Error, RawAmount, ResourceType, ValidationError};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};

use crate::cache::StatusCache;
use crate::constants::endpoints;
use crate::fetch::now_unix;
use crate::snapshot::PurchaseStatus;
use crate::validate::validate_purchase;

// ─── Types ───────────────────────────────────────────────────────────────────

/// Request body for the buy endpoints
#[derive(Debug, Clone, Serialize)]
struct BuyRequest {
    resource_type: ResourceType,
    quantity: i64,
}

/// Authoritative post-purchase fields returned by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseReceipt {
    /// New holdings of the purchased resource
    pub resource_after: i64,
    /// New wallet balance in the settlement currency (raw units)
    pub balance_after: RawAmount,
    /// Units purchased today after this purchase
    pub today_purchased: i64,
    /// Units still purchasable today after this purchase
    pub today_remaining: i64,
    #[serde(default)]
    pub total_cost: RawAmount,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Notification kinds emitted by the purchaser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PurchaseConfirmed,
    QuotaExhausted,
}

/// User-facing event raised by a completed purchase
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseNotification {
    pub id: String,
    pub kind: NotificationKind,
    pub resource: ResourceType,
    pub message: String,
    pub timestamp: i64,
}

// ─── Receipt merge ───────────────────────────────────────────────────────────

/// Merge a confirmed receipt into the snapshot.
///
/// Replaces exactly the fields the server returned (never accumulates
/// deltas, so re-applying the same receipt leaves the snapshot unchanged)
/// and recomputes the derived fields from the merged values.
pub fn apply_receipt(
    status: &mut PurchaseStatus,
    resource: ResourceType,
    receipt: &PurchaseReceipt,
) {
    let settlement = match status.resources.get_mut(&resource) {
        Some(snapshot) => {
            snapshot.current_amount = receipt.resource_after;
            snapshot.today_purchased = receipt.today_purchased;
            snapshot.today_remaining = receipt.today_remaining;
            snapshot.settlement
        }
        None => return,
    };

    status.wallet.set_balance(settlement, receipt.balance_after);
    status.recompute_derived();
}

// ─── In-flight guard ─────────────────────────────────────────────────────────

/// At most one in-flight purchase per resource type
#[derive(Debug, Default)]
pub(crate) struct InFlightGuard {
    active: Mutex<HashSet<ResourceType>>,
}

impl InFlightGuard {
    /// Claim the resource; false if a purchase for it is already in flight
    pub async fn try_begin(&self, resource: ResourceType) -> bool {
        let mut active = self.active.lock().await;
        active.insert(resource)
    }

    /// Release the resource
    pub async fn finish(&self, resource: ResourceType) {
        let mut active = self.active.lock().await;
        active.remove(&resource);
    }
}

// ─── Purchaser ───────────────────────────────────────────────────────────────

/// Drives purchases against one status cache.
///
/// Purchases for different resource types proceed independently; a second
/// call for a type whose purchase is still in flight fails fast with
/// `PurchaseInProgress` instead of being queued.
pub struct Purchaser {
    cache: StatusCache,
    in_flight: InFlightGuard,
    exhausted_notified: Mutex<HashSet<ResourceType>>,
    notifications: Option<mpsc::UnboundedSender<PurchaseNotification>>,
}

impl Purchaser {
    pub fn new(cache: StatusCache) -> Self {
        Self {
            cache,
            in_flight: InFlightGuard::default(),
            exhausted_notified: Mutex::new(HashSet::new()),
            notifications: None,
        }
    }

    /// Create a purchaser that emits notifications on the given channel
    pub fn with_notifications(
        cache: StatusCache,
        sender: mpsc::UnboundedSender<PurchaseNotification>,
    ) -> Self {
        Self {
            notifications: Some(sender),
            ..Self::new(cache)
        }
    }

    /// Execute a purchase through the generalized buy endpoint
    pub async fn buy(
        &self,
        resource: ResourceType,
        quantity: i64,
    ) -> Result<PurchaseReceipt, Error> {
        self.buy_via(endpoints::RESOURCE_BUY, resource, quantity).await
    }

    /// Execute a food purchase through the legacy food-only route
    pub async fn buy_food(&self, quantity: i64) -> Result<PurchaseReceipt, Error> {
        self.buy_via(endpoints::FOOD_BUY, ResourceType::Food, quantity)
            .await
    }

    async fn buy_via(
        &self,
        path: &str,
        resource: ResourceType,
        quantity: i64,
    ) -> Result<PurchaseReceipt, Error> {
        // A snapshot past its quota reset must be refetched, never trusted;
        // fetch failures are reflected in the snapshot state the validator
        // sees (an auth failure will have cleared it).
        let _ = self.cache.ensure_fresh().await;

        // Local validation: rejections are immediate and make no network call
        let status = self.cache.status().await;
        validate_purchase(status.as_ref(), resource, quantity)?;

        if !self.in_flight.try_begin(resource).await {
            return Err(ValidationError::PurchaseInProgress { resource }.into());
        }

        let result = self.execute(path, resource, quantity).await;
        self.in_flight.finish(resource).await;
        result
    }

    async fn execute(
        &self,
        path: &str,
        resource: ResourceType,
        quantity: i64,
    ) -> Result<PurchaseReceipt, Error> {
        let request = BuyRequest {
            resource_type: resource,
            quantity,
        };

        let receipt: PurchaseReceipt =
            match self.cache.client().post_envelope(path, &request).await {
                Ok(receipt) => receipt,
                Err(ClientError::Rejected { message }) => {
                    // Server-side refusal means our quota understanding was
                    // stale; schedule a refresh and surface the reason verbatim
                    tracing::info!("Backend rejected {} purchase: {}", resource, message);
                    self.spawn_refresh();
                    return Err(ClientError::Rejected { message }.into());
                }
                // Pre-purchase state stands; no partial effect is assumed
                Err(e) => return Err(e.into()),
            };

        let updated = self
            .cache
            .update_snapshot(|status| apply_receipt(status, resource, &receipt))
            .await;

        self.emit(PurchaseNotification {
            id: uuid::Uuid::new_v4().to_string(),
            kind: NotificationKind::PurchaseConfirmed,
            resource,
            message: format!("Purchased {} {}", quantity, resource),
            timestamp: now_unix(),
        });

        let remaining = updated
            .as_ref()
            .and_then(|status| status.resource(resource))
            .map(|snapshot| snapshot.today_remaining);
        if let Some(remaining) = remaining {
            if self.should_notify_exhausted(resource, remaining).await {
                self.emit(PurchaseNotification {
                    id: uuid::Uuid::new_v4().to_string(),
                    kind: NotificationKind::QuotaExhausted,
                    resource,
                    message: format!("Daily {} quota exhausted", resource),
                    timestamp: now_unix(),
                });
            }
        }

        Ok(receipt)
    }

    /// One-time quota-exhausted gate: fires on the transition to zero and
    /// re-arms once remaining quota is observed again (e.g. after the daily
    /// reset)
    async fn should_notify_exhausted(&self, resource: ResourceType, remaining: i64) -> bool {
        let mut marked = self.exhausted_notified.lock().await;
        if remaining > 0 {
            marked.remove(&resource);
            false
        } else {
            marked.insert(resource)
        }
    }

    fn spawn_refresh(&self) {
        let cache = self.cache.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.refresh().await {
                tracing::warn!("Post-rejection refresh failed: {}", e);
            }
        });
    }

    fn emit(&self, notification: PurchaseNotification) {
        if let Some(sender) = &self.notifications {
            if sender.send(notification).is_err() {
                tracing::debug!("Notification receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use paraworld_core::BackendConfig;
    use paraworld_client::BackendClient;

    use crate::snapshot::RawStatusPayload;

    fn scenario_status() -> PurchaseStatus {
        // Scenario C: price 0.50 TDB, balance 100 TDB, quota 48 untouched
        let raw: RawStatusPayload = serde_json::from_value(serde_json::json!({
            "resources": [{
                "resource_type": "food",
                "current_amount": 0,
                "unit_price": 50,
                "daily_limit": 48,
                "today_purchased": 0,
                "single_limit": 48
            }],
            "wallet": { "tdb_balance": 10_000, "yld_balance": 0 }
        }))
        .unwrap();
        PurchaseStatus::from_raw(raw, 0)
    }

    fn scenario_receipt() -> PurchaseReceipt {
        serde_json::from_value(serde_json::json!({
            "resource_after": 20,
            "balance_after": 9_000,
            "today_purchased": 20,
            "today_remaining": 28,
            "total_cost": 1_000,
            "transaction_id": "tx-123"
        }))
        .unwrap()
    }

    fn make_purchaser() -> Purchaser {
        // Port 1 is never serving; fetches fail fast without a backend
        let client = BackendClient::new(BackendConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            session_token: String::new(),
        })
        .unwrap();
        Purchaser::new(StatusCache::new(client))
    }

    #[test]
    fn test_apply_receipt_merges_authoritative_fields() {
        let mut status = scenario_status();

        apply_receipt(&mut status, ResourceType::Food, &scenario_receipt());

        let food = status.resource(ResourceType::Food).unwrap();
        assert_eq!(food.current_amount, 20);
        assert_eq!(food.today_purchased, 20);
        assert_eq!(food.today_remaining, 28);
        assert_eq!(status.wallet.tdb_raw, 9_000);

        // Derived fields follow the merged values
        assert!(food.can_buy);
        // 9_000 / 50 = 180 affordable; quota leaves 28
        assert_eq!(food.max_can_buy, 28);
    }

    #[test]
    fn test_apply_receipt_is_idempotent() {
        let mut status = scenario_status();
        let receipt = scenario_receipt();

        apply_receipt(&mut status, ResourceType::Food, &receipt);
        let once = status.clone();
        apply_receipt(&mut status, ResourceType::Food, &receipt);

        // Replaying the same receipt must not double-subtract anything
        assert_eq!(status, once);
    }

    #[test]
    fn test_apply_receipt_unknown_resource_is_noop() {
        let mut status = scenario_status();
        let before = status.clone();

        apply_receipt(&mut status, ResourceType::Iron, &scenario_receipt());

        assert_eq!(status, before);
    }

    #[test]
    fn test_receipt_decoding_defaults() {
        let receipt: PurchaseReceipt = serde_json::from_str(
            r#"{
                "resource_after": 5,
                "balance_after": 100,
                "today_purchased": 5,
                "today_remaining": 43
            }"#,
        )
        .unwrap();

        assert_eq!(receipt.total_cost, 0);
        assert!(receipt.transaction_id.is_none());
    }

    #[tokio::test]
    async fn test_in_flight_guard_one_per_resource() {
        let guard = InFlightGuard::default();

        assert!(guard.try_begin(ResourceType::Food).await);
        // Same resource is rejected while in flight
        assert!(!guard.try_begin(ResourceType::Food).await);
        // A different resource proceeds independently
        assert!(guard.try_begin(ResourceType::Iron).await);

        guard.finish(ResourceType::Food).await;
        assert!(guard.try_begin(ResourceType::Food).await);
    }

    #[tokio::test]
    async fn test_quota_exhausted_fires_once_and_rearms() {
        let purchaser = make_purchaser();
        let food = ResourceType::Food;

        // First transition to zero fires
        assert!(purchaser.should_notify_exhausted(food, 0).await);
        // Repeats are deduplicated
        assert!(!purchaser.should_notify_exhausted(food, 0).await);

        // Quota visible again (daily reset) re-arms the gate
        assert!(!purchaser.should_notify_exhausted(food, 8).await);
        assert!(purchaser.should_notify_exhausted(food, 0).await);
    }

    #[tokio::test]
    async fn test_buy_without_snapshot_is_not_ready() {
        let purchaser = make_purchaser();

        // ensure_fresh cannot reach a backend, so the snapshot stays empty
        // and validation fails before any buy request is attempted
        match purchaser.buy(ResourceType::Food, 1).await {
            Err(Error::Validation(ValidationError::NotReady)) => {}
            other => panic!("Expected NotReady, got: {:?}", other),
        }
    }
}
