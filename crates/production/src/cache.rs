//! Resource Status Cache
//!
//! Owns the purchase-status snapshot for one consuming view: manual and
//! periodic refresh, duplicate-refresh suppression, and request sequencing
//! so a superseded fetch can never overwrite a newer request's result.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use paraworld_client::BackendClient;
use paraworld_core::{ClientError, ResourceType};
use tokio::sync::RwLock;

use crate::fetch::{fetch_purchase_status, now_unix};
use crate::snapshot::PurchaseStatus;

/// Monotonic request-token guard.
///
/// Each issued fetch takes a token; a completion is applied only while its
/// token is still the most recently issued one.
#[derive(Debug, Default)]
pub(crate) struct FetchSequencer {
    issued: AtomicU64,
}

impl FetchSequencer {
    /// Issue the token for a new request
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True while `token` belongs to the most recently issued request
    pub fn is_current(&self, token: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == token
    }
}

struct CacheInner {
    client: BackendClient,
    snapshot: RwLock<Option<PurchaseStatus>>,
    last_error: RwLock<Option<ClientError>>,
    filter: RwLock<Option<ResourceType>>,
    seq: FetchSequencer,
    in_flight: AtomicU64,
    refreshing: AtomicBool,
    polling: AtomicBool,
}

/// Per-view cache of the user's purchase status.
///
/// Each consuming view owns its own instance; snapshots are never shared
/// mutable state across unrelated views.
#[derive(Clone)]
pub struct StatusCache {
    inner: Arc<CacheInner>,
}

impl StatusCache {
    /// Create an empty cache backed by the given client
    pub fn new(client: BackendClient) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                client,
                snapshot: RwLock::new(None),
                last_error: RwLock::new(None),
                filter: RwLock::new(None),
                seq: FetchSequencer::default(),
                in_flight: AtomicU64::new(0),
                refreshing: AtomicBool::new(false),
                polling: AtomicBool::new(false),
            }),
        }
    }

    /// The backend client this cache fetches through
    pub fn client(&self) -> BackendClient {
        self.inner.client.clone()
    }

    /// Current snapshot, if one has been loaded
    pub async fn status(&self) -> Option<PurchaseStatus> {
        self.inner.snapshot.read().await.clone()
    }

    /// Most recent fetch error, cleared by the next successful fetch
    pub async fn last_error(&self) -> Option<ClientError> {
        self.inner.last_error.read().await.clone()
    }

    /// True while at least one status fetch is in flight
    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Fetch status with the given filter, superseding any in-flight request
    pub async fn fetch_status(&self, filter: Option<ResourceType>) -> Result<(), ClientError> {
        {
            let mut lock = self.inner.filter.write().await;
            *lock = filter;
        }
        self.fetch_with_token(filter).await
    }

    /// Re-fetch with the last-used filter.
    ///
    /// A refresh while one is already in flight is suppressed; the caller
    /// simply observes the in-progress result.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        if self.inner.refreshing.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let filter = { *self.inner.filter.read().await };
        let result = self.fetch_with_token(filter).await;
        self.inner.refreshing.store(false, Ordering::SeqCst);
        result
    }

    /// Refetch when nothing is cached or the cached snapshot is past its
    /// quota reset (counters are never reset locally)
    pub async fn ensure_fresh(&self) -> Result<(), ClientError> {
        let stale = {
            let snapshot = self.inner.snapshot.read().await;
            match snapshot.as_ref() {
                Some(status) => status.is_stale(now_unix()),
                None => true,
            }
        };

        if stale {
            self.refresh().await
        } else {
            Ok(())
        }
    }

    /// Start the background refresh loop (no-op if already running).
    ///
    /// The loop holds only a weak reference to the cache: dropping every
    /// handle ends it, and `stop_periodic_refresh` tears it down without
    /// waiting for the next tick to fire a refresh.
    pub fn start_periodic_refresh(&self, interval: Duration) {
        if self.inner.polling.swap(true, Ordering::SeqCst) {
            return; // Already running
        }

        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let inner = match weak.upgrade() {
                    Some(inner) => inner,
                    None => break, // cache dropped
                };
                if !inner.polling.load(Ordering::SeqCst) {
                    break; // stopped
                }

                let cache = StatusCache { inner };
                if let Err(e) = cache.refresh().await {
                    tracing::warn!("Periodic status refresh failed: {}", e);
                }
            }

            tracing::debug!("Status refresh loop stopped");
        });
    }

    /// Stop the background refresh loop
    pub fn stop_periodic_refresh(&self) {
        self.inner.polling.store(false, Ordering::SeqCst);
    }

    async fn fetch_with_token(&self, filter: Option<ResourceType>) -> Result<(), ClientError> {
        let token = self.inner.seq.begin();

        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = fetch_purchase_status(&self.inner.client, filter).await;
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.apply_completion(token, result).await
    }

    /// Apply a fetch completion unless a newer request superseded it.
    ///
    /// Auth failures clear the snapshot (it is no longer trustworthy);
    /// transient failures keep the last-known-good snapshot in place.
    pub(crate) async fn apply_completion(
        &self,
        token: u64,
        result: Result<PurchaseStatus, ClientError>,
    ) -> Result<(), ClientError> {
        if !self.inner.seq.is_current(token) {
            tracing::debug!("Discarding superseded status fetch (token {})", token);
            return Ok(());
        }

        match result {
            Ok(status) => {
                *self.inner.snapshot.write().await = Some(status);
                *self.inner.last_error.write().await = None;
                Ok(())
            }
            Err(ClientError::Unauthorized) => {
                tracing::warn!("Status fetch unauthorized, clearing snapshot");
                *self.inner.snapshot.write().await = None;
                *self.inner.last_error.write().await = Some(ClientError::Unauthorized);
                // No automatic retry without a session
                self.inner.polling.store(false, Ordering::SeqCst);
                Err(ClientError::Unauthorized)
            }
            Err(e) => {
                tracing::warn!("Status fetch failed: {}", e);
                *self.inner.last_error.write().await = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Issue a request token directly (used by tests to simulate in-flight
    /// requests without a live backend)
    #[cfg(test)]
    pub(crate) fn begin_token(&self) -> u64 {
        self.inner.seq.begin()
    }

    /// Mutate the cached snapshot in place, returning the updated copy
    pub(crate) async fn update_snapshot<F>(&self, mutate: F) -> Option<PurchaseStatus>
    where
        F: FnOnce(&mut PurchaseStatus),
    {
        let mut lock = self.inner.snapshot.write().await;
        match lock.as_mut() {
            Some(status) => {
                mutate(status);
                Some(status.clone())
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use paraworld_core::BackendConfig;

    use crate::snapshot::WalletSnapshot;

    fn make_cache() -> StatusCache {
        let client = BackendClient::new(BackendConfig::default()).unwrap();
        StatusCache::new(client)
    }

    /// Minimal status distinguishable by its reset-time marker
    fn make_status(marker: i64) -> PurchaseStatus {
        PurchaseStatus {
            resources: BTreeMap::new(),
            wallet: WalletSnapshot::default(),
            next_reset_time: marker,
            fetched_at: 0,
        }
    }

    #[test]
    fn test_sequencer_tokens_are_monotonic() {
        let seq = FetchSequencer::default();

        let first = seq.begin();
        let second = seq.begin();

        assert!(second > first);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[tokio::test]
    async fn test_superseded_completion_is_discarded() {
        // Scenario: a fetch is in flight when a second one is issued; the
        // older response arrives last but must never become visible.
        let cache = make_cache();

        let older = cache.begin_token();
        let newer = cache.begin_token();

        cache
            .apply_completion(newer, Ok(make_status(2)))
            .await
            .unwrap();
        cache.apply_completion(older, Ok(make_status(1))).await.unwrap();

        let status = cache.status().await.unwrap();
        assert_eq!(status.next_reset_time, 2);
    }

    #[tokio::test]
    async fn test_superseded_completion_even_when_arriving_first() {
        let cache = make_cache();

        let older = cache.begin_token();
        let newer = cache.begin_token();

        // The superseded response arrives first and is dropped outright
        cache.apply_completion(older, Ok(make_status(1))).await.unwrap();
        assert!(cache.status().await.is_none());

        cache
            .apply_completion(newer, Ok(make_status(2)))
            .await
            .unwrap();
        assert_eq!(cache.status().await.unwrap().next_reset_time, 2);
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_snapshot() {
        let cache = make_cache();

        let token = cache.begin_token();
        cache.apply_completion(token, Ok(make_status(1))).await.unwrap();

        let token = cache.begin_token();
        let err = cache
            .apply_completion(
                token,
                Err(ClientError::Network {
                    url: "http://backend".into(),
                    message: "connection reset".into(),
                }),
            )
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "network_error");
        // Stale-but-available beats empty
        assert!(cache.status().await.is_some());
        assert!(cache.last_error().await.is_some());
    }

    #[tokio::test]
    async fn test_auth_failure_clears_snapshot() {
        let cache = make_cache();

        let token = cache.begin_token();
        cache.apply_completion(token, Ok(make_status(1))).await.unwrap();

        let token = cache.begin_token();
        let err = cache
            .apply_completion(token, Err(ClientError::Unauthorized))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Unauthorized));
        assert!(cache.status().await.is_none());
    }

    #[tokio::test]
    async fn test_success_clears_prior_error() {
        let cache = make_cache();

        let token = cache.begin_token();
        let _ = cache
            .apply_completion(
                token,
                Err(ClientError::Network {
                    url: "http://backend".into(),
                    message: "timeout".into(),
                }),
            )
            .await;
        assert!(cache.last_error().await.is_some());

        let token = cache.begin_token();
        cache.apply_completion(token, Ok(make_status(1))).await.unwrap();
        assert!(cache.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_update_snapshot_requires_loaded_state() {
        let cache = make_cache();

        let updated = cache.update_snapshot(|_| {}).await;
        assert!(updated.is_none());

        let token = cache.begin_token();
        cache.apply_completion(token, Ok(make_status(1))).await.unwrap();

        let updated = cache
            .update_snapshot(|status| status.next_reset_time = 9)
            .await;
        assert_eq!(updated.unwrap().next_reset_time, 9);
        assert_eq!(cache.status().await.unwrap().next_reset_time, 9);
    }
}
