//! Purchase Status Snapshot
//!
//! The client's in-memory copy of server-reported purchase status. Raw wire
//! payloads are rebuilt into snapshots with every derived field recomputed
//! from the authoritative ones; the wire payload's own derived values are
//! never trusted.

use std::collections::BTreeMap;

use paraworld_core::{Currency, RawAmount, ResourceType, UnixTime};
use serde::{Deserialize, Serialize};

use crate::calculator::{calculate_capacity, CapacityInput};

/// Wallet balances in raw currency units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub tdb_raw: RawAmount,
    pub yld_raw: RawAmount,
}

impl WalletSnapshot {
    /// Balance in the given settlement currency
    pub fn balance(&self, currency: Currency) -> RawAmount {
        match currency {
            Currency::Tdb => self.tdb_raw,
            Currency::Yld => self.yld_raw,
        }
    }

    /// Replace the balance for the given settlement currency
    pub fn set_balance(&mut self, currency: Currency, amount: RawAmount) {
        match currency {
            Currency::Tdb => self.tdb_raw = amount,
            Currency::Yld => self.yld_raw = amount,
        }
    }
}

/// Per-resource purchase state with derived fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub resource_type: ResourceType,
    /// Currency this resource settles in (server-reported)
    pub settlement: Currency,
    /// Units currently held
    pub current_amount: i64,
    /// Price per unit in raw currency units
    pub unit_price: RawAmount,
    /// Max units purchasable per rolling day
    pub daily_limit: i64,
    /// Units already purchased today
    pub today_purchased: i64,
    /// Max units allowed in one purchase call
    pub single_limit: i64,

    // Derived from the fields above, recomputed on every build and merge
    pub today_remaining: i64,
    pub can_buy: bool,
    pub max_can_buy: i64,
}

impl ResourceSnapshot {
    /// Build from a raw wire entry, deriving capacity against the wallet
    pub fn from_raw(raw: &RawResourceStatus, wallet: &WalletSnapshot) -> Self {
        let mut snapshot = Self {
            resource_type: raw.resource_type,
            settlement: raw.settlement,
            current_amount: raw.current_amount,
            unit_price: raw.unit_price,
            daily_limit: raw.daily_limit,
            today_purchased: raw.today_purchased,
            single_limit: raw.single_limit,
            today_remaining: 0,
            can_buy: false,
            max_can_buy: 0,
        };
        snapshot.recompute(wallet);
        snapshot
    }

    /// Recompute the derived fields against the given wallet
    pub fn recompute(&mut self, wallet: &WalletSnapshot) {
        let capacity = calculate_capacity(&CapacityInput {
            daily_limit: self.daily_limit,
            today_purchased: self.today_purchased,
            single_limit: self.single_limit,
            unit_price: self.unit_price,
            balance: wallet.balance(self.settlement),
        });
        self.today_remaining = capacity.today_remaining;
        self.can_buy = capacity.can_buy;
        self.max_can_buy = capacity.max_can_buy;
    }
}

/// Aggregate purchase status for the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseStatus {
    /// One entry per resource type reported by the backend
    pub resources: BTreeMap<ResourceType, ResourceSnapshot>,
    pub wallet: WalletSnapshot,
    /// When daily quotas roll over (unix seconds). Informational only: the
    /// client refetches after this point, it never resets counters locally.
    pub next_reset_time: UnixTime,
    /// When this snapshot was fetched (unix seconds, client clock)
    pub fetched_at: UnixTime,
}

impl PurchaseStatus {
    /// Build from a raw wire payload, deriving all capacity fields
    pub fn from_raw(raw: RawStatusPayload, fetched_at: UnixTime) -> Self {
        let wallet = WalletSnapshot {
            tdb_raw: raw.wallet.tdb_balance,
            yld_raw: raw.wallet.yld_balance,
        };

        let resources = raw
            .resources
            .iter()
            .map(|entry| {
                (
                    entry.resource_type,
                    ResourceSnapshot::from_raw(entry, &wallet),
                )
            })
            .collect();

        Self {
            resources,
            wallet,
            next_reset_time: raw.next_reset_time,
            fetched_at,
        }
    }

    /// Snapshot for one resource type, if the backend reported it
    pub fn resource(&self, resource: ResourceType) -> Option<&ResourceSnapshot> {
        self.resources.get(&resource)
    }

    /// Quotas have rolled over server-side; the snapshot must be refetched
    pub fn is_stale(&self, now: UnixTime) -> bool {
        self.next_reset_time > 0 && now >= self.next_reset_time
    }

    /// Recompute every resource's derived fields against the current wallet
    pub fn recompute_derived(&mut self) {
        let wallet = self.wallet;
        for snapshot in self.resources.values_mut() {
            snapshot.recompute(&wallet);
        }
    }
}

// ─── Wire DTOs ───────────────────────────────────────────────────────────────

/// Raw wallet entry as reported by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct RawWallet {
    #[serde(default)]
    pub tdb_balance: RawAmount,
    #[serde(default)]
    pub yld_balance: RawAmount,
}

/// Raw per-resource entry as reported by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct RawResourceStatus {
    pub resource_type: ResourceType,
    /// Defaults to TDB when the backend omits it
    #[serde(default)]
    pub settlement: Currency,
    #[serde(default)]
    pub current_amount: i64,
    pub unit_price: RawAmount,
    pub daily_limit: i64,
    #[serde(default)]
    pub today_purchased: i64,
    pub single_limit: i64,
}

/// Raw purchase-status payload as reported by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct RawStatusPayload {
    pub resources: Vec<RawResourceStatus>,
    pub wallet: RawWallet,
    #[serde(default)]
    pub next_reset_time: UnixTime,
}
