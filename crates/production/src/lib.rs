//! Resource Purchase Client
//!
//! This crate implements the client side of Parallel World's resource
//! production purchasing: daily-quota tracking, affordability checks, and
//! optimistic reconciliation of purchase receipts.
//!
//! # Overview
//!
//! Three cooperating pieces:
//! - [`StatusCache`]: fetches and holds the purchase-status snapshot for one
//!   consuming view, with duplicate-refresh suppression and request
//!   sequencing so a superseded fetch never overwrites a newer one.
//! - [`validate_purchase`]: pure admissibility checks run before any network
//!   call (quantity bounds, daily quota, settlement balance).
//! - [`Purchaser`]: orchestrates validate → buy → merge, enforcing one
//!   in-flight purchase per resource type and emitting purchase/quota
//!   notifications.
//!
//! # Example
//!
//! ```ignore
//! use production::{Purchaser, StatusCache};
//!
//! let cache = StatusCache::new(client);
//! cache.fetch_status(None).await?;
//!
//! let purchaser = Purchaser::new(cache.clone());
//! let receipt = purchaser.buy(ResourceType::Food, 20).await?;
//! println!("Paid {} raw units", receipt.total_cost);
//! ```

pub mod cache;
pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod purchase;
pub mod snapshot;
pub mod validate;

pub use cache::StatusCache;
pub use calculator::*;
pub use constants::*;
pub use fetch::{fetch_food_purchase_status, fetch_purchase_status};
pub use purchase::{
    apply_receipt, NotificationKind, PurchaseNotification, PurchaseReceipt, Purchaser,
};
pub use snapshot::*;
pub use validate::validate_purchase;
