//! Purchase Admissibility Validation
//!
//! Pure, ordered checks run before any network call: they give the user
//! immediate feedback and avoid needless failed requests. Each rejection is
//! a distinct [`ValidationError`] carrying its user-facing payload.

use paraworld_core::{ResourceType, ValidationError};

use crate::calculator::purchase_cost;
use crate::snapshot::PurchaseStatus;

/// Decide whether a candidate purchase is admissible against the snapshot.
///
/// Checks run in order and short-circuit on the first failure:
/// 1. snapshot loaded and covering the resource, else `NotReady`
/// 2. quantity within `1..=single_limit`, else `InvalidQuantity`
/// 3. daily quota headroom, else `DailyLimitExceeded` (with the remaining)
/// 4. settlement balance covers the cost, else `InsufficientBalance`
pub fn validate_purchase(
    status: Option<&PurchaseStatus>,
    resource: ResourceType,
    quantity: i64,
) -> Result<(), ValidationError> {
    let status = status.ok_or(ValidationError::NotReady)?;
    let snapshot = status.resource(resource).ok_or(ValidationError::NotReady)?;

    if quantity < 1 || quantity > snapshot.single_limit {
        return Err(ValidationError::InvalidQuantity {
            quantity,
            single_limit: snapshot.single_limit,
        });
    }

    if snapshot.today_purchased + quantity > snapshot.daily_limit {
        return Err(ValidationError::DailyLimitExceeded {
            remaining: snapshot.today_remaining,
            daily_limit: snapshot.daily_limit,
        });
    }

    let required = purchase_cost(quantity, snapshot.unit_price);
    let available = status.wallet.balance(snapshot.settlement);
    if required > available {
        return Err(ValidationError::InsufficientBalance {
            currency: snapshot.settlement,
            required,
            available,
        });
    }

    Ok(())
}
