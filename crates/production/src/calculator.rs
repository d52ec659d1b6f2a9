//! Purchase Capacity Calculator
//!
//! Pure math functions for quota and affordability state.
//! No I/O, no async - just deterministic calculations.
//!
//! # Units
//!
//! - Currency amounts: raw units (i64), 100 raw units = 1.00 TDB/YLD
//! - Quantities: whole resource units (i64)
//! - Cost intermediates use i128 to avoid overflow

use paraworld_core::RawAmount;

/// Input state for one resource's capacity calculation
#[derive(Debug, Clone)]
pub struct CapacityInput {
    /// Units purchasable per rolling day
    pub daily_limit: i64,
    /// Units already purchased today
    pub today_purchased: i64,
    /// Max units allowed in one purchase call
    pub single_limit: i64,
    /// Price per unit in raw currency units
    pub unit_price: RawAmount,
    /// Wallet balance in the resource's settlement currency (raw units)
    pub balance: RawAmount,
}

/// Calculated capacity state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capacity {
    /// Units still purchasable today (never negative)
    pub today_remaining: i64,
    /// Whether at least one unit can be bought right now
    pub can_buy: bool,
    /// Max units purchasable in one call given quota, balance, and call cap
    pub max_can_buy: i64,
}

/// Calculate capacity state for one resource
pub fn calculate_capacity(input: &CapacityInput) -> Capacity {
    let today_remaining = remaining_today(input.daily_limit, input.today_purchased);

    // floor(balance / unit_price); an unpriced resource is limited by quota
    // and the per-call cap only
    let affordable = if input.unit_price > 0 {
        (input.balance / input.unit_price).max(0)
    } else {
        i64::MAX
    };

    let can_buy = today_remaining > 0 && input.balance >= input.unit_price;

    let max_can_buy = affordable
        .min(today_remaining)
        .min(input.single_limit)
        .max(0);

    Capacity {
        today_remaining,
        can_buy,
        max_can_buy,
    }
}

/// Units still purchasable today, clamped at zero
pub fn remaining_today(daily_limit: i64, today_purchased: i64) -> i64 {
    (daily_limit - today_purchased).max(0)
}

/// Total cost of a purchase in raw currency units
pub fn purchase_cost(quantity: i64, unit_price: RawAmount) -> RawAmount {
    let cost = (quantity as i128) * (unit_price as i128);
    cost.min(i64::MAX as i128) as i64
}
