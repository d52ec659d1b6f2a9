//! Core type definitions for the Parallel World client

use serde::{Deserialize, Serialize};
use std::fmt;

/// Consumable in-game resource subject to a daily purchase quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Food,
    Iron,
    Stone,
    Wood,
}

impl ResourceType {
    /// All resource types known to the client
    pub const ALL: [ResourceType; 4] = [Self::Food, Self::Iron, Self::Stone, Self::Wood];

    /// Wire value used in API paths and query parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Iron => "iron",
            Self::Stone => "stone",
            Self::Wood => "wood",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement currency
///
/// TDB is the primary currency; YLD is a secondary token also accepted for
/// certain resource purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Tdb,
    Yld,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tdb => "tdb",
            Self::Yld => "yld",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed-point currency amount in raw units (100 raw units = 1.00)
pub type RawAmount = i64;

/// Unix timestamp in seconds
pub type UnixTime = i64;

/// Constants
pub mod constants {
    use super::RawAmount;

    /// Both settlement currencies carry 2 decimal places
    pub const CURRENCY_DECIMALS: u8 = 2;

    /// 1.00 TDB or YLD in raw units
    pub const RAW_PER_WHOLE: RawAmount = 100;
}
