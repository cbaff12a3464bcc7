//! Strongly-typed identifiers used across the marketplace.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MarketError;

/// Identifier of a registered producer.
///
/// Issued sequentially by the marketplace, starting at 0.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProducerId(u64);

/// Identifier of a cart.
///
/// Issued sequentially by the marketplace, starting at 1. Never reused within
/// one marketplace instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(u64);

/// Identifier of a placed order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

macro_rules! impl_sequential_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            /// The identifier issued right after this one.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = MarketError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| MarketError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_sequential_newtype!(ProducerId, "ProducerId");
impl_sequential_newtype!(CartId, "CartId");

impl OrderId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered), so orders sort by placement time.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for OrderId {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| MarketError::invalid_id(format!("OrderId: {e}")))?;
        Ok(Self(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_id_parses_from_its_display_form() {
        let id = ProducerId::from_raw(7);
        let parsed: ProducerId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn malformed_cart_id_is_rejected() {
        let err = "cart-1".parse::<CartId>().unwrap_err();
        match err {
            MarketError::InvalidId(msg) => assert!(msg.starts_with("CartId")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn sequential_ids_advance_by_one() {
        assert_eq!(CartId::from_raw(1).next(), CartId::from_raw(2));
        assert_eq!(ProducerId::from_raw(0).next().get(), 1);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&CartId::from_raw(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn order_id_parses_from_its_display_form() {
        let a = OrderId::new();
        assert_eq!(a.as_uuid().get_version_num(), 7);
        let parsed: OrderId = a.to_string().parse().unwrap();
        assert_eq!(parsed, a);
    }
}
