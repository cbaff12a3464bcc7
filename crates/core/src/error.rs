//! Marketplace error model.

use thiserror::Error;

use crate::id::{CartId, ProducerId};

/// Result type used across the marketplace layer.
pub type MarketResult<T> = Result<T, MarketError>;

/// Marketplace-level error.
///
/// Only misuse ends up here. Refusals that happen under normal contention
/// (producer at capacity, item not listed, item not in cart) are reported as
/// plain `false` values by the marketplace and are expected to be retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// The producer id was never issued by this marketplace.
    #[error("unknown producer: {0}")]
    UnknownProducer(ProducerId),

    /// The cart id is not open (never issued, or already finalized).
    #[error("unknown cart: {0}")]
    UnknownCart(CartId),

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A producer's outstanding count would drop below zero.
    #[error("capacity accounting out of sync for producer {0}")]
    CapacityUnderflow(ProducerId),

    /// A thread panicked while holding the marketplace lock.
    #[error("marketplace state poisoned")]
    Poisoned,
}

impl MarketError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the error means the caller holds an id the marketplace does
    /// not recognise.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownProducer(_) | Self::UnknownCart(_))
    }
}
