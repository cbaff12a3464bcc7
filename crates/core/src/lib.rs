//! `marketsim-core`: identifiers and the error model shared by every
//! marketplace crate.
//!
//! This crate holds no state and performs no IO.

pub mod error;
pub mod id;

pub use error::{MarketError, MarketResult};
pub use id::{CartId, OrderId, ProducerId};
