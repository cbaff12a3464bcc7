//! Marketplace domain module.
//!
//! Shared state for a bounded multi-producer/multi-consumer market:
//!
//! - [`ItemRegistry`]: items currently listed and free to reserve
//! - [`CapacityTable`]: per-producer outstanding counts and the ceiling
//! - [`CartStore`]: open carts and the items reserved into them
//! - [`Marketplace`]: the synchronized facade over all three
//!
//! The facade is the only type meant to be shared between threads. The three
//! components are plain single-threaded data structures it composes under
//! one lock.

pub mod capacity;
pub mod cart;
pub mod config;
pub mod listing;
pub mod marketplace;
pub mod order;
pub mod registry;

pub use capacity::{CapacityTable, ProducerSlot};
pub use cart::{Cart, CartStore};
pub use config::MarketConfig;
pub use listing::Listing;
pub use marketplace::{MarketSnapshot, Marketplace};
pub use order::{Order, OrderPlaced};
pub use registry::ItemRegistry;
