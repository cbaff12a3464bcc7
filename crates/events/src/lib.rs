//! Marketplace events and the pub/sub plumbing that distributes them.
//!
//! Events here are notifications about things that already happened inside
//! the marketplace (an order was placed, ...). The marketplace itself never
//! depends on a bus; actors publish after their marketplace call returns.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
