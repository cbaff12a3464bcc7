//! Producer and consumer actors.
//!
//! Each actor runs on its own named thread and talks to a shared
//! [`Marketplace`](marketsim_market::Marketplace). All waiting (backoff after
//! a refusal, production delays) happens here, never inside a marketplace
//! call.

pub mod consumer;
pub mod error;
pub mod handle;
pub mod producer;
pub mod retry;

pub use consumer::{CartOp, CartOpKind, Consumer, ConsumerConfig, OrderSink, ShoppingList};
pub use error::ActorError;
pub use handle::{ActorHandle, ActorStats, StatsCell, StopSignal};
pub use producer::{CatalogEntry, Producer, ProducerConfig, ProducerReport};
pub use retry::{RetryOutcome, RetryPolicy, retry_until};
