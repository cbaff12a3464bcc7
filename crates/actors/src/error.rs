use thiserror::Error;

use marketsim_core::MarketError;

/// Why an actor stopped before finishing its work.
#[derive(Debug, Error)]
pub enum ActorError {
    /// The marketplace rejected a call as misuse (unknown id, poisoned lock).
    #[error(transparent)]
    Market(#[from] MarketError),

    /// A bounded retry budget ran out.
    #[error("gave up on {item} after {attempts} attempts")]
    RetriesExhausted { item: String, attempts: u32 },

    /// The actor was asked to stop in the middle of a shopping list.
    #[error("stopped before finishing")]
    Stopped,

    #[error("failed to spawn actor thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("actor thread panicked")]
    Panicked,
}
