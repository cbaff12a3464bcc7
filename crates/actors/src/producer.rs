//! Producer actor: keeps its catalog listed in the marketplace.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use marketsim_core::ProducerId;
use marketsim_market::Marketplace;

use crate::error::ActorError;
use crate::handle::{ActorHandle, StatsCell, StopSignal};
use crate::retry::{RetryOutcome, RetryPolicy, retry_until};

/// One line of a producer's catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry<I> {
    pub item: I,
    /// Units to publish per pass over the catalog.
    pub quantity: usize,
    /// Pause after each unit is accepted.
    pub production_delay: Duration,
}

impl<I> CatalogEntry<I> {
    pub fn new(item: I, quantity: usize, production_delay: Duration) -> Self {
        Self {
            item,
            quantity,
            production_delay,
        }
    }
}

/// Producer configuration.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Thread name, also used in logs.
    pub name: String,
    /// Pause after the marketplace refuses a unit.
    pub republish_wait: Duration,
    /// Passes over the catalog. `None` replays it until stopped.
    pub rounds: Option<usize>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            name: "producer".to_string(),
            republish_wait: Duration::from_millis(100),
            rounds: None,
        }
    }
}

impl ProducerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_republish_wait(mut self, wait: Duration) -> Self {
        self.republish_wait = wait;
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }
}

/// What a producer got done before it exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProducerReport {
    pub producer_id: ProducerId,
    pub published: usize,
    /// Complete passes over the catalog.
    pub rounds: usize,
}

/// Producer actor.
///
/// Registers with the marketplace when constructed, then publishes every
/// catalog entry `quantity` times per round. A refused unit is retried after
/// `republish_wait`; it is never skipped.
pub struct Producer<I> {
    id: ProducerId,
    market: Arc<Marketplace<I>>,
    catalog: Vec<CatalogEntry<I>>,
    config: ProducerConfig,
}

impl<I> fmt::Debug for Producer<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("catalog_len", &self.catalog.len())
            .finish()
    }
}

impl<I> Producer<I>
where
    I: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    pub fn new(
        market: Arc<Marketplace<I>>,
        catalog: Vec<CatalogEntry<I>>,
        config: ProducerConfig,
    ) -> Result<Self, ActorError> {
        let id = market.register_producer()?;
        info!(producer = %config.name, producer_id = %id, "producer ready");
        Ok(Self {
            id,
            market,
            catalog,
            config,
        })
    }

    pub fn id(&self) -> ProducerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Run on the calling thread until the configured rounds are done or
    /// `stop` is raised.
    pub fn run(&self, stop: &StopSignal, stats: &StatsCell) -> Result<ProducerReport, ActorError> {
        self.run_limited(self.config.rounds, stop, stats)
    }

    /// Run exactly `rounds` passes on the calling thread.
    pub fn run_rounds(&self, rounds: usize) -> Result<ProducerReport, ActorError> {
        self.run_limited(Some(rounds), &StopSignal::never(), &StatsCell::new())
    }

    fn run_limited(
        &self,
        rounds: Option<usize>,
        stop: &StopSignal,
        stats: &StatsCell,
    ) -> Result<ProducerReport, ActorError> {
        let mut report = ProducerReport {
            producer_id: self.id,
            published: 0,
            rounds: 0,
        };
        // Nothing to publish: replaying an empty catalog would spin.
        if self.catalog.iter().all(|e| e.quantity == 0) {
            return Ok(report);
        }

        let policy = RetryPolicy::forever(self.config.republish_wait);
        info!(producer = %self.config.name, "producer started");

        'rounds: while rounds.is_none_or(|max| report.rounds < max) {
            for entry in &self.catalog {
                for _ in 0..entry.quantity {
                    let outcome = retry_until(&policy, stop, stats, || {
                        self.market.publish(self.id, entry.item.clone())
                    })?;
                    match outcome {
                        RetryOutcome::Completed => report.published += 1,
                        RetryOutcome::Stopped => break 'rounds,
                        RetryOutcome::Exhausted { attempts } => {
                            return Err(ActorError::RetriesExhausted {
                                item: format!("{:?}", entry.item),
                                attempts,
                            });
                        }
                    }
                    debug!(producer = %self.config.name, item = ?entry.item, "unit published");
                    if stop.sleep(entry.production_delay) {
                        break 'rounds;
                    }
                }
            }
            report.rounds += 1;
        }

        info!(
            producer = %self.config.name,
            published = report.published,
            rounds = report.rounds,
            "producer stopped"
        );
        Ok(report)
    }

    /// Run on a dedicated thread named after the producer.
    pub fn spawn(self) -> Result<ActorHandle<ProducerReport>, ActorError> {
        let name = self.config.name.clone();
        ActorHandle::spawn(name, move |stop, stats| self.run(&stop, &stats))
    }
}
