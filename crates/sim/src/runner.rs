//! Plays a [`Scenario`] out on real threads.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, anyhow};
use serde::Serialize;
use tracing::{error, info};

use marketsim_actors::{ActorError, ActorHandle, ActorStats, Consumer, Producer, ProducerReport};
use marketsim_events::{EventBus, InMemoryEventBus, Subscription};
use marketsim_market::{MarketSnapshot, Marketplace, Order, OrderPlaced};

use crate::product::Product;
use crate::scenario::Scenario;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Placed orders, grouped by consumer in scenario order.
    pub orders: Vec<Order<Product>>,
    pub producers: Vec<ProducerReport>,
    pub consumers: Vec<(String, ActorStats)>,
    /// Receipt lines written by the order printer.
    pub receipts: usize,
    /// Marketplace state after every actor has stopped.
    pub market: MarketSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub orders: usize,
    pub items_bought: usize,
    pub receipts: usize,
    pub producers: Vec<ProducerReport>,
    pub consumers: Vec<(String, ActorStats)>,
    pub market: MarketSnapshot,
}

impl RunReport {
    pub fn items_bought(&self) -> usize {
        self.orders.iter().map(Order::len).sum()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            orders: self.orders.len(),
            items_bought: self.items_bought(),
            receipts: self.receipts,
            producers: self.producers.clone(),
            consumers: self.consumers.clone(),
            market: self.market.clone(),
        }
    }
}

/// Run `scenario` to completion, writing one `"<buyer> bought <product>"`
/// line to `out` per purchased item.
///
/// Producers start first, then consumers. The run ends when every consumer
/// has worked through its shopping lists; producers are then stopped.
pub fn run_scenario(scenario: &Scenario, out: &mut (dyn Write + Send)) -> anyhow::Result<RunReport> {
    scenario.validate().context("invalid scenario")?;

    let market: Arc<Marketplace<Product>> = Arc::new(Marketplace::new(scenario.marketplace));
    let bus: Arc<InMemoryEventBus<OrderPlaced<Product>>> = Arc::new(InMemoryEventBus::new());

    let producers = scenario
        .producers
        .iter()
        .map(|plan| -> anyhow::Result<Producer<Product>> {
            let catalog = scenario.catalog_for(plan)?;
            let config = scenario.producer_config(plan)?;
            Producer::new(market.clone(), catalog, config)
                .with_context(|| format!("registering producer {}", plan.name))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let consumers = scenario
        .consumers
        .iter()
        .map(|plan| -> anyhow::Result<Consumer<Product>> {
            let lists = scenario.lists_for(plan)?;
            let config = scenario.consumer_config(plan)?;
            Ok(Consumer::new(market.clone(), lists, config).with_sink(bus.clone()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    // Consumers now hold the only references to the bus. Once the last of
    // them finishes, the subscription disconnects and the printer returns.
    let subscription = bus.subscribe();
    drop(bus);

    info!(
        producers = producers.len(),
        consumers = consumers.len(),
        capacity = scenario.marketplace.queue_size_per_producer,
        "simulation starting"
    );

    thread::scope(|s| -> anyhow::Result<RunReport> {
        let printer = thread::Builder::new()
            .name("order-printer".to_string())
            .spawn_scoped(s, move || print_receipts(subscription, out))
            .context("spawning order printer")?;

        let producer_handles = spawn_all(producers, Producer::spawn)?;
        let consumer_handles = spawn_all(consumers, Consumer::spawn)?;

        let mut orders = Vec::new();
        let mut consumer_stats = Vec::new();
        let mut first_failure = None;
        for handle in consumer_handles {
            let name = handle.name().to_string();
            let stats = handle.stats_cell();
            match handle.join() {
                Ok(placed) => orders.extend(placed),
                Err(e) => {
                    error!(consumer = %name, error = %e, "consumer failed");
                    first_failure.get_or_insert((name.clone(), e));
                }
            }
            consumer_stats.push((name, stats.get()));
        }

        let mut producer_reports = Vec::new();
        for handle in producer_handles {
            let name = handle.name().to_string();
            let report = handle
                .shutdown()
                .with_context(|| format!("producer {name} failed"))?;
            producer_reports.push(report);
        }

        let receipts = printer
            .join()
            .map_err(|_| anyhow!("order printer panicked"))?
            .context("writing receipts")?;

        if let Some((name, e)) = first_failure {
            return Err(anyhow::Error::new(e).context(format!("consumer {name} failed")));
        }

        let report = RunReport {
            orders,
            producers: producer_reports,
            consumers: consumer_stats,
            receipts,
            market: market.snapshot()?,
        };
        info!(
            orders = report.orders.len(),
            items_bought = report.items_bought(),
            "simulation finished"
        );
        Ok(report)
    })
}

fn spawn_all<A, T>(
    actors: Vec<A>,
    spawn: impl Fn(A) -> Result<ActorHandle<T>, ActorError>,
) -> anyhow::Result<Vec<ActorHandle<T>>> {
    actors
        .into_iter()
        .map(|actor| spawn(actor).context("spawning actor thread"))
        .collect()
}

/// Write receipt lines for every announced order until the bus goes away.
fn print_receipts(
    subscription: Subscription<OrderPlaced<Product>>,
    out: &mut (dyn Write + Send),
) -> io::Result<usize> {
    let mut lines = 0;
    while let Ok(event) = subscription.recv() {
        for line in event.order.receipt_lines() {
            writeln!(out, "{line}")?;
            lines += 1;
        }
    }
    out.flush()?;
    Ok(lines)
}
