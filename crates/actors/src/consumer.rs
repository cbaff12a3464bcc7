//! Consumer actor: fills carts from shopping lists and places orders.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use marketsim_core::{CartId, MarketResult};
use marketsim_events::EventBus;
use marketsim_market::{Marketplace, Order, OrderPlaced};

use crate::error::ActorError;
use crate::handle::{ActorHandle, StatsCell, StopSignal};
use crate::retry::{RetryOutcome, RetryPolicy, retry_until};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartOpKind {
    /// Reserve the item into the cart.
    Add,
    /// Release the item from the cart back to the marketplace.
    Remove,
}

/// One shopping-list entry: repeat `kind` on `item`, `quantity` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartOp<I> {
    pub kind: CartOpKind,
    pub item: I,
    pub quantity: usize,
}

impl<I> CartOp<I> {
    pub fn add(item: I, quantity: usize) -> Self {
        Self {
            kind: CartOpKind::Add,
            item,
            quantity,
        }
    }

    pub fn remove(item: I, quantity: usize) -> Self {
        Self {
            kind: CartOpKind::Remove,
            item,
            quantity,
        }
    }
}

/// Operations applied, in order, to one cart.
pub type ShoppingList<I> = Vec<CartOp<I>>;

/// Receives every order a consumer places.
pub trait OrderSink<I>: Send + Sync {
    fn order_placed(&self, order: &Order<I>);
}

impl<I, B> OrderSink<I> for B
where
    I: Clone,
    B: EventBus<OrderPlaced<I>>,
{
    fn order_placed(&self, order: &Order<I>) {
        if let Err(e) = self.publish(OrderPlaced::from(order.clone())) {
            warn!(order_id = %order.order_id, error = ?e, "failed to publish order");
        }
    }
}

/// Consumer configuration.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Thread name and order buyer name.
    pub name: String,
    /// Pause after the marketplace refuses a reserve or release.
    pub retry_wait: Duration,
    /// Refusals tolerated per unit. `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            name: "consumer".to_string(),
            retry_wait: Duration::from_millis(100),
            max_retries: None,
        }
    }
}

impl ConsumerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_retry_wait(mut self, wait: Duration) -> Self {
        self.retry_wait = wait;
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = Some(max);
        self
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            wait: self.retry_wait,
            max_retries: self.max_retries,
        }
    }
}

/// Consumer actor.
///
/// For every shopping list: open a cart, apply each entry unit by unit
/// (retrying refused units after `retry_wait`), then finalize the cart into
/// an [`Order`].
pub struct Consumer<I> {
    market: Arc<Marketplace<I>>,
    lists: Vec<ShoppingList<I>>,
    config: ConsumerConfig,
    sink: Option<Arc<dyn OrderSink<I>>>,
}

impl<I> fmt::Debug for Consumer<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("name", &self.config.name)
            .field("lists", &self.lists.len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl<I> Consumer<I>
where
    I: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    pub fn new(
        market: Arc<Marketplace<I>>,
        lists: Vec<ShoppingList<I>>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            market,
            lists,
            config,
            sink: None,
        }
    }

    /// Announce every placed order to `sink` (typically an event bus).
    pub fn with_sink(mut self, sink: Arc<dyn OrderSink<I>>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Work through every shopping list on the calling thread.
    ///
    /// If `stop` is raised mid-list, the items already reserved into the
    /// current cart are handed back before returning [`ActorError::Stopped`].
    pub fn run(&self, stop: &StopSignal, stats: &StatsCell) -> Result<Vec<Order<I>>, ActorError> {
        info!(consumer = %self.config.name, lists = self.lists.len(), "consumer started");
        let mut orders = Vec::with_capacity(self.lists.len());

        for list in &self.lists {
            let cart_id = self.market.open_cart()?;
            if let Err(e) = self.fill_cart(cart_id, list, stop, stats) {
                if let Err(abandon_err) = self.abandon(cart_id) {
                    warn!(consumer = %self.config.name, %cart_id, error = %abandon_err, "failed to abandon cart");
                }
                return Err(e);
            }

            let items = self.market.finalize(cart_id)?.unwrap_or_default();
            let order = Order::new(cart_id, self.config.name.clone(), items);
            stats.record_order();
            debug!(
                consumer = %self.config.name,
                %cart_id,
                order_id = %order.order_id,
                items = order.len(),
                "order placed"
            );
            if let Some(sink) = &self.sink {
                sink.order_placed(&order);
            }
            orders.push(order);
        }

        info!(consumer = %self.config.name, orders = orders.len(), "consumer finished");
        Ok(orders)
    }

    /// Run every shopping list to completion on the calling thread.
    pub fn run_to_completion(&self) -> Result<Vec<Order<I>>, ActorError> {
        self.run(&StopSignal::never(), &StatsCell::new())
    }

    /// Run on a dedicated thread named after the consumer.
    pub fn spawn(self) -> Result<ActorHandle<Vec<Order<I>>>, ActorError> {
        let name = self.config.name.clone();
        ActorHandle::spawn(name, move |stop, stats| self.run(&stop, &stats))
    }

    fn fill_cart(
        &self,
        cart_id: CartId,
        list: &[CartOp<I>],
        stop: &StopSignal,
        stats: &StatsCell,
    ) -> Result<(), ActorError> {
        let policy = self.config.retry_policy();
        for op in list {
            for _ in 0..op.quantity {
                let outcome = retry_until(&policy, stop, stats, || self.apply(cart_id, op))?;
                match outcome {
                    RetryOutcome::Completed => {}
                    RetryOutcome::Stopped => return Err(ActorError::Stopped),
                    RetryOutcome::Exhausted { attempts } => {
                        warn!(
                            consumer = %self.config.name,
                            %cart_id,
                            item = ?op.item,
                            attempts,
                            "giving up on cart operation"
                        );
                        return Err(ActorError::RetriesExhausted {
                            item: format!("{:?}", op.item),
                            attempts,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(&self, cart_id: CartId, op: &CartOp<I>) -> MarketResult<bool> {
        match op.kind {
            CartOpKind::Add => self.market.reserve(cart_id, &op.item),
            CartOpKind::Remove => self.market.release(cart_id, &op.item),
        }
    }

    /// Hand every reserved item back and close the cart.
    fn abandon(&self, cart_id: CartId) -> Result<(), ActorError> {
        let held = self.market.cart_items(cart_id)?;
        for item in &held {
            self.market.release(cart_id, item)?;
        }
        self.market.finalize(cart_id)?;
        info!(consumer = %self.config.name, %cart_id, returned = held.len(), "cart abandoned");
        Ok(())
    }
}
