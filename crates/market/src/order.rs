//! Finalized carts as orders, and the event announcing them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketsim_core::{CartId, OrderId};
use marketsim_events::Event;

/// A finalized cart: what a consumer actually bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order<I> {
    pub order_id: OrderId,
    pub cart_id: CartId,
    /// Name of the consumer that placed the order.
    pub buyer: String,
    /// Purchased items in reservation order.
    pub items: Vec<I>,
    pub placed_at: DateTime<Utc>,
}

impl<I> Order<I> {
    pub fn new(cart_id: CartId, buyer: impl Into<String>, items: Vec<I>) -> Self {
        Self {
            order_id: OrderId::new(),
            cart_id,
            buyer: buyer.into(),
            items,
            placed_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<I: core::fmt::Display> Order<I> {
    /// One `"<buyer> bought <item>"` line per purchased item.
    pub fn receipt_lines(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| format!("{} bought {}", self.buyer, item))
            .collect()
    }
}

/// Event: an order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced<I> {
    pub order: Order<I>,
}

impl<I> From<Order<I>> for OrderPlaced<I> {
    fn from(order: Order<I>) -> Self {
        Self { order }
    }
}

impl<I> Event for OrderPlaced<I>
where
    I: Clone + core::fmt::Debug + Send + Sync + 'static,
{
    fn event_type(&self) -> &'static str {
        "market.order.placed"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.order.placed_at
    }
}
