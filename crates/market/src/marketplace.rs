//! The synchronized marketplace facade.
//!
//! Every operation takes the single state lock, does a bounded amount of work
//! and returns. Nothing here sleeps or waits for availability: a refusal is
//! returned as `false` and the caller decides when to try again.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use marketsim_core::{CartId, MarketError, MarketResult, ProducerId};

use crate::capacity::{CapacityTable, ProducerSlot};
use crate::cart::CartStore;
use crate::config::MarketConfig;
use crate::listing::Listing;
use crate::registry::ItemRegistry;

/// Everything the lock guards. The three parts are only ever mutated together.
#[derive(Debug)]
struct MarketState<I> {
    registry: ItemRegistry<I>,
    capacity: CapacityTable,
    carts: CartStore<I>,
}

/// Point-in-time view of the marketplace counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketSnapshot {
    pub capacity: usize,
    pub producers: Vec<ProducerSlot>,
    /// Items listed and free to reserve.
    pub listed: usize,
    /// Items sitting in open carts.
    pub reserved: usize,
    pub open_carts: usize,
}

/// Shared registry of producer capacity, listed items and open carts.
///
/// Share it between actor threads behind an `Arc`. All methods take `&self`.
///
/// Refusals under normal contention come back as `Ok(false)` (or `Ok(None)`
/// for [`finalize`](Self::finalize)). `Err` is reserved for ids the
/// marketplace never issued, carts that are no longer open, and a poisoned
/// lock.
pub struct Marketplace<I> {
    config: MarketConfig,
    state: Mutex<MarketState<I>>,
}

impl<I> fmt::Debug for Marketplace<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marketplace")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<I> Marketplace<I> {
    pub fn new(config: MarketConfig) -> Self {
        Self {
            config,
            state: Mutex::new(MarketState {
                registry: ItemRegistry::new(),
                capacity: CapacityTable::new(config.queue_size_per_producer),
                carts: CartStore::new(),
            }),
        }
    }

    /// Build a marketplace with the given per-producer ceiling.
    pub fn with_capacity(queue_size_per_producer: usize) -> MarketResult<Self> {
        Ok(Self::new(MarketConfig::new(queue_size_per_producer)?))
    }

    pub fn config(&self) -> MarketConfig {
        self.config
    }

    /// Per-producer ceiling on listed items.
    pub fn capacity(&self) -> usize {
        self.config.queue_size_per_producer
    }

    fn lock(&self) -> MarketResult<MutexGuard<'_, MarketState<I>>> {
        self.state.lock().map_err(|_| MarketError::Poisoned)
    }

    /// Register a new producer with nothing listed.
    ///
    /// Ids are issued in call order starting at 0.
    pub fn register_producer(&self) -> MarketResult<ProducerId> {
        let producer_id = self.lock()?.capacity.register();
        info!(%producer_id, "producer registered");
        Ok(producer_id)
    }

    /// Open an empty cart.
    ///
    /// Ids are issued in call order starting at 1 and are never reused.
    pub fn open_cart(&self) -> MarketResult<CartId> {
        let cart_id = self.lock()?.carts.open();
        info!(%cart_id, "cart opened");
        Ok(cart_id)
    }

    /// Remove the cart and hand back its items in reservation order.
    ///
    /// Returns `Ok(None)` for a cart that is not open, including one that was
    /// already finalized.
    pub fn finalize(&self, cart_id: CartId) -> MarketResult<Option<Vec<I>>> {
        let cart = self.lock()?.carts.take(cart_id);
        match cart {
            Some(cart) => {
                let items = cart.into_items();
                info!(%cart_id, items = items.len(), "cart finalized");
                Ok(Some(items))
            }
            None => {
                debug!(%cart_id, "finalize on a cart that is not open");
                Ok(None)
            }
        }
    }

    /// Items currently listed by `producer_id`.
    pub fn outstanding(&self, producer_id: ProducerId) -> MarketResult<usize> {
        self.lock()?.capacity.outstanding(producer_id)
    }

    /// Number of listed items (all producers).
    pub fn listed(&self) -> MarketResult<usize> {
        Ok(self.lock()?.registry.len())
    }

    /// Number of open carts.
    pub fn open_carts(&self) -> MarketResult<usize> {
        Ok(self.lock()?.carts.len())
    }

    pub fn snapshot(&self) -> MarketResult<MarketSnapshot> {
        let state = self.lock()?;
        Ok(MarketSnapshot {
            capacity: state.capacity.capacity(),
            producers: state.capacity.slots().to_vec(),
            listed: state.registry.len(),
            reserved: state.carts.reserved(),
            open_carts: state.carts.len(),
        })
    }
}

impl<I> Marketplace<I>
where
    I: PartialEq + fmt::Debug,
{
    /// List `item` on behalf of `producer_id`.
    ///
    /// Returns `Ok(false)`, changing nothing, when the producer already has
    /// `capacity` items listed. The item is visible to reservers as soon as
    /// this returns `Ok(true)`.
    pub fn publish(&self, producer_id: ProducerId, item: I) -> MarketResult<bool> {
        let mut state = self.lock()?;
        if !state.capacity.try_occupy(producer_id)? {
            trace!(%producer_id, ?item, "publish refused: producer at capacity");
            return Ok(false);
        }
        debug!(%producer_id, ?item, "item published");
        state.registry.list(Listing::new(producer_id, item));
        Ok(true)
    }

    /// Move one listed item equal to `item` into the cart.
    ///
    /// Any producer's item satisfies the request. Returns `Ok(false)` when
    /// nothing equal is listed right now.
    pub fn reserve(&self, cart_id: CartId, item: &I) -> MarketResult<bool> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let cart = state
            .carts
            .get_mut(cart_id)
            .ok_or(MarketError::UnknownCart(cart_id))?;
        let Some(listing) = state.registry.take_first(item) else {
            trace!(%cart_id, ?item, "reserve refused: item not listed");
            return Ok(false);
        };

        if let Err(e) = state.capacity.vacate(listing.producer()) {
            warn!(%cart_id, producer_id = %listing.producer(), error = %e, "reserve aborted");
            state.registry.list(listing);
            return Err(e);
        }
        debug!(%cart_id, producer_id = %listing.producer(), ?item, "item reserved");
        cart.push(listing);
        Ok(true)
    }

    /// Move one item equal to `item` out of the cart and back into the
    /// registry, crediting the producer that supplied it.
    ///
    /// Returns `Ok(false)` when the cart holds no such item.
    pub fn release(&self, cart_id: CartId, item: &I) -> MarketResult<bool> {
        let mut guard = self.lock()?;
        let state = &mut *guard;

        let cart = state
            .carts
            .get_mut(cart_id)
            .ok_or(MarketError::UnknownCart(cart_id))?;
        let Some(listing) = cart.remove_first(item) else {
            trace!(%cart_id, ?item, "release refused: item not in cart");
            return Ok(false);
        };

        state.capacity.reoccupy(listing.producer())?;
        debug!(%cart_id, producer_id = %listing.producer(), ?item, "item released");
        state.registry.list(listing);
        Ok(true)
    }

    /// Number of listed items equal to `item`.
    pub fn available(&self, item: &I) -> MarketResult<usize> {
        Ok(self.lock()?.registry.count(item))
    }
}

impl<I> Marketplace<I>
where
    I: Clone,
{
    /// Copy of the items currently in an open cart, in reservation order.
    pub fn cart_items(&self, cart_id: CartId) -> MarketResult<Vec<I>> {
        let state = self.lock()?;
        let cart = state
            .carts
            .get(cart_id)
            .ok_or(MarketError::UnknownCart(cart_id))?;
        Ok(cart.items().cloned().collect())
    }
}
