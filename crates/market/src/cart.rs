//! Open carts and the items reserved into them.

use std::collections::HashMap;

use marketsim_core::CartId;

use crate::listing::Listing;

/// A consumer's cart: reserved listings in reservation order.
#[derive(Debug, Clone)]
pub struct Cart<I> {
    lines: Vec<Listing<I>>,
}

impl<I> Cart<I> {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn items(&self) -> impl Iterator<Item = &I> {
        self.lines.iter().map(Listing::item)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a reserved listing.
    pub fn push(&mut self, listing: Listing<I>) {
        self.lines.push(listing);
    }

    /// Consume the cart, keeping only the items in reservation order.
    pub fn into_items(self) -> Vec<I> {
        self.lines.into_iter().map(Listing::into_item).collect()
    }
}

impl<I: PartialEq> Cart<I> {
    /// Remove the earliest line holding an item equal to `item`.
    pub fn remove_first(&mut self, item: &I) -> Option<Listing<I>> {
        let pos = self.lines.iter().position(|l| l.item() == item)?;
        Some(self.lines.remove(pos))
    }
}

/// Every open cart, keyed by id.
#[derive(Debug, Clone)]
pub struct CartStore<I> {
    next_id: CartId,
    carts: HashMap<CartId, Cart<I>>,
}

impl<I> CartStore<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cart under the next sequential id.
    pub fn open(&mut self) -> CartId {
        let id = self.next_id;
        self.next_id = id.next();
        self.carts.insert(id, Cart::new());
        id
    }

    pub fn get(&self, id: CartId) -> Option<&Cart<I>> {
        self.carts.get(&id)
    }

    pub fn get_mut(&mut self, id: CartId) -> Option<&mut Cart<I>> {
        self.carts.get_mut(&id)
    }

    /// Remove a cart. Later lookups of `id` see nothing.
    pub fn take(&mut self, id: CartId) -> Option<Cart<I>> {
        self.carts.remove(&id)
    }

    /// Number of open carts.
    pub fn len(&self) -> usize {
        self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }

    /// Total number of reserved items across all open carts.
    pub fn reserved(&self) -> usize {
        self.carts.values().map(Cart::len).sum()
    }
}

impl<I> Default for CartStore<I> {
    fn default() -> Self {
        Self {
            next_id: CartId::from_raw(1),
            carts: HashMap::new(),
        }
    }
}
