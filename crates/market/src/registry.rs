//! Pool of listed (unclaimed) items.

use marketsim_core::ProducerId;

use crate::listing::Listing;

/// Items currently visible to consumers, in listing order.
///
/// Equal items are kept as separate entries. Lookups are linear scans; the
/// pool is bounded by `producers * capacity`.
#[derive(Debug, Clone)]
pub struct ItemRegistry<I> {
    listings: Vec<Listing<I>>,
}

impl<I> ItemRegistry<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listing at the back of the pool.
    pub fn list(&mut self, listing: Listing<I>) {
        self.listings.push(listing);
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Number of listings supplied by `producer`.
    pub fn count_from(&self, producer: ProducerId) -> usize {
        self.listings
            .iter()
            .filter(|l| l.producer() == producer)
            .count()
    }
}

impl<I: PartialEq> ItemRegistry<I> {
    /// Remove and return the oldest listing whose item equals `item`.
    ///
    /// Producer identity is ignored: any equal item satisfies the request.
    pub fn take_first(&mut self, item: &I) -> Option<Listing<I>> {
        let pos = self.listings.iter().position(|l| l.item() == item)?;
        Some(self.listings.remove(pos))
    }

    /// Number of listings whose item equals `item`.
    pub fn count(&self, item: &I) -> usize {
        self.listings.iter().filter(|l| l.item() == item).count()
    }
}

impl<I> Default for ItemRegistry<I> {
    fn default() -> Self {
        Self {
            listings: Vec::new(),
        }
    }
}
