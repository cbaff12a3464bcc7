use marketsim_core::ProducerId;

/// One item instance together with the producer that supplied it.
///
/// Listings are what actually moves between the registry and carts, so the
/// owning producer is always known when a reservation is undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<I> {
    producer: ProducerId,
    item: I,
}

impl<I> Listing<I> {
    pub fn new(producer: ProducerId, item: I) -> Self {
        Self { producer, item }
    }

    pub fn producer(&self) -> ProducerId {
        self.producer
    }

    pub fn item(&self) -> &I {
        &self.item
    }

    pub fn into_item(self) -> I {
        self.item
    }
}
