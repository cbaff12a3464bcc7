//! Per-producer outstanding counts and the capacity ceiling.

use serde::Serialize;

use marketsim_core::{MarketError, MarketResult, ProducerId};

/// Bookkeeping for one registered producer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ProducerSlot {
    producer_id: ProducerId,
    outstanding: usize,
}

impl ProducerSlot {
    pub fn producer_id(&self) -> ProducerId {
        self.producer_id
    }

    /// Items of this producer currently listed in the registry.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

/// Outstanding counts for every registered producer.
///
/// Producer ids double as indexes into the slot table: ids are issued
/// sequentially from 0 and slots are never removed.
#[derive(Debug, Clone)]
pub struct CapacityTable {
    capacity: usize,
    slots: Vec<ProducerSlot>,
}

impl CapacityTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ProducerSlot] {
        &self.slots
    }

    /// Allocate the next producer id with an outstanding count of 0.
    pub fn register(&mut self) -> ProducerId {
        let producer_id = ProducerId::from_raw(self.slots.len() as u64);
        self.slots.push(ProducerSlot {
            producer_id,
            outstanding: 0,
        });
        producer_id
    }

    pub fn outstanding(&self, producer_id: ProducerId) -> MarketResult<usize> {
        self.slot(producer_id).map(|s| s.outstanding)
    }

    /// Take one unit of the producer's capacity.
    ///
    /// Returns `Ok(false)` without changing anything when the producer is
    /// already at (or above) the ceiling.
    pub fn try_occupy(&mut self, producer_id: ProducerId) -> MarketResult<bool> {
        let capacity = self.capacity;
        let slot = self.slot_mut(producer_id)?;
        if slot.outstanding >= capacity {
            return Ok(false);
        }
        slot.outstanding += 1;
        Ok(true)
    }

    /// One of the producer's items left the registry.
    ///
    /// Fails with `CapacityUnderflow` if the producer has nothing outstanding,
    /// which means the counts no longer match the registry.
    pub fn vacate(&mut self, producer_id: ProducerId) -> MarketResult<()> {
        let slot = self.slot_mut(producer_id)?;
        slot.outstanding = slot
            .outstanding
            .checked_sub(1)
            .ok_or(MarketError::CapacityUnderflow(producer_id))?;
        Ok(())
    }

    /// One of the producer's items came back to the registry.
    ///
    /// Unconditional: a returned item is never refused, even if the producer
    /// has refilled its slot in the meantime. `try_occupy` keeps refusing
    /// until the count drops back under the ceiling.
    pub fn reoccupy(&mut self, producer_id: ProducerId) -> MarketResult<()> {
        let slot = self.slot_mut(producer_id)?;
        slot.outstanding += 1;
        Ok(())
    }

    fn slot(&self, producer_id: ProducerId) -> MarketResult<&ProducerSlot> {
        usize::try_from(producer_id.get())
            .ok()
            .and_then(|idx| self.slots.get(idx))
            .ok_or(MarketError::UnknownProducer(producer_id))
    }

    fn slot_mut(&mut self, producer_id: ProducerId) -> MarketResult<&mut ProducerSlot> {
        usize::try_from(producer_id.get())
            .ok()
            .and_then(|idx| self.slots.get_mut(idx))
            .ok_or(MarketError::UnknownProducer(producer_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_issues_sequential_ids_from_zero() {
        let mut table = CapacityTable::new(3);
        assert_eq!(table.register(), ProducerId::from_raw(0));
        assert_eq!(table.register(), ProducerId::from_raw(1));
        assert_eq!(table.len(), 2);
        assert_eq!(table.outstanding(ProducerId::from_raw(1)).unwrap(), 0);
    }

    #[test]
    fn try_occupy_stops_at_capacity() {
        let mut table = CapacityTable::new(2);
        let p = table.register();

        assert!(table.try_occupy(p).unwrap());
        assert!(table.try_occupy(p).unwrap());
        assert!(!table.try_occupy(p).unwrap());
        assert_eq!(table.outstanding(p).unwrap(), 2);
    }

    #[test]
    fn vacate_frees_capacity_for_the_owner_only() {
        let mut table = CapacityTable::new(1);
        let a = table.register();
        let b = table.register();
        assert!(table.try_occupy(a).unwrap());
        assert!(table.try_occupy(b).unwrap());

        table.vacate(a).unwrap();

        assert!(table.try_occupy(a).unwrap());
        assert!(!table.try_occupy(b).unwrap());
    }

    #[test]
    fn vacate_on_an_empty_slot_is_an_error() {
        let mut table = CapacityTable::new(2);
        let p = table.register();

        assert_eq!(table.vacate(p), Err(MarketError::CapacityUnderflow(p)));
        assert_eq!(table.outstanding(p).unwrap(), 0);
        assert!(table.try_occupy(p).unwrap());
    }

    #[test]
    fn reoccupy_may_exceed_ceiling_and_blocks_further_publishing() {
        let mut table = CapacityTable::new(1);
        let p = table.register();
        assert!(table.try_occupy(p).unwrap());
        table.vacate(p).unwrap();
        assert!(table.try_occupy(p).unwrap());

        table.reoccupy(p).unwrap();

        assert_eq!(table.outstanding(p).unwrap(), 2);
        assert!(!table.try_occupy(p).unwrap());
    }

    #[test]
    fn unknown_producer_is_reported() {
        let mut table = CapacityTable::new(1);
        let ghost = ProducerId::from_raw(9);
        assert_eq!(
            table.try_occupy(ghost),
            Err(MarketError::UnknownProducer(ghost))
        );
        assert!(table.outstanding(ghost).unwrap_err().is_not_found());
    }
}
