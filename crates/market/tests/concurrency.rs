//! Multi-threaded behavior of the marketplace facade.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use marketsim_core::{CartId, ProducerId};
use marketsim_market::{MarketSnapshot, Marketplace};

#[test]
fn concurrent_reserves_of_a_single_instance_yield_one_winner() {
    const RESERVERS: usize = 16;

    let market: Arc<Marketplace<&'static str>> = Arc::new(Marketplace::with_capacity(1).unwrap());
    let producer = market.register_producer().unwrap();
    assert!(market.publish(producer, "tea").unwrap());

    let barrier = Arc::new(Barrier::new(RESERVERS));
    let handles: Vec<_> = (0..RESERVERS)
        .map(|_| {
            let market = market.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let cart = market.open_cart().unwrap();
                barrier.wait();
                market.reserve(cart, &"tea").unwrap()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(market.available(&"tea").unwrap(), 0);
    assert_eq!(market.outstanding(producer).unwrap(), 0);
}

#[test]
fn concurrent_publishes_never_exceed_capacity() {
    const CAPACITY: usize = 5;
    const PUBLISHERS: usize = 12;

    let market: Arc<Marketplace<u32>> = Arc::new(Marketplace::with_capacity(CAPACITY).unwrap());
    let producer = market.register_producer().unwrap();

    let barrier = Arc::new(Barrier::new(PUBLISHERS));
    let handles: Vec<_> = (0..PUBLISHERS)
        .map(|n| {
            let market = market.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                market.publish(producer, n as u32).unwrap()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(accepted, CAPACITY);
    assert_eq!(market.outstanding(producer).unwrap(), CAPACITY);
    assert_eq!(market.listed().unwrap(), CAPACITY);
}

#[test]
fn ids_are_unique_under_concurrent_allocation() {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 100;

    let market: Arc<Marketplace<u8>> = Arc::new(Marketplace::with_capacity(1).unwrap());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let market = market.clone();
            thread::spawn(move || {
                let mut carts = Vec::new();
                let mut producers = Vec::new();
                for _ in 0..PER_THREAD {
                    carts.push(market.open_cart().unwrap());
                    producers.push(market.register_producer().unwrap());
                }
                (carts, producers)
            })
        })
        .collect();

    let mut carts = HashSet::new();
    let mut producers = HashSet::new();
    for h in handles {
        let (c, p) = h.join().unwrap();
        carts.extend(c);
        producers.extend(p);
    }

    let expected_carts: HashSet<_> = (1..=THREADS * PER_THREAD).map(CartId::from_raw).collect();
    let expected_producers: HashSet<_> =
        (0..THREADS * PER_THREAD).map(ProducerId::from_raw).collect();
    assert_eq!(carts, expected_carts);
    assert_eq!(producers, expected_producers);
}

/// Spawn a thread that samples snapshots, running `check` on each one, until
/// `stop` is set. Joining it yields the number of samples taken.
fn watch(
    market: Arc<Marketplace<u32>>,
    stop: Arc<AtomicBool>,
    check: impl Fn(&MarketSnapshot) + Send + 'static,
) -> thread::JoinHandle<usize> {
    thread::spawn(move || {
        let mut samples = 0;
        loop {
            check(&market.snapshot().unwrap());
            samples += 1;
            if stop.load(Ordering::Acquire) {
                return samples;
            }
            thread::yield_now();
        }
    })
}

/// Producers and consumers hammer the same item value until supply equals
/// demand. Consumers hand back every tenth item they reserve and take it
/// again later. Afterwards every published item must have been bought
/// exactly once.
#[test]
fn mixed_workload_conserves_items_and_capacity() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 50;
    const CAPACITY: usize = 3;
    const ITEM: u32 = 7;

    let market: Arc<Marketplace<u32>> = Arc::new(Marketplace::with_capacity(CAPACITY).unwrap());
    let per_consumer = PRODUCERS * PER_PRODUCER / CONSUMERS;

    let producer_ids: Vec<_> = (0..PRODUCERS)
        .map(|_| market.register_producer().unwrap())
        .collect();

    // Outstanding counts always mirror what is listed, releases included.
    let stop = Arc::new(AtomicBool::new(false));
    let watcher = watch(market.clone(), stop.clone(), |snap| {
        let outstanding: usize = snap.producers.iter().map(|s| s.outstanding()).sum();
        assert_eq!(outstanding, snap.listed);
    });

    let producers: Vec<_> = producer_ids
        .iter()
        .copied()
        .map(|id| {
            let market = market.clone();
            thread::spawn(move || {
                let mut published = 0;
                while published < PER_PRODUCER {
                    if market.publish(id, ITEM).unwrap() {
                        published += 1;
                    } else {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let market = market.clone();
            thread::spawn(move || {
                let cart = market.open_cart().unwrap();
                let mut held = 0;
                let mut reserves = 0;
                while held < per_consumer {
                    if !market.reserve(cart, &ITEM).unwrap() {
                        thread::yield_now();
                        continue;
                    }
                    held += 1;
                    reserves += 1;
                    if reserves % 10 == 0 {
                        assert!(market.release(cart, &ITEM).unwrap());
                        held -= 1;
                    }
                }
                market.finalize(cart).unwrap().unwrap()
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    let bought: usize = consumers.into_iter().map(|c| c.join().unwrap().len()).sum();
    stop.store(true, Ordering::Release);
    assert!(watcher.join().unwrap() > 0);

    assert_eq!(bought, PRODUCERS * PER_PRODUCER);
    let snap = market.snapshot().unwrap();
    assert_eq!(snap.listed, 0);
    assert_eq!(snap.reserved, 0);
    assert_eq!(snap.open_carts, 0);
    for slot in snap.producers {
        assert_eq!(slot.outstanding(), 0, "producer {}", slot.producer_id());
    }
}

/// Without releases the ceiling is never crossed, even momentarily.
#[test]
fn outstanding_stays_within_capacity_under_contention() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 100;
    const CAPACITY: usize = 2;
    const ITEM: u32 = 3;

    let market: Arc<Marketplace<u32>> = Arc::new(Marketplace::with_capacity(CAPACITY).unwrap());
    let producer_ids: Vec<_> = (0..PRODUCERS)
        .map(|_| market.register_producer().unwrap())
        .collect();

    let stop = Arc::new(AtomicBool::new(false));
    let watcher = watch(market.clone(), stop.clone(), |snap| {
        for slot in &snap.producers {
            assert!(
                slot.outstanding() <= CAPACITY,
                "producer {} holds {} listings",
                slot.producer_id(),
                slot.outstanding()
            );
        }
    });

    let producers: Vec<_> = producer_ids
        .into_iter()
        .map(|id| {
            let market = market.clone();
            thread::spawn(move || {
                let mut published = 0;
                while published < PER_PRODUCER {
                    if market.publish(id, ITEM).unwrap() {
                        published += 1;
                    } else {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let per_consumer = PRODUCERS * PER_PRODUCER / CONSUMERS;
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let market = market.clone();
            thread::spawn(move || {
                let cart = market.open_cart().unwrap();
                let mut held = 0;
                while held < per_consumer {
                    if market.reserve(cart, &ITEM).unwrap() {
                        held += 1;
                    } else {
                        thread::yield_now();
                    }
                }
                market.finalize(cart).unwrap().unwrap().len()
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    let bought: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
    stop.store(true, Ordering::Release);
    assert!(watcher.join().unwrap() > 0);

    assert_eq!(bought, PRODUCERS * PER_PRODUCER);
    assert_eq!(market.listed().unwrap(), 0);
}
