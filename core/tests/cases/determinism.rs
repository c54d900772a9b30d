use routesim_core::policies::{QRoute, Shortest};
use routesim_core::{LearnRates, SimConfig, SECOND};

use crate::common::{ring, TestHarness};

fn config(seed: u64) -> SimConfig {
    SimConfig {
        lambda: 2.0,
        seed,
        ..SimConfig::default()
    }
}

#[test]
fn same_seed_replays_the_exact_trajectory() {
    let topology = ring(6);

    let mut runs = (0..2).map(|_| {
        let policy = Box::new(QRoute::new(&topology, 0.0));
        let mut h = TestHarness::new(topology.clone(), config(12345), policy);
        let record = h.net.train(60 * SECOND, LearnRates::default());
        (h.net.stats, record)
    });
    let (stats_a, record_a) = runs.next().unwrap();
    let (stats_b, record_b) = runs.next().unwrap();

    assert_eq!(stats_a, stats_b);
    assert_eq!(record_a.len(), record_b.len());
    assert_eq!(record_a.route_times(), record_b.route_times());
    assert_eq!(record_a.drop_rates(), record_b.drop_rates());
}

#[test]
fn different_seeds_diverge() {
    let topology = ring(6);

    let policy = Box::new(QRoute::new(&topology, 0.0));
    let mut a = TestHarness::new(topology.clone(), config(100), policy);
    a.net.train(60 * SECOND, LearnRates::default());

    let policy = Box::new(QRoute::new(&topology, 0.0));
    let mut b = TestHarness::new(topology.clone(), config(200), policy);
    b.net.train(60 * SECOND, LearnRates::default());

    assert_ne!(a.net.stats, b.net.stats);
}

#[test]
fn reset_replays_identically_with_a_stateless_policy() {
    let topology = ring(6);
    let policy = Box::new(Shortest::new(&topology));
    let mut h = TestHarness::new(topology, config(7), policy);

    h.run_slots(100);
    let first = h.net.stats;

    h.net.reset();
    assert_eq!(h.net.clock, 0);
    assert_eq!(h.net.pending_events(), 0);

    h.run_slots(100);
    assert_eq!(h.net.stats, first);
}
