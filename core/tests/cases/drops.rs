use std::cell::Cell;
use std::rc::Rc;

use rand::rngs::StdRng;
use routesim_core::{Event, NodeId, Policy, SimConfig};

use crate::common::{line, quiet_config, Bounce, TestHarness};

fn loop_config() -> SimConfig {
    SimConfig {
        drop_threshold: Some(4),
        ..quiet_config()
    }
}

#[test]
fn looping_packet_is_dropped_not_delivered() {
    // The packet for node 2 ping-pongs between 0 and 1 until the loop
    // detector fires at four hops.
    let mut h = TestHarness::new(line(3), loop_config(), Box::new(Bounce));

    h.net.inject(0, 2);
    h.run_slots(6);

    let s = h.net.stats;
    assert_eq!(s.drop_packets, 1);
    assert_eq!(s.end_packets, 0);
    assert_eq!(s.active_packets, 0);
    assert_eq!(h.net.pending_events(), 0);
    assert_eq!(h.net.in_flight(0, 1), 0);
    assert_eq!(h.net.in_flight(1, 0), 0);
}

#[test]
fn disabled_loop_detector_keeps_the_packet_alive() {
    let config = SimConfig {
        drop_enabled: false,
        ..loop_config()
    };
    let mut h = TestHarness::new(line(3), config, Box::new(Bounce));

    h.net.inject(0, 2);
    h.run_slots(10);

    let s = h.net.stats;
    assert_eq!(s.drop_packets, 0);
    assert_eq!(s.end_packets, 0);
    assert_eq!(s.active_packets, 1);
}

/// Bounce with an observable drop hook.
struct CountingBounce {
    drops: Rc<Cell<u32>>,
    last_penalty: Rc<Cell<f64>>,
}

impl Policy for CountingBounce {
    fn choose(&mut self, source: NodeId, _dest: NodeId, _rng: &mut StdRng) -> NodeId {
        if source == 0 {
            1
        } else {
            0
        }
    }

    fn on_drop(&mut self, event: &Event, penalty: f64) {
        assert!(event.packet.hops >= 4);
        self.drops.set(self.drops.get() + 1);
        self.last_penalty.set(penalty);
    }
}

#[test]
fn drop_hook_receives_the_event_and_penalty() {
    let drops = Rc::new(Cell::new(0));
    let last_penalty = Rc::new(Cell::new(0.0));
    let policy = Box::new(CountingBounce {
        drops: Rc::clone(&drops),
        last_penalty: Rc::clone(&last_penalty),
    });
    let mut h = TestHarness::new(line(3), loop_config(), policy);

    h.net.inject(0, 2);
    h.run_slots(6);

    assert_eq!(drops.get(), 1);
    assert_eq!(last_penalty.get(), h.net.config.drop_penalty);
}
