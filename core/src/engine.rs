use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::path::Path;

use hdrhistogram::Histogram;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::analytics::TrainRecorder;
use crate::config::{LearnRates, SimConfig, SECOND};
use crate::node::{Node, Received};
use crate::packet::{Packet, Reward};
use crate::topology::{Topology, TopologyError};
use crate::traits::{NodeId, Policy, SendStrategy};

/// A scheduled arrival: the packet is in flight on the `from_node ->
/// to_node` link and lands at `arrive_time` (absolute simulated time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub packet: Packet,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub arrive_time: u64,
}

/// Heap entry: arrival time first, then insertion sequence so that ties
/// replay in FIFO order under a fixed seed.
#[derive(Debug)]
struct Scheduled {
    arrive_time: u64,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.arrive_time == other.arrive_time && self.seq == other.seq
    }
}
impl Eq for Scheduled {}
impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.arrive_time, self.seq).cmp(&(other.arrive_time, other.seq))
    }
}

/// Aggregate packet counters. Conservation holds at every step boundary:
/// `active_packets == all_packets - end_packets - drop_packets`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub all_packets: u64,
    pub end_packets: u64,
    pub drop_packets: u64,
    pub active_packets: u64,
    /// Total hops over all delivered packets.
    pub hops: u64,
    /// Total route time over all delivered packets, in microseconds.
    pub route_time: u64,
}

impl Stats {
    pub fn ave_hops(&self) -> f64 {
        if self.end_packets > 0 {
            self.hops as f64 / self.end_packets as f64
        } else {
            0.0
        }
    }

    /// Average end-to-end route time of delivered packets, microseconds.
    pub fn ave_route_time(&self) -> f64 {
        if self.end_packets > 0 {
            self.route_time as f64 / self.end_packets as f64
        } else {
            0.0
        }
    }

    pub fn drop_rate(&self) -> f64 {
        if self.all_packets > 0 {
            self.drop_packets as f64 / self.all_packets as f64
        } else {
            0.0
        }
    }
}

/// The simulator: global clock, deterministic event queue, Poisson traffic
/// source and the per-slot step/train loop driving every node.
///
/// Execution is single-threaded and fully deterministic: all randomness
/// (arrival counts, source/destination sampling, policy tie-breaks) flows
/// from one seeded generator, and event-queue ties break by insertion order.
pub struct Network {
    pub clock: u64,
    pub config: SimConfig,
    pub stats: Stats,
    topology: Topology,
    nodes: Vec<Node>,
    events: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
    rng: StdRng,
    policy: Option<Box<dyn Policy>>,
    strategy: SendStrategy,
    route_hist: Histogram<u64>,
}

impl Network {
    pub fn new(topology: Topology, config: SimConfig) -> Self {
        let nodes = (0..topology.node_count())
            .map(|id| Node::new(id, topology.neighbors(id).len()))
            .collect();
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            clock: 0,
            config,
            stats: Stats::default(),
            topology,
            nodes,
            events: BinaryHeap::new(),
            next_seq: 0,
            rng,
            policy: None,
            strategy: SendStrategy::Default,
            route_hist: Histogram::new(3).expect("valid histogram precision"),
        }
    }

    pub fn from_file(path: impl AsRef<Path>, config: SimConfig) -> Result<Self, TopologyError> {
        Ok(Self::new(Topology::from_file(path)?, config))
    }

    /// Bind the routing policy every node consults. The send strategy is
    /// resolved here, once, and stays fixed for the run.
    pub fn bind(&mut self, policy: Box<dyn Policy>) {
        self.strategy = policy.strategy();
        self.policy = Some(policy);
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn queue_len(&self, node: NodeId) -> usize {
        self.nodes[node].queue_len()
    }

    /// Packets currently in flight on the directed link `from -> to`.
    pub fn in_flight(&self, from: NodeId, to: NodeId) -> u32 {
        let idx = self
            .topology
            .neighbor_index(from, to)
            .unwrap_or_else(|| panic!("{from} and {to} are not adjacent"));
        self.nodes[from].in_flight(idx)
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Route-time percentile over all delivered packets, microseconds.
    pub fn route_time_percentile(&self, percentile: f64) -> Option<u64> {
        if self.route_hist.is_empty() {
            None
        } else {
            Some(self.route_hist.value_at_quantile(percentile / 100.0))
        }
    }

    /// Inject one packet at its source node at the current clock.
    pub fn inject(&mut self, source: NodeId, dest: NodeId) {
        assert_ne!(source, dest, "packet source must differ from destination");
        assert!(source < self.node_count() && dest < self.node_count());
        self.stats.all_packets += 1;
        self.stats.active_packets += 1;
        trace!(now = self.clock, source, dest, "packet injected");
        self.deliver(source, Packet::new(source, dest, self.clock), self.clock);
    }

    /// Zero the clock, the event queue and all counters and queues, keeping
    /// the topology and any bound policy.
    pub fn reset(&mut self) {
        self.clock = 0;
        self.events.clear();
        self.next_seq = 0;
        self.stats = Stats::default();
        self.route_hist.reset();
        self.rng = StdRng::seed_from_u64(self.config.seed);
        for node in &mut self.nodes {
            node.reset();
        }
    }

    /// Advance the simulation by `duration` microseconds.
    ///
    /// One step is: Poisson injection at the slot boundary, one send
    /// opportunity per node in ascending id order, then a continuous drain
    /// of every arrival falling within the step's horizon. Returns the
    /// rewards of all sends admitted in this slot.
    pub fn step(&mut self, duration: u64) -> Vec<Reward> {
        assert!(self.policy.is_some(), "no routing policy bound");

        // Slotted generation: N ~ Poisson(lambda * duration).
        let mean = self.config.lambda * duration as f64 / SECOND as f64;
        if mean > 0.0 {
            let poisson = Poisson::new(mean).expect("arrival rate must be positive and finite");
            let count = poisson.sample(&mut self.rng) as u64;
            for _ in 0..count {
                let source = self.rng.gen_range(0..self.node_count());
                let mut dest = self.rng.gen_range(0..self.node_count());
                while dest == source {
                    dest = self.rng.gen_range(0..self.node_count());
                }
                self.inject(source, dest);
            }
        }

        // One transmission opportunity per node, id ascending for replay
        // stability.
        let mut rewards = Vec::new();
        let mut outgoing = Vec::new();
        let policy = self.policy.as_deref_mut().expect("no routing policy bound");
        for node in &mut self.nodes {
            let neighbors = self.topology.neighbors(node.id);
            outgoing.extend(node.send(
                self.clock,
                neighbors,
                policy,
                &mut self.rng,
                &self.config,
                self.strategy,
                &mut rewards,
            ));
        }
        for event in outgoing {
            self.schedule(event);
        }

        // Continuous drain: consume every arrival inside this step's horizon.
        let horizon = self.clock + duration;
        while let Some(Reverse(next)) = self.events.peek() {
            if next.arrive_time > horizon {
                break;
            }
            let Reverse(Scheduled { event, .. }) =
                self.events.pop().expect("peeked event vanished");
            let link = self
                .topology
                .neighbor_index(event.from_node, event.to_node)
                .expect("in-flight event on a link outside the topology");
            self.nodes[event.from_node].link_released(link);

            let threshold = self
                .config
                .drop_threshold
                .unwrap_or(self.node_count() as u32);
            if self.config.drop_enabled && event.packet.hops >= threshold {
                self.stats.drop_packets += 1;
                self.stats.active_packets -= 1;
                debug!(
                    now = event.arrive_time,
                    source = event.packet.source,
                    dest = event.packet.dest,
                    hops = event.packet.hops,
                    "packet dropped as a suspected loop"
                );
                let penalty = self.config.drop_penalty;
                self.policy
                    .as_deref_mut()
                    .expect("no routing policy bound")
                    .on_drop(&event, penalty);
            } else {
                let now = event.arrive_time;
                self.deliver(event.to_node, event.packet, now);
            }
        }

        self.clock = horizon;
        rewards
    }

    /// Run `duration / slot` training steps, feeding each slot's rewards to
    /// the policy and sampling the aggregate series the experiment observes.
    pub fn train(&mut self, duration: u64, rates: LearnRates) -> TrainRecorder {
        let slot = self.config.slot_us;
        let steps = duration / slot;
        let mut recorder = TrainRecorder::with_capacity(steps as usize);
        for _ in 0..steps {
            let rewards = self.step(slot);
            // Idle slots still reach the policy: eligibility traces decay
            // and carried-over drop penalties are consumed inside learn.
            self.policy
                .as_deref_mut()
                .expect("no routing policy bound")
                .learn(&rewards, rates);
            recorder.record(self.clock, &self.stats);
        }
        recorder
    }

    fn schedule(&mut self, event: Event) {
        trace!(
            from = event.from_node,
            to = event.to_node,
            at = event.arrive_time,
            "arrival scheduled"
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Reverse(Scheduled {
            arrive_time: event.arrive_time,
            seq,
            event,
        }));
    }

    /// Hand a packet to `node` at time `now`, folding a delivery into the
    /// aggregate counters or notifying the policy of a queued packet.
    fn deliver(&mut self, node: NodeId, packet: Packet, now: u64) {
        match self.nodes[node].receive(packet, now) {
            Received::Delivered { hops, route_time } => {
                self.stats.active_packets -= 1;
                self.stats.end_packets += 1;
                self.stats.hops += u64::from(hops);
                self.stats.route_time += route_time;
                self.route_hist
                    .record(route_time)
                    .expect("autoresizing histogram accepts any u64");
            }
            Received::Queued { dest } => {
                if let Some(policy) = self.policy.as_deref_mut() {
                    policy.on_receive(node, dest);
                }
            }
        }
    }
}
