use std::collections::VecDeque;

use rand::rngs::StdRng;
use tracing::debug;

use crate::config::SimConfig;
use crate::engine::Event;
use crate::packet::{Packet, Reward};
use crate::traits::{NodeId, Policy, SendStrategy};

/// Outcome of handing a packet to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// The packet reached its destination and is finished.
    Delivered { hops: u32, route_time: u64 },
    /// The packet was appended to the pending queue.
    Queued { dest: NodeId },
}

/// Per-vertex actor: a pending queue of packets awaiting a forwarding
/// decision, plus one in-flight counter per neighbor for bandwidth
/// admission. The queue is only ever mutated by its owning node; the
/// counters are decremented by the simulator when an arrival event for the
/// corresponding link is consumed.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    queue: VecDeque<Packet>,
    /// Indexed by neighbor position in the topology's neighbor order.
    in_flight: Vec<u32>,
}

impl Node {
    pub fn new(id: NodeId, neighbor_count: usize) -> Self {
        Self {
            id,
            queue: VecDeque::new(),
            in_flight: vec![0; neighbor_count],
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight(&self, neighbor_idx: usize) -> u32 {
        self.in_flight[neighbor_idx]
    }

    /// The arrival event for the link at `neighbor_idx` was consumed.
    pub fn link_released(&mut self, neighbor_idx: usize) {
        debug_assert!(self.in_flight[neighbor_idx] > 0, "in-flight counter underflow");
        self.in_flight[neighbor_idx] -= 1;
    }

    pub fn reset(&mut self) {
        self.queue.clear();
        self.in_flight.fill(0);
    }

    /// Accept a packet at simulated time `now`: finish it if it is addressed
    /// here, otherwise start its queuing clock and enqueue it.
    pub fn receive(&mut self, mut packet: Packet, now: u64) -> Received {
        if packet.dest == self.id {
            debug!(now, node = self.id, source = packet.source, hops = packet.hops, "packet ended");
            Received::Delivered {
                hops: packet.hops,
                route_time: now - packet.birth,
            }
        } else {
            packet.start_queue = now;
            let dest = packet.dest;
            self.queue.push_back(packet);
            Received::Queued { dest }
        }
    }

    /// Run one slot's worth of sends, appending the rewards of every
    /// admitted packet to `rewards` and returning the arrival events to
    /// schedule.
    pub fn send(
        &mut self,
        now: u64,
        neighbors: &[NodeId],
        policy: &mut dyn Policy,
        rng: &mut StdRng,
        config: &SimConfig,
        strategy: SendStrategy,
        rewards: &mut Vec<Reward>,
    ) -> Vec<Event> {
        match strategy {
            SendStrategy::Default | SendStrategy::Dual => {
                self.send_single(now, neighbors, policy, rng, config, strategy, rewards)
            }
            SendStrategy::Backpressure => {
                self.send_backpressure(now, neighbors, policy, config, rewards)
            }
        }
    }

    /// Default admission loop: walk the pending queue in FIFO order and send
    /// the first packet whose chosen link has spare capacity. Saturated
    /// choices do not block the packets behind them.
    fn send_single(
        &mut self,
        now: u64,
        neighbors: &[NodeId],
        policy: &mut dyn Policy,
        rng: &mut StdRng,
        config: &SimConfig,
        strategy: SendStrategy,
        rewards: &mut Vec<Reward>,
    ) -> Vec<Event> {
        let mut i = 0;
        while i < self.queue.len() {
            let dest = self.queue[i].dest;
            let choice = policy.choose(self.id, dest, rng);
            let idx = neighbor_index(self.id, neighbors, choice);
            if self.in_flight[idx] < config.bandwidth_limit {
                let event = self.admit(i, idx, choice, now, config, policy, strategy, rewards);
                return vec![event];
            }
            i += 1;
        }
        Vec::new()
    }

    /// Backpressure admission loop: the policy assigns a destination to every
    /// free link at once, and the node repeats full passes until no free link
    /// has matching queued traffic left.
    fn send_backpressure(
        &mut self,
        now: u64,
        neighbors: &[NodeId],
        policy: &mut dyn Policy,
        config: &SimConfig,
        rewards: &mut Vec<Reward>,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            if self.queue.is_empty() {
                break;
            }
            let available: Vec<NodeId> = neighbors
                .iter()
                .enumerate()
                .filter(|&(idx, _)| self.in_flight[idx] < config.bandwidth_limit)
                .map(|(_, &n)| n)
                .collect();
            if available.is_empty() {
                break;
            }
            let choices = policy.choose_multi(self.id, &available);
            assert_eq!(
                choices.len(),
                available.len(),
                "policy returned {} choices for {} available links of node {}",
                choices.len(),
                available.len(),
                self.id
            );
            let mut sent_any = false;
            for (&link, dest) in available.iter().zip(choices) {
                let Some(dest) = dest else { continue };
                let Some(pos) = self.queue.iter().position(|p| p.dest == dest) else {
                    continue;
                };
                let idx = neighbor_index(self.id, neighbors, link);
                events.push(self.admit(
                    pos,
                    idx,
                    link,
                    now,
                    config,
                    policy,
                    SendStrategy::Backpressure,
                    rewards,
                ));
                sent_any = true;
            }
            if !sent_any {
                break;
            }
        }
        events
    }

    /// Commit one send: pull the packet at queue position `pos`, stamp its
    /// hop and delays, bump the link counter and build the reward(s).
    #[allow(clippy::too_many_arguments)]
    fn admit(
        &mut self,
        pos: usize,
        neighbor_idx: usize,
        choice: NodeId,
        now: u64,
        config: &SimConfig,
        policy: &mut dyn Policy,
        strategy: SendStrategy,
        rewards: &mut Vec<Reward>,
    ) -> Event {
        let mut packet = self.queue.remove(pos).expect("queue position out of range");
        packet.hops += 1;
        packet.queue_time = now - packet.start_queue;
        packet.trans_time = config.trans_time_us;
        self.in_flight[neighbor_idx] += 1;
        debug!(
            now,
            node = self.id,
            to = choice,
            dest = packet.dest,
            hops = packet.hops,
            "packet sent"
        );
        policy.on_send(self.id, packet.dest);
        rewards.push(Reward::new(
            self.id,
            &packet,
            choice,
            policy.get_info(self.id, packet.dest, choice),
        ));
        if strategy == SendStrategy::Dual {
            // Backward reward: lets the receiving side refine its estimate
            // toward the packet's origin.
            rewards.push(Reward {
                source: choice,
                dest: packet.source,
                action: self.id,
                queue_time: packet.queue_time,
                trans_time: packet.trans_time,
                info: policy.get_info(choice, packet.source, self.id),
            });
        }
        let arrive_time = now + packet.trans_time;
        Event {
            packet,
            from_node: self.id,
            to_node: choice,
            arrive_time,
        }
    }
}

fn neighbor_index(node: NodeId, neighbors: &[NodeId], choice: NodeId) -> usize {
    neighbors
        .iter()
        .position(|&n| n == choice)
        .unwrap_or_else(|| panic!("policy chose {choice}, which is not a neighbor of node {node}"))
}
