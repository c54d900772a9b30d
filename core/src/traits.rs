use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::LearnRates;
use crate::engine::Event;
use crate::packet::{AgentInfo, Reward};

/// Dense node identifier, `0..node_count`.
pub type NodeId = usize;

/// How a node runs its admission loop within one slot. Resolved once when
/// the policy is bound, never switched mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SendStrategy {
    /// At most one packet leaves the node per slot: the first queued packet
    /// whose chosen link has spare capacity.
    #[default]
    Default,
    /// Same admission loop as [`SendStrategy::Default`], but every send also
    /// emits a backward reward for the receiving side (dual Q-routing).
    Dual,
    /// The policy picks destinations for all free links at once and the node
    /// keeps draining until no free link has matching queued traffic.
    Backpressure,
}

/// The decision boundary between the simulator and a routing policy.
///
/// The simulator guarantees `choose` is only called for packets that still
/// need forwarding, and it is entitled to assume the returned node is a
/// graph neighbor of `source`; violating that is a precondition failure,
/// not a recoverable error.
///
/// All randomness a policy needs must come from the `rng` handed in, so a
/// fixed seed replays the whole run bit for bit.
pub trait Policy {
    /// Admission-loop variant this policy expects from every node.
    fn strategy(&self) -> SendStrategy {
        SendStrategy::Default
    }

    /// Pick the next hop for a packet queued at `source` bound for `dest`.
    fn choose(&mut self, source: NodeId, dest: NodeId, rng: &mut StdRng) -> NodeId;

    /// Backpressure-mode choice: for each currently free link of `source`,
    /// the destination whose traffic should use it, or `None` to leave the
    /// link idle. The returned vector is parallel to `available`.
    fn choose_multi(&mut self, _source: NodeId, available: &[NodeId]) -> Vec<Option<NodeId>> {
        vec![None; available.len()]
    }

    /// Auxiliary values merged into the [`Reward`] built for a send of a
    /// `dest`-bound packet from `source` to `action`.
    fn get_info(&self, _source: NodeId, _dest: NodeId, _action: NodeId) -> AgentInfo {
        AgentInfo::new()
    }

    /// Apply one training update from the rewards of one slot.
    fn learn(&mut self, _rewards: &[Reward], _rates: LearnRates) {}

    /// A packet bound for `dest` was queued at `node`.
    fn on_receive(&mut self, _node: NodeId, _dest: NodeId) {}

    /// A packet bound for `dest` left the queue of `node`.
    fn on_send(&mut self, _node: NodeId, _dest: NodeId) {}

    /// The packet carried by `event` was dropped as a suspected loop.
    fn on_drop(&mut self, _event: &Event, _penalty: f64) {}

    /// Forget all learned state.
    fn reset(&mut self) {}
}
