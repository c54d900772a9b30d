use rand::rngs::StdRng;

use crate::config::LearnRates;
use crate::packet::{AgentInfo, Reward};
use crate::policies::argmax_random_tie;
use crate::topology::Topology;
use crate::traits::{NodeId, Policy};

/// Q-routing: every node keeps one Q estimate per (destination, neighbor)
/// pair of the negated remaining delivery time, picks the argmax neighbor
/// (random among ties) and moves its estimate toward the observed delay
/// plus the chosen neighbor's own best estimate.
pub struct QRoute {
    topology: Topology,
    init_q: f64,
    /// `q[source][dest][i]` scores forwarding a `dest`-bound packet to the
    /// i-th neighbor of `source`. The diagonal rows are unused.
    q: Vec<Vec<Vec<f64>>>,
}

impl QRoute {
    pub fn new(topology: &Topology, init_q: f64) -> Self {
        let q = Self::tables(topology, init_q);
        Self {
            topology: topology.clone(),
            init_q,
            q,
        }
    }

    fn tables(topology: &Topology, init_q: f64) -> Vec<Vec<Vec<f64>>> {
        (0..topology.node_count())
            .map(|source| {
                vec![vec![init_q; topology.neighbors(source).len()]; topology.node_count()]
            })
            .collect()
    }

    /// Best available estimate of the remaining cost from `node` to `dest`:
    /// zero once `node` is the destination.
    fn best_estimate(&self, node: NodeId, dest: NodeId) -> f64 {
        if node == dest {
            return 0.0;
        }
        self.q[node][dest]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl Policy for QRoute {
    fn choose(&mut self, source: NodeId, dest: NodeId, rng: &mut StdRng) -> NodeId {
        let idx = argmax_random_tie(&self.q[source][dest], rng);
        self.topology.neighbors(source)[idx]
    }

    fn get_info(&self, _source: NodeId, dest: NodeId, action: NodeId) -> AgentInfo {
        AgentInfo::from([("action_max".to_string(), self.best_estimate(action, dest))])
    }

    fn learn(&mut self, rewards: &[Reward], rates: LearnRates) {
        for reward in rewards {
            let action_max = reward.info["action_max"];
            let idx = self
                .topology
                .neighbor_index(reward.source, reward.action)
                .expect("reward action is not a neighbor of its source");
            let old = self.q[reward.source][reward.dest][idx];
            self.q[reward.source][reward.dest][idx] +=
                rates.q * (-reward.delay_secs() + action_max - old);
        }
    }

    fn reset(&mut self) {
        self.q = Self::tables(&self.topology, self.init_q);
    }
}
