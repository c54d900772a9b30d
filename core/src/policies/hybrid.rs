use rand::rngs::StdRng;

use crate::config::LearnRates;
use crate::packet::{AgentInfo, Reward};
use crate::policies::{softmax_gradient, softmax_sample};
use crate::topology::Topology;
use crate::traits::{NodeId, Policy};

/// Bound kept on theta so softmax probabilities never saturate.
const THETA_CLAMP: f64 = 2.0;

/// Hybrid of Q-learning and a softmax policy gradient: a Q table tracks
/// discounted delivery cost while a separate preference table theta is
/// pushed along the advantage-weighted score-function gradient. Forwarding
/// samples from `softmax(theta)` instead of taking the argmax.
pub struct HybridQ {
    topology: Topology,
    discount: f64,
    init_q: f64,
    init_p: f64,
    /// `q[source][dest][i]` and `theta[source][dest][i]`, indexed by the
    /// i-th neighbor of `source`.
    pub(crate) q: Vec<Vec<Vec<f64>>>,
    pub(crate) theta: Vec<Vec<Vec<f64>>>,
}

impl HybridQ {
    pub fn new(topology: &Topology, init_q: f64, init_p: f64, discount: f64) -> Self {
        Self {
            topology: topology.clone(),
            discount,
            init_q,
            init_p,
            q: tables(topology, init_q),
            theta: tables(topology, init_p),
        }
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub(crate) fn best_estimate(&self, node: NodeId, dest: NodeId) -> f64 {
        if node == dest {
            return 0.0;
        }
        self.q[node][dest]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

pub(crate) fn tables(topology: &Topology, init: f64) -> Vec<Vec<Vec<f64>>> {
    (0..topology.node_count())
        .map(|source| vec![vec![init; topology.neighbors(source).len()]; topology.node_count()])
        .collect()
}

impl Policy for HybridQ {
    fn choose(&mut self, source: NodeId, dest: NodeId, rng: &mut StdRng) -> NodeId {
        let idx = softmax_sample(&self.theta[source][dest], rng);
        self.topology.neighbors(source)[idx]
    }

    fn get_info(&self, source: NodeId, dest: NodeId, action: NodeId) -> AgentInfo {
        AgentInfo::from([
            ("action_max".to_string(), self.best_estimate(action, dest)),
            ("source_max".to_string(), self.best_estimate(source, dest)),
        ])
    }

    fn learn(&mut self, rewards: &[Reward], rates: LearnRates) {
        for reward in rewards {
            let action_max = reward.info["action_max"];
            let source_max = reward.info["source_max"];
            let idx = self
                .topology
                .neighbor_index(reward.source, reward.action)
                .expect("reward action is not a neighbor of its source");

            let target = -reward.delay_secs() + self.discount * action_max;
            let old = self.q[reward.source][reward.dest][idx];
            self.q[reward.source][reward.dest][idx] += rates.q * (target - old);

            let advantage = target - source_max;
            let theta = &mut self.theta[reward.source][reward.dest];
            let grad = softmax_gradient(theta, idx);
            for (t, g) in theta.iter_mut().zip(grad) {
                *t = (*t + rates.p * advantage * g).clamp(-THETA_CLAMP, THETA_CLAMP);
            }
        }
    }

    fn reset(&mut self) {
        self.q = tables(&self.topology, self.init_q);
        self.theta = tables(&self.topology, self.init_p);
    }
}
