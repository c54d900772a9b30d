use rand::rngs::StdRng;

use crate::config::LearnRates;
use crate::engine::Event;
use crate::packet::{AgentInfo, Reward};
use crate::policies::hybrid::{tables, HybridQ};
use crate::policies::softmax_gradient;
use crate::topology::Topology;
use crate::traits::{NodeId, Policy};

/// Multi-agent hybrid Q-routing with eligibility traces: the slot's rewards
/// are pooled into one global advantage signal, credit is spread across all
/// nodes through per-table traces decayed by `discount_trace`, and drop
/// penalties feed into the next slot's pooled signal.
pub struct MaHybridQ {
    base: HybridQ,
    discount_trace: f64,
    /// Same shape as the theta tables.
    trace: Vec<Vec<Vec<f64>>>,
    /// Carry-over shaping term, fed by drop penalties.
    reward_shape: f64,
}

impl MaHybridQ {
    pub fn new(
        topology: &Topology,
        init_q: f64,
        init_p: f64,
        discount: f64,
        discount_trace: f64,
    ) -> Self {
        Self {
            base: HybridQ::new(topology, init_q, init_p, discount),
            discount_trace,
            trace: tables(topology, 0.0),
            reward_shape: 0.0,
        }
    }
}

impl Policy for MaHybridQ {
    fn choose(&mut self, source: NodeId, dest: NodeId, rng: &mut StdRng) -> NodeId {
        self.base.choose(source, dest, rng)
    }

    fn get_info(&self, source: NodeId, dest: NodeId, action: NodeId) -> AgentInfo {
        self.base.get_info(source, dest, action)
    }

    fn learn(&mut self, rewards: &[Reward], rates: LearnRates) {
        let discount = self.base.discount();

        // Pooled advantage over the whole slot.
        let mut delta = self.reward_shape;
        self.reward_shape = 0.0;
        for reward in rewards {
            delta += -reward.delay_secs() + discount * reward.info["action_max"]
                - reward.info["source_max"];
        }

        for table in &mut self.trace {
            for row in table.iter_mut() {
                for t in row.iter_mut() {
                    *t *= self.discount_trace;
                }
            }
        }

        for reward in rewards {
            let idx = self
                .base
                .topology()
                .neighbor_index(reward.source, reward.action)
                .expect("reward action is not a neighbor of its source");
            let grad = softmax_gradient(&self.base.theta[reward.source][reward.dest], idx);
            for (t, g) in self.trace[reward.source][reward.dest].iter_mut().zip(grad) {
                *t += g;
            }
            let target = -reward.delay_secs() + discount * reward.info["action_max"];
            let old = self.base.q[reward.source][reward.dest][idx];
            self.base.q[reward.source][reward.dest][idx] += rates.q * (target - old);
        }

        for (theta_table, trace_table) in self.base.theta.iter_mut().zip(&self.trace) {
            for (theta_row, trace_row) in theta_table.iter_mut().zip(trace_table) {
                for (t, e) in theta_row.iter_mut().zip(trace_row) {
                    *t += rates.p * delta * e;
                }
            }
        }
    }

    fn on_drop(&mut self, _event: &Event, penalty: f64) {
        self.reward_shape += penalty;
    }

    fn reset(&mut self) {
        self.base.reset();
        for table in &mut self.trace {
            for row in table.iter_mut() {
                row.fill(0.0);
            }
        }
        self.reward_shape = 0.0;
    }
}
