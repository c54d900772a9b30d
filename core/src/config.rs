use serde::{Deserialize, Serialize};

/// One simulated second, in clock ticks (microseconds).
pub const SECOND: u64 = 1_000_000;

/// Knobs of one simulation experiment. Times are in microseconds of
/// simulated time; `lambda` is per simulated second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Poisson arrival rate of new packets, packets per second.
    pub lambda: f64,
    /// Length of one action slot.
    pub slot_us: u64,
    /// Per-hop transmission delay assigned on every send.
    pub trans_time_us: u64,
    /// Maximum number of in-flight packets per link direction.
    pub bandwidth_limit: u32,
    /// Whether looping packets are dropped at all.
    pub drop_enabled: bool,
    /// Hop count at which a packet is considered lost in a loop.
    /// `None` falls back to the node count of the topology.
    pub drop_threshold: Option<u32>,
    /// Reward handed to `Policy::on_drop` for every dropped packet.
    pub drop_penalty: f64,
    /// Seed of the single generator driving all randomness in a run.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            lambda: 2.0,
            slot_us: SECOND / 3,
            trans_time_us: SECOND,
            bandwidth_limit: 3,
            drop_enabled: true,
            drop_threshold: None,
            drop_penalty: -10.0,
            seed: 0,
        }
    }
}

/// Learning rates fed into `Policy::learn`, one per table family.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LearnRates {
    /// Rate for value (Q) table updates.
    pub q: f64,
    /// Rate for policy (theta) table updates.
    pub p: f64,
}

impl Default for LearnRates {
    fn default() -> Self {
        Self { q: 0.1, p: 0.1 }
    }
}
