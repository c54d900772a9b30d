use serde::{Deserialize, Serialize};

use crate::engine::Stats;

/// One sampled point of the training time series, taken at the end of a
/// slot. These series are the primary observable output of an experiment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlotSample {
    pub clock_us: u64,
    /// Running average route time of delivered packets, microseconds.
    pub ave_route_time_us: f64,
    /// Cumulative fraction of injected packets that were dropped.
    pub drop_rate: f64,
}

/// Accumulates the per-slot samples produced by `Network::train`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TrainRecorder {
    pub samples: Vec<SlotSample>,
}

impl TrainRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(slots: usize) -> Self {
        Self {
            samples: Vec::with_capacity(slots),
        }
    }

    pub fn record(&mut self, clock_us: u64, stats: &Stats) {
        self.samples.push(SlotSample {
            clock_us,
            ave_route_time_us: stats.ave_route_time(),
            drop_rate: stats.drop_rate(),
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Route-time column of the series, in sample order.
    pub fn route_times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.ave_route_time_us).collect()
    }

    /// Drop-rate column of the series, in sample order.
    pub fn drop_rates(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.drop_rate).collect()
    }
}
