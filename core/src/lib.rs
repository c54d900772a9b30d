//! Discrete-event simulator of packet routing over a fixed graph topology,
//! built as a testbed for reinforcement-learning routing policies.
//!
//! The [`Network`] owns the global clock, the deterministic event queue and
//! a Poisson traffic source; every [`Node`](node::Node) applies bandwidth
//! admission control and asks the bound [`Policy`] for forwarding
//! decisions. Runs are replayable bit for bit given the same seed, topology
//! and parameters.

pub mod analytics;
pub mod config;
pub mod engine;
pub mod node;
pub mod packet;
pub mod policies;
pub mod topology;
pub mod traits;

pub use analytics::{SlotSample, TrainRecorder};
pub use config::{LearnRates, SimConfig, SECOND};
pub use engine::{Event, Network, Stats};
pub use node::{Node, Received};
pub use packet::{AgentInfo, Packet, Reward};
pub use policies::{Backpressure, HybridQ, MaHybridQ, QRoute, Shortest};
pub use topology::{Topology, TopologyError};
pub use traits::{NodeId, Policy, SendStrategy};
