use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SECOND;
use crate::traits::NodeId;

/// One unit of traffic in flight.
///
/// A packet is owned by exactly one place at a time: either the pending
/// queue of the node currently holding it, or the single in-flight event
/// carrying it to its next hop. After delivery or drop it is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Packet {
    pub source: NodeId,
    pub dest: NodeId,
    /// When the packet was injected.
    pub birth: u64,
    /// Number of links traversed so far, incremented once per send.
    pub hops: u32,
    /// When queuing at the current node started.
    pub start_queue: u64,
    /// Queuing delay measured at the last send.
    pub queue_time: u64,
    /// Transmission delay assigned at the last send.
    pub trans_time: u64,
}

impl Packet {
    pub fn new(source: NodeId, dest: NodeId, birth: u64) -> Self {
        Self {
            source,
            dest,
            birth,
            hops: 0,
            start_queue: 0,
            queue_time: 0,
            trans_time: 0,
        }
    }
}

/// Policy-specific auxiliary values merged into a [`Reward`].
pub type AgentInfo = HashMap<String, f64>;

/// Feedback signal produced by one successful send, consumed by
/// `Policy::learn` at the end of the slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    /// Node that performed the send.
    pub source: NodeId,
    /// Final destination of the packet.
    pub dest: NodeId,
    /// Neighbor the packet was forwarded to.
    pub action: NodeId,
    pub queue_time: u64,
    pub trans_time: u64,
    /// Opaque extras supplied by `Policy::get_info`.
    pub info: AgentInfo,
}

impl Reward {
    pub fn new(source: NodeId, packet: &Packet, action: NodeId, info: AgentInfo) -> Self {
        Self {
            source,
            dest: packet.dest,
            action,
            queue_time: packet.queue_time,
            trans_time: packet.trans_time,
            info,
        }
    }

    /// Total delay (queuing plus transmission) in simulated seconds.
    pub fn delay_secs(&self) -> f64 {
        (self.queue_time + self.trans_time) as f64 / SECOND as f64
    }
}
