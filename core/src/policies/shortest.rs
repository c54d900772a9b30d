use rand::rngs::StdRng;

use crate::topology::Topology;
use crate::traits::{NodeId, Policy};

/// Static shortest-path routing: next hops are precomputed once by repeated
/// edge relaxation and never change. Serves as the non-learning baseline
/// and as the phase-1 link restriction inside the backpressure policy.
#[derive(Debug, Clone)]
pub struct Shortest {
    /// `distance[node][dest]`, in hops.
    distance: Vec<Vec<u32>>,
    /// `next_hop[node][dest]`; `None` on the diagonal or if unreachable.
    next_hop: Vec<Vec<Option<NodeId>>>,
}

impl Shortest {
    pub fn new(topology: &Topology) -> Self {
        let n = topology.node_count();
        let unreachable = n as u32 + 1;
        let mut distance = vec![vec![unreachable; n]; n];
        let mut next_hop = vec![vec![None; n]; n];

        for node in 0..n {
            distance[node][node] = 0;
            for &neighbor in topology.neighbors(node) {
                distance[node][neighbor] = 1;
                next_hop[node][neighbor] = Some(neighbor);
            }
        }
        let mut changing = true;
        while changing {
            changing = false;
            for source in 0..n {
                for dest in 0..n {
                    for &neighbor in topology.neighbors(source) {
                        if distance[source][dest] > distance[neighbor][dest] + 1 {
                            distance[source][dest] = distance[neighbor][dest] + 1;
                            next_hop[source][dest] = Some(neighbor);
                            changing = true;
                        }
                    }
                }
            }
        }

        Self { distance, next_hop }
    }

    pub fn distance(&self, source: NodeId, dest: NodeId) -> u32 {
        self.distance[source][dest]
    }

    pub fn next_hop(&self, source: NodeId, dest: NodeId) -> Option<NodeId> {
        self.next_hop[source][dest]
    }
}

impl Policy for Shortest {
    fn choose(&mut self, source: NodeId, dest: NodeId, _rng: &mut StdRng) -> NodeId {
        self.next_hop[source][dest]
            .unwrap_or_else(|| panic!("no route from {source} to {dest}"))
    }
}
