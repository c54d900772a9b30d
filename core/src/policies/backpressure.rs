use rand::rngs::StdRng;

use crate::policies::Shortest;
use crate::topology::Topology;
use crate::traits::{NodeId, Policy, SendStrategy};

/// Backpressure scheduling over per-destination queue occupancy.
///
/// Each node tracks how many queued packets it holds per destination (kept
/// current through the `on_receive`/`on_send` hooks). For every free link
/// the policy picks the destination with the largest positive occupancy
/// differential toward that neighbor. In phase 1 a link only carries
/// destinations it is the shortest-path next hop for; above the optional
/// occupancy threshold `l_max` the choice expands to every link (the
/// incremental-expansion variant).
pub struct Backpressure {
    topology: Topology,
    shortest: Shortest,
    /// `occupancy[node][dest]`: queued packets at `node` bound for `dest`.
    occupancy: Vec<Vec<i64>>,
    /// `None` keeps every link in phase 1.
    l_max: Option<i64>,
}

impl Backpressure {
    pub fn new(topology: &Topology) -> Self {
        Self {
            topology: topology.clone(),
            shortest: Shortest::new(topology),
            occupancy: vec![vec![0; topology.node_count()]; topology.node_count()],
            l_max: None,
        }
    }

    /// Enable phase-2 expansion once a destination's occupancy exceeds
    /// `l_max` packets.
    pub fn with_expansion(mut self, l_max: i64) -> Self {
        self.l_max = Some(l_max);
        self
    }

    pub fn occupancy(&self, node: NodeId, dest: NodeId) -> i64 {
        self.occupancy[node][dest]
    }

    fn eligible(&self, source: NodeId, dest: NodeId, link: NodeId) -> bool {
        let phase2 = self
            .l_max
            .is_some_and(|l| self.occupancy[source][dest] > l);
        phase2 || self.shortest.next_hop(source, dest) == Some(link)
    }
}

impl Policy for Backpressure {
    fn strategy(&self) -> SendStrategy {
        SendStrategy::Backpressure
    }

    fn choose(&mut self, source: NodeId, dest: NodeId, rng: &mut StdRng) -> NodeId {
        // Fallback for default-mode callers: plain shortest path.
        self.shortest.choose(source, dest, rng)
    }

    fn choose_multi(&mut self, source: NodeId, available: &[NodeId]) -> Vec<Option<NodeId>> {
        available
            .iter()
            .map(|&link| {
                let mut best: Option<(i64, NodeId)> = None;
                for dest in 0..self.topology.node_count() {
                    if dest == source {
                        continue;
                    }
                    let diff = self.occupancy[source][dest] - self.occupancy[link][dest];
                    if diff <= 0 || !self.eligible(source, dest, link) {
                        continue;
                    }
                    if best.map_or(true, |(d, _)| diff > d) {
                        best = Some((diff, dest));
                    }
                }
                best.map(|(_, dest)| dest)
            })
            .collect()
    }

    fn on_receive(&mut self, node: NodeId, dest: NodeId) {
        self.occupancy[node][dest] += 1;
    }

    fn on_send(&mut self, node: NodeId, dest: NodeId) {
        self.occupancy[node][dest] -= 1;
    }

    fn reset(&mut self) {
        for row in &mut self.occupancy {
            row.fill(0);
        }
    }
}
