use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::traits::NodeId;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("failed to read topology file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: record too short: {record:?}")]
    ShortRecord { line: usize, record: String },
    #[error("line {line}: duplicate node declaration {name:?}")]
    DuplicateNode { line: usize, name: String },
    #[error("line {line}: edge references unknown node {name:?}")]
    UnknownNode { line: usize, name: String },
    #[error("line {line}: self-loop on node {name:?}")]
    SelfLoop { line: usize, name: String },
}

/// Static graph of the network: dense node ids and ordered neighbor lists.
///
/// Built once at startup and never mutated afterwards. Neighbor lists keep
/// their insertion order; policies index their per-neighbor tables by
/// position in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// External file identity to dense id, in declaration order.
    ids: HashMap<String, NodeId>,
    links: Vec<Vec<NodeId>>,
}

impl Topology {
    /// Parse the line-oriented network file format: `1000 <name>` declares a
    /// node, `2000 <a> <b>` an undirected edge between declared nodes.
    /// Records with any other tag are ignored.
    pub fn parse(text: &str) -> Result<Self, TopologyError> {
        let mut ids = HashMap::new();
        let mut links: Vec<Vec<NodeId>> = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let fields: Vec<&str> = raw.split_whitespace().collect();
            match fields.first() {
                Some(&"1000") => {
                    let name = *fields.get(1).ok_or_else(|| TopologyError::ShortRecord {
                        line,
                        record: raw.to_string(),
                    })?;
                    if ids.contains_key(name) {
                        return Err(TopologyError::DuplicateNode {
                            line,
                            name: name.to_string(),
                        });
                    }
                    ids.insert(name.to_string(), links.len());
                    links.push(Vec::new());
                }
                Some(&"2000") => {
                    if fields.len() < 3 {
                        return Err(TopologyError::ShortRecord {
                            line,
                            record: raw.to_string(),
                        });
                    }
                    let resolve = |name: &str| {
                        ids.get(name).copied().ok_or_else(|| TopologyError::UnknownNode {
                            line,
                            name: name.to_string(),
                        })
                    };
                    let a = resolve(fields[1])?;
                    let b = resolve(fields[2])?;
                    if a == b {
                        return Err(TopologyError::SelfLoop {
                            line,
                            name: fields[1].to_string(),
                        });
                    }
                    if !links[a].contains(&b) {
                        links[a].push(b);
                        links[b].push(a);
                    }
                }
                _ => {} // unknown record types are ignored
            }
        }

        let topology = Self { ids, links };
        if !topology.is_connected() {
            warn!("topology is not connected; some destinations are unreachable");
        }
        Ok(topology)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Build a topology directly from dense node ids, mainly for tests and
    /// programmatic setups. Both directions of every edge are inserted.
    pub fn from_edges(node_count: usize, edges: &[(NodeId, NodeId)]) -> Self {
        let mut links = vec![Vec::new(); node_count];
        for &(a, b) in edges {
            assert!(a < node_count && b < node_count, "edge ({a}, {b}) out of range");
            assert_ne!(a, b, "self-loops are not allowed");
            if !links[a].contains(&b) {
                links[a].push(b);
                links[b].push(a);
            }
        }
        Self {
            ids: HashMap::new(),
            links,
        }
    }

    pub fn node_count(&self) -> usize {
        self.links.len()
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.links[node]
    }

    /// Position of `to` in the neighbor list of `from`, if adjacent.
    pub fn neighbor_index(&self, from: NodeId, to: NodeId) -> Option<usize> {
        self.links[from].iter().position(|&n| n == to)
    }

    /// Dense id assigned to an external node name from the file.
    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    pub fn is_connected(&self) -> bool {
        let n = self.node_count();
        if n == 0 {
            return true;
        }
        let mut seen = vec![false; n];
        let mut stack = vec![0];
        seen[0] = true;
        while let Some(node) = stack.pop() {
            for &next in &self.links[node] {
                if !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
        seen.into_iter().all(|s| s)
    }
}
