use routesim_core::{Topology, TopologyError};

const SAMPLE: &str = "\
1000 alpha
1000 beta
1000 gamma
2000 alpha beta
2000 beta gamma
3000 some ignored record
";

#[test]
fn nodes_get_dense_ids_in_declaration_order() {
    let topology = Topology::parse(SAMPLE).unwrap();
    assert_eq!(topology.node_count(), 3);
    assert_eq!(topology.resolve("alpha"), Some(0));
    assert_eq!(topology.resolve("beta"), Some(1));
    assert_eq!(topology.resolve("gamma"), Some(2));
    assert_eq!(topology.resolve("delta"), None);
    assert_eq!(topology.neighbors(1), &[0, 2]);
}

#[test]
fn edges_are_symmetric() {
    let topology = Topology::parse(SAMPLE).unwrap();
    for a in 0..topology.node_count() {
        for &b in topology.neighbors(a) {
            assert!(
                topology.neighbors(b).contains(&a),
                "edge {a}-{b} missing its reverse direction"
            );
        }
    }
}

#[test]
fn parsing_is_idempotent() {
    let once = Topology::parse(SAMPLE).unwrap();
    let twice = Topology::parse(SAMPLE).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn duplicate_edges_do_not_duplicate_neighbors() {
    let text = "1000 a\n1000 b\n2000 a b\n2000 a b\n2000 b a\n";
    let topology = Topology::parse(text).unwrap();
    assert_eq!(topology.neighbors(0), &[1]);
    assert_eq!(topology.neighbors(1), &[0]);
}

#[test]
fn edge_to_unknown_node_is_fatal() {
    let text = "1000 a\n2000 a ghost\n";
    assert!(matches!(
        Topology::parse(text),
        Err(TopologyError::UnknownNode { line: 2, .. })
    ));
}

#[test]
fn self_loop_is_fatal() {
    let text = "1000 a\n2000 a a\n";
    assert!(matches!(
        Topology::parse(text),
        Err(TopologyError::SelfLoop { line: 2, .. })
    ));
}

#[test]
fn short_record_is_fatal() {
    assert!(matches!(
        Topology::parse("1000\n"),
        Err(TopologyError::ShortRecord { line: 1, .. })
    ));
    assert!(matches!(
        Topology::parse("1000 a\n2000 a\n"),
        Err(TopologyError::ShortRecord { line: 2, .. })
    ));
}

#[test]
fn duplicate_node_declaration_is_fatal() {
    assert!(matches!(
        Topology::parse("1000 a\n1000 a\n"),
        Err(TopologyError::DuplicateNode { line: 2, .. })
    ));
}

#[test]
fn neighbor_index_follows_insertion_order() {
    let topology = Topology::parse(SAMPLE).unwrap();
    assert_eq!(topology.neighbor_index(1, 0), Some(0));
    assert_eq!(topology.neighbor_index(1, 2), Some(1));
    assert_eq!(topology.neighbor_index(0, 2), None);
}

#[test]
fn connectivity_is_reported() {
    let connected = Topology::parse(SAMPLE).unwrap();
    assert!(connected.is_connected());
    let split = Topology::parse("1000 a\n1000 b\n").unwrap();
    assert!(!split.is_connected());
}
