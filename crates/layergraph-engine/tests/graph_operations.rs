use std::collections::BTreeSet;

use layergraph_core::error::GraphError;
use layergraph_core::types::ROOT_ID;
use layergraph_engine::graph::{Graph, Node};
use layergraph_engine::visit::{IntegrityChecker, Visitor};
use layergraph_test_utils::{
    basic_graph, complex_graph, fork_graph, labelled, layer_ids, Label,
    RecordingVisitor,
};

fn parents(graph: &Graph, id: &str) -> BTreeSet<String> {
    graph.get_node(id).unwrap().parents.clone()
}

fn set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn assert_depths_consistent(graph: &Graph) {
    for node in graph.nodes() {
        let expected = node
            .parents
            .iter()
            .map(|p| graph.get_node(p).unwrap().depth())
            .max()
            .unwrap()
            + 1;
        assert_eq!(node.depth(), expected, "depth of {}", node.id());
    }
    assert_eq!(graph.root().depth(), 0);
}

fn assert_parents_visited_first(graph: &Graph, visitor: &RecordingVisitor, reversed: bool) {
    for node in graph.nodes() {
        for parent in node.parents.iter().filter(|p| p.as_str() != ROOT_ID) {
            let (p, c) = (visitor.position(parent).unwrap(), visitor.position(node.id()).unwrap());
            if reversed {
                assert!(c < p, "{} visited after its parent {}", node.id(), parent);
            } else {
                assert!(p < c, "{} visited before its parent {}", node.id(), parent);
            }
        }
    }
}

#[test]
fn test_basic_depths_and_order() {
    let graph = basic_graph();
    let depths: Vec<usize> = ["id1", "id2", "id4", "id3", "id5"]
        .iter()
        .map(|id| graph.get_node(id).unwrap().depth())
        .collect();
    assert_eq!(depths, vec![1, 2, 3, 4, 5]);

    let mut visitor = RecordingVisitor::new();
    assert!(visitor.visit(&graph));
    assert_eq!(visitor.visited, vec!["id1", "id2", "id4", "id3", "id5"]);
}

#[test]
fn test_edges_respected_both_ways() {
    let graph = complex_graph();

    let mut forward = RecordingVisitor::new();
    assert!(forward.visit(&graph));
    assert_eq!(forward.visited.len(), 13);
    assert_parents_visited_first(&graph, &forward, false);

    let mut backward =
        RecordingVisitor::new().with_options(layergraph_core::config::VisitOptions::reversed());
    assert!(backward.visit(&graph));
    assert_parents_visited_first(&graph, &backward, true);

    let mut reversed_forward = forward.visited.clone();
    reversed_forward.reverse();
    assert_eq!(backward.visited, reversed_forward);
    assert_depths_consistent(&graph);
}

#[test]
fn test_remove_leaf_and_interior() {
    let mut graph = basic_graph();
    assert_eq!(graph.remove_node("id5").unwrap(), vec!["id5"]);
    assert_eq!(graph.len(), 4);

    let mut graph = complex_graph();
    let expected: BTreeSet<String> = graph
        .descendants("F")
        .into_iter()
        .chain(["F".to_string()])
        .collect();
    let removed: BTreeSet<String> = graph.remove_node("F").unwrap().into_iter().collect();
    assert_eq!(removed, expected);
    assert_eq!(graph.node_ids(), vec!["A", "B", "C", "D", "E", "G"]);
    assert!(graph.successors("G").is_empty());
    assert!(IntegrityChecker::new().check(&graph).is_ok());
}

#[test]
fn test_replace_node_keeps_position() {
    let mut graph = basic_graph();
    let previous = graph
        .replace_node(Node::task("id3", Label("rewritten".into())).with_parents(["id1"]))
        .unwrap();

    assert_eq!(previous.payload_as::<Label>(), Some(&Label("id3".into())));
    let node = graph.get_node("id3").unwrap();
    assert_eq!(node.payload_as::<Label>(), Some(&Label("rewritten".into())));
    assert_eq!(node.parents, set(&["id2", "id4"]));
    assert_eq!(node.depth(), 4);
}

#[test]
fn test_fork_without_join() {
    let mut graph = basic_graph();
    graph
        .fork_from_node(Node::new("id4").with_fork_id("f"), None)
        .unwrap();

    assert_eq!(graph.len(), 8);
    assert_eq!(parents(&graph, "id4::f"), set(&["id2"]));
    assert_eq!(parents(&graph, "id3::f"), set(&["id2", "id4::f"]));
    assert_eq!(parents(&graph, "id5::f"), set(&["id4::f", "id3::f"]));
    // the forked node received the given payload, the others kept theirs
    assert!(graph.get_node("id4::f").unwrap().payload_as::<Label>().is_none());
    assert_eq!(
        graph.get_node("id3::f").unwrap().payload_as::<Label>(),
        Some(&Label("id3".into()))
    );
    assert_depths_consistent(&graph);
    assert!(IntegrityChecker::new().check(&graph).is_ok());
}

#[test]
fn test_fork_is_isomorphic() {
    let mut graph = complex_graph();
    graph
        .fork_from_node(labelled("F").with_fork_id("copy"), None)
        .unwrap();

    let original = graph.sub_graph("F", &[]).unwrap();
    let copy = graph.sub_graph("F::copy", &[]).unwrap();
    assert_eq!(original.len(), copy.len());
    for node in original.nodes() {
        let forked = copy.get_node(&format!("{}::copy", node.id())).unwrap();
        assert_eq!(forked.fork_id(), Some("copy"));
        assert_eq!(forked.depth(), node.depth());
        let mapped: BTreeSet<String> = node
            .parents
            .iter()
            .map(|p| if p == ROOT_ID { p.clone() } else { format!("{p}::copy") })
            .collect();
        assert_eq!(forked.parents, mapped);
    }
    // K kept its external parent G
    assert_eq!(parents(&graph, "K::copy"), set(&["F::copy", "G"]));
}

#[test]
fn test_fork_with_join() {
    let mut graph = fork_graph();
    graph
        .fork_from_node(labelled("id1").with_fork_id("chocobo"), Some("id_join"))
        .unwrap();

    assert_eq!(graph.len(), 16);
    assert_eq!(
        parents(&graph, "id_join"),
        set(&[
            "id2", "id4", "id5", "id6", "id2::chocobo", "id4::chocobo", "id5::chocobo",
            "id6::chocobo",
        ])
    );
    assert_eq!(parents(&graph, "id3::chocobo"), set(&["id1::chocobo"]));
    assert_eq!(parents(&graph, "id7"), set(&["id_join"]));
    assert_depths_consistent(&graph);

    let mut visitor = RecordingVisitor::new();
    assert!(visitor.visit(&graph));
    assert_parents_visited_first(&graph, &visitor, false);
}

#[test]
fn test_fork_failures_leave_graph_untouched() {
    let mut graph = fork_graph();
    let before = graph.snapshot();

    // id6 escapes to id_9, which never reaches the join
    graph.add_node(labelled("id_9").with_parents(["id6"])).unwrap();
    let with_escape = graph.snapshot();
    assert!(matches!(
        graph.fork_from_node(Node::new("id1").with_fork_id("c"), Some("id_join")),
        Err(GraphError::EscapingEdge { .. })
    ));
    assert_eq!(graph.snapshot(), with_escape);

    graph.remove_node("id_9").unwrap();
    assert_eq!(graph.snapshot(), before);
    assert!(matches!(
        graph.fork_from_node(Node::new("id1"), Some("id_join")),
        Err(GraphError::MissingForkId(_))
    ));
    assert!(matches!(
        graph.fork_from_node(Node::new("id1").with_fork_id("c"), Some("nope")),
        Err(GraphError::JoinNotFound(_))
    ));
    assert_eq!(graph.snapshot(), before);
}

#[test]
fn test_sub_graph_with_stops_and_removed_parents() {
    let graph = complex_graph();
    let (sub, removed) = graph.sub_graph_with_removed("A", &["K", "J"]).unwrap();
    assert_eq!(sub.node_ids(), vec!["A", "C", "D", "F", "H", "I", "J", "K"]);

    // A hung from the source root, K from G outside the copy
    let cut: Vec<(String, Vec<String>)> = removed
        .into_iter()
        .map(|r| (r.node, r.parents.into_iter().collect()))
        .collect();
    assert!(cut.contains(&("K".to_string(), vec!["G".to_string()])));
    assert!(cut.contains(&("A".to_string(), vec![ROOT_ID.to_string()])));
    assert_eq!(parents(&sub, "K"), set(&["F"]));
    assert!(IntegrityChecker::new().check(&sub).is_ok());
}

#[test]
fn test_layers_partition_independent_nodes() {
    let graph = complex_graph();
    let layers = layer_ids(&graph);
    assert_eq!(layers[0], vec!["A", "B"]);
    assert_eq!(layers[1], vec!["C", "D", "E"]);

    for layer in graph.layers() {
        for node in &layer {
            for other in &layer {
                assert!(!node.parents.contains(other.id()));
            }
        }
    }
}

#[test]
fn test_snapshot_json() {
    let graph = basic_graph();
    let json: serde_json::Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
    let nodes = json["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 6);
    assert_eq!(nodes[0]["kind"], "root");
    assert_eq!(nodes[5]["id"], "id5");
    assert_eq!(nodes[5]["depth"], 5);
}
