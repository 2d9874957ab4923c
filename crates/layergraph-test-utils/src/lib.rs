//! Graph fixtures, a recording visitor and a recording layer worker shared by
//! the layergraph test suites.

use std::sync::Mutex;

use futures::future::BoxFuture;

use layergraph_core::config::VisitOptions;
use layergraph_core::error::{GraphError, Result};
use layergraph_core::types::Flow;
use layergraph_engine::graph::{Graph, LayerWorker, Node, Task};
use layergraph_engine::visit::{CustomHooks, Visitor};

/// Payload carrying a human readable label.
#[derive(Debug, Clone, PartialEq)]
pub struct Label(pub String);

impl Task for Label {}

/// Node carrying a [`Label`] equal to its identity.
pub fn labelled(id: &str) -> Node {
    Node::task(id, Label(id.to_string()))
}

/// ```text
///     ,_____, id2
///  id1         |
///              |    ,----- id3
///              |   /           \
///              |  /             `___ id5
///             id4 `--------------`
/// ```
pub fn basic_graph() -> Graph {
    build(vec![
        labelled("id1"),
        labelled("id2").with_parents(["id1"]),
        labelled("id4").with_parents(["id2"]),
        labelled("id3").with_parents(["id2", "id4"]),
        labelled("id5").with_parents(["id4", "id3"]),
    ])
}

/// ```text
///            A                      B
///         /     \                 /  |
///        C       D              E    |
///                 \              \   |
///                  F .______,    G   |
///               /  |  \     \   /    |
///             H    I   J     `,K.    |
///                     /,_____/   \   |
///                    L             M
/// ```
pub fn complex_graph() -> Graph {
    build(vec![
        labelled("A"),
        labelled("B"),
        labelled("C").with_parents(["A"]),
        labelled("D").with_parents(["A"]),
        labelled("E").with_parents(["B"]),
        labelled("F").with_parents(["D"]),
        labelled("G").with_parents(["E"]),
        labelled("H").with_parents(["F"]),
        labelled("I").with_parents(["F"]),
        labelled("J").with_parents(["F"]),
        labelled("K").with_parents(["F", "G"]),
        labelled("L").with_parents(["J", "K"]),
        labelled("M").with_parents(["K", "B"]),
    ])
}

/// ```text
///            id0
///             |
///       .___ id1 ___.
///      /      |      \
///     id2    id3     id4
///     |     /   \      |
///     |   id5   id6    |
///     \     \   /     /
///      `-- id_join --'
///          /     \
///         id7    id8
/// ```
pub fn fork_graph() -> Graph {
    build(vec![
        labelled("id0"),
        labelled("id1").with_parents(["id0"]),
        labelled("id2").with_parents(["id1"]),
        labelled("id3").with_parents(["id1"]),
        labelled("id4").with_parents(["id1"]),
        labelled("id5").with_parents(["id3"]),
        labelled("id6").with_parents(["id3"]),
        labelled("id_join").with_parents(["id2", "id5", "id6", "id4"]),
        labelled("id7").with_parents(["id_join"]),
        labelled("id8").with_parents(["id_join"]),
    ])
}

/// `T1_a -> G1 -> T1_b`, where `G1` embeds `T2_x -> G2` and `G2` embeds
/// `T2_y -> T2_z`.
pub fn graph_with_subgraphs() -> Graph {
    let deepest = build(vec![labelled("T2_y"), labelled("T2_z").with_parents(["T2_y"])]);
    let middle = build(vec![
        labelled("T2_x"),
        Node::embedding("G2", deepest).with_parents(["T2_x"]),
    ]);
    build(vec![
        labelled("T1_a"),
        Node::embedding("G1", middle).with_parents(["T1_a"]),
        labelled("T1_b").with_parents(["G1"]),
    ])
}

fn build(nodes: Vec<Node>) -> Graph {
    let mut graph = Graph::new();
    if let Err(e) = graph.add_nodes(nodes) {
        panic!("invalid fixture: {e}");
    }
    graph
}

/// Identities of the nodes in `graph`, layer by layer.
pub fn layer_ids(graph: &Graph) -> Vec<Vec<String>> {
    graph
        .layers()
        .into_iter()
        .skip(1)
        .map(|layer| layer.iter().map(|n| n.id().to_string()).collect())
        .collect()
}

/// Visitor recording what a walk offered it.
///
/// `visited` holds the identities of the visited nodes in walk order;
/// `events` holds the hook calls.
#[derive(Debug, Default)]
pub struct RecordingVisitor {
    pub visited: Vec<String>,
    pub events: Vec<String>,
    pub hooks: CustomHooks,
    options: VisitOptions,
    stop_on: Option<String>,
}

impl RecordingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: VisitOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop the walk once `id` has been recorded.
    pub fn stopping_at(mut self, id: impl Into<String>) -> Self {
        self.stop_on = Some(id.into());
        self
    }

    /// Position of `id` in `visited`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.visited.iter().position(|v| v == id)
    }
}

impl Visitor for RecordingVisitor {
    fn visit_node(&mut self, node: &Node, _graph: &Graph) -> Flow {
        self.visited.push(node.id().to_string());
        Flow::from(self.stop_on.as_deref() != Some(node.id()))
    }

    fn hook_start(&mut self) {
        self.events.push("start".into());
    }

    fn hook_end(&mut self) {
        self.events.push("end".into());
    }

    fn hook_start_graph_node(&mut self, node: &Node) {
        self.events.push(format!("enter {}", node.id()));
    }

    fn hook_end_graph_node(&mut self, node: &Node) {
        self.events.push(format!("leave {}", node.id()));
    }

    fn options(&self) -> VisitOptions {
        self.options
    }

    fn custom_hooks(&mut self) -> Option<&mut CustomHooks> {
        Some(&mut self.hooks)
    }
}

/// Layer worker recording the nodes it ran, optionally failing or stopping
/// on a given node.
#[derive(Debug, Default)]
pub struct RecordingWorker {
    runs: Mutex<Vec<String>>,
    stop_on: Option<String>,
    fail_on: Option<String>,
}

impl RecordingWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_at(mut self, id: impl Into<String>) -> Self {
        self.stop_on = Some(id.into());
        self
    }

    pub fn failing_at(mut self, id: impl Into<String>) -> Self {
        self.fail_on = Some(id.into());
        self
    }

    /// Identities run so far, in completion order.
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl LayerWorker for RecordingWorker {
    fn run<'a>(&'a self, node: &'a Node) -> BoxFuture<'a, Result<Flow>> {
        Box::pin(async move {
            if let Ok(mut runs) = self.runs.lock() {
                runs.push(node.id().to_string());
            }
            if self.fail_on.as_deref() == Some(node.id()) {
                return Err(GraphError::Execution {
                    node: node.id().to_string(),
                    reason: "requested failure".into(),
                });
            }
            Ok(Flow::from(self.stop_on.as_deref() != Some(node.id())))
        })
    }
}
