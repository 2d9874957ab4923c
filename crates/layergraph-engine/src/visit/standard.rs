use tracing::warn;

use layergraph_core::config::VisitOptions;
use layergraph_core::error::{GraphError, Result};
use layergraph_core::types::Flow;

use super::Visitor;
use crate::graph::{Graph, Node};

/// Stops on the first node matching a predicate.
///
/// A walk that found something reports itself as not completed.
pub struct FindFirst<P> {
    predicate: P,
    options: VisitOptions,
    result: Option<Node>,
}

impl<P: FnMut(&Node) -> bool> FindFirst<P> {
    pub fn new(predicate: P) -> Self {
        Self {
            predicate,
            options: VisitOptions::default(),
            result: None,
        }
    }

    pub fn with_options(mut self, options: VisitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn found(&self) -> bool {
        self.result.is_some()
    }

    /// Copy of the matching node.
    pub fn result(&self) -> Option<&Node> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<Node> {
        self.result
    }
}

impl<P: FnMut(&Node) -> bool> Visitor for FindFirst<P> {
    fn visit_node(&mut self, node: &Node, _graph: &Graph) -> Flow {
        if (self.predicate)(node) {
            self.result = Some(node.clone());
            return Flow::Stop;
        }
        Flow::Continue
    }

    fn hook_start(&mut self) {
        self.result = None;
    }

    fn options(&self) -> VisitOptions {
        self.options
    }

    fn visits_embedding_nodes(&self) -> bool {
        true
    }
}

/// Collects every node matching a predicate, in walk order.
pub struct FindAll<P> {
    predicate: P,
    options: VisitOptions,
    results: Vec<Node>,
}

impl<P: FnMut(&Node) -> bool> FindAll<P> {
    pub fn new(predicate: P) -> Self {
        Self {
            predicate,
            options: VisitOptions::default(),
            results: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: VisitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn results(&self) -> &[Node] {
        &self.results
    }

    pub fn count(&self) -> usize {
        self.results.len()
    }

    pub fn into_results(self) -> Vec<Node> {
        self.results
    }
}

impl<P: FnMut(&Node) -> bool> Visitor for FindAll<P> {
    fn visit_node(&mut self, node: &Node, _graph: &Graph) -> Flow {
        if (self.predicate)(node) {
            self.results.push(node.clone());
        }
        Flow::Continue
    }

    fn hook_start(&mut self) {
        self.results.clear();
    }

    fn options(&self) -> VisitOptions {
        self.options
    }

    fn visits_embedding_nodes(&self) -> bool {
        true
    }
}

/// Verifies the structure of a graph and of the graphs nested in it.
///
/// Violations can only come from edits made behind the graph's back (through
/// [`Graph::get_node_mut`]). The walk stops on the first one.
#[derive(Debug, Default)]
pub struct IntegrityChecker {
    error: Option<GraphError>,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `graph` and report the first violation found.
    pub fn check(&mut self, graph: &Graph) -> Result<()> {
        self.error = cycle_in(graph);
        if self.error.is_none() {
            self.visit(graph);
        }
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Violation found by the last walk.
    pub fn error(&self) -> Option<&GraphError> {
        self.error.as_ref()
    }

    fn fail(&mut self, node: &Node, reason: String) -> Flow {
        warn!(node_id = %node.id(), reason = %reason, "Graph integrity violated");
        self.error = Some(GraphError::Integrity {
            node: node.id().to_string(),
            reason,
        });
        Flow::Stop
    }
}

impl Visitor for IntegrityChecker {
    fn visit_node(&mut self, node: &Node, graph: &Graph) -> Flow {
        if self.error.is_some() {
            return Flow::Stop;
        }
        match violation(node, graph) {
            Some(reason) => self.fail(node, reason),
            None => Flow::Continue,
        }
    }

    fn hook_start(&mut self) {
        self.error = None;
    }

    fn hook_start_graph_node(&mut self, node: &Node) {
        if self.error.is_none() {
            self.error = node.inner_graph().and_then(cycle_in);
        }
    }
}

fn cycle_in(graph: &Graph) -> Option<GraphError> {
    graph.find_cycle().map(|node| GraphError::Integrity {
        node,
        reason: "caught in a dependency cycle".into(),
    })
}

fn violation(node: &Node, graph: &Graph) -> Option<String> {
    if node.id().is_empty() {
        return Some("empty identity".into());
    }
    if !graph
        .get_node(node.id())
        .is_some_and(|registered| std::ptr::eq(registered, node))
    {
        return Some("not registered in the graph".into());
    }
    if node.parents.is_empty() {
        return Some("no parents".into());
    }

    let mut expected_depth = 0;
    for parent_id in &node.parents {
        let Some(parent) = graph.get_node(parent_id) else {
            return Some(format!("parent '{}' is not in the graph", parent_id));
        };
        if !graph.children_of(parent_id).any(|c| c == node.id()) {
            return Some(format!("edge from parent '{}' is missing", parent_id));
        }
        expected_depth = expected_depth.max(parent.depth() + 1);
    }
    if node.depth() != expected_depth {
        return Some(format!(
            "depth {} does not match parents (expected {})",
            node.depth(),
            expected_depth
        ));
    }
    None
}
