use tracing::debug;

use layergraph_core::error::{GraphError, Result};
use layergraph_core::types::{EmbeddedPolicy, Flow};

use super::Visitor;
use crate::graph::{Graph, Node, NodeKind};

/// Walk the whole graph with `visitor`. Returns whether the walk completed.
pub fn visit(visitor: &mut dyn Visitor, graph: &Graph) -> bool {
    visit_scoped(visitor, graph, None)
}

/// Walk the nodes at or below the depth of `from` (at or above when the
/// visitor walks reversed), `from` excluded. Starting from the root is a full
/// walk.
pub fn visit_from(visitor: &mut dyn Visitor, graph: &Graph, from: &str) -> Result<bool> {
    let start = graph
        .get_node(from)
        .ok_or_else(|| GraphError::NodeNotFound(from.to_string()))?;
    let start = if start.is_root() { None } else { Some(start) };
    Ok(visit_scoped(visitor, graph, start))
}

pub(crate) fn visit_scoped(visitor: &mut dyn Visitor, graph: &Graph, start: Option<&Node>) -> bool {
    visitor.hook_start();
    let completed = walk(graph, start, visitor, 0).is_continue();
    if completed {
        visitor.hook_end();
    }
    completed
}

/// Nodes of `graph` in walk order, restricted to the depth range of `start`.
pub(crate) fn walk_order<'g>(graph: &'g Graph, start: Option<&Node>, reversed: bool) -> Vec<&'g Node> {
    graph
        .topological_order(reversed)
        .into_iter()
        .filter_map(|id| graph.get_node(id))
        .filter(|node| match start {
            None => true,
            Some(start) if reversed => node.id() != start.id() && node.depth() <= start.depth(),
            Some(start) => node.id() != start.id() && node.depth() >= start.depth(),
        })
        .collect()
}

pub(crate) fn walk(graph: &Graph, start: Option<&Node>, visitor: &mut dyn Visitor, nesting: usize) -> Flow {
    let reversed = visitor.options().reversed;
    for node in walk_order(graph, start, reversed) {
        if dispatch(node, graph, visitor, nesting).is_stop() {
            debug!(node_id = %node.id(), nesting, "Visit stopped");
            return Flow::Stop;
        }
    }
    Flow::Continue
}

/// Offer one node of `graph` to `visitor`.
pub(crate) fn dispatch(node: &Node, graph: &Graph, visitor: &mut dyn Visitor, nesting: usize) -> Flow {
    if node.is_root() {
        return Flow::Continue;
    }
    if let Some(hooks) = visitor.custom_hooks() {
        hooks.run(node);
    }

    match node.kind() {
        NodeKind::Root => Flow::Continue,
        NodeKind::Task(task) => task.accept(node, graph, visitor),
        NodeKind::Embedded(inner) => {
            let options = visitor.options();
            if options.may_enter(nesting) {
                visitor.hook_start_graph_node(node);
                if walk(inner, None, visitor, nesting + 1).is_stop() {
                    return Flow::Stop;
                }
                visitor.hook_end_graph_node(node);
            } else if options.embedded_policy == EmbeddedPolicy::Stop {
                debug!(node_id = %node.id(), nesting, "Nested graph beyond depth limit");
                return Flow::Stop;
            }
            if visitor.visits_embedding_nodes() {
                visitor.visit_node(node, graph)
            } else {
                Flow::Continue
            }
        }
    }
}
