//! Traversal of graphs in dependency order.
//!
//! A [`Visitor`] is offered every node of a graph in topological order (ties
//! broken by identity), or the reverse of that order. Returning
//! [`Flow::Stop`] from any callback halts the whole walk, nested graphs
//! included; `hook_end` is only called on walks that ran to completion.
//!
//! Embedding nodes delegate to their nested graph, which is walked between
//! `hook_start_graph_node` and `hook_end_graph_node`. The embedding node
//! itself only reaches `visit_node` for visitors that ask for it through
//! [`Visitor::visits_embedding_nodes`].

pub mod composer;
pub mod hooks;
pub mod standard;
pub mod walker;

pub use composer::VisitorComposer;
pub use hooks::CustomHooks;
pub use standard::{FindAll, FindFirst, IntegrityChecker};

use layergraph_core::config::VisitOptions;
use layergraph_core::error::Result;
use layergraph_core::types::Flow;

use crate::graph::{Graph, Node};

/// Callbacks driven by a graph traversal.
pub trait Visitor {
    /// Called for every node but the root, `graph` being the graph that owns
    /// `node`.
    fn visit_node(&mut self, node: &Node, graph: &Graph) -> Flow {
        let _ = (node, graph);
        Flow::Continue
    }

    /// Called once before the first node.
    fn hook_start(&mut self) {}

    /// Called once after the last node, unless the walk was stopped.
    fn hook_end(&mut self) {}

    /// Called before walking the nested graph of an embedding node.
    fn hook_start_graph_node(&mut self, _node: &Node) {}

    /// Called after a nested graph was walked without stopping.
    fn hook_end_graph_node(&mut self, _node: &Node) {}

    fn options(&self) -> VisitOptions {
        VisitOptions::default()
    }

    /// Whether embedding nodes are offered to `visit_node` once their nested
    /// graph was walked (or skipped).
    fn visits_embedding_nodes(&self) -> bool {
        false
    }

    /// Predicate-triggered actions run on every visited node before it is
    /// dispatched.
    fn custom_hooks(&mut self) -> Option<&mut CustomHooks> {
        None
    }

    /// Walk the whole graph. Returns whether the walk completed.
    fn visit(&mut self, graph: &Graph) -> bool
    where
        Self: Sized,
    {
        walker::visit(self, graph)
    }

    /// Walk the part of the graph at or below the depth of `from` (at or
    /// above when reversed), `from` itself excluded.
    fn visit_from(&mut self, graph: &Graph, from: &str) -> Result<bool>
    where
        Self: Sized,
    {
        walker::visit_from(self, graph, from)
    }
}
