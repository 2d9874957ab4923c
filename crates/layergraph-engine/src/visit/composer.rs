use tracing::debug;

use layergraph_core::error::{GraphError, Result};

use super::walker;
use super::Visitor;
use crate::graph::{Graph, Node};

/// Runs groups of visitors over one graph.
///
/// `before` visitors walk the graph one after the other, then all `actions`
/// share a single walk (each node is offered to every action before the walk
/// moves on), then `after` visitors walk one after the other. A stopped walk
/// aborts the whole composition.
pub struct VisitorComposer<'v> {
    before: Vec<&'v mut dyn Visitor>,
    actions: Vec<&'v mut dyn Visitor>,
    after: Vec<&'v mut dyn Visitor>,
}

impl<'v> VisitorComposer<'v> {
    /// At least one action is required, and all actions must walk in the
    /// same direction.
    pub fn new(actions: Vec<&'v mut dyn Visitor>) -> Result<Self> {
        let Some(first) = actions.first() else {
            return Err(GraphError::Composition(
                "at least one action visitor is required".into(),
            ));
        };
        let reversed = first.options().reversed;
        if actions.iter().any(|a| a.options().reversed != reversed) {
            return Err(GraphError::Composition(
                "action visitors disagree on traversal direction".into(),
            ));
        }
        Ok(Self {
            before: Vec::new(),
            actions,
            after: Vec::new(),
        })
    }

    pub fn with_before(mut self, visitors: Vec<&'v mut dyn Visitor>) -> Self {
        self.before = visitors;
        self
    }

    pub fn with_after(mut self, visitors: Vec<&'v mut dyn Visitor>) -> Self {
        self.after = visitors;
        self
    }

    /// Run the composition on the whole graph. Returns whether every walk
    /// completed.
    pub fn visit(&mut self, graph: &Graph) -> bool {
        self.run(graph, None)
    }

    /// Run the composition on the part of the graph scoped by `from`, as
    /// [`Visitor::visit_from`] does.
    pub fn visit_from(&mut self, graph: &Graph, from: &str) -> Result<bool> {
        let start = graph
            .get_node(from)
            .ok_or_else(|| GraphError::NodeNotFound(from.to_string()))?;
        let start = if start.is_root() { None } else { Some(start) };
        Ok(self.run(graph, start))
    }

    fn run(&mut self, graph: &Graph, start: Option<&Node>) -> bool {
        for (index, visitor) in self.before.iter_mut().enumerate() {
            if !walker::visit_scoped(&mut **visitor, graph, start) {
                debug!(index, "Before visitor stopped, composition aborted");
                return false;
            }
        }
        if !self.run_actions(graph, start) {
            debug!("Action visitors stopped, composition aborted");
            return false;
        }
        for (index, visitor) in self.after.iter_mut().enumerate() {
            if !walker::visit_scoped(&mut **visitor, graph, start) {
                debug!(index, "After visitor stopped, composition aborted");
                return false;
            }
        }
        true
    }

    fn run_actions(&mut self, graph: &Graph, start: Option<&Node>) -> bool {
        let reversed = self
            .actions
            .first()
            .map_or(false, |a| a.options().reversed);

        for action in self.actions.iter_mut() {
            action.hook_start();
        }
        for node in walker::walk_order(graph, start, reversed) {
            for action in self.actions.iter_mut() {
                if walker::dispatch(node, graph, &mut **action, 0).is_stop() {
                    return false;
                }
            }
        }
        for action in self.actions.iter_mut() {
            action.hook_end();
        }
        true
    }
}
