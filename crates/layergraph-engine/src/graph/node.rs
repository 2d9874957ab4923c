use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;

use layergraph_core::types::{Flow, ROOT_ID};

use super::container::Graph;
use crate::visit::Visitor;

/// Domain payload of a node.
///
/// The graph never looks inside a payload: it only copies it (forks and
/// sub-graphs) and asks it to accept visitors. Implementors derive `Clone`
/// and `Debug`; cloning and downcasting come from the blanket [`TaskObject`].
pub trait Task: TaskObject + fmt::Debug + Send + Sync + 'static {
    /// Dispatch a visitor on this node. Returning [`Flow::Stop`] halts the
    /// whole traversal.
    fn accept(&self, node: &Node, graph: &Graph, visitor: &mut dyn Visitor) -> Flow {
        visitor.visit_node(node, graph)
    }
}

/// Object-safe cloning and downcasting for boxed payloads.
pub trait TaskObject {
    fn clone_box(&self) -> Box<dyn Task>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Task + Clone> TaskObject for T {
    fn clone_box(&self) -> Box<dyn Task> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Clone for Box<dyn Task> {
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}

/// Payload of nodes that only carry structure.
#[derive(Debug, Clone, Default)]
pub struct EmptyTask;

impl Task for EmptyTask {}

/// What a node is made of.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The sentinel entry point of a graph.
    Root,
    /// An ordinary unit of work.
    Task(Box<dyn Task>),
    /// A node owning a whole nested graph; visiting it walks the nested graph.
    Embedded(Box<Graph>),
}

/// A node of the execution graph.
///
/// Identity and parents are chosen by the caller. Depth is assigned when the
/// node is bound into a graph, and the fork id when the node is produced by a
/// fork. Neighbors are queried through the owning [`Graph`], a node never
/// holds a reference to it.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: String,
    /// Identities this node depends on.
    pub parents: BTreeSet<String>,
    pub(crate) depth: usize,
    pub(crate) fork_id: Option<String>,
    pub(crate) kind: NodeKind,
}

impl Node {
    /// Create a node without payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self::task(id, EmptyTask)
    }

    /// Create a node carrying a payload.
    pub fn task(id: impl Into<String>, task: impl Task) -> Self {
        Self::with_kind(id, NodeKind::Task(Box::new(task)))
    }

    /// Create a node that embeds (and owns) a complete graph.
    pub fn embedding(id: impl Into<String>, graph: Graph) -> Self {
        Self::with_kind(id, NodeKind::Embedded(Box::new(graph)))
    }

    pub(crate) fn root() -> Self {
        Self::with_kind(ROOT_ID, NodeKind::Root)
    }

    fn with_kind(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            parents: BTreeSet::new(),
            depth: 0,
            fork_id: None,
            kind,
        }
    }

    /// Set the parents.
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Set the fork id, required on the node handed to `Graph::fork_from_node`.
    pub fn with_fork_id(mut self, fork_id: impl Into<String>) -> Self {
        self.fork_id = Some(fork_id.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Layer of the node: 0 for the root, one more than its deepest parent
    /// otherwise. Nodes sharing a depth never depend on each other.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn fork_id(&self) -> Option<&str> {
        self.fork_id.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    pub fn is_embedding(&self) -> bool {
        matches!(self.kind, NodeKind::Embedded(_))
    }

    pub fn payload(&self) -> Option<&dyn Task> {
        match &self.kind {
            NodeKind::Task(task) => Some(task.as_ref()),
            _ => None,
        }
    }

    /// Downcast the payload to a concrete task type.
    pub fn payload_as<T: Task>(&self) -> Option<&T> {
        self.payload().and_then(|t| t.as_any().downcast_ref::<T>())
    }

    pub fn inner_graph(&self) -> Option<&Graph> {
        match &self.kind {
            NodeKind::Embedded(graph) => Some(graph),
            _ => None,
        }
    }

    /// Nodes depending on this one in `graph`.
    pub fn successors<'g>(&self, graph: &'g Graph) -> Vec<&'g Node> {
        graph.successors(&self.id)
    }

    /// Nodes this one depends on in `graph`.
    pub fn predecessors<'g>(&self, graph: &'g Graph) -> Vec<&'g Node> {
        graph.predecessors(&self.id)
    }
}
