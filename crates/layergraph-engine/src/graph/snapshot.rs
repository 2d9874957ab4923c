use serde::{Deserialize, Serialize};

use layergraph_core::error::Result;

use super::container::Graph;
use super::node::{Node, NodeKind};

/// Serializable picture of a graph's structure, payloads left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in topological order, root first.
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub parents: Vec<String>,
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_id: Option<String>,
    pub kind: SnapshotKind,
    /// Structure of the nested graph of an embedding node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<GraphSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Root,
    Task,
    Embedded,
}

impl NodeSnapshot {
    fn of(node: &Node) -> Self {
        let (kind, inner) = match node.kind() {
            NodeKind::Root => (SnapshotKind::Root, None),
            NodeKind::Task(_) => (SnapshotKind::Task, None),
            NodeKind::Embedded(graph) => (SnapshotKind::Embedded, Some(graph.snapshot())),
        };
        Self {
            id: node.id().to_string(),
            parents: node.parents.iter().cloned().collect(),
            depth: node.depth(),
            fork_id: node.fork_id().map(str::to_string),
            kind,
            inner,
        }
    }
}

impl Graph {
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .topological_order(false)
                .into_iter()
                .filter_map(|id| self.get_node(id))
                .map(NodeSnapshot::of)
                .collect(),
        }
    }

    /// Pretty JSON rendering of [`Graph::snapshot`].
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}
