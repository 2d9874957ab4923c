use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use tracing::{debug, info};

use layergraph_core::error::{GraphError, Result};
use layergraph_core::types::{validate_fork_id, validate_identity, ROOT_ID};

use super::node::Node;

/// A mutable DAG of nodes with a single sentinel root.
///
/// Every node's parents are inserted strictly before it, which keeps the
/// structure acyclic by construction. Failed mutations leave the graph as it
/// was before the call.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) root: Node,
    pub(crate) nodes: HashMap<String, Node>,
    /// parent -> children adjacency, root included.
    pub(crate) children: HashMap<String, BTreeSet<String>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create a graph holding only its root node.
    pub fn new() -> Self {
        let mut children = HashMap::new();
        children.insert(ROOT_ID.to_string(), BTreeSet::new());
        Self {
            root: Node::root(),
            nodes: HashMap::new(),
            children,
        }
    }

    /// The sentinel entry point of the graph (depth 0).
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Add a node whose parents are all already in the graph.
    ///
    /// A node without parents is attached to the root.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        self.check_identity(&node)?;
        if self.contains(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if let Some(missing) = node.parents.iter().find(|p| !self.contains(p)) {
            return Err(GraphError::MissingParent {
                node: node.id.clone(),
                parent: missing.clone(),
            });
        }
        self.bind(node);
        Ok(())
    }

    /// Add a batch of nodes given in any order.
    ///
    /// The insertion order is inferred by repeatedly admitting the nodes whose
    /// parents are all known (in the graph or admitted earlier). Fails without
    /// touching the graph when some nodes can never be admitted.
    pub fn add_nodes(&mut self, nodes: Vec<Node>) -> Result<()> {
        let mut batch_ids = HashSet::new();
        for node in &nodes {
            self.check_identity(node)?;
            if self.contains(&node.id) || !batch_ids.insert(node.id.clone()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut admitted: HashSet<String> = HashSet::new();
        let mut ordered = Vec::with_capacity(nodes.len());
        let mut pending = nodes;

        while !pending.is_empty() {
            let (ready, rest): (Vec<Node>, Vec<Node>) = pending.into_iter().partition(|n| {
                n.parents
                    .iter()
                    .all(|p| self.contains(p) || admitted.contains(p))
            });
            if ready.is_empty() {
                let mut unresolved: Vec<String> = rest.into_iter().map(|n| n.id).collect();
                unresolved.sort();
                return Err(GraphError::UnresolvedBatch(unresolved));
            }
            admitted.extend(ready.iter().map(|n| n.id.clone()));
            ordered.extend(ready);
            pending = rest;
        }

        debug!(count = ordered.len(), "Adding node batch");
        for node in ordered {
            self.bind(node);
        }
        Ok(())
    }

    /// Remove a node and every node depending on it, directly or not.
    ///
    /// Returns the removed identities, descendants first.
    pub fn remove_node(&mut self, id: &str) -> Result<Vec<String>> {
        if id == ROOT_ID {
            return Err(GraphError::RootImmutable);
        }
        if !self.contains(id) {
            return Err(GraphError::NodeNotFound(id.to_string()));
        }

        let removed = self.post_order(id);
        for node_id in &removed {
            self.detach(node_id);
        }
        info!(node_id = %id, removed = removed.len(), "Removed node and its successors");
        Ok(removed)
    }

    /// Swap the content of an existing node, keeping its place in the graph.
    ///
    /// Fork id, depth and parents of the replaced node are carried over to
    /// `node`. Returns the replaced node.
    pub fn replace_node(&mut self, mut node: Node) -> Result<Node> {
        if node.id == ROOT_ID {
            return Err(GraphError::RootImmutable);
        }
        let previous = self
            .nodes
            .get_mut(&node.id)
            .ok_or_else(|| GraphError::NodeNotFound(node.id.clone()))?;

        node.fork_id = previous.fork_id.clone();
        node.depth = previous.depth;
        node.parents = previous.parents.clone();
        debug!(node_id = %node.id, "Replaced node content");
        Ok(std::mem::replace(previous, node))
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        if id == ROOT_ID {
            Some(&self.root)
        } else {
            self.nodes.get(id)
        }
    }

    /// Mutable access to a node. The root is never handed out.
    ///
    /// Editing `parents` here bypasses the graph invariants; the
    /// [`IntegrityChecker`](crate::visit::IntegrityChecker) reports such edits.
    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        id == ROOT_ID || self.nodes.contains_key(id)
    }

    /// Number of nodes, root excluded.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Identities of all nodes but the root, sorted.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// All nodes but the root, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes depending directly on `id`, sorted by identity.
    pub fn successors(&self, id: &str) -> Vec<&Node> {
        self.children_of(id)
            .filter_map(|child| self.get_node(child))
            .collect()
    }

    /// Nodes `id` depends on directly, sorted by identity.
    pub fn predecessors(&self, id: &str) -> Vec<&Node> {
        self.get_node(id)
            .map(|node| {
                node.parents
                    .iter()
                    .filter_map(|p| self.get_node(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every node reachable from `id`, `id` excluded.
    pub fn descendants(&self, id: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = self.children_of(id).map(String::as_str).collect();
        while let Some(current) = stack.pop() {
            if seen.insert(current.to_string()) {
                stack.extend(self.children_of(current).map(String::as_str));
            }
        }
        seen
    }

    /// Topological order of the whole graph, root first, ties broken by
    /// identity. `reversed` returns the same sequence backwards.
    pub fn topological_order(&self, reversed: bool) -> Vec<&str> {
        let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(self.nodes.len() + 1);
        in_degree.insert(ROOT_ID, 0);
        for id in self.nodes.keys() {
            in_degree.insert(id.as_str(), 0);
        }
        for children in self.children.values() {
            for child in children {
                if let Some(degree) = in_degree.get_mut(child.as_str()) {
                    *degree += 1;
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<&str>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| Reverse(*id))
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for child in self.children_of(id) {
                if let Some(degree) = in_degree.get_mut(child.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(child.as_str()));
                    }
                }
            }
        }

        if reversed {
            order.reverse();
        }
        order
    }

    /// Nodes grouped by depth, index 0 holding the root. Nodes of one layer
    /// are independent of each other and sorted by identity.
    pub fn layers(&self) -> Vec<Vec<&Node>> {
        let mut layers: Vec<Vec<&Node>> = vec![Vec::new(); self.max_depth() + 1];
        layers[0].push(&self.root);
        for node in self.nodes.values() {
            layers[node.depth].push(node);
        }
        for layer in &mut layers {
            layer.sort_by(|a, b| a.id.cmp(&b.id));
        }
        layers
    }

    /// Depth of the deepest node, 0 for an empty graph.
    pub fn max_depth(&self) -> usize {
        self.nodes.values().map(|n| n.depth).max().unwrap_or(0)
    }

    pub(crate) fn children_of<'a>(&'a self, id: &str) -> impl DoubleEndedIterator<Item = &'a String> + 'a {
        self.children.get(id).into_iter().flatten()
    }

    /// Add the edge `parent -> child` between two present nodes.
    pub(crate) fn link(&mut self, parent: &str, child: &str) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parents.insert(parent.to_string());
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(child.to_string());
        }
    }

    /// Recompute the depth of `id` and of everything below it.
    pub(crate) fn refresh_depths(&mut self, id: &str) {
        let mut affected = self.descendants(id);
        affected.insert(id.to_string());
        let order: Vec<String> = self
            .topological_order(false)
            .into_iter()
            .filter(|n| affected.contains(*n))
            .map(str::to_string)
            .collect();
        for node_id in order {
            let depth = match self.nodes.get(&node_id) {
                Some(node) => self.depth_under(&node.parents),
                None => continue,
            };
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.depth = depth;
            }
        }
    }

    /// First node (by identity) caught in a cycle, if any. Only reachable
    /// when parents were edited behind the graph's back.
    pub(crate) fn find_cycle(&self) -> Option<String> {
        let ordered: HashSet<&str> = self.topological_order(false).into_iter().collect();
        self.node_ids()
            .into_iter()
            .find(|id| !ordered.contains(id))
            .map(str::to_string)
    }

    fn check_identity(&self, node: &Node) -> Result<()> {
        validate_identity(&node.id, node.fork_id.as_deref())?;
        if let Some(fork_id) = node.fork_id.as_deref() {
            validate_fork_id(&node.id, fork_id)?;
        }
        Ok(())
    }

    fn depth_under(&self, parents: &BTreeSet<String>) -> usize {
        parents
            .iter()
            .filter_map(|p| self.get_node(p))
            .map(|p| p.depth)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Insert an already validated node.
    fn bind(&mut self, mut node: Node) {
        if node.parents.is_empty() {
            node.parents.insert(ROOT_ID.to_string());
        }
        node.depth = self.depth_under(&node.parents);
        for parent in &node.parents {
            self.children
                .entry(parent.clone())
                .or_default()
                .insert(node.id.clone());
        }
        self.children.entry(node.id.clone()).or_default();
        debug!(node_id = %node.id, depth = node.depth, "Node added to graph");
        self.nodes.insert(node.id.clone(), node);
    }

    fn detach(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            for parent in &node.parents {
                if let Some(children) = self.children.get_mut(parent) {
                    children.remove(id);
                }
            }
        }
        self.children.remove(id);
    }

    /// `id` and its descendants, every node listed after all of its
    /// successors.
    fn post_order(&self, id: &str) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(id.to_string(), false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            let children: Vec<String> = self
                .children_of(&current)
                .rev()
                .filter(|c| !seen.contains(*c))
                .cloned()
                .collect();
            stack.push((current, true));
            stack.extend(children.into_iter().map(|c| (c, false)));
        }
        order
    }
}
