use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use layergraph_core::error::{GraphError, Result};
use layergraph_core::types::ROOT_ID;

use super::container::Graph;
use super::node::Node;

/// Parent links cut from a node when it was copied into a sub-graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedParents {
    pub node: String,
    pub parents: BTreeSet<String>,
}

impl Graph {
    /// Copy the part of the graph reachable from `from` into a new graph.
    ///
    /// Expansion stops on the nodes of `to` (which are copied) or at the
    /// leaves. Parent links leading outside the copied set are dropped, nodes
    /// left without parents hang from the new root.
    pub fn sub_graph(&self, from: &str, to: &[&str]) -> Result<Graph> {
        self.sub_graph_with_removed(from, to)
            .map(|(graph, _)| graph)
    }

    /// Same as [`Graph::sub_graph`], also reporting the dropped parent links.
    pub fn sub_graph_with_removed(
        &self,
        from: &str,
        to: &[&str],
    ) -> Result<(Graph, Vec<RemovedParents>)> {
        let members = self.closure(from, to)?;
        let member_set: HashSet<&str> = members.iter().map(String::as_str).collect();

        let mut copies = Vec::with_capacity(members.len());
        let mut removed = Vec::new();
        for id in &members {
            let Some(original) = self.get_node(id) else {
                return Err(GraphError::NodeNotFound(id.clone()));
            };
            let mut copy: Node = original.clone();
            let (kept, cut): (BTreeSet<String>, BTreeSet<String>) = copy
                .parents
                .into_iter()
                .partition(|p| member_set.contains(p.as_str()));
            copy.parents = kept;
            if !cut.is_empty() {
                removed.push(RemovedParents {
                    node: id.clone(),
                    parents: cut,
                });
            }
            copies.push(copy);
        }

        let mut graph = Graph::new();
        graph.add_nodes(copies)?;
        info!(
            from = %from,
            nodes = graph.len(),
            cut_links = removed.len(),
            "Extracted sub-graph"
        );
        Ok((graph, removed))
    }

    /// Identities reachable from `from` (itself included, the root never),
    /// without expanding past the nodes of `stops`.
    pub(crate) fn closure(&self, from: &str, stops: &[&str]) -> Result<Vec<String>> {
        if !self.contains(from) {
            return Err(GraphError::NodeNotFound(from.to_string()));
        }
        let unknown: Vec<&&str> = stops.iter().filter(|s| !self.contains(s)).collect();
        if !unknown.is_empty() {
            debug!(?unknown, "Stop nodes absent from the graph are ignored");
        }

        let mut members = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![from];
        seen.insert(from);

        while let Some(current) = stack.pop() {
            if current != ROOT_ID {
                members.push(current.to_string());
            }
            if stops.contains(&current) {
                continue;
            }
            for child in self.children_of(current).rev() {
                if !self.contains(child) {
                    return Err(GraphError::NodeNotFound(child.clone()));
                }
                if seen.insert(child.as_str()) {
                    stack.push(child.as_str());
                }
            }
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //            A                      B
    //         /     \                 /  |
    //        C       D              E    |
    //                 \              \   |
    //                  F .______,    G   |
    //               /  |  \     \   /    |
    //             H    I   J     `,K.    |
    //                     /,_____/   \   |
    //                    L             M
    fn complex_graph() -> Graph {
        let mut graph = Graph::new();
        graph
            .add_nodes(vec![
                Node::new("A"),
                Node::new("B"),
                Node::new("C").with_parents(["A"]),
                Node::new("D").with_parents(["A"]),
                Node::new("E").with_parents(["B"]),
                Node::new("F").with_parents(["D"]),
                Node::new("G").with_parents(["E"]),
                Node::new("H").with_parents(["F"]),
                Node::new("I").with_parents(["F"]),
                Node::new("J").with_parents(["F"]),
                Node::new("K").with_parents(["F", "G"]),
                Node::new("L").with_parents(["J", "K"]),
                Node::new("M").with_parents(["K", "B"]),
            ])
            .unwrap();
        graph
    }

    #[test]
    fn test_sub_graph_to_leaves() {
        let graph = complex_graph();
        let sub = graph.sub_graph("F", &[]).unwrap();
        assert_eq!(sub.node_ids(), vec!["F", "H", "I", "J", "K", "L", "M"]);
        assert_eq!(sub.get_node("F").unwrap().depth(), 1);
        assert_eq!(sub.get_node("K").unwrap().parents.len(), 1);
        assert_eq!(sub.get_node("L").unwrap().depth(), 3);
    }

    #[test]
    fn test_sub_graph_of_one_element() {
        let graph = complex_graph();
        let sub = graph.sub_graph("E", &["E"]).unwrap();
        assert_eq!(sub.node_ids(), vec!["E"]);
    }

    #[test]
    fn test_sub_graph_with_stops() {
        let graph = complex_graph();
        let sub = graph.sub_graph("A", &["K", "J"]).unwrap();
        assert_eq!(
            sub.node_ids(),
            vec!["A", "C", "D", "F", "H", "I", "J", "K"]
        );
    }

    #[test]
    fn test_sub_graph_unreachable_stop() {
        let graph = complex_graph();
        let sub = graph.sub_graph("F", &["A", "NOT_EXISTING"]).unwrap();
        assert_eq!(sub.len(), 7);
    }

    #[test]
    fn test_sub_graph_removed_parents() {
        let graph = complex_graph();
        let (_, removed) = graph.sub_graph_with_removed("F", &[]).unwrap();

        let find = |id: &str| {
            removed
                .iter()
                .find(|r| r.node == id)
                .map(|r| r.parents.iter().cloned().collect::<Vec<_>>())
        };
        assert_eq!(find("F"), Some(vec!["D".to_string()]));
        assert_eq!(find("K"), Some(vec!["G".to_string()]));
        assert_eq!(find("M"), Some(vec!["B".to_string()]));
        assert_eq!(find("L"), None);
        assert_eq!(removed.len(), 3);
    }

    #[test]
    fn test_sub_graph_is_independent() {
        let graph = complex_graph();
        let mut sub = graph.sub_graph("F", &[]).unwrap();
        sub.remove_node("K").unwrap();
        assert!(graph.contains("K"));
        assert_eq!(graph.len(), 13);
    }

    #[test]
    fn test_sub_graph_from_root() {
        let graph = complex_graph();
        let sub = graph.sub_graph(ROOT_ID, &[]).unwrap();
        assert_eq!(sub.len(), 13);
    }

    #[test]
    fn test_sub_graph_missing_start() {
        let graph = complex_graph();
        assert!(matches!(
            graph.sub_graph("NOT_EXISTING", &[]),
            Err(GraphError::NodeNotFound(_))
        ));
    }
}
