use std::collections::{BTreeSet, HashSet};

use tracing::info;

use layergraph_core::error::{GraphError, Result};
use layergraph_core::types::{fork_identity, validate_fork_id, ROOT_ID};

use super::container::Graph;
use super::node::Node;

impl Graph {
    /// Duplicate a node and everything downstream of it under the fork id
    /// carried by `forked`.
    ///
    /// `forked` names the node to fork (by identity) and provides the payload
    /// of its copy. Every copy is named `original::fork_id`; the copy of the
    /// forked node keeps the original's parents, the other copies point to the
    /// copies of their parents when those were duplicated too.
    ///
    /// With a `join`, duplication stops before the join node and the copies
    /// directly preceding it are linked into it. Every duplicated node must
    /// then lead to the join, and a node linked to the join cannot lead to it
    /// through any other edge.
    pub fn fork_from_node(&mut self, forked: Node, join: Option<&str>) -> Result<()> {
        let id = forked.id.clone();
        if id == ROOT_ID {
            return Err(GraphError::RootImmutable);
        }
        let original = self
            .get_node(&id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        if original.is_embedding() || forked.is_embedding() {
            return Err(GraphError::ForkEmbedded(id));
        }
        let fork_id = forked
            .fork_id
            .clone()
            .ok_or_else(|| GraphError::MissingForkId(id.clone()))?;
        validate_fork_id(&id, &fork_id)?;

        let frontier = match join {
            Some(join_id) => {
                if !self.contains(join_id) {
                    return Err(GraphError::JoinNotFound(join_id.to_string()));
                }
                self.join_frontier(&id, join_id)?
            }
            None => Vec::new(),
        };

        let stops: Vec<&str> = join.into_iter().collect();
        let region: BTreeSet<String> = self
            .closure(&id, &stops)?
            .into_iter()
            .filter(|n| Some(n.as_str()) != join)
            .collect();

        let mut copies = Vec::with_capacity(region.len());
        let mut forked = Some(forked);
        for node_id in &region {
            let Some(source) = self.get_node(node_id) else {
                return Err(GraphError::NodeNotFound(node_id.clone()));
            };
            let mut copy = if *node_id == id {
                forked.take().unwrap_or_else(|| source.clone())
            } else {
                source.clone()
            };
            copy.id = fork_identity(node_id, &fork_id);
            copy.fork_id = Some(fork_id.clone());
            copy.parents = source
                .parents
                .iter()
                .map(|p| {
                    if region.contains(p) {
                        fork_identity(p, &fork_id)
                    } else {
                        p.clone()
                    }
                })
                .collect();
            copies.push(copy);
        }

        let count = copies.len();
        self.add_nodes(copies)?;

        if let Some(join_id) = join {
            for node_id in &frontier {
                self.link(&fork_identity(node_id, &fork_id), join_id);
            }
            self.refresh_depths(join_id);
        }

        info!(
            node_id = %id,
            fork_id = %fork_id,
            copies = count,
            join = join.unwrap_or("-"),
            "Forked node"
        );
        Ok(())
    }

    /// Check the region between `from` and `join` and return the nodes of the
    /// region linked directly to the join.
    fn join_frontier(&self, from: &str, join: &str) -> Result<Vec<String>> {
        let unreachable = || GraphError::JoinUnreachable {
            node: from.to_string(),
            join: join.to_string(),
        };
        if from == join {
            return Err(unreachable());
        }
        let region: HashSet<String> = self
            .closure(from, &[join])?
            .into_iter()
            .filter(|n| n != join)
            .collect();
        let order: Vec<&str> = self
            .topological_order(false)
            .into_iter()
            .filter(|n| region.contains(*n))
            .collect();

        // children are settled before their parents
        let mut leads_to_join: HashSet<&str> = HashSet::new();
        for &node_id in order.iter().rev() {
            if self
                .children_of(node_id)
                .any(|c| c == join || leads_to_join.contains(c.as_str()))
            {
                leads_to_join.insert(node_id);
            }
        }
        if !leads_to_join.contains(from) {
            return Err(unreachable());
        }

        let mut frontier = Vec::new();
        for &node_id in &order {
            let mut direct = false;
            let mut links = 0;
            for child in self.children_of(node_id) {
                if child == join {
                    direct = true;
                } else if !leads_to_join.contains(child.as_str()) {
                    return Err(GraphError::EscapingEdge {
                        from: node_id.to_string(),
                        to: child.clone(),
                        join: join.to_string(),
                    });
                }
                links += 1;
            }
            if direct && links > 1 {
                return Err(GraphError::AmbiguousJoin {
                    node: node_id.to_string(),
                    join: join.to_string(),
                });
            }
            if direct {
                frontier.push(node_id.to_string());
            }
        }
        frontier.sort();
        Ok(frontier)
    }
}
