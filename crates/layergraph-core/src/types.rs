use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Identity of the sentinel root node present in every graph.
///
/// It contains the fork separator, so no user identity can collide with it.
pub const ROOT_ID: &str = "::root_node::";

/// Separator joining a node identity with a fork id (`node::fork`).
pub const FORK_SEPARATOR: &str = "::";

/// Build the identity of the copy of `node_id` made by the fork `fork_id`.
pub fn fork_identity(node_id: &str, fork_id: &str) -> String {
    format!("{}{}{}", node_id, FORK_SEPARATOR, fork_id)
}

/// Check a node identity before it enters a graph.
///
/// Forked nodes are allowed to carry the separator, plain nodes are not.
pub fn validate_identity(id: &str, fork_id: Option<&str>) -> Result<()> {
    if id.is_empty() {
        return Err(GraphError::EmptyIdentity);
    }
    if fork_id.is_none() && id.contains(FORK_SEPARATOR) {
        return Err(GraphError::ReservedSeparator { id: id.to_string() });
    }
    Ok(())
}

/// Check a fork id used to namespace the copies of a fork.
pub fn validate_fork_id(id: &str, fork_id: &str) -> Result<()> {
    if fork_id.is_empty() || fork_id.contains(FORK_SEPARATOR) {
        return Err(GraphError::InvalidForkId {
            id: id.to_string(),
            fork_id: fork_id.to_string(),
        });
    }
    Ok(())
}

/// Whether a traversal goes on after a node has been dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    #[default]
    Continue,
    Stop,
}

impl Flow {
    pub fn is_continue(self) -> bool {
        self == Flow::Continue
    }

    pub fn is_stop(self) -> bool {
        self == Flow::Stop
    }
}

impl From<bool> for Flow {
    fn from(keep_going: bool) -> Self {
        if keep_going {
            Flow::Continue
        } else {
            Flow::Stop
        }
    }
}

/// What a traversal does with an embedding node it is not allowed to enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddedPolicy {
    /// Pass over the nested graph and keep walking.
    #[default]
    Skip,
    /// Abort the whole walk.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fork_identity() {
        assert_eq!(fork_identity("id4", "f"), "id4::f");
        assert_eq!(fork_identity(&fork_identity("id4", "a"), "b"), "id4::a::b");
    }

    #[test]
    fn test_validate_identity() {
        assert!(validate_identity("id1", None).is_ok());
        assert!(matches!(
            validate_identity("", None),
            Err(GraphError::EmptyIdentity)
        ));
        assert!(matches!(
            validate_identity("a::b", None),
            Err(GraphError::ReservedSeparator { .. })
        ));
        assert!(validate_identity("a::b", Some("b")).is_ok());
        // a single colon is not the separator
        assert!(validate_identity("a:b", None).is_ok());
    }

    #[test]
    fn test_validate_fork_id() {
        assert!(validate_fork_id("n", "fork_1").is_ok());
        assert!(validate_fork_id("n", "").is_err());
        assert!(validate_fork_id("n", "a::b").is_err());
    }

    #[test]
    fn test_root_id_is_reserved() {
        assert!(validate_identity(ROOT_ID, None).is_err());
    }

    #[test]
    fn test_flow_from_bool() {
        assert_eq!(Flow::from(true), Flow::Continue);
        assert!(Flow::from(false).is_stop());
        assert!(Flow::default().is_continue());
    }
}
