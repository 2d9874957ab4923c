use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    // Identity errors
    #[error("Node identity cannot be empty")]
    EmptyIdentity,

    #[error("Node identity '{id}' contains the reserved fork separator \"::\"")]
    ReservedSeparator { id: String },

    #[error("Node already in the graph: {0}")]
    DuplicateNode(String),

    #[error("Parent '{parent}' of node '{node}' has to be added to the graph first")]
    MissingParent { node: String, parent: String },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("The root node cannot be removed, replaced or forked")]
    RootImmutable,

    #[error("Batch cannot be ordered, nodes not linked together: {0:?}")]
    UnresolvedBatch(Vec<String>),

    // Fork errors
    #[error("Cannot fork node '{0}': no fork id set")]
    MissingForkId(String),

    #[error("Cannot fork node '{id}': invalid fork id '{fork_id}'")]
    InvalidForkId { id: String, fork_id: String },

    #[error("Cannot fork node '{0}': forking into an embedded graph is not supported")]
    ForkEmbedded(String),

    #[error("Join node not found: {0}")]
    JoinNotFound(String),

    #[error("Join node '{join}' is not reachable from '{node}'")]
    JoinUnreachable { node: String, join: String },

    #[error("Node '{node}' reaches join node '{join}' through more than one link")]
    AmbiguousJoin { node: String, join: String },

    #[error("Edge {from} -> {to} escapes the fork bounded by join node '{join}'")]
    EscapingEdge {
        from: String,
        to: String,
        join: String,
    },

    // Diagnostics
    #[error("Graph integrity violated at '{node}': {reason}")]
    Integrity { node: String, reason: String },

    #[error("Invalid visitor composition: {0}")]
    Composition(String),

    // Execution errors
    #[error("Worker failed on node '{node}': {reason}")]
    Execution { node: String, reason: String },

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
