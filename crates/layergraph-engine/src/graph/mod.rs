//! Graph model: a mutable DAG of nodes hanging from a sentinel root.
//!
//! Every node sits at a depth one below its deepest parent, so nodes sharing
//! a depth are independent. `Graph` enforces the invariants at mutation time
//! and offers the structural operations (fork/join, sub-graph extraction);
//! `LayerExecutor` runs a graph one depth layer at a time.

pub mod container;
pub mod executor;
mod fork;
pub mod node;
pub mod snapshot;
pub mod subgraph;

pub use container::Graph;
pub use executor::{ExecutionReport, LayerExecutor, LayerWorker};
pub use node::{EmptyTask, Node, NodeKind, Task, TaskObject};
pub use snapshot::{GraphSnapshot, NodeSnapshot, SnapshotKind};
pub use subgraph::RemovedParents;
