//! Dependency-ordered execution graphs.
//!
//! A [`Graph`] is a mutable DAG of nodes layered by depth. It can be walked in
//! dependency order by [`Visitor`]s, forked (with an optional join), sliced
//! into independent sub-graphs, nested inside other graphs, and executed one
//! layer at a time by a [`LayerExecutor`].

pub mod telemetry;

pub use layergraph_core::config::{ExecutorConfig, GraphConfig, LogConfig, VisitOptions};
pub use layergraph_core::error::{GraphError, Result};
pub use layergraph_core::types::{EmbeddedPolicy, Flow, FORK_SEPARATOR, ROOT_ID};
pub use layergraph_engine::graph::{
    EmptyTask, ExecutionReport, Graph, GraphSnapshot, LayerExecutor, LayerWorker, Node, NodeKind,
    RemovedParents, Task,
};
pub use layergraph_engine::visit::{
    CustomHooks, FindAll, FindFirst, IntegrityChecker, Visitor, VisitorComposer,
};
