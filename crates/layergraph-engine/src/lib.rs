pub mod graph;
pub mod visit;

pub use graph::{
    EmptyTask, ExecutionReport, Graph, GraphSnapshot, LayerExecutor, LayerWorker, Node, NodeKind,
    NodeSnapshot, RemovedParents, SnapshotKind, Task, TaskObject,
};
pub use visit::{CustomHooks, FindAll, FindFirst, IntegrityChecker, Visitor, VisitorComposer};
