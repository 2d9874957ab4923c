use std::time::Instant;

use futures::future::BoxFuture;
use futures::StreamExt;
use tracing::{debug, info, warn};

use layergraph_core::config::ExecutorConfig;
use layergraph_core::error::Result;
use layergraph_core::types::Flow;

use super::container::Graph;
use super::node::Node;

/// Work performed on every node by a [`LayerExecutor`].
///
/// Nodes of one layer run concurrently, so hooks and `run` take `&self`.
pub trait LayerWorker: Send + Sync {
    /// Process one node. [`Flow::Stop`] lets the current layer finish and
    /// prevents any deeper layer from starting.
    fn run<'a>(&'a self, node: &'a Node) -> BoxFuture<'a, Result<Flow>>;

    /// Called once before the first node is dispatched.
    fn hook_start(&self) {}

    /// Called once after every layer completed without abort.
    fn hook_end(&self) {}

    fn hook_start_graph_node(&self, _node: &Node) {}

    fn hook_end_graph_node(&self, _node: &Node) {}
}

/// Result of executing a graph layer by layer.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Identities of the nodes handed to the worker, layer by layer. Embedding
    /// nodes are never handed over: the nodes of their nested graph take their
    /// place.
    pub dispatched: Vec<String>,
    /// Number of layers of the outer graph that were run.
    pub layers_run: usize,
    /// Whether every layer ran without abort.
    pub completed: bool,
    /// Total execution time in milliseconds.
    pub total_elapsed_ms: u64,
}

#[derive(Debug, Default)]
struct Outcome {
    flow: Flow,
    dispatched: Vec<String>,
    layers_run: usize,
}

/// Runs a graph one depth layer at a time.
///
/// Nodes sharing a depth never depend on each other, so a whole layer is
/// dispatched concurrently (up to `max_concurrency`), and the next layer
/// starts only once every node of the current one is done.
pub struct LayerExecutor {
    config: ExecutorConfig,
}

impl LayerExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Execute every node of `graph` with `worker`, root excluded.
    ///
    /// A worker error aborts the run once its layer settled and is returned
    /// as is; `hook_end` is then never called.
    pub async fn execute(&self, graph: &Graph, worker: &dyn LayerWorker) -> Result<ExecutionReport> {
        let start = Instant::now();
        info!(
            nodes = graph.len(),
            layers = graph.max_depth(),
            max_concurrency = self.config.max_concurrency,
            "Executing graph"
        );

        worker.hook_start();
        let outcome = self.execute_graph(graph, worker, 0).await?;
        let completed = outcome.flow.is_continue();
        if completed {
            worker.hook_end();
        }

        let total_elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            dispatched = outcome.dispatched.len(),
            layers_run = outcome.layers_run,
            completed,
            total_elapsed_ms,
            "Graph execution finished"
        );
        Ok(ExecutionReport {
            dispatched: outcome.dispatched,
            layers_run: outcome.layers_run,
            completed,
            total_elapsed_ms,
        })
    }

    fn execute_graph<'a>(
        &'a self,
        graph: &'a Graph,
        worker: &'a dyn LayerWorker,
        nesting: usize,
    ) -> BoxFuture<'a, Result<Outcome>> {
        Box::pin(async move {
            let mut outcome = Outcome::default();
            let layers = graph.layers();

            for (depth, layer) in layers.iter().enumerate().skip(1) {
                if layer.is_empty() {
                    continue;
                }
                let limit = match self.config.max_concurrency {
                    0 => layer.len(),
                    cap => cap,
                };
                debug!(depth, size = layer.len(), nesting, "Dispatching layer");

                let mut pending: Vec<BoxFuture<'a, Result<Outcome>>> = Vec::with_capacity(layer.len());
                for node in layer.iter().copied() {
                    pending.push(self.execute_node(node, worker, nesting));
                }
                let results: Vec<Result<Outcome>> = futures::stream::iter(pending)
                    .buffered(limit)
                    .collect()
                    .await;
                outcome.layers_run += 1;

                let mut stopped = false;
                for result in results {
                    let node_outcome = result?;
                    stopped |= node_outcome.flow.is_stop();
                    outcome.dispatched.extend(node_outcome.dispatched);
                }
                if stopped {
                    info!(depth, nesting, "Layer aborted, deeper layers skipped");
                    outcome.flow = Flow::Stop;
                    return Ok(outcome);
                }
            }
            Ok(outcome)
        })
    }

    fn execute_node<'a>(
        &'a self,
        node: &'a Node,
        worker: &'a dyn LayerWorker,
        nesting: usize,
    ) -> BoxFuture<'a, Result<Outcome>> {
        Box::pin(async move {
            let mut outcome = Outcome::default();

            let Some(inner) = node.inner_graph() else {
                outcome.flow = worker.run(node).await.map_err(|e| {
                    warn!(node_id = %node.id(), error = %e, "Node execution failed");
                    e
                })?;
                outcome.dispatched.push(node.id().to_string());
                return Ok(outcome);
            };

            let may_enter = self
                .config
                .extension_depth_limit
                .map_or(true, |limit| nesting < limit);
            if !may_enter {
                debug!(node_id = %node.id(), nesting, "Nested graph beyond depth limit, not entered");
                return Ok(outcome);
            }

            worker.hook_start_graph_node(node);
            let nested = self.execute_graph(inner, worker, nesting + 1).await?;
            outcome.dispatched = nested.dispatched;
            outcome.flow = nested.flow;
            if outcome.flow.is_continue() {
                worker.hook_end_graph_node(node);
            }
            Ok(outcome)
        })
    }
}
