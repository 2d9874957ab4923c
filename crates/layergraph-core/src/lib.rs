pub mod config;
pub mod error;
pub mod types;

pub use config::{ExecutorConfig, GraphConfig, LogConfig, VisitOptions};
pub use error::{GraphError, Result};
pub use types::*;
