use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::types::EmbeddedPolicy;

/// Top-level layergraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub visit: VisitOptions,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Traversal options carried by every visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisitOptions {
    /// Walk in reverse topological order.
    #[serde(default)]
    pub reversed: bool,
    /// How many levels of nested graphs the visitor enters (None = unlimited,
    /// 0 = never enter nested graphs).
    #[serde(default)]
    pub extension_depth_limit: Option<usize>,
    /// Behaviour on an embedding node beyond `extension_depth_limit`.
    #[serde(default)]
    pub embedded_policy: EmbeddedPolicy,
}

impl VisitOptions {
    pub fn reversed() -> Self {
        Self {
            reversed: true,
            ..Self::default()
        }
    }

    pub fn with_extension_depth_limit(mut self, limit: usize) -> Self {
        self.extension_depth_limit = Some(limit);
        self
    }

    pub fn with_embedded_policy(mut self, policy: EmbeddedPolicy) -> Self {
        self.embedded_policy = policy;
        self
    }

    /// Whether a visitor currently `nesting` graphs deep may enter one more.
    pub fn may_enter(&self, nesting: usize) -> bool {
        self.extension_depth_limit.map_or(true, |limit| nesting < limit)
    }
}

/// Layered executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of nodes of one layer in flight (0 = whole layer).
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// How many levels of nested graphs are executed (None = unlimited).
    #[serde(default)]
    pub extension_depth_limit: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            extension_depth_limit: None,
        }
    }
}

/// Log filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_max_concurrency() -> usize { 0 }
fn default_log_filter() -> String { "layergraph=info,warn".to_string() }

impl GraphConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| GraphError::ConfigNotFound(path.display().to_string()))?;

        let expanded = expand_env_vars(&content);

        let config = Self::from_toml(&expanded)?;
        debug!(path = %path.display(), "Loaded graph config");
        Ok(config)
    }

    /// Parse config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GraphError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                // Keep original if env var not set
                Err(_) => result.push_str(&format!("${{{}}}", var_name)),
            }
        } else {
            result.push(c);
        }
    }
    result
}
