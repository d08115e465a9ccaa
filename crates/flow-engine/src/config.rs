//! Configuration for compiling and running flows

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default values
pub mod defaults {
    /// Upper bound on tokens visited in one pass
    pub const MAX_TOKENS: usize = 10_000;
    /// Failures are logged, not returned
    pub const SURFACE_FAILURES: bool = false;
}

/// Which compilation strategy turns a token tree into a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProducerKind {
    /// Follow the successor chain only; children are ignored
    #[default]
    Linear,
    /// Precompute a flat plan from a pre-order walk of the whole tree
    Hierarchical,
    /// Resolve and execute each token before moving on
    Immediate,
}

impl ProducerKind {
    /// Stable name used in logs and events
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Hierarchical => "hierarchical",
            Self::Immediate => "immediate",
        }
    }
}

impl std::fmt::Display for ProducerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowConfig {
    /// Compilation strategy
    pub producer: ProducerKind,
    /// Upper bound on tokens visited in one pass (guards against cycles)
    pub max_tokens: usize,
    /// Return unit failures from the compiled run instead of only logging them
    pub surface_failures: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            producer: ProducerKind::default(),
            max_tokens: defaults::MAX_TOKENS,
            surface_failures: defaults::SURFACE_FAILURES,
        }
    }
}

impl FlowConfig {
    /// Configuration with the given producer and default settings
    pub fn with_producer(producer: ProducerKind) -> Self {
        Self {
            producer,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the token bound
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Return unit failures from the compiled run
    pub fn surface_failures(mut self, surface: bool) -> Self {
        self.surface_failures = surface;
        self
    }
}
