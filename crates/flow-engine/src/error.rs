//! Error types for the flow engine

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using FlowError
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that can occur while compiling or running a flow
#[derive(Debug, Error)]
pub enum FlowError {
    /// The graph model rejected a mutation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A token id does not exist in the token tree
    #[error("Unknown token: {0}")]
    UnknownToken(usize),

    /// The token tree has no root token
    #[error("Token tree has no root")]
    MissingRoot,

    /// A token was reached a second time in one pass (cycle or shared branch)
    #[error("Token '{label}' (#{id}) reached twice in one pass")]
    TokenRevisited { id: usize, label: String },

    /// More tokens were visited than the configured bound allows
    #[error("Token limit exceeded ({0} tokens)")]
    TokenLimitExceeded(usize),

    /// A node is the target of more than one flow path
    #[error("Node '{0}' is reached through more than one flow path")]
    DuplicateFlowPath(String),

    /// A node id is not present in the graph model
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A port id is not present in the graph model
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// The node owning a port has no value for it
    #[error("Node '{node_id}' has no value for port '{port_id}'")]
    NoPortValue { node_id: String, port_id: String },

    /// Missing required input
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// Invalid input type
    #[error("Invalid input type for '{port}': expected {expected}")]
    InvalidInputType { port: String, expected: String },

    /// A token's resolve step failed
    #[error("Resolving token '{token}' failed: {source}")]
    ResolveFailed {
        token: String,
        #[source]
        source: Box<FlowError>,
    },

    /// A flow unit failed while executing
    #[error("Unit '{unit}' of token '{token}' failed: {source}")]
    UnitFailed {
        unit: String,
        token: String,
        #[source]
        source: Box<FlowError>,
    },

    /// Unit execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// A compiled plan was executed a second time
    #[error("Plan '{0}' has already been executed")]
    PlanConsumed(String),

    /// The run was cancelled
    #[error("Flow cancelled")]
    Cancelled,

    /// A spawned run panicked or was aborted
    #[error("Run task failed: {0}")]
    Join(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Wrap a unit failure with the identity of the unit and its token
    pub fn unit_failed(
        unit: impl Into<String>,
        token: impl Into<String>,
        source: FlowError,
    ) -> Self {
        Self::UnitFailed {
            unit: unit.into(),
            token: token.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a resolve failure with the identity of its token
    pub fn resolve_failed(token: impl Into<String>, source: FlowError) -> Self {
        Self::ResolveFailed {
            token: token.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error is (or wraps) a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::UnitFailed { source, .. } | Self::ResolveFailed { source, .. } => {
                source.is_cancelled()
            }
            _ => false,
        }
    }
}
