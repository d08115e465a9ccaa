//! Event types for observing flow runs
//!
//! Events are the side channel through which a host learns about unit
//! progress and failures. A compiled run reports completion to its caller
//! even when a unit fails, so `UnitFailed` events (and the matching log
//! lines) are where failures become visible.

use serde::{Deserialize, Serialize};

/// Trait for sending flow events
///
/// This abstracts over the transport mechanism (channel, UI bridge, etc.)
/// allowing the engine to be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: FlowEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted while a compiled flow runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FlowEvent {
    /// A compiled run started
    #[serde(rename_all = "camelCase")]
    RunStarted { run_id: String, producer: String },

    /// A token finished resolving during the run (immediate strategy only)
    #[serde(rename_all = "camelCase")]
    TokenResolved {
        run_id: String,
        token: String,
        units: usize,
    },

    /// A unit started executing
    #[serde(rename_all = "camelCase")]
    UnitStarted {
        run_id: String,
        unit: String,
        token: String,
    },

    /// A unit finished successfully
    #[serde(rename_all = "camelCase")]
    UnitCompleted {
        run_id: String,
        unit: String,
        token: String,
    },

    /// A unit failed; the run stops after this
    #[serde(rename_all = "camelCase")]
    UnitFailed {
        run_id: String,
        unit: String,
        token: String,
        error: String,
    },

    /// The run reported completion to its caller
    #[serde(rename_all = "camelCase")]
    RunCompleted { run_id: String, units_executed: usize },

    /// The run returned a failure to its caller
    #[serde(rename_all = "camelCase")]
    RunFailed {
        run_id: String,
        units_executed: usize,
        error: String,
    },

    /// The run stopped because its cancellation token fired
    #[serde(rename_all = "camelCase")]
    RunCancelled { run_id: String, units_executed: usize },
}

impl FlowEvent {
    /// Label of the unit this event concerns, if any
    pub fn unit(&self) -> Option<&str> {
        match self {
            Self::UnitStarted { unit, .. }
            | Self::UnitCompleted { unit, .. }
            | Self::UnitFailed { unit, .. } => Some(unit),
            _ => None,
        }
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: FlowEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<FlowEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<FlowEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Labels of units that started, in order
    pub fn started_units(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FlowEvent::UnitStarted { unit, .. } => Some(unit),
                _ => None,
            })
            .collect()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: FlowEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "Event buffer poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}
