//! Shared variable store

use std::collections::HashMap;
use std::sync::Arc;

use flow_engine::PortValue;
use parking_lot::RwLock;

/// Named values shared by the nodes of one graph
///
/// Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct Blackboard {
    values: Arc<RwLock<HashMap<String, PortValue>>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a variable
    pub fn get(&self, name: &str) -> Option<PortValue> {
        self.values.read().get(name).cloned()
    }

    /// Set a variable, returning the previous value
    pub fn set(&self, name: impl Into<String>, value: PortValue) -> Option<PortValue> {
        self.values.write().insert(name.into(), value)
    }

    pub fn remove(&self, name: &str) -> Option<PortValue> {
        self.values.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}
