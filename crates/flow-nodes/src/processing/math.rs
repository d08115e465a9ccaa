//! Add Node
//!
//! Sums two numeric inputs. Inputs are pulled every time the sum is read.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flow_engine::{
    GraphModel, GraphNode, NodeContext, PortDataType, PortDefinition, PortValue, Result,
};

use crate::port_id;

/// Add Node
///
/// # Inputs
/// - `a` (required) - Left operand
/// - `b` (required) - Right operand
///
/// # Outputs
/// - `sum` - `a + b`
#[derive(Default)]
pub struct AddNode {
    evaluations: Arc<AtomicUsize>,
}

impl AddNode {
    /// Node type name
    pub const NODE_TYPE: &'static str = "add";
    /// Port name for the left operand
    pub const PORT_A: &'static str = "a";
    /// Port name for the right operand
    pub const PORT_B: &'static str = "b";
    /// Port name for the result
    pub const PORT_SUM: &'static str = "sum";

    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an add node
    pub fn node(id: &str) -> GraphNode {
        GraphNode::new(id, Self::NODE_TYPE)
            .with_port(
                PortDefinition::input(port_id(id, Self::PORT_A), Self::PORT_A, PortDataType::Number)
                    .required(),
            )
            .with_port(
                PortDefinition::input(port_id(id, Self::PORT_B), Self::PORT_B, PortDataType::Number)
                    .required(),
            )
            .with_port(PortDefinition::output(
                port_id(id, Self::PORT_SUM),
                Self::PORT_SUM,
                PortDataType::Number,
            ))
    }

    /// Shared counter of how many times the sum was computed
    pub fn evaluations(&self) -> Arc<AtomicUsize> {
        self.evaluations.clone()
    }
}

impl NodeContext for AddNode {
    fn port_value(
        &self,
        node: &GraphNode,
        _port_id: &str,
        model: &GraphModel,
    ) -> Result<PortValue> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        let a = model.require_number(node, Self::PORT_A)?;
        let b = model.require_number(node, Self::PORT_B)?;
        log::trace!("AddNode {}: {} + {}", node.id, a, b);
        Ok(serde_json::json!(a + b))
    }
}
