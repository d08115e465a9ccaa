//! Variable Nodes
//!
//! `GetVariableNode` exposes a blackboard variable as a value port;
//! `SetVariableNode` writes one when its flow unit executes.

use std::sync::Arc;

use flow_engine::{
    FlowAccumulator, FlowError, GraphModel, GraphNode, NodeContext, PortDataType, PortDefinition,
    PortValue, Result,
};

use super::Blackboard;
use crate::port_id;
use crate::tree::{FLOW_IN, FLOW_NEXT};

/// Get Variable Node
///
/// # Outputs
/// - `value` - The variable's current value, or `null` when unset
pub struct GetVariableNode {
    blackboard: Blackboard,
    name: String,
}

impl GetVariableNode {
    /// Node type name
    pub const NODE_TYPE: &'static str = "get-variable";
    /// Port name for the value output
    pub const PORT_VALUE: &'static str = "value";

    pub fn new(blackboard: Blackboard, name: impl Into<String>) -> Self {
        Self {
            blackboard,
            name: name.into(),
        }
    }

    /// Declare a get-variable node
    pub fn node(id: &str) -> GraphNode {
        GraphNode::new(id, Self::NODE_TYPE).with_port(PortDefinition::output(
            port_id(id, Self::PORT_VALUE),
            Self::PORT_VALUE,
            PortDataType::Any,
        ))
    }
}

impl NodeContext for GetVariableNode {
    fn port_value(
        &self,
        _node: &GraphNode,
        _port_id: &str,
        _model: &GraphModel,
    ) -> Result<PortValue> {
        Ok(self.blackboard.get(&self.name).unwrap_or(PortValue::Null))
    }
}

/// Set Variable Node
///
/// Emits one unit that pulls `value` and stores it when executed, so the
/// stored value reflects the graph at execution time.
///
/// # Inputs
/// - `exec` - Flow in
/// - `value` (required) - Value to store
///
/// # Outputs
/// - `next` - Flow out
pub struct SetVariableNode {
    blackboard: Blackboard,
    name: String,
}

impl SetVariableNode {
    /// Node type name
    pub const NODE_TYPE: &'static str = "set-variable";
    /// Port name for the value input
    pub const PORT_VALUE: &'static str = "value";

    pub fn new(blackboard: Blackboard, name: impl Into<String>) -> Self {
        Self {
            blackboard,
            name: name.into(),
        }
    }

    /// Declare a set-variable node
    pub fn node(id: &str) -> GraphNode {
        GraphNode::new(id, Self::NODE_TYPE)
            .with_port(PortDefinition::input(port_id(id, FLOW_IN), FLOW_IN, PortDataType::Flow))
            .with_port(
                PortDefinition::input(
                    port_id(id, Self::PORT_VALUE),
                    Self::PORT_VALUE,
                    PortDataType::Any,
                )
                .required(),
            )
            .with_port(PortDefinition::output(
                port_id(id, FLOW_NEXT),
                FLOW_NEXT,
                PortDataType::Flow,
            ))
    }
}

impl NodeContext for SetVariableNode {
    fn resolve(
        &self,
        node: &GraphNode,
        model: &Arc<GraphModel>,
        accumulator: &mut FlowAccumulator,
    ) -> Result<()> {
        let model = model.clone();
        let blackboard = self.blackboard.clone();
        let name = self.name.clone();
        let node_id = node.id.clone();

        accumulator.push_fn(node.id.clone(), move |_cancel| {
            let result = store_input(&model, &node_id, &blackboard, &name);
            async move { result }
        });
        Ok(())
    }
}

/// Pull the node's `value` input and write it to the blackboard
fn store_input(
    model: &GraphModel,
    node_id: &str,
    blackboard: &Blackboard,
    name: &str,
) -> Result<()> {
    let node = model
        .find_node(node_id)
        .ok_or_else(|| FlowError::NodeNotFound(node_id.to_string()))?;
    let value = model.require_input(node, SetVariableNode::PORT_VALUE)?;
    log::debug!("SetVariableNode {}: {} = {}", node_id, name, value);
    blackboard.set(name, value);
    Ok(())
}
