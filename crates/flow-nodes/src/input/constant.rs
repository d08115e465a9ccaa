//! Constant Node
//!
//! Provides a fixed value on its single output port.

use flow_engine::{
    GraphModel, GraphNode, NodeContext, PortDataType, PortDefinition, PortValue, Result,
};

use crate::port_id;

/// Constant Node
///
/// # Outputs
/// - `value` - The configured value
pub struct ConstantNode {
    value: PortValue,
}

impl ConstantNode {
    /// Node type name
    pub const NODE_TYPE: &'static str = "constant";
    /// Port name for the value output
    pub const PORT_VALUE: &'static str = "value";

    pub fn new(value: impl Into<PortValue>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Declare a constant node with an `Any` output
    pub fn node(id: &str) -> GraphNode {
        Self::typed_node(id, PortDataType::Any)
    }

    /// Declare a constant node whose output has the given type
    pub fn typed_node(id: &str, data_type: PortDataType) -> GraphNode {
        GraphNode::new(id, Self::NODE_TYPE).with_port(PortDefinition::output(
            port_id(id, Self::PORT_VALUE),
            Self::PORT_VALUE,
            data_type,
        ))
    }
}

impl NodeContext for ConstantNode {
    fn port_value(
        &self,
        _node: &GraphNode,
        _port_id: &str,
        _model: &GraphModel,
    ) -> Result<PortValue> {
        Ok(self.value.clone())
    }
}
