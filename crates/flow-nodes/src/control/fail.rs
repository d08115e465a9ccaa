//! Fail Node
//!
//! Emits a unit that always fails. Useful as an explicit abort step.

use std::sync::Arc;

use flow_engine::{
    FlowAccumulator, FlowError, GraphModel, GraphNode, NodeContext, PortDataType, PortDefinition,
    Result,
};

use crate::port_id;
use crate::tree::{FLOW_IN, FLOW_NEXT};

/// Fail Node
///
/// # Inputs
/// - `exec` - Flow in
///
/// # Outputs
/// - `next` - Flow out (never reached within one run)
pub struct FailNode {
    message: String,
}

impl FailNode {
    /// Node type name
    pub const NODE_TYPE: &'static str = "fail";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Declare a fail node
    pub fn node(id: &str) -> GraphNode {
        GraphNode::new(id, Self::NODE_TYPE)
            .with_port(PortDefinition::input(port_id(id, FLOW_IN), FLOW_IN, PortDataType::Flow))
            .with_port(PortDefinition::output(
                port_id(id, FLOW_NEXT),
                FLOW_NEXT,
                PortDataType::Flow,
            ))
    }
}

impl NodeContext for FailNode {
    fn resolve(
        &self,
        node: &GraphNode,
        _model: &Arc<GraphModel>,
        accumulator: &mut FlowAccumulator,
    ) -> Result<()> {
        let message = self.message.clone();
        accumulator.push_fn(node.id.clone(), move |_cancel| {
            let result: Result<()> = Err(FlowError::failed(message.clone()));
            async move { result }
        });
        Ok(())
    }
}
