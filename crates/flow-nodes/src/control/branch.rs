//! Branch Node
//!
//! Enables one of two flow outputs based on a boolean condition.

use std::sync::Arc;

use flow_engine::{
    FlowAccumulator, GraphModel, GraphNode, NodeContext, PortDataType, PortDefinition, Result,
};
use parking_lot::Mutex;

use crate::port_id;
use crate::tree::{FLOW_IN, FLOW_NEXT};

/// Branch Node
///
/// The condition is pulled when the node's token resolves. Tokens on the
/// `true` and `false` outputs are guarded by this node, so only the
/// selected side contributes units. `next` always runs afterwards.
///
/// Which state the condition sees depends on the producer: the immediate
/// strategy resolves the branch after earlier units executed, the
/// hierarchical one at compile time.
///
/// # Inputs
/// - `exec` - Flow in
/// - `condition` (required) - Boolean condition
///
/// # Outputs
/// - `true` - Flow taken when the condition holds
/// - `false` - Flow taken otherwise
/// - `next` - Flow after the chosen branch
#[derive(Default)]
pub struct BranchNode {
    decision: Mutex<Option<bool>>,
}

impl BranchNode {
    /// Node type name
    pub const NODE_TYPE: &'static str = "branch";
    /// Port name for the condition input
    pub const PORT_CONDITION: &'static str = "condition";
    /// Port name for the flow taken on true
    pub const PORT_TRUE: &'static str = "true";
    /// Port name for the flow taken on false
    pub const PORT_FALSE: &'static str = "false";

    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a branch node
    pub fn node(id: &str) -> GraphNode {
        GraphNode::new(id, Self::NODE_TYPE)
            .with_port(PortDefinition::input(port_id(id, FLOW_IN), FLOW_IN, PortDataType::Flow))
            .with_port(
                PortDefinition::input(
                    port_id(id, Self::PORT_CONDITION),
                    Self::PORT_CONDITION,
                    PortDataType::Boolean,
                )
                .required(),
            )
            .with_port(PortDefinition::output(
                port_id(id, Self::PORT_TRUE),
                Self::PORT_TRUE,
                PortDataType::Flow,
            ))
            .with_port(PortDefinition::output(
                port_id(id, Self::PORT_FALSE),
                Self::PORT_FALSE,
                PortDataType::Flow,
            ))
            .with_port(PortDefinition::output(
                port_id(id, FLOW_NEXT),
                FLOW_NEXT,
                PortDataType::Flow,
            ))
    }

    /// The decision taken by the last resolve, if any
    pub fn decision(&self) -> Option<bool> {
        *self.decision.lock()
    }
}

impl NodeContext for BranchNode {
    fn resolve(
        &self,
        node: &GraphNode,
        model: &Arc<GraphModel>,
        _accumulator: &mut FlowAccumulator,
    ) -> Result<()> {
        *self.decision.lock() = None;
        let condition = model.require_bool(node, Self::PORT_CONDITION)?;
        log::debug!("BranchNode {}: condition={}", node.id, condition);
        *self.decision.lock() = Some(condition);
        Ok(())
    }

    fn flow_enabled(&self, port: &PortDefinition) -> bool {
        match port.name.as_str() {
            Self::PORT_TRUE => self.decision() == Some(true),
            Self::PORT_FALSE => self.decision() == Some(false),
            _ => true,
        }
    }
}
