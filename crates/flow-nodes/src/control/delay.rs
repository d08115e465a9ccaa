//! Delay Node
//!
//! Waits for a fixed duration. The wait ends early when the run is
//! cancelled.

use std::sync::Arc;
use std::time::Duration;

use flow_engine::{
    CancellationToken, FlowAccumulator, FlowError, GraphModel, GraphNode, NodeContext,
    PortDataType, PortDefinition, Result,
};

use crate::port_id;
use crate::tree::{FLOW_IN, FLOW_NEXT};

/// Delay Node
///
/// # Inputs
/// - `exec` - Flow in
///
/// # Outputs
/// - `next` - Flow out, once the delay has elapsed
pub struct DelayNode {
    duration: Duration,
}

impl DelayNode {
    /// Node type name
    pub const NODE_TYPE: &'static str = "delay";

    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Declare a delay node
    pub fn node(id: &str) -> GraphNode {
        GraphNode::new(id, Self::NODE_TYPE)
            .with_port(PortDefinition::input(port_id(id, FLOW_IN), FLOW_IN, PortDataType::Flow))
            .with_port(PortDefinition::output(
                port_id(id, FLOW_NEXT),
                FLOW_NEXT,
                PortDataType::Flow,
            ))
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

async fn wait(duration: Duration, cancel: CancellationToken) -> Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(FlowError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

impl NodeContext for DelayNode {
    fn resolve(
        &self,
        node: &GraphNode,
        _model: &Arc<GraphModel>,
        accumulator: &mut FlowAccumulator,
    ) -> Result<()> {
        let duration = self.duration;
        log::debug!("DelayNode {}: waiting {:?}", node.id, duration);
        accumulator.push_fn(node.id.clone(), move |cancel| wait(duration, cancel));
        Ok(())
    }
}
