//! Print Node
//!
//! Renders its input as text when its unit executes and appends the line
//! to a shared output log.

use std::sync::Arc;

use flow_engine::{
    FlowAccumulator, FlowError, GraphModel, GraphNode, NodeContext, PortDataType, PortDefinition,
    PortValue, Result,
};
use parking_lot::Mutex;

use crate::port_id;
use crate::tree::{FLOW_IN, FLOW_NEXT};

/// Lines printed during runs, in execution order
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines.lock().push(line.into());
    }

    /// Snapshot of everything printed so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

/// Print Node
///
/// # Inputs
/// - `exec` - Flow in
/// - `value` - Value to print; an unconnected input prints an empty line
///
/// # Outputs
/// - `next` - Flow out
pub struct PrintNode {
    output: OutputLog,
}

impl PrintNode {
    /// Node type name
    pub const NODE_TYPE: &'static str = "print";
    /// Port name for the value input
    pub const PORT_VALUE: &'static str = "value";

    pub fn new(output: OutputLog) -> Self {
        Self { output }
    }

    /// Declare a print node
    pub fn node(id: &str) -> GraphNode {
        GraphNode::new(id, Self::NODE_TYPE)
            .with_port(PortDefinition::input(port_id(id, FLOW_IN), FLOW_IN, PortDataType::Flow))
            .with_port(PortDefinition::input(
                port_id(id, Self::PORT_VALUE),
                Self::PORT_VALUE,
                PortDataType::Any,
            ))
            .with_port(PortDefinition::output(
                port_id(id, FLOW_NEXT),
                FLOW_NEXT,
                PortDataType::Flow,
            ))
    }
}

/// Text rendering of a port value; strings print without quotes
fn render(value: Option<PortValue>) -> String {
    match value {
        None | Some(PortValue::Null) => String::new(),
        Some(PortValue::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn print_input(model: &GraphModel, node_id: &str, output: &OutputLog) -> Result<()> {
    let node = model
        .find_node(node_id)
        .ok_or_else(|| FlowError::NodeNotFound(node_id.to_string()))?;
    let line = render(model.input(node, PrintNode::PORT_VALUE)?);
    log::info!("[{}] {}", node_id, line);
    output.push(line);
    Ok(())
}

impl NodeContext for PrintNode {
    fn resolve(
        &self,
        node: &GraphNode,
        model: &Arc<GraphModel>,
        accumulator: &mut FlowAccumulator,
    ) -> Result<()> {
        let model = model.clone();
        let output = self.output.clone();
        let node_id = node.id.clone();

        accumulator.push_fn(node.id.clone(), move |_cancel| {
            let result = print_input(&model, &node_id, &output);
            async move { result }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConstantNode;
    use flow_engine::{CancellationToken, FlowUnit, GraphBuilder};
    use serde_json::json;

    #[test]
    fn test_render() {
        assert_eq!(render(None), "");
        assert_eq!(render(Some(json!("hi"))), "hi");
        assert_eq!(render(Some(json!(3))), "3");
        assert_eq!(render(Some(json!({"a": true}))), r#"{"a":true}"#);
    }

    #[tokio::test]
    async fn test_prints_on_execute() {
        let output = OutputLog::new();
        let graph = GraphBuilder::new("wf", "Print")
            .add_graph_node(ConstantNode::node("c"))
            .add_graph_node(PrintNode::node("p"))
            .connect("c", "c.value", "p", "p.value")
            .build()
            .unwrap();
        let model = Arc::new(
            GraphModel::new(graph)
                .with_context("c", ConstantNode::new(json!("hello")))
                .with_context("p", PrintNode::new(output.clone())),
        );

        let mut accumulator = FlowAccumulator::new();
        PrintNode::new(output.clone())
            .resolve(model.find_node("p").unwrap(), &model, &mut accumulator)
            .unwrap();
        assert!(output.lines().is_empty());

        for entry in accumulator.drain() {
            entry.unit().execute(&CancellationToken::new()).await.unwrap();
        }
        assert_eq!(output.lines(), vec!["hello"]);
    }
}
