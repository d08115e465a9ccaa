//! Fluent builder for flow graphs
//!
//! Provides a compact API for constructing graphs programmatically. Every
//! connection goes through the same validation as an editor mutation.

use crate::types::{Connection, FlowGraph, GraphNode, PortDataType, PortDefinition};
use crate::validation::ValidationError;

/// Fluent builder for constructing flow graphs
///
/// # Example
///
/// ```ignore
/// let graph = GraphBuilder::new("g-1", "My Flow")
///     .add_node("start", "start")
///     .flow_output("start.next", "next")
///     .add_node("hello", "print")
///     .flow_input("hello.in", "in")
///     .connect("start", "start.next", "hello", "hello.in")
///     .build()?;
/// ```
pub struct GraphBuilder {
    id: String,
    name: String,
    nodes: Vec<GraphNode>,
    connections: Vec<Connection>,
}

impl GraphBuilder {
    /// Create a new graph builder
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(mut self, id: impl Into<String>, node_type: impl Into<String>) -> Self {
        self.nodes.push(GraphNode::new(id, node_type));
        self
    }

    /// Add a node that already declares its ports
    pub fn add_graph_node(mut self, node: GraphNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a port to the most recently added node
    ///
    /// Must be called after `add_node`.
    pub fn port(mut self, port: PortDefinition) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.ports.push(port);
        }
        self
    }

    /// Add an optional data input to the most recently added node
    pub fn input(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        data_type: PortDataType,
    ) -> Self {
        self.port(PortDefinition::input(id, name, data_type))
    }

    /// Add a required data input to the most recently added node
    pub fn required_input(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        data_type: PortDataType,
    ) -> Self {
        self.port(PortDefinition::input(id, name, data_type).required())
    }

    /// Add a data output to the most recently added node
    pub fn output(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        data_type: PortDataType,
    ) -> Self {
        self.port(PortDefinition::output(id, name, data_type))
    }

    /// Add a flow input to the most recently added node
    pub fn flow_input(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.port(PortDefinition::input(id, name, PortDataType::Flow))
    }

    /// Add a flow output to the most recently added node
    pub fn flow_output(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.port(PortDefinition::output(id, name, PortDataType::Flow))
    }

    /// Connect two ports
    pub fn connect(
        mut self,
        source_node: impl Into<String>,
        source_port: impl Into<String>,
        target_node: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.connections.push(Connection::new(
            source_node,
            source_port,
            target_node,
            target_port,
        ));
        self
    }

    /// Build the graph, validating every node and connection
    pub fn build(self) -> Result<FlowGraph, ValidationError> {
        let mut graph = FlowGraph::new(self.id, self.name);
        for node in self.nodes {
            graph.add_node(node)?;
        }
        for connection in self.connections {
            graph.connect(connection)?;
        }
        Ok(graph)
    }
}
