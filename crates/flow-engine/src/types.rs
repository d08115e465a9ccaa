//! Core types for flow graphs
//!
//! These types define the structure of an authored graph: nodes, their
//! ports, and the connections between ports. The graph is only mutated by
//! the editing surface; the engine reads it.

use serde::{Deserialize, Serialize};

use crate::validation::{validate_connection, ValidationError};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for a port (unique across the whole graph)
pub type PortId = String;

/// A value that flows through a data port
pub type PortValue = serde_json::Value;

/// The data type of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDataType {
    /// Control flow (execution order, carries no value)
    Flow,
    /// Accepts any data type
    Any,
    /// Boolean value
    Boolean,
    /// Numeric value
    Number,
    /// Text string
    String,
    /// JSON object
    Json,
}

impl PortDataType {
    /// Check if this type can connect to another type
    pub fn is_compatible_with(&self, other: &PortDataType) -> bool {
        // Flow only ever connects to flow
        if matches!(self, PortDataType::Flow) || matches!(other, PortDataType::Flow) {
            return self == other;
        }

        if matches!(self, PortDataType::Any) || matches!(other, PortDataType::Any) {
            return true;
        }

        self == other
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// How many connections a port may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortCapacity {
    /// At most one connection
    Single,
    /// Any number of connections
    Multiple,
}

/// Definition of a port on a node instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDefinition {
    /// Graph-wide unique identifier
    pub id: PortId,
    /// Name local to the owning node (e.g. "next", "value")
    pub name: String,
    /// Input or output
    pub direction: PortDirection,
    /// Data type of the port
    pub data_type: PortDataType,
    /// Connection capacity
    pub capacity: PortCapacity,
    /// Whether an input port must be connected
    pub required: bool,
}

impl PortDefinition {
    /// Create an optional input port
    ///
    /// Data inputs default to single capacity; flow inputs accept many
    /// incoming connections.
    pub fn input(id: impl Into<String>, name: impl Into<String>, data_type: PortDataType) -> Self {
        let capacity = if data_type == PortDataType::Flow {
            PortCapacity::Multiple
        } else {
            PortCapacity::Single
        };
        Self {
            id: id.into(),
            name: name.into(),
            direction: PortDirection::Input,
            data_type,
            capacity,
            required: false,
        }
    }

    /// Create an output port
    ///
    /// Data outputs fan out to many consumers; flow outputs lead to one
    /// next step.
    pub fn output(id: impl Into<String>, name: impl Into<String>, data_type: PortDataType) -> Self {
        let capacity = if data_type == PortDataType::Flow {
            PortCapacity::Single
        } else {
            PortCapacity::Multiple
        };
        Self {
            id: id.into(),
            name: name.into(),
            direction: PortDirection::Output,
            data_type,
            capacity,
            required: false,
        }
    }

    /// Mark this port as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set this port to accept multiple connections
    pub fn multiple(mut self) -> Self {
        self.capacity = PortCapacity::Multiple;
        self
    }

    /// Limit this port to a single connection
    pub fn single(mut self) -> Self {
        self.capacity = PortCapacity::Single;
        self
    }

    /// Whether this is a control-flow port
    pub fn is_flow(&self) -> bool {
        self.data_type == PortDataType::Flow
    }
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Node type (e.g. "print", "branch")
    pub node_type: String,
    /// Ports declared by this node, in declaration order
    pub ports: Vec<PortDefinition>,
}

impl GraphNode {
    /// Create a node with no ports
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            ports: Vec::new(),
        }
    }

    /// Add a port
    pub fn with_port(mut self, port: PortDefinition) -> Self {
        self.ports.push(port);
        self
    }

    /// Find a port by its graph-wide ID
    pub fn port(&self, port_id: &str) -> Option<&PortDefinition> {
        self.ports.iter().find(|p| p.id == port_id)
    }

    /// Find a port by its local name
    pub fn port_named(&self, name: &str) -> Option<&PortDefinition> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Flow output ports in declaration order
    pub fn flow_outputs(&self) -> impl Iterator<Item = &PortDefinition> {
        self.ports
            .iter()
            .filter(|p| p.is_flow() && p.direction == PortDirection::Output)
    }
}

/// A connection between an output port and an input port
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source node ID
    pub source_node: NodeId,
    /// Source port ID
    pub source_port: PortId,
    /// Target node ID
    pub target_node: NodeId,
    /// Target port ID
    pub target_port: PortId,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        source_node: impl Into<String>,
        source_port: impl Into<String>,
        target_node: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source_node: source_node.into(),
            source_port: source_port.into(),
            target_node: target_node.into(),
            target_port: target_port.into(),
        }
    }

    /// Check if this connection touches a specific port
    pub fn involves_port(&self, port_id: &str) -> bool {
        self.source_port == port_id || self.target_port == port_id
    }

    /// Check if this connection touches a specific node
    pub fn involves_node(&self, node_id: &str) -> bool {
        self.source_node == node_id || self.target_node == node_id
    }
}

/// A complete flow graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGraph {
    /// Unique identifier for this graph
    pub id: String,
    /// Human-readable name
    pub name: String,
    nodes: Vec<GraphNode>,
    connections: Vec<Connection>,
}

impl FlowGraph {
    /// Create a new empty graph
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Add a node, rejecting duplicate node or port IDs
    pub fn add_node(&mut self, node: GraphNode) -> Result<(), ValidationError> {
        if self.find_node(&node.id).is_some() {
            return Err(ValidationError::DuplicateNode {
                node_id: node.id.clone(),
            });
        }
        for (i, port) in node.ports.iter().enumerate() {
            let repeated_locally = node.ports[..i].iter().any(|p| p.id == port.id);
            if repeated_locally || self.find_port(&port.id).is_some() {
                return Err(ValidationError::DuplicatePort {
                    port_id: port.id.clone(),
                });
            }
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every connection touching it
    pub fn remove_node(&mut self, node_id: &str) -> Option<GraphNode> {
        let pos = self.nodes.iter().position(|n| n.id == node_id)?;
        self.connections.retain(|c| !c.involves_node(node_id));
        Some(self.nodes.remove(pos))
    }

    /// Validate and add a connection
    ///
    /// A rejected connection leaves the graph untouched.
    pub fn connect(&mut self, connection: Connection) -> Result<(), ValidationError> {
        validate_connection(self, &connection)?;
        self.connections.push(connection);
        Ok(())
    }

    /// Remove an exact connection
    pub fn disconnect(&mut self, connection: &Connection) -> bool {
        match self.connections.iter().position(|c| c == connection) {
            Some(pos) => {
                self.connections.remove(pos);
                true
            }
            None => false,
        }
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// All connections in insertion order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a port and its owning node by port ID
    pub fn find_port(&self, port_id: &str) -> Option<(&GraphNode, &PortDefinition)> {
        self.nodes
            .iter()
            .find_map(|n| n.port(port_id).map(|p| (n, p)))
    }

    /// Connections touching a port, in insertion order
    pub fn connections_of_port<'a>(
        &'a self,
        port_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.involves_port(port_id))
    }

    /// Number of connections touching a port
    pub fn count_connections_of_port(&self, port_id: &str) -> usize {
        self.connections_of_port(port_id).count()
    }

    /// The first connection of a port, if any
    pub fn first_connection<'a>(&'a self, port_id: &'a str) -> Option<&'a Connection> {
        self.connections_of_port(port_id).next()
    }

    /// Check whether an identical connection already exists
    pub fn contains_connection(&self, connection: &Connection) -> bool {
        self.connections.iter().any(|c| c == connection)
    }
}
