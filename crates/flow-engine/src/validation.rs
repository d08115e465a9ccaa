//! Graph validation for flow graphs
//!
//! `validate_connection` guards every mutation of the connection set;
//! `validate_graph` checks a whole graph and reports every problem found,
//! including cycles among data connections.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{Connection, FlowGraph, PortCapacity, PortDefinition, PortDirection};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A node with this ID already exists
    DuplicateNode { node_id: String },
    /// A port with this ID already exists somewhere in the graph
    DuplicatePort { port_id: String },
    /// A connection references a node that does not exist
    UnknownNode { node_id: String },
    /// A connection references a port that does not exist on its node
    UnknownPort { node_id: String, port_id: String },
    /// The exact same connection already exists
    DuplicateConnection { connection: Connection },
    /// Source and target are the same node
    SelfConnection { node_id: String },
    /// Source and target are the same port
    SamePort { port_id: String },
    /// Source is not an output or target is not an input
    DirectionMismatch { port_id: String },
    /// The ports' data types cannot be connected
    IncompatiblePortTypes {
        source_port: String,
        target_port: String,
        source_type: String,
        target_type: String,
    },
    /// A single-capacity port already carries a connection
    PortCapacityExceeded { port_id: String },
    /// A required input port is not connected
    MissingRequiredPort { node_id: String, port_id: String },
    /// Data connections form a cycle, so pulling a value would never end
    CycleDetected,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNode { node_id } => write!(f, "Node '{}' already exists", node_id),
            Self::DuplicatePort { port_id } => write!(f, "Port '{}' already exists", port_id),
            Self::UnknownNode { node_id } => write!(f, "Unknown node '{}'", node_id),
            Self::UnknownPort { node_id, port_id } => {
                write!(f, "Node '{}' has no port '{}'", node_id, port_id)
            }
            Self::DuplicateConnection { connection } => write!(
                f,
                "Connection {}.{} -> {}.{} already exists",
                connection.source_node,
                connection.source_port,
                connection.target_node,
                connection.target_port
            ),
            Self::SelfConnection { node_id } => {
                write!(f, "Node '{}' cannot connect to itself", node_id)
            }
            Self::SamePort { port_id } => {
                write!(f, "Port '{}' cannot connect to itself", port_id)
            }
            Self::DirectionMismatch { port_id } => {
                write!(f, "Port '{}' has the wrong direction for this end", port_id)
            }
            Self::IncompatiblePortTypes {
                source_port,
                target_port,
                source_type,
                target_type,
            } => write!(
                f,
                "Ports '{}' ({}) and '{}' ({}) are incompatible",
                source_port, source_type, target_port, target_type
            ),
            Self::PortCapacityExceeded { port_id } => {
                write!(f, "Single-capacity port '{}' is already connected", port_id)
            }
            Self::MissingRequiredPort { node_id, port_id } => write!(
                f,
                "Required input '{}' on node '{}' is not connected",
                port_id, node_id
            ),
            Self::CycleDetected => write!(f, "Cycle detected in data connections"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check whether a connection may be added to the graph
///
/// Does not mutate the graph.
pub fn validate_connection(
    graph: &FlowGraph,
    connection: &Connection,
) -> Result<(), ValidationError> {
    let source = endpoint(graph, &connection.source_node, &connection.source_port)?;
    let target = endpoint(graph, &connection.target_node, &connection.target_port)?;

    if graph.contains_connection(connection) {
        return Err(ValidationError::DuplicateConnection {
            connection: connection.clone(),
        });
    }

    if connection.source_node == connection.target_node {
        return Err(ValidationError::SelfConnection {
            node_id: connection.source_node.clone(),
        });
    }

    if connection.source_port == connection.target_port {
        return Err(ValidationError::SamePort {
            port_id: connection.source_port.clone(),
        });
    }

    if source.direction != PortDirection::Output {
        return Err(ValidationError::DirectionMismatch {
            port_id: source.id.clone(),
        });
    }
    if target.direction != PortDirection::Input {
        return Err(ValidationError::DirectionMismatch {
            port_id: target.id.clone(),
        });
    }

    if !source.data_type.is_compatible_with(&target.data_type) {
        return Err(ValidationError::IncompatiblePortTypes {
            source_port: source.id.clone(),
            target_port: target.id.clone(),
            source_type: format!("{:?}", source.data_type),
            target_type: format!("{:?}", target.data_type),
        });
    }

    for port in [source, target] {
        if port.capacity == PortCapacity::Single && graph.count_connections_of_port(&port.id) > 0 {
            return Err(ValidationError::PortCapacityExceeded {
                port_id: port.id.clone(),
            });
        }
    }

    if !source.is_flow()
        && data_path_exists(graph, &connection.target_node, &connection.source_node)
    {
        return Err(ValidationError::CycleDetected);
    }

    Ok(())
}

/// Validate a whole graph
///
/// Returns all validation errors found (not just the first).
pub fn validate_graph(graph: &FlowGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_connection_references(graph, &mut errors);
    validate_capacities(graph, &mut errors);
    validate_required_inputs(graph, &mut errors);
    detect_data_cycles(graph, &mut errors);

    errors
}

fn endpoint<'a>(
    graph: &'a FlowGraph,
    node_id: &str,
    port_id: &str,
) -> Result<&'a PortDefinition, ValidationError> {
    let node = graph
        .find_node(node_id)
        .ok_or_else(|| ValidationError::UnknownNode {
            node_id: node_id.to_string(),
        })?;
    node.port(port_id).ok_or_else(|| ValidationError::UnknownPort {
        node_id: node_id.to_string(),
        port_id: port_id.to_string(),
    })
}

/// Whether a data connection carries values rather than control flow
fn is_data_connection(graph: &FlowGraph, connection: &Connection) -> bool {
    graph
        .find_port(&connection.source_port)
        .map_or(false, |(_, port)| !port.is_flow())
}

/// Whether `to` can be reached from `from` along data connections
fn data_path_exists<'a>(graph: &'a FlowGraph, from: &'a str, to: &str) -> bool {
    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(node_id) = stack.pop() {
        if node_id == to {
            return true;
        }
        if !seen.insert(node_id) {
            continue;
        }
        stack.extend(
            graph
                .connections()
                .iter()
                .filter(|c| c.source_node == node_id && is_data_connection(graph, c))
                .map(|c| c.target_node.as_str()),
        );
    }
    false
}

/// Check that all connection endpoints exist
fn validate_connection_references(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for connection in graph.connections() {
        for (node_id, port_id) in [
            (&connection.source_node, &connection.source_port),
            (&connection.target_node, &connection.target_port),
        ] {
            if let Err(e) = endpoint(graph, node_id, port_id) {
                errors.push(e);
            }
        }
    }
}

/// Check that no single-capacity port carries more than one connection
fn validate_capacities(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    let mut reported = HashSet::new();
    for node in graph.nodes() {
        for port in &node.ports {
            if port.capacity == PortCapacity::Single
                && graph.count_connections_of_port(&port.id) > 1
                && reported.insert(port.id.clone())
            {
                errors.push(ValidationError::PortCapacityExceeded {
                    port_id: port.id.clone(),
                });
            }
        }
    }
}

/// Check that all required inputs are connected
fn validate_required_inputs(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        for port in &node.ports {
            if port.required
                && port.direction == PortDirection::Input
                && graph.count_connections_of_port(&port.id) == 0
            {
                errors.push(ValidationError::MissingRequiredPort {
                    node_id: node.id.clone(),
                    port_id: port.id.clone(),
                });
            }
        }
    }
}

/// Detect cycles among data (non-flow) connections using Kahn's algorithm
///
/// `validate_connection` already refuses cycle-closing connections; this
/// catches graphs that arrived through deserialization. Flow connections may
/// loop back; the token-tree builder rejects those on its own.
fn detect_data_cycles(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    let edges: Vec<&Connection> = graph
        .connections()
        .iter()
        .filter(|c| is_data_connection(graph, c))
        .collect();

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in graph.nodes() {
        in_degree.insert(&node.id, 0);
    }
    for edge in &edges {
        *in_degree.entry(&edge.target_node).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        for edge in &edges {
            if edge.source_node == node_id {
                if let Some(deg) = in_degree.get_mut(edge.target_node.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(&edge.target_node);
                    }
                }
            }
        }
    }

    if visited < in_degree.len() {
        errors.push(ValidationError::CycleDetected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::PortDataType;

    fn two_node_graph() -> FlowGraph {
        GraphBuilder::new("wf", "Test")
            .add_node("a", "constant")
            .output("a.value", "value", PortDataType::Number)
            .output("a.text", "text", PortDataType::String)
            .add_node("b", "print")
            .input("b.value", "value", PortDataType::Number)
            .add_node("c", "print")
            .input("c.value", "value", PortDataType::Any)
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_connection() {
        let mut graph = two_node_graph();
        assert!(graph
            .connect(Connection::new("a", "a.value", "b", "b.value"))
            .is_ok());
        assert_eq!(graph.connections().len(), 1);
    }

    #[test]
    fn test_duplicate_connection_rejected_without_mutation() {
        let mut graph = two_node_graph();
        let conn = Connection::new("a", "a.value", "c", "c.value");
        graph.connect(conn.clone()).unwrap();

        let err = graph.connect(conn).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateConnection { .. }));
        assert_eq!(graph.connections().len(), 1);
    }

    #[test]
    fn test_single_capacity_port_full() {
        let mut graph = two_node_graph();
        graph
            .connect(Connection::new("a", "a.value", "c", "c.value"))
            .unwrap();

        let err = graph
            .connect(Connection::new("a", "a.text", "c", "c.value"))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::PortCapacityExceeded {
                port_id: "c.value".to_string()
            }
        );
        assert_eq!(graph.connections().len(), 1);
    }

    #[test]
    fn test_incompatible_types_rejected() {
        let mut graph = two_node_graph();
        let err = graph
            .connect(Connection::new("a", "a.text", "b", "b.value"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::IncompatiblePortTypes { .. }));
    }

    #[test]
    fn test_self_connection_rejected() {
        let mut graph = GraphBuilder::new("wf", "Loop")
            .add_node("a", "passthrough")
            .input("a.in", "in", PortDataType::Any)
            .output("a.out", "out", PortDataType::Any)
            .build()
            .unwrap();

        let err = graph
            .connect(Connection::new("a", "a.out", "a", "a.in"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::SelfConnection { .. }));
    }

    #[test]
    fn test_direction_mismatch_rejected() {
        let mut graph = two_node_graph();
        let err = graph
            .connect(Connection::new("b", "b.value", "c", "c.value"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::DirectionMismatch { .. }));
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let mut graph = two_node_graph();
        let err = graph
            .connect(Connection::new("a", "a.value", "missing", "x"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownNode { .. }));

        let err = graph
            .connect(Connection::new("a", "b.value", "c", "c.value"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownPort { .. }));
    }

    #[test]
    fn test_missing_required_port() {
        let graph = GraphBuilder::new("wf", "Test")
            .add_node("p", "print")
            .required_input("p.value", "value", PortDataType::Any)
            .build()
            .unwrap();

        let errors = validate_graph(&graph);
        assert_eq!(
            errors,
            vec![ValidationError::MissingRequiredPort {
                node_id: "p".to_string(),
                port_id: "p.value".to_string(),
            }]
        );
    }

    #[test]
    fn test_valid_graph_has_no_errors() {
        let mut graph = two_node_graph();
        graph
            .connect(Connection::new("a", "a.value", "b", "b.value"))
            .unwrap();
        let errors = validate_graph(&graph);
        assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
    }

    fn adder_pair() -> FlowGraph {
        GraphBuilder::new("wf", "Cycle")
            .add_node("a", "add")
            .input("a.in", "in", PortDataType::Number)
            .output("a.out", "out", PortDataType::Number)
            .add_node("b", "add")
            .input("b.in", "in", PortDataType::Number)
            .output("b.out", "out", PortDataType::Number)
            .build()
            .unwrap()
    }

    #[test]
    fn test_cycle_closing_connection_rejected() {
        let mut graph = adder_pair();
        graph.connect(Connection::new("a", "a.out", "b", "b.in")).unwrap();

        let err = graph
            .connect(Connection::new("b", "b.out", "a", "a.in"))
            .unwrap_err();
        assert_eq!(err, ValidationError::CycleDetected);
        assert_eq!(graph.connections().len(), 1);
    }

    #[test]
    fn test_longer_cycle_rejected() {
        let mut graph = GraphBuilder::new("wf", "Ring")
            .add_node("a", "add")
            .input("a.in", "in", PortDataType::Number)
            .output("a.out", "out", PortDataType::Number)
            .add_node("b", "add")
            .input("b.in", "in", PortDataType::Number)
            .output("b.out", "out", PortDataType::Number)
            .add_node("c", "add")
            .input("c.in", "in", PortDataType::Number)
            .output("c.out", "out", PortDataType::Number)
            .connect("a", "a.out", "b", "b.in")
            .connect("b", "b.out", "c", "c.in")
            .build()
            .unwrap();

        assert!(matches!(
            graph.connect(Connection::new("c", "c.out", "a", "a.in")),
            Err(ValidationError::CycleDetected)
        ));
    }

    #[test]
    fn test_detect_data_cycle_in_deserialized_graph() {
        let mut graph = adder_pair();
        graph.connect(Connection::new("a", "a.out", "b", "b.in")).unwrap();

        let mut value = serde_json::to_value(&graph).unwrap();
        value["connections"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::to_value(Connection::new("b", "b.out", "a", "a.in")).unwrap());
        let graph: FlowGraph = serde_json::from_value(value).unwrap();

        let errors = validate_graph(&graph);
        assert!(errors.contains(&ValidationError::CycleDetected));
    }

    #[test]
    fn test_flow_loop_is_not_a_data_cycle() {
        let mut graph = GraphBuilder::new("wf", "Loop")
            .add_node("a", "print")
            .flow_input("a.exec", "exec")
            .flow_output("a.next", "next")
            .add_node("b", "print")
            .flow_input("b.exec", "exec")
            .flow_output("b.next", "next")
            .build()
            .unwrap();
        graph.connect(Connection::new("a", "a.next", "b", "b.exec")).unwrap();
        graph.connect(Connection::new("b", "b.next", "a", "a.exec")).unwrap();

        assert!(validate_graph(&graph).is_empty());
    }
}
