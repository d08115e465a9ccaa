//! Graph model with node contexts and pull-based dataflow
//!
//! A `GraphModel` pairs a validated `FlowGraph` with one `NodeContext` per
//! node. Contexts emit flow units when their token resolves and answer
//! value requests for their output ports.
//!
//! Values are pulled, never pushed: reading an input port follows its first
//! connection upstream and asks the owning node for the value, every time.
//! Nothing is cached, so a node feeding two consumers is evaluated twice.

use std::collections::HashMap;
use std::sync::Arc;

use crate::accumulator::FlowAccumulator;
use crate::error::{FlowError, Result};
use crate::token::FlowToken;
use crate::types::{Connection, FlowGraph, GraphNode, NodeId, PortDefinition, PortId, PortValue};
use crate::validation::{validate_graph, ValidationError};

/// Runtime behaviour attached to one graph node
pub trait NodeContext: Send + Sync {
    /// Append the units this node contributes to the current pass
    fn resolve(
        &self,
        _node: &GraphNode,
        _model: &Arc<GraphModel>,
        _accumulator: &mut FlowAccumulator,
    ) -> Result<()> {
        Ok(())
    }

    /// Compute the value of one of this node's output ports
    fn port_value(
        &self,
        node: &GraphNode,
        port_id: &str,
        _model: &GraphModel,
    ) -> Result<PortValue> {
        Err(FlowError::NoPortValue {
            node_id: node.id.clone(),
            port_id: port_id.to_string(),
        })
    }

    /// Whether control flow leaving through `port` is live in this pass
    fn flow_enabled(&self, _port: &PortDefinition) -> bool {
        true
    }
}

/// A flow graph plus the contexts that give its nodes behaviour
#[derive(Default)]
pub struct GraphModel {
    graph: FlowGraph,
    contexts: HashMap<NodeId, Arc<dyn NodeContext>>,
}

impl GraphModel {
    /// Wrap a graph; nodes start without contexts
    pub fn new(graph: FlowGraph) -> Self {
        Self {
            graph,
            contexts: HashMap::new(),
        }
    }

    /// Attach a context to a node (builder form)
    pub fn with_context(
        mut self,
        node_id: impl Into<String>,
        context: impl NodeContext + 'static,
    ) -> Self {
        self.set_context(node_id, Arc::new(context));
        self
    }

    /// Attach or replace a node's context
    pub fn set_context(&mut self, node_id: impl Into<String>, context: Arc<dyn NodeContext>) {
        self.contexts.insert(node_id.into(), context);
    }

    /// Validate the whole graph, returning the first problem found
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        match validate_graph(&self.graph).into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// The underlying graph
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// Add a connection after validating it
    pub fn connect(
        &mut self,
        connection: Connection,
    ) -> std::result::Result<(), ValidationError> {
        self.graph.connect(connection)
    }

    pub fn find_node(&self, node_id: &str) -> Option<&GraphNode> {
        self.graph.find_node(node_id)
    }

    pub fn connections_of_port<'a>(
        &'a self,
        port_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.graph.connections_of_port(port_id)
    }

    pub fn count_connections_of_port(&self, port_id: &str) -> usize {
        self.graph.count_connections_of_port(port_id)
    }

    pub fn first_connection<'a>(&'a self, port_id: &'a str) -> Option<&'a Connection> {
        self.graph.first_connection(port_id)
    }

    /// Context attached to a node, if any
    pub fn context(&self, node_id: &str) -> Option<&Arc<dyn NodeContext>> {
        self.contexts.get(node_id)
    }

    /// Ask a node for the value of one of its ports
    pub fn get_port_value(&self, node_id: &str, port_id: &str) -> Result<PortValue> {
        let node = self
            .find_node(node_id)
            .ok_or_else(|| FlowError::NodeNotFound(node_id.to_string()))?;
        match self.context(node_id) {
            Some(context) => context.port_value(node, port_id, self),
            None => Err(FlowError::NoPortValue {
                node_id: node_id.to_string(),
                port_id: port_id.to_string(),
            }),
        }
    }

    /// Pull the value arriving at an input port
    ///
    /// Returns `None` when the port is not connected. Evaluated on every
    /// call.
    pub fn get_input_port_value(&self, port_id: &str) -> Result<Option<PortValue>> {
        let Some(connection) = self
            .connections_of_port(port_id)
            .find(|c| c.target_port == port_id)
        else {
            return Ok(None);
        };
        log::trace!(
            "Pulling {} from {}.{}",
            port_id,
            connection.source_node,
            connection.source_port
        );
        self.get_port_value(&connection.source_node, &connection.source_port)
            .map(Some)
    }

    /// Pull the value of a node's input port looked up by its local name
    pub fn input(&self, node: &GraphNode, name: &str) -> Result<Option<PortValue>> {
        let port = node
            .port_named(name)
            .ok_or_else(|| FlowError::PortNotFound(format!("{}.{}", node.id, name)))?;
        self.get_input_port_value(&port.id)
    }

    /// Like [`GraphModel::input`] but the port must be connected
    pub fn require_input(&self, node: &GraphNode, name: &str) -> Result<PortValue> {
        self.input(node, name)?
            .ok_or_else(|| FlowError::MissingInput(format!("{}.{}", node.id, name)))
    }

    /// Pull a numeric input
    pub fn require_number(&self, node: &GraphNode, name: &str) -> Result<f64> {
        self.require_input(node, name)?
            .as_f64()
            .ok_or_else(|| FlowError::InvalidInputType {
                port: format!("{}.{}", node.id, name),
                expected: "number".to_string(),
            })
    }

    /// Pull a boolean input
    pub fn require_bool(&self, node: &GraphNode, name: &str) -> Result<bool> {
        self.require_input(node, name)?
            .as_bool()
            .ok_or_else(|| FlowError::InvalidInputType {
                port: format!("{}.{}", node.id, name),
                expected: "boolean".to_string(),
            })
    }

    /// Whether flow leaving `node_id` through `port_id` is live
    pub fn flow_enabled(&self, node_id: &str, port_id: &str) -> Result<bool> {
        let node = self
            .find_node(node_id)
            .ok_or_else(|| FlowError::NodeNotFound(node_id.to_string()))?;
        let port = node
            .port(port_id)
            .ok_or_else(|| FlowError::PortNotFound(port_id.to_string()))?;
        Ok(self
            .context(node_id)
            .map_or(true, |context| context.flow_enabled(port)))
    }
}

/// The flow token contributed by one graph node
///
/// Resolving it hands the accumulator to the node's context. A token inside
/// a branch carries guards; it contributes nothing while any guarding port
/// is disabled.
pub struct NodeToken {
    node_id: NodeId,
    model: Arc<GraphModel>,
    guards: Vec<(NodeId, PortId)>,
}

impl NodeToken {
    pub fn new(model: Arc<GraphModel>, node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            model,
            guards: Vec::new(),
        }
    }

    /// Only resolve while the given flow ports are enabled
    pub fn with_guards(mut self, guards: Vec<(NodeId, PortId)>) -> Self {
        self.guards = guards;
        self
    }

    pub fn guards(&self) -> &[(NodeId, PortId)] {
        &self.guards
    }
}

impl FlowToken for NodeToken {
    fn label(&self) -> &str {
        &self.node_id
    }

    fn resolve(&self, accumulator: &mut FlowAccumulator) -> Result<()> {
        for (node_id, port_id) in &self.guards {
            if !self.model.flow_enabled(node_id, port_id)? {
                log::debug!(
                    "Skipping '{}': flow port {}.{} is disabled",
                    self.node_id,
                    node_id,
                    port_id
                );
                return Ok(());
            }
        }

        let node = self
            .model
            .find_node(&self.node_id)
            .ok_or_else(|| FlowError::NodeNotFound(self.node_id.clone()))?;
        match self.model.context(&self.node_id) {
            Some(context) => context.resolve(node, &self.model, accumulator),
            None => Ok(()),
        }
    }
}
