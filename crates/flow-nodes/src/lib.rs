//! Flow Nodes
//!
//! Node contexts for the flow engine, plus the builder that turns a graph's
//! flow connections into a token tree.
//!
//! # Categories
//!
//! - **Input**: nodes that provide values (constants)
//! - **Processing**: nodes that compute values from their inputs
//! - **Storage**: a shared blackboard and variable get/set nodes
//! - **Output**: nodes that record results
//! - **Control**: branching, delays and explicit failures
//!
//! Every node type offers a `node(id)` constructor declaring its ports.
//! Port ids are `"{node_id}.{port_name}"`, so they stay unique across the
//! graph.

pub mod control;
pub mod input;
pub mod output;
pub mod processing;
pub mod storage;
pub mod tree;

pub use control::*;
pub use input::*;
pub use output::*;
pub use processing::*;
pub use storage::*;
pub use tree::{build_token_tree, FLOW_IN, FLOW_NEXT};

/// Graph-wide id of a node's port
pub fn port_id(node_id: &str, name: &str) -> String {
    format!("{}.{}", node_id, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_id() {
        assert_eq!(port_id("print1", "value"), "print1.value");
    }

    #[test]
    fn test_flow_nodes_share_port_names() {
        for node in [
            PrintNode::node("p"),
            SetVariableNode::node("s"),
            DelayNode::node("d"),
            FailNode::node("f"),
            BranchNode::node("b"),
        ] {
            assert!(node.port_named(FLOW_IN).is_some(), "{} lacks exec", node.node_type);
            assert!(node.port_named(FLOW_NEXT).is_some(), "{} lacks next", node.node_type);
        }
    }
}
