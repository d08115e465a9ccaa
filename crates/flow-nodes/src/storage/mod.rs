//! Storage nodes
//!
//! A blackboard shared between nodes and the nodes that read and write it.

mod blackboard;
mod variable;

pub use blackboard::Blackboard;
pub use variable::{GetVariableNode, SetVariableNode};
