//! Processing nodes
//!
//! Nodes that compute output values from their inputs on demand.

mod math;

pub use math::AddNode;
