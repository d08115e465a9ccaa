//! Output nodes
//!
//! Nodes that record results where the host can see them.

mod print;

pub use print::{OutputLog, PrintNode};
