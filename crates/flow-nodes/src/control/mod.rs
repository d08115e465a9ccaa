//! Control nodes
//!
//! Nodes that shape control flow: branching, waiting and aborting.

mod branch;
mod delay;
mod fail;

pub use branch::BranchNode;
pub use delay::DelayNode;
pub use fail::FailNode;
