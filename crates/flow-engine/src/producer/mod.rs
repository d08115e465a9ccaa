//! Flow producers: compile a token tree into one runnable unit.
//!
//! Three strategies share the `FlowProducer` trait but keep independent
//! traversals:
//!
//! - **Linear**: follows the successor chain from the root and ignores
//!   children. Default.
//! - **Hierarchical**: pre-order walk of the whole tree into a flat,
//!   immutable plan. Each token is resolved exactly once.
//! - **Immediate**: resolves and executes one token at a time, so a token
//!   can look at state written by units that already ran.
//!
//! In every strategy a unit failure stops the run. By default the failure
//! is logged and reported through the event sink while the compiled unit
//! still completes normally; `FlowConfig::surface_failures` returns it
//! instead. Cancellation is always returned as `FlowError::Cancelled`.

mod hierarchical;
mod immediate;
mod linear;
mod plan;
mod run;

use std::sync::Arc;

pub use hierarchical::HierarchicalProducer;
pub use immediate::{ImmediateProducer, ImmediateRun};
pub use linear::LinearProducer;
pub use plan::FlowPlan;

use crate::accumulator::FlowAccumulator;
use crate::config::{FlowConfig, ProducerKind};
use crate::error::{FlowError, Result};
use crate::events::EventSink;
use crate::token::{TokenId, TokenTree};
use crate::unit::BoxedUnit;

/// A strategy that compiles a token tree into one flow unit
pub trait FlowProducer: Send + Sync {
    /// Which strategy this is
    fn kind(&self) -> ProducerKind;

    /// Compile the tree rooted at `tree.root()` into a runnable unit
    fn compile(&self, tree: Arc<TokenTree>) -> Result<BoxedUnit>;
}

/// Create the producer selected by the configuration
pub fn producer_for(config: &FlowConfig, events: Arc<dyn EventSink>) -> Box<dyn FlowProducer> {
    match config.producer {
        ProducerKind::Linear => Box::new(LinearProducer::new(config.clone(), events)),
        ProducerKind::Hierarchical => Box::new(HierarchicalProducer::new(config.clone(), events)),
        ProducerKind::Immediate => Box::new(ImmediateProducer::new(config.clone(), events)),
    }
}

/// Resolve one token into the accumulator, tagging its units with the token
fn resolve_into(tree: &TokenTree, id: TokenId, accumulator: &mut FlowAccumulator) -> Result<()> {
    let token = tree.token(id)?;
    let label = token.label();
    accumulator.begin_token(label);
    let before = accumulator.len();
    token
        .resolve(accumulator)
        .map_err(|e| FlowError::resolve_failed(label, e))?;
    log::debug!(
        "Resolved token '{}' into {} unit(s)",
        label,
        accumulator.len() - before
    );
    Ok(())
}
