//! Linear producer: the successor chain, nothing else.

use std::sync::Arc;

use super::plan::FlowPlan;
use super::{resolve_into, FlowProducer};
use crate::accumulator::FlowAccumulator;
use crate::config::{FlowConfig, ProducerKind};
use crate::error::Result;
use crate::events::EventSink;
use crate::token::{TokenTree, VisitGuard};
use crate::unit::BoxedUnit;

/// Walks the successor chain from the root and ignores children
///
/// This is the strategy hosts get by default.
pub struct LinearProducer {
    config: FlowConfig,
    events: Arc<dyn EventSink>,
}

impl LinearProducer {
    /// Create a linear producer
    pub fn new(config: FlowConfig, events: Arc<dyn EventSink>) -> Self {
        Self { config, events }
    }

    /// Resolve the successor chain into a plan
    pub fn plan(&self, tree: &TokenTree) -> Result<FlowPlan> {
        let mut accumulator = FlowAccumulator::new();
        let mut guard = VisitGuard::new(tree, self.config.max_tokens);

        let mut cursor = Some(tree.root()?);
        while let Some(current) = cursor {
            guard.visit(tree, current)?;
            resolve_into(tree, current, &mut accumulator)?;
            cursor = tree.successor(current)?;
        }

        Ok(FlowPlan::new(
            ProducerKind::Linear,
            accumulator,
            self.events.clone(),
            self.config.surface_failures,
        ))
    }
}

impl FlowProducer for LinearProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Linear
    }

    fn compile(&self, tree: Arc<TokenTree>) -> Result<BoxedUnit> {
        Ok(Box::new(self.plan(&tree)?))
    }
}
