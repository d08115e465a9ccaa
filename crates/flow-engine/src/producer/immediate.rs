//! Immediate producer: resolve and execute one token at a time.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::run::RunReporter;
use super::{resolve_into, FlowProducer};
use crate::accumulator::FlowAccumulator;
use crate::config::{FlowConfig, ProducerKind};
use crate::error::{FlowError, Result};
use crate::events::EventSink;
use crate::token::{TokenId, TokenTree, VisitGuard};
use crate::unit::{BoxedUnit, FlowUnit};

/// Compiles a tree into a unit that interleaves resolution and execution
///
/// Compilation does no traversal. Each run walks the tree afresh, so a
/// token resolved late in the run sees the effects of units that already
/// executed.
pub struct ImmediateProducer {
    config: FlowConfig,
    events: Arc<dyn EventSink>,
}

impl ImmediateProducer {
    /// Create an immediate producer
    pub fn new(config: FlowConfig, events: Arc<dyn EventSink>) -> Self {
        Self { config, events }
    }

    /// Wrap the tree into a runnable unit
    pub fn run_for(&self, tree: Arc<TokenTree>) -> ImmediateRun {
        ImmediateRun {
            label: format!("{}-run", ProducerKind::Immediate),
            tree,
            config: self.config.clone(),
            events: self.events.clone(),
        }
    }
}

impl FlowProducer for ImmediateProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Immediate
    }

    fn compile(&self, tree: Arc<TokenTree>) -> Result<BoxedUnit> {
        tree.root()?;
        Ok(Box::new(self.run_for(tree)))
    }
}

/// The unit produced by [`ImmediateProducer`]
///
/// For each token in the successor chain: resolve it, execute its units,
/// walk each child branch the same way, then advance. Resolution errors
/// and revisits end the run like a unit failure.
pub struct ImmediateRun {
    label: String,
    tree: Arc<TokenTree>,
    config: FlowConfig,
    events: Arc<dyn EventSink>,
}

impl ImmediateRun {
    fn walk<'a>(
        &'a self,
        start: TokenId,
        guard: &'a mut VisitGuard,
        reporter: &'a mut RunReporter,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let tree = self.tree.as_ref();
            let mut cursor = Some(start);
            while let Some(current) = cursor {
                if cancel.is_cancelled() {
                    return Err(FlowError::Cancelled);
                }
                guard.visit(tree, current)?;

                let mut accumulator = FlowAccumulator::new();
                resolve_into(tree, current, &mut accumulator)?;
                reporter.token_resolved(tree.label(current)?, accumulator.len());

                for entry in accumulator.into_units() {
                    reporter.run_unit(entry.token(), entry.unit(), cancel).await?;
                }

                for &child in tree.children(current)? {
                    self.walk(child, guard, reporter, cancel).await?;
                }

                cursor = tree.successor(current)?;
            }
            Ok(())
        })
    }
}

#[async_trait]
impl FlowUnit for ImmediateRun {
    fn label(&self) -> &str {
        &self.label
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<()> {
        let mut reporter = RunReporter::start(
            ProducerKind::Immediate,
            self.events.clone(),
            self.config.surface_failures,
        );
        let mut guard = VisitGuard::new(&self.tree, self.config.max_tokens);

        let outcome = match self.tree.root() {
            Ok(root) => self.walk(root, &mut guard, &mut reporter, cancel).await,
            Err(e) => Err(e),
        };
        reporter.finish(outcome)
    }
}
