//! Host-facing engine facade
//!
//! `FlowEngine` owns the producer selected by its configuration and the
//! event sink runs report to. Hosts either await a run in place with
//! [`FlowEngine::execute`] or spawn it with [`FlowEngine::start`] and keep
//! the returned [`RunHandle`] to stop it later.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{FlowConfig, ProducerKind};
use crate::error::{FlowError, Result};
use crate::events::{EventSink, NullEventSink};
use crate::producer::{producer_for, FlowProducer};
use crate::token::TokenTree;
use crate::unit::BoxedUnit;

/// Compiles and runs token trees with one configured strategy
pub struct FlowEngine {
    config: FlowConfig,
    producer: Box<dyn FlowProducer>,
    events: Arc<dyn EventSink>,
}

impl FlowEngine {
    /// Create an engine reporting to `events`
    pub fn new(config: FlowConfig, events: Arc<dyn EventSink>) -> Self {
        let producer = producer_for(&config, events.clone());
        log::debug!("Flow engine using the {} producer", producer.kind());
        Self {
            config,
            producer,
            events,
        }
    }

    /// Create an engine that discards events
    pub fn with_config(config: FlowConfig) -> Self {
        Self::new(config, Arc::new(NullEventSink))
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn producer_kind(&self) -> ProducerKind {
        self.producer.kind()
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// Compile a tree into one runnable unit
    pub fn compile(&self, tree: Arc<TokenTree>) -> Result<BoxedUnit> {
        self.producer.compile(tree)
    }

    /// Compile and run a tree, observing `cancel`
    pub async fn execute(&self, tree: Arc<TokenTree>, cancel: &CancellationToken) -> Result<()> {
        let unit = self.compile(tree)?;
        unit.execute(cancel).await
    }

    /// Compile a tree and run it on the tokio runtime
    ///
    /// Compilation errors are returned here; run errors come out of
    /// [`RunHandle::wait`].
    pub fn start(&self, tree: Arc<TokenTree>) -> Result<RunHandle> {
        let unit = self.compile(tree)?;
        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();
        let join = tokio::spawn(async move { unit.execute(&run_cancel).await });
        Ok(RunHandle { cancel, join })
    }
}

/// Handle to a run spawned by [`FlowEngine::start`]
pub struct RunHandle {
    cancel: CancellationToken,
    join: JoinHandle<Result<()>>,
}

impl RunHandle {
    /// Signal the run's cancellation token
    ///
    /// The unit in flight observes it and the rest never start.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the run has ended
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// A clone of the run's cancellation token
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the run to end
    pub async fn wait(self) -> Result<()> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(FlowError::Join(e.to_string())),
        }
    }
}
