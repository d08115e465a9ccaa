//! Per-run bookkeeping shared by the producers' compiled units.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ProducerKind;
use crate::error::{FlowError, Result};
use crate::events::{EventSink, FlowEvent};
use crate::unit::FlowUnit;

/// Tracks one execution of a compiled unit and reports it
pub(super) struct RunReporter {
    run_id: String,
    events: Arc<dyn EventSink>,
    executed: usize,
    surface_failures: bool,
}

impl RunReporter {
    /// Begin a run and announce it
    pub(super) fn start(
        kind: ProducerKind,
        events: Arc<dyn EventSink>,
        surface_failures: bool,
    ) -> Self {
        let run_id = format!("flow-run-{}", uuid::Uuid::new_v4());
        log::debug!("Flow run {} started ({} producer)", run_id, kind);
        let reporter = Self {
            run_id,
            events,
            executed: 0,
            surface_failures,
        };
        reporter.emit(FlowEvent::RunStarted {
            run_id: reporter.run_id.clone(),
            producer: kind.to_string(),
        });
        reporter
    }

    /// Record that a token resolved during the run
    pub(super) fn token_resolved(&self, token: &str, units: usize) {
        self.emit(FlowEvent::TokenResolved {
            run_id: self.run_id.clone(),
            token: token.to_string(),
            units,
        });
    }

    /// Execute one unit
    ///
    /// Refuses to start once `cancel` has fired. A failure is reported and
    /// returned wrapped with the unit's and token's identity.
    pub(super) async fn run_unit(
        &mut self,
        token: &str,
        unit: &dyn FlowUnit,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(FlowError::Cancelled);
        }

        let label = unit.label();
        log::debug!("Flow run {}: executing unit '{}'", self.run_id, label);
        self.emit(FlowEvent::UnitStarted {
            run_id: self.run_id.clone(),
            unit: label.to_string(),
            token: token.to_string(),
        });
        self.executed += 1;

        match unit.execute(cancel).await {
            Ok(()) => {
                self.emit(FlowEvent::UnitCompleted {
                    run_id: self.run_id.clone(),
                    unit: label.to_string(),
                    token: token.to_string(),
                });
                Ok(())
            }
            Err(e) if e.is_cancelled() => Err(FlowError::Cancelled),
            Err(e) => {
                self.emit(FlowEvent::UnitFailed {
                    run_id: self.run_id.clone(),
                    unit: label.to_string(),
                    token: token.to_string(),
                    error: e.to_string(),
                });
                Err(FlowError::unit_failed(label, token, e))
            }
        }
    }

    /// Close the run and decide what the caller sees
    pub(super) fn finish(self, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => {
                log::debug!(
                    "Flow run {} completed ({} units)",
                    self.run_id,
                    self.executed
                );
                self.completed();
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                log::warn!(
                    "Flow run {} cancelled after {} units",
                    self.run_id,
                    self.executed
                );
                self.emit(FlowEvent::RunCancelled {
                    run_id: self.run_id.clone(),
                    units_executed: self.executed,
                });
                Err(FlowError::Cancelled)
            }
            Err(e) => {
                log::error!("Flow run {} stopped: {}", self.run_id, e);
                if self.surface_failures {
                    self.emit(FlowEvent::RunFailed {
                        run_id: self.run_id.clone(),
                        units_executed: self.executed,
                        error: e.to_string(),
                    });
                    Err(e)
                } else {
                    self.completed();
                    Ok(())
                }
            }
        }
    }

    fn completed(&self) {
        self.emit(FlowEvent::RunCompleted {
            run_id: self.run_id.clone(),
            units_executed: self.executed,
        });
    }

    fn emit(&self, event: FlowEvent) {
        let _ = self.events.send(event);
    }
}
