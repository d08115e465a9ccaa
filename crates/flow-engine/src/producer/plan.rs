//! Precomputed execution plans.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::run::RunReporter;
use crate::accumulator::{AccumulatedUnit, FlowAccumulator};
use crate::config::ProducerKind;
use crate::error::{FlowError, Result};
use crate::events::EventSink;
use crate::unit::FlowUnit;

/// A flat list of units executed in order
///
/// Produced by the linear and hierarchical strategies. Executing the plan
/// never resolves tokens again. The units are handed over on the first
/// execution and dropped as they finish; executing the plan a second time
/// fails with [`FlowError::PlanConsumed`].
pub struct FlowPlan {
    label: String,
    kind: ProducerKind,
    labels: Vec<String>,
    units: Mutex<Option<Vec<AccumulatedUnit>>>,
    events: Arc<dyn EventSink>,
    surface_failures: bool,
}

impl FlowPlan {
    pub(super) fn new(
        kind: ProducerKind,
        accumulator: FlowAccumulator,
        events: Arc<dyn EventSink>,
        surface_failures: bool,
    ) -> Self {
        let units = accumulator.into_units();
        Self {
            label: format!("{}-plan", kind),
            kind,
            labels: units.iter().map(|u| u.label().to_string()).collect(),
            units: Mutex::new(Some(units)),
            events,
            surface_failures,
        }
    }

    /// Strategy that built the plan
    pub fn kind(&self) -> ProducerKind {
        self.kind
    }

    /// Unit labels in execution order
    pub fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    /// Number of units compiled into the plan
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the plan has no units
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether the plan has already been executed
    pub fn is_consumed(&self) -> bool {
        self.units.lock().is_none()
    }

    fn take_units(&self) -> Option<Vec<AccumulatedUnit>> {
        self.units.lock().take()
    }

    async fn run(
        &self,
        units: Vec<AccumulatedUnit>,
        reporter: &mut RunReporter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for entry in units {
            reporter.run_unit(entry.token(), entry.unit(), cancel).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for FlowPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowPlan")
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("units", &self.labels)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

#[async_trait]
impl FlowUnit for FlowPlan {
    fn label(&self) -> &str {
        &self.label
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<()> {
        let Some(units) = self.take_units() else {
            log::warn!("Plan '{}' was already executed", self.label);
            return Err(FlowError::PlanConsumed(self.label.clone()));
        };
        let mut reporter =
            RunReporter::start(self.kind, self.events.clone(), self.surface_failures);
        let outcome = self.run(units, &mut reporter, cancel).await;
        reporter.finish(outcome)
    }
}
