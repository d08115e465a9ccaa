//! Flow accumulator
//!
//! Transient buffer that tokens append units into while they resolve. The
//! producer that owns the accumulator records which token is resolving so
//! every unit keeps a reference to the token that emitted it.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::unit::{unit_fn, BoxedUnit, FlowUnit};

/// A unit together with the label of the token that emitted it
pub struct AccumulatedUnit {
    token: String,
    unit: BoxedUnit,
}

impl AccumulatedUnit {
    /// Label of the emitting token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Label of the unit
    pub fn label(&self) -> &str {
        self.unit.label()
    }

    /// The unit itself
    pub fn unit(&self) -> &dyn FlowUnit {
        self.unit.as_ref()
    }
}

impl std::fmt::Debug for AccumulatedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumulatedUnit")
            .field("token", &self.token)
            .field("unit", &self.unit.label())
            .finish()
    }
}

/// Buffer of pending units, in emission order
#[derive(Debug, Default)]
pub struct FlowAccumulator {
    units: Vec<AccumulatedUnit>,
    current_token: String,
}

impl FlowAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit
    pub fn push(&mut self, unit: BoxedUnit) {
        self.units.push(AccumulatedUnit {
            token: self.current_token.clone(),
            unit,
        });
    }

    /// Append a closure-backed unit
    pub fn push_fn<F, Fut>(&mut self, label: impl Into<String>, run: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.push(unit_fn(label, run));
    }

    /// Number of pending units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no unit is pending
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Labels of the pending units, in order
    pub fn labels(&self) -> Vec<String> {
        self.units.iter().map(|u| u.label().to_string()).collect()
    }

    /// Drop every pending unit
    pub fn clear(&mut self) {
        self.units.clear();
    }

    /// Take every pending unit out, leaving the accumulator empty
    pub fn drain(&mut self) -> std::vec::Drain<'_, AccumulatedUnit> {
        self.units.drain(..)
    }

    /// Consume the accumulator, returning its units
    pub fn into_units(self) -> Vec<AccumulatedUnit> {
        self.units
    }

    /// Record which token the following pushes belong to
    pub(crate) fn begin_token(&mut self, label: &str) {
        self.current_token.clear();
        self.current_token.push_str(label);
    }
}
