//! Flow units, the smallest schedulable actions
//!
//! A unit is created while a token resolves, handed to a producer, and
//! executed at most once. Every unit receives the run's cancellation token
//! and must stop promptly once it fires.

use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{FlowError, Result};

/// An asynchronous, cancellable action with a diagnostic label
#[async_trait]
pub trait FlowUnit: Send + Sync {
    /// Human-readable label used in logs and events
    fn label(&self) -> &str;

    /// Run the action
    ///
    /// Implementations must return `Err(FlowError::Cancelled)` rather than
    /// `Ok(())` when they stop because `cancel` fired.
    async fn execute(&self, cancel: &CancellationToken) -> Result<()>;
}

/// Owned, type-erased unit
pub type BoxedUnit = Box<dyn FlowUnit>;

/// A unit backed by a closure returning a future
///
/// The closure is called with a clone of the run's cancellation token.
pub struct FnUnit<F> {
    label: String,
    run: F,
}

impl<F, Fut> FnUnit<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    /// Create a new closure-backed unit
    pub fn new(label: impl Into<String>, run: F) -> Self {
        Self {
            label: label.into(),
            run,
        }
    }
}

#[async_trait]
impl<F, Fut> FlowUnit for FnUnit<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn label(&self) -> &str {
        &self.label
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(FlowError::Cancelled);
        }
        (self.run)(cancel.clone()).await
    }
}

/// Box a closure-backed unit
pub fn unit_fn<F, Fut>(label: impl Into<String>, run: F) -> BoxedUnit
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Box::new(FnUnit::new(label, run))
}
