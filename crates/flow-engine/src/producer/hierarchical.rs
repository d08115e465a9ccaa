//! Hierarchical producer: a static plan of the whole tree.

use std::sync::Arc;

use super::plan::FlowPlan;
use super::{resolve_into, FlowProducer};
use crate::accumulator::FlowAccumulator;
use crate::config::{FlowConfig, ProducerKind};
use crate::error::Result;
use crate::events::EventSink;
use crate::token::{TokenId, TokenTree, VisitGuard};
use crate::unit::BoxedUnit;

/// Compiles a branching tree into a flat plan, pre-order and depth first
///
/// For each token: resolve it, then every child branch in order (each
/// branch with its own successor chain), then the token's successor. Each
/// token is resolved exactly once. Branch decisions are taken at compile
/// time; the plan never looks at runtime state again.
pub struct HierarchicalProducer {
    config: FlowConfig,
    events: Arc<dyn EventSink>,
}

impl HierarchicalProducer {
    /// Create a hierarchical producer
    pub fn new(config: FlowConfig, events: Arc<dyn EventSink>) -> Self {
        Self { config, events }
    }

    /// Resolve the whole tree into a plan
    pub fn plan(&self, tree: &TokenTree) -> Result<FlowPlan> {
        let mut accumulator = FlowAccumulator::new();
        let mut guard = VisitGuard::new(tree, self.config.max_tokens);

        self.visit(tree, tree.root()?, &mut guard, &mut accumulator)?;

        Ok(FlowPlan::new(
            ProducerKind::Hierarchical,
            accumulator,
            self.events.clone(),
            self.config.surface_failures,
        ))
    }

    /// Visit a branch: `start` and its successor chain
    fn visit(
        &self,
        tree: &TokenTree,
        start: TokenId,
        guard: &mut VisitGuard,
        accumulator: &mut FlowAccumulator,
    ) -> Result<()> {
        let mut cursor = Some(start);
        while let Some(current) = cursor {
            guard.visit(tree, current)?;
            resolve_into(tree, current, accumulator)?;

            for &child in tree.children(current)? {
                self.visit(tree, child, guard, accumulator)?;
            }

            cursor = tree.successor(current)?;
        }
        Ok(())
    }
}

impl FlowProducer for HierarchicalProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Hierarchical
    }

    fn compile(&self, tree: Arc<TokenTree>) -> Result<BoxedUnit> {
        Ok(Box::new(self.plan(&tree)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::events::{FlowEvent, NullEventSink, VecEventSink};
    use crate::producer::test_support::{branching, Journal, RecordingToken};
    use crate::unit::FlowUnit;
    use tokio_util::sync::CancellationToken;

    fn producer() -> HierarchicalProducer {
        HierarchicalProducer::new(FlowConfig::default(), Arc::new(NullEventSink))
    }

    #[tokio::test]
    async fn test_pre_order_plan() {
        let journal = Journal::default();
        let tree = branching(&journal);

        let plan = producer().plan(&tree).unwrap();
        assert_eq!(plan.labels(), vec!["r", "x", "x2", "y", "z"]);

        plan.execute(&CancellationToken::new()).await.unwrap();
        assert_eq!(journal.executed(), vec!["r", "x", "x2", "y", "z"]);
    }

    #[test]
    fn test_each_token_resolved_exactly_once() {
        let journal = Journal::default();
        let tree = branching(&journal);

        producer().plan(&tree).unwrap();
        for token in ["root", "a", "a2", "b", "s"] {
            assert_eq!(journal.resolves_of(token), 1, "token {}", token);
        }
    }

    #[tokio::test]
    async fn test_children_resolved_before_any_execution() {
        let journal = Journal::default();
        let mut tree = TokenTree::new();
        let root = tree.push(RecordingToken::new("root", &[], &journal));
        let a = tree.push(RecordingToken::new("A", &["x"], &journal));
        let b = tree.push(RecordingToken::new("B", &["y"], &journal));
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        producer()
            .plan(&tree)
            .unwrap()
            .execute(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            journal.entries(),
            vec!["resolve root", "resolve A", "resolve B", "exec x", "exec y"]
        );
    }

    #[tokio::test]
    async fn test_failure_in_branch_truncates_plan() {
        let journal = Journal::default();
        let sink = Arc::new(VecEventSink::new());
        let mut tree = TokenTree::new();
        let root = tree.push(RecordingToken::new("root", &["u1"], &journal));
        let a = tree.push(RecordingToken::new("a", &["u2"], &journal).failing_at("u2"));
        let b = tree.push(RecordingToken::new("b", &["u3"], &journal));
        let s = tree.push(RecordingToken::new("s", &["u4"], &journal));
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.set_successor(root, s).unwrap();

        let result = HierarchicalProducer::new(FlowConfig::default(), sink.clone())
            .plan(&tree)
            .unwrap()
            .execute(&CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert_eq!(journal.executed(), vec!["u1", "u2"]);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            FlowEvent::UnitFailed { unit, token, .. } if unit == "u2" && token == "a"
        )));
    }

    #[tokio::test]
    async fn test_cancel_before_start_runs_nothing() {
        let journal = Journal::default();
        let plan = producer().plan(&branching(&journal)).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = plan.execute(&cancel).await;

        assert!(matches!(result, Err(FlowError::Cancelled)));
        assert!(journal.executed().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_inside_branch_skips_the_rest() {
        let journal = Journal::default();
        let cancel = CancellationToken::new();
        let mut tree = TokenTree::new();
        let root = tree.push(RecordingToken::new("root", &["r"], &journal));
        let a = tree.push(
            RecordingToken::new("a", &["x1", "x2", "x3"], &journal).cancelling_at("x2", &cancel),
        );
        let b = tree.push(RecordingToken::new("b", &["y"], &journal));
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        let result = producer().plan(&tree).unwrap().execute(&cancel).await;

        assert!(matches!(result, Err(FlowError::Cancelled)));
        assert_eq!(journal.executed(), vec!["r", "x1", "x2"]);
    }

    #[test]
    fn test_shared_child_is_rejected() {
        let journal = Journal::default();
        let mut tree = TokenTree::new();
        let root = tree.push(RecordingToken::new("root", &[], &journal));
        let shared = tree.push(RecordingToken::new("shared", &["x"], &journal));
        tree.add_child(root, shared).unwrap();
        tree.add_child(root, shared).unwrap();

        let err = producer().plan(&tree).unwrap_err();
        assert!(matches!(err, FlowError::TokenRevisited { .. }));
    }

    #[test]
    fn test_token_limit() {
        let journal = Journal::default();
        let tree = branching(&journal);
        let producer = HierarchicalProducer::new(
            FlowConfig::default().max_tokens(3),
            Arc::new(NullEventSink),
        );

        assert!(matches!(
            producer.plan(&tree),
            Err(FlowError::TokenLimitExceeded(3))
        ));
    }

    #[test]
    fn test_resolve_failure_names_token() {
        let mut tree = TokenTree::new();
        tree.push(crate::token::FnToken::new(
            "broken",
            |_acc: &mut FlowAccumulator| Err(FlowError::MissingInput("condition".to_string())),
        ));

        match producer().plan(&tree) {
            Err(FlowError::ResolveFailed { token, .. }) => assert_eq!(token, "broken"),
            other => panic!("Expected ResolveFailed, got {:?}", other.map(|p| p.labels())),
        }
    }
}
