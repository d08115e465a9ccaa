//! End-to-end runs: graph -> token tree -> producer -> execution

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use flow_engine::{
    CancellationToken, FlowConfig, FlowEngine, FlowError, FlowEvent, FlowUnit, GraphBuilder,
    GraphModel, PortDataType, ProducerKind, VecEventSink,
};
use flow_nodes::{
    build_token_tree, AddNode, Blackboard, BranchNode, ConstantNode, DelayNode, FailNode,
    GetVariableNode, OutputLog, PrintNode, SetVariableNode,
};
use serde_json::json;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// set(flag = true) -> branch(flag) { true: "yes", false: "no" } -> "done"
///
/// The blackboard starts with `flag = false`.
fn branch_scenario(output: &OutputLog, blackboard: &Blackboard) -> Arc<GraphModel> {
    let graph = GraphBuilder::new("wf", "Branch on variable")
        .add_graph_node(ConstantNode::typed_node("t", PortDataType::Boolean))
        .add_graph_node(SetVariableNode::node("set"))
        .add_graph_node(GetVariableNode::node("get"))
        .add_graph_node(BranchNode::node("if"))
        .add_graph_node(ConstantNode::typed_node("yes_text", PortDataType::String))
        .add_graph_node(ConstantNode::typed_node("no_text", PortDataType::String))
        .add_graph_node(ConstantNode::typed_node("done_text", PortDataType::String))
        .add_graph_node(PrintNode::node("yes"))
        .add_graph_node(PrintNode::node("no"))
        .add_graph_node(PrintNode::node("done"))
        .connect("t", "t.value", "set", "set.value")
        .connect("get", "get.value", "if", "if.condition")
        .connect("yes_text", "yes_text.value", "yes", "yes.value")
        .connect("no_text", "no_text.value", "no", "no.value")
        .connect("done_text", "done_text.value", "done", "done.value")
        .connect("set", "set.next", "if", "if.exec")
        .connect("if", "if.true", "yes", "yes.exec")
        .connect("if", "if.false", "no", "no.exec")
        .connect("if", "if.next", "done", "done.exec")
        .build()
        .unwrap();

    blackboard.set("flag", json!(false));
    let model = GraphModel::new(graph)
        .with_context("t", ConstantNode::new(true))
        .with_context("set", SetVariableNode::new(blackboard.clone(), "flag"))
        .with_context("get", GetVariableNode::new(blackboard.clone(), "flag"))
        .with_context("if", BranchNode::new())
        .with_context("yes_text", ConstantNode::new("yes"))
        .with_context("no_text", ConstantNode::new("no"))
        .with_context("done_text", ConstantNode::new("done"))
        .with_context("yes", PrintNode::new(output.clone()))
        .with_context("no", PrintNode::new(output.clone()))
        .with_context("done", PrintNode::new(output.clone()));
    assert!(model.validate().is_ok());
    Arc::new(model)
}

async fn run_branch_scenario(kind: ProducerKind) -> (Vec<String>, Blackboard) {
    init_logging();
    let output = OutputLog::new();
    let blackboard = Blackboard::new();
    let model = branch_scenario(&output, &blackboard);
    let tree = build_token_tree(&model, "set").unwrap();

    FlowEngine::with_config(FlowConfig::with_producer(kind))
        .execute(Arc::new(tree), &CancellationToken::new())
        .await
        .unwrap();

    (output.lines(), blackboard)
}

#[tokio::test]
async fn test_immediate_branch_sees_runtime_state() {
    let (lines, blackboard) = run_branch_scenario(ProducerKind::Immediate).await;
    assert_eq!(lines, vec!["yes", "done"]);
    assert_eq!(blackboard.get("flag"), Some(json!(true)));
}

#[tokio::test]
async fn test_hierarchical_branch_decided_at_compile_time() {
    let (lines, blackboard) = run_branch_scenario(ProducerKind::Hierarchical).await;
    assert_eq!(lines, vec!["no", "done"]);
    assert_eq!(blackboard.get("flag"), Some(json!(true)));
}

#[tokio::test]
async fn test_linear_ignores_branches() {
    let (lines, _) = run_branch_scenario(ProducerKind::Linear).await;
    assert_eq!(lines, vec!["done"]);
}

#[tokio::test]
async fn test_shared_upstream_is_evaluated_per_read() {
    init_logging();
    let output = OutputLog::new();
    let add = AddNode::new();
    let evaluations = add.evaluations();

    let graph = GraphBuilder::new("wf", "Shared sum")
        .add_graph_node(ConstantNode::typed_node("x", PortDataType::Number))
        .add_graph_node(ConstantNode::typed_node("y", PortDataType::Number))
        .add_graph_node(AddNode::node("add"))
        .add_graph_node(PrintNode::node("p1"))
        .add_graph_node(PrintNode::node("p2"))
        .connect("x", "x.value", "add", "add.a")
        .connect("y", "y.value", "add", "add.b")
        .connect("add", "add.sum", "p1", "p1.value")
        .connect("add", "add.sum", "p2", "p2.value")
        .connect("p1", "p1.next", "p2", "p2.exec")
        .build()
        .unwrap();
    let model = Arc::new(
        GraphModel::new(graph)
            .with_context("x", ConstantNode::new(2))
            .with_context("y", ConstantNode::new(3))
            .with_context("add", add)
            .with_context("p1", PrintNode::new(output.clone()))
            .with_context("p2", PrintNode::new(output.clone())),
    );

    let tree = build_token_tree(&model, "p1").unwrap();
    FlowEngine::with_config(FlowConfig::default())
        .execute(Arc::new(tree), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.lines(), vec!["5.0", "5.0"]);
    assert_eq!(evaluations.load(Ordering::SeqCst), 2);
}

fn fail_scenario(output: &OutputLog) -> Arc<GraphModel> {
    let graph = GraphBuilder::new("wf", "Abort")
        .add_graph_node(ConstantNode::typed_node("text", PortDataType::String))
        .add_graph_node(PrintNode::node("before"))
        .add_graph_node(FailNode::node("abort"))
        .add_graph_node(PrintNode::node("after"))
        .connect("text", "text.value", "before", "before.value")
        .connect("text", "text.value", "after", "after.value")
        .connect("before", "before.next", "abort", "abort.exec")
        .connect("abort", "abort.next", "after", "after.exec")
        .build()
        .unwrap();
    Arc::new(
        GraphModel::new(graph)
            .with_context("text", ConstantNode::new("line"))
            .with_context("before", PrintNode::new(output.clone()))
            .with_context("abort", FailNode::new("aborted by graph"))
            .with_context("after", PrintNode::new(output.clone())),
    )
}

#[tokio::test]
async fn test_failure_is_reported_not_raised() {
    init_logging();
    for kind in [
        ProducerKind::Linear,
        ProducerKind::Hierarchical,
        ProducerKind::Immediate,
    ] {
        let output = OutputLog::new();
        let sink = Arc::new(VecEventSink::new());
        let model = fail_scenario(&output);
        let tree = build_token_tree(&model, "before").unwrap();

        let result = FlowEngine::new(FlowConfig::with_producer(kind), sink.clone())
            .execute(Arc::new(tree), &CancellationToken::new())
            .await;

        assert!(result.is_ok(), "{} producer raised {:?}", kind, result);
        assert_eq!(output.lines(), vec!["line"], "{} producer", kind);
        assert!(sink.events().iter().any(|e| matches!(
            e,
            FlowEvent::UnitFailed { unit, error, .. }
                if unit == "abort" && error.contains("aborted by graph")
        )));
    }
}

#[tokio::test]
async fn test_failure_surfaces_when_configured() {
    let output = OutputLog::new();
    let model = fail_scenario(&output);
    let tree = build_token_tree(&model, "before").unwrap();
    let config = FlowConfig::from_json_str(r#"{"producer": "immediate", "surfaceFailures": true}"#)
        .unwrap();

    let result = FlowEngine::with_config(config)
        .execute(Arc::new(tree), &CancellationToken::new())
        .await;

    match result {
        Err(FlowError::UnitFailed { unit, .. }) => assert_eq!(unit, "abort"),
        other => panic!("Expected UnitFailed, got {:?}", other),
    }
    assert_eq!(output.lines(), vec!["line"]);
}

#[tokio::test]
async fn test_stop_cancels_delay() {
    init_logging();
    let output = OutputLog::new();
    let sink = Arc::new(VecEventSink::new());

    let graph = GraphBuilder::new("wf", "Slow")
        .add_graph_node(ConstantNode::typed_node("text", PortDataType::String))
        .add_graph_node(DelayNode::node("wait"))
        .add_graph_node(PrintNode::node("late"))
        .connect("text", "text.value", "late", "late.value")
        .connect("wait", "wait.next", "late", "late.exec")
        .build()
        .unwrap();
    let model = Arc::new(
        GraphModel::new(graph)
            .with_context("text", ConstantNode::new("too late"))
            .with_context("wait", DelayNode::new(Duration::from_secs(60)))
            .with_context("late", PrintNode::new(output.clone())),
    );
    let tree = build_token_tree(&model, "wait").unwrap();

    let engine = FlowEngine::new(FlowConfig::default(), sink.clone());
    let handle = engine.start(Arc::new(tree)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.stop();

    let result = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("run did not stop");
    assert!(matches!(result, Err(FlowError::Cancelled)));
    assert!(output.lines().is_empty());
    assert!(matches!(
        sink.events().last(),
        Some(FlowEvent::RunCancelled { units_executed: 1, .. })
    ));
}

#[tokio::test]
async fn test_recompiling_unchanged_graph_yields_same_plan() {
    let output = OutputLog::new();
    let blackboard = Blackboard::new();
    let model = branch_scenario(&output, &blackboard);
    let engine = FlowEngine::with_config(FlowConfig::with_producer(ProducerKind::Hierarchical));

    let first = engine
        .compile(Arc::new(build_token_tree(&model, "set").unwrap()))
        .unwrap();
    let second = engine
        .compile(Arc::new(build_token_tree(&model, "set").unwrap()))
        .unwrap();

    first.execute(&CancellationToken::new()).await.unwrap();
    let first_lines = output.lines();
    output.clear();
    second.execute(&CancellationToken::new()).await.unwrap();

    assert_eq!(first_lines, output.lines());
}
