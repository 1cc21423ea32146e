use atelier::catalog::{NodeCatalog, NodeCategory, NodeDefinition, SocketDefinition, SocketType};
use atelier::graph::builder::GraphBuilder;
use atelier::ops::generation::GenerationClient;
use atelier::ops::{NodeOperation, SocketValues};
use atelier::runtime::{Engine, NodeStatus};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use anyhow::{Result, anyhow};

#[derive(Debug)]
struct EmitOp;

#[async_trait]
impl NodeOperation for EmitOp {
    async fn run(&self, _inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues> {
        let mut out = SocketValues::new();
        out.insert(
            "text".to_string(),
            config.get("text").cloned().unwrap_or(json!("")),
        );
        Ok(out)
    }
}

#[derive(Debug)]
struct ConcatOp;

#[async_trait]
impl NodeOperation for ConcatOp {
    async fn run(&self, inputs: &SocketValues, _config: &Map<String, Value>) -> Result<SocketValues> {
        let a = inputs.get("a").and_then(|v| v.as_str()).unwrap_or("");
        let b = inputs.get("b").and_then(|v| v.as_str()).unwrap_or("");
        let mut out = SocketValues::new();
        out.insert("text".to_string(), json!(format!("{}{}", a, b)));
        Ok(out)
    }
}

#[derive(Debug)]
struct FailOp;

#[async_trait]
impl NodeOperation for FailOp {
    async fn run(&self, _inputs: &SocketValues, _config: &Map<String, Value>) -> Result<SocketValues> {
        Err(anyhow!("generation backend exploded"))
    }
}

/// Counts invocations so tests can assert an operation never ran.
#[derive(Debug)]
struct SinkOp {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl NodeOperation for SinkOp {
    async fn run(&self, inputs: &SocketValues, _config: &Map<String, Value>) -> Result<SocketValues> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.clone())
    }
}

fn test_catalog(sink_calls: Arc<AtomicUsize>) -> Arc<NodeCatalog> {
    let mut catalog = NodeCatalog::new();

    catalog.register(
        NodeDefinition::new("emit", "Emit", NodeCategory::Input)
            .output(SocketDefinition::optional("text", "Text", SocketType::Text))
            .config_default("text", json!("")),
        Arc::new(EmitOp),
    );
    catalog.register(
        NodeDefinition::new("concat", "Concat", NodeCategory::Utility)
            .input(SocketDefinition::required("a", "A", SocketType::Text))
            .input(SocketDefinition::optional("b", "B", SocketType::Text).with_default(json!("-")))
            .output(SocketDefinition::optional("text", "Text", SocketType::Text)),
        Arc::new(ConcatOp),
    );
    catalog.register(
        NodeDefinition::new("fail", "Fail", NodeCategory::Processing)
            .output(SocketDefinition::optional("text", "Text", SocketType::Text)),
        Arc::new(FailOp),
    );
    catalog.register(
        NodeDefinition::new("sink", "Sink", NodeCategory::Output)
            .input(SocketDefinition::required("text", "Text", SocketType::Text)),
        Arc::new(SinkOp { calls: sink_calls }),
    );

    Arc::new(catalog)
}

#[tokio::test]
async fn test_linear_execution_with_default_substitution() {
    let catalog = test_catalog(Arc::new(AtomicUsize::new(0)));
    let definition = GraphBuilder::new("linear")
        .node("source", "emit").config("text", "hello").build()
        .node("join", "concat").build()
        .node("end", "sink").build()
        .connect("source", "text", "join", "a")
        .connect("join", "text", "end", "text")
        .build(&catalog)
        .expect("build");

    let engine = Engine::new(catalog);
    let report = engine.run(&definition).await.expect("run");

    assert_eq!(report.completed, 3);
    assert_eq!(report.errored, 0);
    assert_eq!(report.skipped, 0);
    // The unconnected "b" input fell back to its declared default
    assert_eq!(
        report.outputs("join").and_then(|o| o.get("text")),
        Some(&json!("hello-"))
    );
    assert_eq!(report.status("end"), Some(NodeStatus::Success));
}

#[tokio::test]
async fn test_failure_skips_downstream_chain() {
    let catalog = test_catalog(Arc::new(AtomicUsize::new(0)));
    // a -> b -> c, with a failing
    let definition = GraphBuilder::new("chain")
        .node("a", "fail").build()
        .node("b", "concat").build()
        .node("c", "concat").build()
        .connect("a", "text", "b", "a")
        .connect("b", "text", "c", "a")
        .build(&catalog)
        .expect("build");

    let engine = Engine::new(catalog);
    let report = engine.run(&definition).await.expect("run");

    assert_eq!(report.status("a"), Some(NodeStatus::Error));
    assert_eq!(report.status("b"), Some(NodeStatus::Skipped));
    assert_eq!(report.status("c"), Some(NodeStatus::Skipped));
    assert_eq!(report.errored, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.completed, 0);
    assert!(report.error("a").expect("message").contains("exploded"));
}

#[tokio::test]
async fn test_independent_branches_are_isolated() {
    let calls = Arc::new(AtomicUsize::new(0));
    let catalog = test_catalog(calls.clone());
    let definition = GraphBuilder::new("branches")
        .node("bad", "fail").build()
        .node("bad-sink", "sink").build()
        .node("good", "emit").config("text", "ok").build()
        .node("good-sink", "sink").build()
        .connect("bad", "text", "bad-sink", "text")
        .connect("good", "text", "good-sink", "text")
        .build(&catalog)
        .expect("build");

    let engine = Engine::new(catalog);
    let report = engine.run(&definition).await.expect("run");

    assert_eq!(report.status("bad"), Some(NodeStatus::Error));
    assert_eq!(report.status("bad-sink"), Some(NodeStatus::Skipped));
    assert_eq!(report.status("good"), Some(NodeStatus::Success));
    assert_eq!(report.status("good-sink"), Some(NodeStatus::Success));
    assert_eq!(report.completed, 2);
    assert_eq!(report.errored, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "only the healthy sink ran");
}

#[tokio::test]
async fn test_missing_required_input_fails_without_invoking_operation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let catalog = test_catalog(calls.clone());
    // "sink" has a required, default-less input left unconnected
    let definition = GraphBuilder::new("unconnected")
        .node("end", "sink").build()
        .build(&catalog)
        .expect("build");

    let engine = Engine::new(catalog);
    let report = engine.run(&definition).await.expect("run");

    assert_eq!(report.status("end"), Some(NodeStatus::Error));
    assert_eq!(report.errored, 1);
    assert!(report.error("end").expect("message").contains("required input"));
    assert_eq!(calls.load(Ordering::SeqCst), 0, "operation must not be invoked");
}

#[tokio::test]
async fn test_builtin_utility_pipeline() {
    let client = GenerationClient::new("http://127.0.0.1:7860", None, Duration::from_secs(5))
        .expect("client construction should not fail");
    let catalog = Arc::new(NodeCatalog::builtin(client));

    let definition = GraphBuilder::new("utilities")
        .node("subject", "text-input").config("text", "lighthouse").build()
        .node("style", "text-input").config("text", "watercolor").build()
        .node("prompt", "text-template")
            .config("template", "a {b} painting of a {a}")
            .build()
        .node("seen", "text-output").build()
        .node("x", "number-input").config("value", 6).build()
        .node("y", "number-input").config("value", 7).build()
        .node("product", "math-expression").config("expression", "a * b").build()
        .connect("subject", "text", "prompt", "a")
        .connect("style", "text", "prompt", "b")
        .connect("prompt", "text", "seen", "text")
        .connect("x", "value", "product", "a")
        .connect("y", "value", "product", "b")
        .build(&catalog)
        .expect("build");

    let engine = Engine::new(catalog);
    let report = engine.run(&definition).await.expect("run");

    assert_eq!(report.errored, 0);
    assert_eq!(
        report.outputs("prompt").and_then(|o| o.get("text")),
        Some(&json!("a watercolor painting of a lighthouse"))
    );
    assert_eq!(
        report.outputs("product").and_then(|o| o.get("value")),
        Some(&json!(42))
    );
}
