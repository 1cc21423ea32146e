use atelier::catalog::NodeCatalog;
use atelier::error::GraphError;
use atelier::graph::{GraphDocument, Position};
use atelier::ops::generation::GenerationClient;
use std::sync::Arc;
use std::time::Duration;

fn document() -> GraphDocument {
    let client = GenerationClient::new("http://127.0.0.1:7860", None, Duration::from_secs(5))
        .expect("client construction should not fail");
    GraphDocument::new(Arc::new(NodeCatalog::builtin(client)), "test")
}

#[test]
fn test_add_node_applies_default_config() {
    let mut doc = document();
    doc.add_node("settings", "generation-settings", Position::default())
        .expect("add");

    let node = doc.node("settings").expect("node");
    assert_eq!(node.config.get("width"), Some(&serde_json::json!(1024)));
}

#[test]
fn test_add_node_rejects_duplicates_and_unknown_types() {
    let mut doc = document();
    doc.add_node("a", "text-input", Position::default()).expect("add");

    let duplicate = doc.add_node("a", "text-input", Position::default());
    assert!(matches!(duplicate, Err(GraphError::DuplicateNode(_))));

    let unknown = doc.add_node("b", "does-not-exist", Position::default());
    assert!(matches!(unknown, Err(GraphError::UnknownNodeType(_))));
}

#[test]
fn test_connect_and_cascade_removal() {
    let mut doc = document();
    doc.add_node("prompt", "text-input", Position::default()).expect("add");
    doc.add_node("image", "generate-image", Position::new(200.0, 0.0))
        .expect("add");

    let edge_id = doc
        .connect("prompt", "text", "image", "prompt")
        .expect("connect");
    assert_eq!(doc.edges().len(), 1);
    assert_eq!(doc.edges()[0].id, edge_id);

    // Removing a node takes its incident edges with it
    doc.remove_node("prompt").expect("remove");
    assert!(doc.node("prompt").is_none());
    assert!(doc.edges().is_empty());
}

#[test]
fn test_connect_rejects_incompatible_socket_types() {
    let mut doc = document();
    doc.add_node("prompt", "text-input", Position::default()).expect("add");
    doc.add_node("out", "image-output", Position::default()).expect("add");

    let result = doc.connect("prompt", "text", "out", "image");
    assert!(matches!(result, Err(GraphError::IncompatibleSockets { .. })));
    assert!(doc.edges().is_empty(), "no edge may be added on rejection");
}

#[test]
fn test_connect_rejects_unknown_socket() {
    let mut doc = document();
    doc.add_node("prompt", "text-input", Position::default()).expect("add");
    doc.add_node("image", "generate-image", Position::default()).expect("add");

    let result = doc.connect("prompt", "nope", "image", "prompt");
    assert!(matches!(
        result,
        Err(GraphError::UnknownSocket { side: "output", .. })
    ));
}

#[test]
fn test_connect_rejects_second_connection_into_same_input() {
    let mut doc = document();
    doc.add_node("a", "text-input", Position::default()).expect("add");
    doc.add_node("b", "text-input", Position::default()).expect("add");
    doc.add_node("image", "generate-image", Position::default()).expect("add");

    doc.connect("a", "text", "image", "prompt").expect("first connection");
    let second = doc.connect("b", "text", "image", "prompt");
    assert!(matches!(second, Err(GraphError::InputAlreadyConnected { .. })));
    assert_eq!(doc.edges().len(), 1);
}

#[test]
fn test_connect_rejects_cycles() {
    let mut doc = document();
    doc.add_node("t1", "text-template", Position::default()).expect("add");
    doc.add_node("t2", "text-template", Position::default()).expect("add");

    doc.connect("t1", "text", "t2", "a").expect("forward edge");

    let back = doc.connect("t2", "text", "t1", "a");
    assert!(matches!(back, Err(GraphError::CyclicConnection { .. })));

    let self_loop = doc.connect("t1", "text", "t1", "b");
    assert!(matches!(self_loop, Err(GraphError::CyclicConnection { .. })));

    assert_eq!(doc.edges().len(), 1);
}

#[test]
fn test_disconnect() {
    let mut doc = document();
    doc.add_node("prompt", "text-input", Position::default()).expect("add");
    doc.add_node("image", "generate-image", Position::default()).expect("add");

    let edge_id = doc
        .connect("prompt", "text", "image", "prompt")
        .expect("connect");
    doc.disconnect(&edge_id).expect("disconnect");
    assert!(doc.edges().is_empty());

    let missing = doc.disconnect(&edge_id);
    assert!(matches!(missing, Err(GraphError::UnknownEdge(_))));
}
