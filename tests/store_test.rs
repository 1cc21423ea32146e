use atelier::catalog::NodeCatalog;
use atelier::graph::Position;
use atelier::graph::builder::GraphBuilder;
use atelier::ops::generation::GenerationClient;
use atelier::store::{MemoryWorkflowStore, WorkflowPatch, WorkflowStore};
use atelier::workbench::Workbench;
use std::sync::Arc;
use std::time::Duration;
use serde_json::json;

fn catalog() -> Arc<NodeCatalog> {
    let client = GenerationClient::new("http://127.0.0.1:7860", None, Duration::from_secs(5))
        .expect("client construction should not fail");
    Arc::new(NodeCatalog::builtin(client))
}

fn sample_definition(catalog: &NodeCatalog, name: &str) -> atelier::graph::WorkflowDefinition {
    GraphBuilder::new(name)
        .node("prompt", "text-input").config("text", "a red fox").build()
        .node("image", "generate-image").build()
        .connect("prompt", "text", "image", "prompt")
        .build(catalog)
        .expect("build")
}

#[tokio::test]
async fn test_create_get_delete() {
    let catalog = catalog();
    let store = MemoryWorkflowStore::new();

    let record = store
        .create("user-1", sample_definition(&catalog, "fox"))
        .await
        .expect("create");
    assert_eq!(record.name, "fox");
    assert!(!record.favorite);

    let fetched = store.get(record.id).await.expect("get").expect("present");
    assert_eq!(fetched.definition, record.definition);

    assert!(store.delete(record.id).await.expect("delete"));
    assert!(!store.delete(record.id).await.expect("second delete"));
    assert!(store.get(record.id).await.expect("get").is_none());
}

#[tokio::test]
async fn test_rename_keeps_everything_else() {
    let catalog = catalog();
    let store = MemoryWorkflowStore::new();

    let record = store
        .create("user-1", sample_definition(&catalog, "draft"))
        .await
        .expect("create");

    store
        .update(record.id, WorkflowPatch::rename("final"))
        .await
        .expect("update")
        .expect("present");

    let reloaded = store.get(record.id).await.expect("get").expect("present");
    assert_eq!(reloaded.name, "final");
    assert_eq!(reloaded.definition, record.definition);
    assert_eq!(reloaded.owner_id, record.owner_id);
    assert_eq!(reloaded.favorite, record.favorite);
    assert_eq!(reloaded.created_at, record.created_at);
    assert!(reloaded.updated_at >= record.updated_at);
}

#[tokio::test]
async fn test_list_is_owner_scoped_and_newest_first() {
    let catalog = catalog();
    let store = MemoryWorkflowStore::new();

    let first = store
        .create("user-1", sample_definition(&catalog, "first"))
        .await
        .expect("create");
    let _other = store
        .create("user-2", sample_definition(&catalog, "other"))
        .await
        .expect("create");
    let second = store
        .create("user-1", sample_definition(&catalog, "second"))
        .await
        .expect("create");

    // Touching the older record moves it to the front
    store
        .update(first.id, WorkflowPatch::favorite(true))
        .await
        .expect("update")
        .expect("present");

    let listed = store.list("user-1").await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert!(listed[0].favorite);
    assert_eq!(listed[1].id, second.id);
}

#[tokio::test]
async fn test_update_unknown_id_returns_none() {
    let store = MemoryWorkflowStore::new();
    let missing = store
        .update(uuid::Uuid::new_v4(), WorkflowPatch::rename("ghost"))
        .await
        .expect("update");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_workbench_save_load_rename_delete() {
    let catalog = catalog();
    let store = Arc::new(MemoryWorkflowStore::new());
    let mut workbench = Workbench::new(catalog.clone(), store.clone());

    workbench.document_mut().set_name("studio piece");
    workbench
        .document_mut()
        .add_node("prompt", "text-input", Position::default())
        .expect("add");
    workbench
        .document_mut()
        .set_config("prompt", "text", json!("sunrise"))
        .expect("config");

    // First save creates, second save updates in place
    let record = workbench.save("user-1").await.expect("save");
    assert_eq!(workbench.current_id(), Some(record.id));
    workbench
        .document_mut()
        .add_node("image", "generate-image", Position::default())
        .expect("add");
    let updated = workbench.save("user-1").await.expect("save again");
    assert_eq!(updated.id, record.id);
    assert_eq!(updated.definition.nodes.len(), 2);

    workbench.rename("gallery piece").await.expect("rename");

    // A fresh session loads the renamed record by id
    let mut other = Workbench::new(catalog, store);
    other.load(record.id).await.expect("load");
    assert_eq!(other.document().name(), "gallery piece");
    assert_eq!(other.document().nodes().len(), 2);

    assert!(workbench.delete().await.expect("delete"));
    assert_eq!(workbench.current_id(), None);
    let gone = other.load(record.id).await;
    assert!(gone.is_err());
}
