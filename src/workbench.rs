use std::path::Path;
use std::sync::Arc;
use anyhow::{Result, anyhow};
use tracing::info;
use uuid::Uuid;

use crate::catalog::NodeCatalog;
use crate::graph::GraphDocument;
use crate::store::{WorkflowPatch, WorkflowRecord, WorkflowStore};
use crate::transfer;

/// Editing-session glue between the in-memory document and the store:
/// save/load/rename/delete on the persisted record, import/export on
/// files. Store failures surface to the caller; nothing retries.
pub struct Workbench {
    catalog: Arc<NodeCatalog>,
    store: Arc<dyn WorkflowStore>,
    document: GraphDocument,
    current_id: Option<Uuid>,
}

impl Workbench {
    pub fn new(catalog: Arc<NodeCatalog>, store: Arc<dyn WorkflowStore>) -> Self {
        let document = GraphDocument::new(catalog.clone(), "untitled");
        Self {
            catalog,
            store,
            document,
            current_id: None,
        }
    }

    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut GraphDocument {
        &mut self.document
    }

    /// Id of the persisted record backing the current document, if saved.
    pub fn current_id(&self) -> Option<Uuid> {
        self.current_id
    }

    /// Creates the record on first save, updates it afterwards.
    pub async fn save(&mut self, owner_id: &str) -> Result<WorkflowRecord> {
        let definition = self.document.to_definition();
        match self.current_id {
            Some(id) => {
                let patch = WorkflowPatch {
                    name: Some(definition.name.clone()),
                    definition: Some(definition),
                    ..WorkflowPatch::default()
                };
                self.store
                    .update(id, patch)
                    .await?
                    .ok_or_else(|| anyhow!("workflow {} no longer exists", id))
            }
            None => {
                let record = self.store.create(owner_id, definition).await?;
                info!(id = %record.id, name = %record.name, "workflow created");
                self.current_id = Some(record.id);
                Ok(record)
            }
        }
    }

    /// Replaces the in-memory graph with a stored workflow. The current
    /// document is kept when the record is missing or fails validation.
    pub async fn load(&mut self, id: Uuid) -> Result<()> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("workflow {} not found", id))?;
        self.document.replace(record.definition)?;
        self.document.set_name(&record.name);
        self.current_id = Some(id);
        Ok(())
    }

    /// Renames the persisted record only; the document keeps its content.
    pub async fn rename(&mut self, name: &str) -> Result<()> {
        let id = self
            .current_id
            .ok_or_else(|| anyhow!("no saved workflow to rename"))?;
        self.store
            .update(id, WorkflowPatch::rename(name))
            .await?
            .ok_or_else(|| anyhow!("workflow {} no longer exists", id))?;
        self.document.set_name(name);
        Ok(())
    }

    pub async fn delete(&mut self) -> Result<bool> {
        let id = self
            .current_id
            .ok_or_else(|| anyhow!("no saved workflow to delete"))?;
        let removed = self.store.delete(id).await?;
        self.current_id = None;
        Ok(removed)
    }

    pub fn export_file(&self, path: &Path) -> Result<()> {
        transfer::export_to_file(&self.document.to_definition(), path)
    }

    /// Loads a document file into the session. Rejected files leave the
    /// current graph unchanged; an accepted one starts unsaved.
    pub fn import_file(&mut self, path: &Path) -> Result<()> {
        let definition = transfer::import_from_file(path, &self.catalog)?;
        self.document.replace(definition)?;
        self.current_id = None;
        Ok(())
    }
}
