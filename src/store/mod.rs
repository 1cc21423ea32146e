use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Serialize, Deserialize};
use uuid::Uuid;
use anyhow::Result;

use crate::graph::WorkflowDefinition;

pub mod redis_store;

/// Persisted workflow: a definition wrapped with ownership metadata.
/// Created on first save, updated on every save, deleted explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub definition: WorkflowDefinition,
    pub favorite: bool,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied by `WorkflowStore::update`. Absent fields are
/// left untouched; `updated_at` is always bumped.
#[derive(Debug, Clone, Default)]
pub struct WorkflowPatch {
    pub name: Option<String>,
    pub definition: Option<WorkflowDefinition>,
    pub favorite: Option<bool>,
    pub thumbnail: Option<Option<String>>,
}

impl WorkflowPatch {
    pub fn rename(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_definition(definition: WorkflowDefinition) -> Self {
        Self {
            definition: Some(definition),
            ..Self::default()
        }
    }

    pub fn favorite(favorite: bool) -> Self {
        Self {
            favorite: Some(favorite),
            ..Self::default()
        }
    }

    fn apply(self, record: &mut WorkflowRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(definition) = self.definition {
            record.definition = definition;
        }
        if let Some(favorite) = self.favorite {
            record.favorite = favorite;
        }
        if let Some(thumbnail) = self.thumbnail {
            record.thumbnail = thumbnail;
        }
        record.updated_at = Utc::now();
    }
}

/// The persistence collaborator. `get` and `update` return `None` for an
/// unknown id, `delete` reports whether anything was removed; backend
/// failures surface through `Result`.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create(&self, owner_id: &str, definition: WorkflowDefinition) -> Result<WorkflowRecord>;
    async fn get(&self, id: Uuid) -> Result<Option<WorkflowRecord>>;
    /// All workflows of one owner, most recently updated first.
    async fn list(&self, owner_id: &str) -> Result<Vec<WorkflowRecord>>;
    async fn update(&self, id: Uuid, patch: WorkflowPatch) -> Result<Option<WorkflowRecord>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// In-process store used in standalone mode and tests.
pub struct MemoryWorkflowStore {
    records: DashMap<Uuid, WorkflowRecord>,
}

impl MemoryWorkflowStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for MemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    async fn create(&self, owner_id: &str, definition: WorkflowDefinition) -> Result<WorkflowRecord> {
        let now = Utc::now();
        let record = WorkflowRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            name: definition.name.clone(),
            definition,
            favorite: false,
            thumbnail: None,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkflowRecord>> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self, owner_id: &str) -> Result<Vec<WorkflowRecord>> {
        let mut records: Vec<WorkflowRecord> = self
            .records
            .iter()
            .filter(|r| r.value().owner_id == owner_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn update(&self, id: Uuid, patch: WorkflowPatch) -> Result<Option<WorkflowRecord>> {
        if let Some(mut record) = self.records.get_mut(&id) {
            patch.apply(record.value_mut());
            Ok(Some(record.value().clone()))
        } else {
            Ok(None)
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }
}
