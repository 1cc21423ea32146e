use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use uuid::Uuid;
use anyhow::Result;

use crate::graph::WorkflowDefinition;
use crate::store::{WorkflowPatch, WorkflowRecord, WorkflowStore};

/// Redis-backed store: one JSON blob per record plus a per-owner id set.
pub struct RedisWorkflowStore {
    client: redis::Client,
}

impl RedisWorkflowStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub fn open(url: &str) -> Result<Self> {
        Ok(Self::new(redis::Client::open(url)?))
    }

    fn record_key(&self, id: Uuid) -> String {
        format!("atelier:workflow:{}", id)
    }

    fn owner_key(&self, owner_id: &str) -> String {
        format!("atelier:owner:{}:workflows", owner_id)
    }
}

#[async_trait]
impl WorkflowStore for RedisWorkflowStore {
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

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let serialized = serde_json::to_string(&record)?;
        let _: () = conn.set(self.record_key(record.id), serialized).await?;
        let _: () = conn
            .sadd(self.owner_key(owner_id), record.id.to_string())
            .await?;
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<WorkflowRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(self.record_key(id)).await?;

        if let Some(raw) = raw {
            let record: WorkflowRecord = serde_json::from_str(&raw)?;
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    async fn list(&self, owner_id: &str) -> Result<Vec<WorkflowRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ids: Vec<String> = conn.smembers(self.owner_key(owner_id)).await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let Ok(id) = id.parse::<Uuid>() else {
                continue;
            };
            let raw: Option<String> = conn.get(self.record_key(id)).await?;
            // A record may have been deleted between SMEMBERS and GET.
            if let Some(raw) = raw {
                if let Ok(record) = serde_json::from_str::<WorkflowRecord>(&raw) {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn update(&self, id: Uuid, patch: WorkflowPatch) -> Result<Option<WorkflowRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(self.record_key(id)).await?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let mut record: WorkflowRecord = serde_json::from_str(&raw)?;
        patch.apply(&mut record);

        let serialized = serde_json::to_string(&record)?;
        let _: () = conn.set(self.record_key(id), serialized).await?;
        Ok(Some(record))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(self.record_key(id)).await?;

        let Some(raw) = raw else {
            return Ok(false);
        };
        if let Ok(record) = serde_json::from_str::<WorkflowRecord>(&raw) {
            let _: () = conn
                .srem(self.owner_key(&record.owner_id), id.to_string())
                .await?;
        }
        let removed: usize = conn.del(self.record_key(id)).await?;
        Ok(removed > 0)
    }
}
