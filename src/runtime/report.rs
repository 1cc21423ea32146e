use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::ops::SocketValues;

/// Lifecycle of one node within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Idle,
    Queued,
    Running,
    Success,
    Error,
    Skipped,
}

/// Terminal state of one node after a run.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRunState {
    pub status: NodeStatus,
    pub error: Option<String>,
    /// Produced values keyed by output socket id.
    pub outputs: Option<SocketValues>,
}

/// Outcome of one execution pass. Run-scoped; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub nodes: HashMap<String, NodeRunState>,
    pub completed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl ExecutionReport {
    pub fn status(&self, node_id: &str) -> Option<NodeStatus> {
        self.nodes.get(node_id).map(|n| n.status)
    }

    pub fn error(&self, node_id: &str) -> Option<&str> {
        self.nodes.get(node_id).and_then(|n| n.error.as_deref())
    }

    pub fn outputs(&self, node_id: &str) -> Option<&SocketValues> {
        self.nodes.get(node_id).and_then(|n| n.outputs.as_ref())
    }
}
