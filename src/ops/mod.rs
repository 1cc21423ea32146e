use std::collections::HashMap;
use std::fmt::Debug;
use async_trait::async_trait;
use serde_json::{Map, Value};
use anyhow::Result;

pub mod builtin;
pub mod generation;

/// Values keyed by socket id, as consumed or produced by one node.
pub type SocketValues = HashMap<String, Value>;

/// The operation attached to a node kind: an outbound generation call for
/// processing nodes, a pure transform for everything else. One invocation
/// per node per run; the engine never retries.
#[async_trait]
pub trait NodeOperation: Send + Sync + Debug {
    async fn run(&self, inputs: &SocketValues, config: &Map<String, Value>) -> Result<SocketValues>;
}
