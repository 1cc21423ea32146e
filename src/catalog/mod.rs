pub mod builtin;
pub mod socket;

use std::collections::HashMap;
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

use crate::ops::NodeOperation;
pub use socket::SocketType;

/// Typed input or output port declared by a node kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketDefinition {
    pub id: String,
    pub label: String,
    pub socket_type: SocketType,
    pub required: bool,
    /// Substituted when an input is left unconnected.
    pub default: Option<Value>,
}

impl SocketDefinition {
    pub fn required(id: &str, label: &str, socket_type: SocketType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            socket_type,
            required: true,
            default: None,
        }
    }

    pub fn optional(id: &str, label: &str, socket_type: SocketType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            socket_type,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Input,
    Processing,
    Output,
    Utility,
}

/// Immutable template describing one node kind. Defined at registration
/// time, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub type_id: String,
    pub label: String,
    pub category: NodeCategory,
    pub inputs: Vec<SocketDefinition>,
    pub outputs: Vec<SocketDefinition>,
    pub default_config: Map<String, Value>,
}

impl NodeDefinition {
    pub fn new(type_id: &str, label: &str, category: NodeCategory) -> Self {
        Self {
            type_id: type_id.to_string(),
            label: label.to_string(),
            category,
            inputs: Vec::new(),
            outputs: Vec::new(),
            default_config: Map::new(),
        }
    }

    pub fn input(mut self, socket: SocketDefinition) -> Self {
        self.inputs.push(socket);
        self
    }

    pub fn output(mut self, socket: SocketDefinition) -> Self {
        self.outputs.push(socket);
        self
    }

    pub fn config_default(mut self, key: &str, value: Value) -> Self {
        self.default_config.insert(key.to_string(), value);
        self
    }

    pub fn input_socket(&self, socket_id: &str) -> Option<&SocketDefinition> {
        self.inputs.iter().find(|s| s.id == socket_id)
    }

    pub fn output_socket(&self, socket_id: &str) -> Option<&SocketDefinition> {
        self.outputs.iter().find(|s| s.id == socket_id)
    }
}

struct CatalogEntry {
    definition: NodeDefinition,
    operation: Arc<dyn NodeOperation>,
}

/// Registry mapping node type ids to their definition and operation.
/// Populated once at startup, read-only afterwards. The palette lists
/// node kinds from here and the execution engine resolves inputs,
/// defaults and operations against it.
pub struct NodeCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl NodeCatalog {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, definition: NodeDefinition, operation: Arc<dyn NodeOperation>) {
        self.entries.insert(
            definition.type_id.clone(),
            CatalogEntry {
                definition,
                operation,
            },
        );
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.entries.contains_key(type_id)
    }

    pub fn definition(&self, type_id: &str) -> Option<&NodeDefinition> {
        self.entries.get(type_id).map(|e| &e.definition)
    }

    pub fn operation(&self, type_id: &str) -> Option<Arc<dyn NodeOperation>> {
        self.entries.get(type_id).map(|e| e.operation.clone())
    }

    /// All registered node kinds, for palette listings.
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.entries.values().map(|e| &e.definition)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NodeCatalog {
    fn default() -> Self {
        Self::new()
    }
}
