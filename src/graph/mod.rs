pub mod builder;
pub mod document;

use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

use crate::catalog::SocketType;

pub use document::{GraphDocument, validate_definition};

/// Schema version written into every exported document.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// One node placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Typed connection from an output socket to an input socket. The socket
/// types are checked when the edge is created and carried for display;
/// they are not re-validated at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_socket: String,
    pub target_socket: String,
    pub source_type: SocketType,
    pub target_type: SocketType,
}

/// Visual grouping of canvas nodes. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub position: Position,
    pub width: f64,
    pub height: f64,
}

/// Serializable workflow snapshot: the unit persisted to the store and
/// exchanged as a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub groups: Vec<NodeGroup>,
    #[serde(default)]
    pub viewport: Viewport,
}
