use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::NodeCatalog;
use crate::error::GraphError;
use crate::graph::{
    DOCUMENT_VERSION, NodeGroup, Position, Viewport, WorkflowDefinition, WorkflowEdge, WorkflowNode,
};

/// The in-memory graph as edited by the user. Owns structural integrity:
/// removing a node cascades to its incident edges, and `connect` rejects
/// incompatible socket types, double-connected inputs and cycle-forming
/// edges before anything is mutated.
pub struct GraphDocument {
    catalog: Arc<NodeCatalog>,
    name: String,
    description: Option<String>,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    groups: Vec<NodeGroup>,
    viewport: Viewport,
}

impl GraphDocument {
    pub fn new(catalog: Arc<NodeCatalog>, name: &str) -> Self {
        Self {
            catalog,
            name: name.to_string(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            groups: Vec::new(),
            viewport: Viewport::default(),
        }
    }

    /// Builds a document from a definition, rejecting it wholesale if any
    /// structural check fails.
    pub fn from_definition(
        catalog: Arc<NodeCatalog>,
        definition: WorkflowDefinition,
    ) -> Result<Self, GraphError> {
        let mut document = Self::new(catalog, &definition.name);
        document.replace(definition)?;
        Ok(document)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    pub fn groups(&self) -> &[NodeGroup] {
        &self.groups
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn add_node(
        &mut self,
        id: &str,
        node_type: &str,
        position: Position,
    ) -> Result<(), GraphError> {
        if self.node(id).is_some() {
            return Err(GraphError::DuplicateNode(id.to_string()));
        }
        let definition = self
            .catalog
            .definition(node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node_type.to_string()))?;

        self.nodes.push(WorkflowNode {
            id: id.to_string(),
            node_type: node_type.to_string(),
            position,
            config: definition.default_config.clone(),
        });
        Ok(())
    }

    /// Removes a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<(), GraphError> {
        if self.node(id).is_none() {
            return Err(GraphError::UnknownNode(id.to_string()));
        }
        self.nodes.retain(|n| n.id != id);
        self.edges.retain(|e| e.source != id && e.target != id);
        Ok(())
    }

    pub fn set_config(&mut self, id: &str, key: &str, value: Value) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.config.insert(key.to_string(), value);
        Ok(())
    }

    /// Connects an output socket to an input socket, returning the new
    /// edge id. Nothing is added if any check fails.
    pub fn connect(
        &mut self,
        source: &str,
        source_socket: &str,
        target: &str,
        target_socket: &str,
    ) -> Result<String, GraphError> {
        let source_node = self
            .node(source)
            .ok_or_else(|| GraphError::UnknownNode(source.to_string()))?;
        let target_node = self
            .node(target)
            .ok_or_else(|| GraphError::UnknownNode(target.to_string()))?;

        // Node types were resolved at add_node time, so the definitions exist.
        let source_def = self
            .catalog
            .definition(&source_node.node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(source_node.node_type.clone()))?;
        let target_def = self
            .catalog
            .definition(&target_node.node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(target_node.node_type.clone()))?;

        let out_socket = source_def.output_socket(source_socket).ok_or_else(|| {
            GraphError::UnknownSocket {
                node: source.to_string(),
                side: "output",
                socket: source_socket.to_string(),
            }
        })?;
        let in_socket = target_def.input_socket(target_socket).ok_or_else(|| {
            GraphError::UnknownSocket {
                node: target.to_string(),
                side: "input",
                socket: target_socket.to_string(),
            }
        })?;

        if !out_socket.socket_type.is_compatible(in_socket.socket_type) {
            return Err(GraphError::IncompatibleSockets {
                output: out_socket.socket_type,
                input: in_socket.socket_type,
            });
        }

        if self
            .edges
            .iter()
            .any(|e| e.target == target && e.target_socket == target_socket)
        {
            return Err(GraphError::InputAlreadyConnected {
                node: target.to_string(),
                socket: target_socket.to_string(),
            });
        }

        // The edge source -> target closes a loop iff source is already
        // reachable from target.
        if source == target || self.reaches(target, source) {
            return Err(GraphError::CyclicConnection {
                from: source.to_string(),
                to: target.to_string(),
            });
        }

        let edge = WorkflowEdge {
            id: format!("edge-{}", Uuid::new_v4()),
            source: source.to_string(),
            target: target.to_string(),
            source_socket: source_socket.to_string(),
            target_socket: target_socket.to_string(),
            source_type: out_socket.socket_type,
            target_type: in_socket.socket_type,
        };
        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(id)
    }

    pub fn disconnect(&mut self, edge_id: &str) -> Result<(), GraphError> {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != edge_id);
        if self.edges.len() == before {
            return Err(GraphError::UnknownEdge(edge_id.to_string()));
        }
        Ok(())
    }

    pub fn add_group(&mut self, group: NodeGroup) {
        self.groups.push(group);
    }

    pub fn remove_group(&mut self, group_id: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != group_id);
        self.groups.len() != before
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Snapshots the document for persistence or export.
    pub fn to_definition(&self) -> WorkflowDefinition {
        WorkflowDefinition {
            version: DOCUMENT_VERSION,
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            groups: self.groups.clone(),
            viewport: self.viewport,
        }
    }

    /// Swaps in a new definition. Validation runs first; on failure the
    /// current document is left untouched.
    pub fn replace(&mut self, definition: WorkflowDefinition) -> Result<(), GraphError> {
        validate_definition(&definition, &self.catalog)?;
        self.name = definition.name;
        self.description = definition.description;
        self.nodes = definition.nodes;
        self.edges = definition.edges;
        self.groups = definition.groups;
        self.viewport = definition.viewport;
        Ok(())
    }

    /// True if `to` is reachable from `from` along edge direction.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            for edge in self.edges.iter().filter(|e| e.source == current) {
                stack.push(&edge.target);
            }
        }
        false
    }
}

/// The single validation gate used by load and import: structural
/// integrity, socket typing, and acyclicity of a whole definition.
pub fn validate_definition(
    definition: &WorkflowDefinition,
    catalog: &NodeCatalog,
) -> Result<(), GraphError> {
    if definition.version != DOCUMENT_VERSION {
        return Err(GraphError::UnsupportedVersion(definition.version));
    }

    let mut ids = HashSet::new();
    for node in &definition.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(GraphError::DuplicateNode(node.id.clone()));
        }
        if !catalog.contains(&node.node_type) {
            return Err(GraphError::UnknownNodeType(node.node_type.clone()));
        }
    }

    let node_by_id: HashMap<&str, &WorkflowNode> =
        definition.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut connected_inputs = HashSet::new();
    for edge in &definition.edges {
        let source = node_by_id.get(edge.source.as_str()).ok_or_else(|| {
            GraphError::DanglingEdge {
                edge: edge.id.clone(),
                node: edge.source.clone(),
            }
        })?;
        let target = node_by_id.get(edge.target.as_str()).ok_or_else(|| {
            GraphError::DanglingEdge {
                edge: edge.id.clone(),
                node: edge.target.clone(),
            }
        })?;

        // contains() above guarantees these resolve
        let source_def = catalog
            .definition(&source.node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(source.node_type.clone()))?;
        let target_def = catalog
            .definition(&target.node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(target.node_type.clone()))?;

        let out_socket = source_def.output_socket(&edge.source_socket).ok_or_else(|| {
            GraphError::UnknownSocket {
                node: edge.source.clone(),
                side: "output",
                socket: edge.source_socket.clone(),
            }
        })?;
        let in_socket = target_def.input_socket(&edge.target_socket).ok_or_else(|| {
            GraphError::UnknownSocket {
                node: edge.target.clone(),
                side: "input",
                socket: edge.target_socket.clone(),
            }
        })?;

        if !out_socket.socket_type.is_compatible(in_socket.socket_type) {
            return Err(GraphError::IncompatibleSockets {
                output: out_socket.socket_type,
                input: in_socket.socket_type,
            });
        }

        if !connected_inputs.insert((edge.target.as_str(), edge.target_socket.as_str())) {
            return Err(GraphError::InputAlreadyConnected {
                node: edge.target.clone(),
                socket: edge.target_socket.clone(),
            });
        }
    }

    // Kahn pass over node ids; anything left unvisited sits on a cycle.
    let mut indegree: HashMap<&str, usize> =
        definition.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    for edge in &definition.edges {
        if let Some(count) = indegree.get_mut(edge.target.as_str()) {
            *count += 1;
        }
    }
    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0;
    while let Some(id) = queue.pop_front() {
        visited += 1;
        for edge in definition.edges.iter().filter(|e| e.source == id) {
            if let Some(count) = indegree.get_mut(edge.target.as_str()) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(edge.target.as_str());
                }
            }
        }
    }
    if visited != definition.nodes.len() {
        return Err(GraphError::CycleDetected);
    }

    Ok(())
}
