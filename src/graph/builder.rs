use serde_json::{Map, Value};

use crate::catalog::NodeCatalog;
use crate::error::GraphError;
use crate::graph::{
    DOCUMENT_VERSION, Position, Viewport, WorkflowDefinition, WorkflowEdge, WorkflowNode,
};

/// Fluent construction of workflow definitions, mainly for tests and
/// programmatic callers. Socket types are resolved and the whole document
/// validated at `build` time.
pub struct GraphBuilder {
    name: String,
    description: Option<String>,
    nodes: Vec<WorkflowNode>,
    connections: Vec<(String, String, String, String)>,
}

impl GraphBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn node(self, id: &str, node_type: &str) -> NodeBuilder {
        NodeBuilder {
            graph_builder: self,
            id: id.to_string(),
            node_type: node_type.to_string(),
            position: Position::default(),
            config: Map::new(),
        }
    }

    pub fn connect(
        mut self,
        source: &str,
        source_socket: &str,
        target: &str,
        target_socket: &str,
    ) -> Self {
        self.connections.push((
            source.to_string(),
            source_socket.to_string(),
            target.to_string(),
            target_socket.to_string(),
        ));
        self
    }

    pub fn build(self, catalog: &NodeCatalog) -> Result<WorkflowDefinition, GraphError> {
        let mut edges = Vec::with_capacity(self.connections.len());
        for (index, (source, source_socket, target, target_socket)) in
            self.connections.into_iter().enumerate()
        {
            let source_node = self
                .nodes
                .iter()
                .find(|n| n.id == source)
                .ok_or_else(|| GraphError::UnknownNode(source.clone()))?;
            let target_node = self
                .nodes
                .iter()
                .find(|n| n.id == target)
                .ok_or_else(|| GraphError::UnknownNode(target.clone()))?;

            let source_def = catalog
                .definition(&source_node.node_type)
                .ok_or_else(|| GraphError::UnknownNodeType(source_node.node_type.clone()))?;
            let target_def = catalog
                .definition(&target_node.node_type)
                .ok_or_else(|| GraphError::UnknownNodeType(target_node.node_type.clone()))?;

            let out_socket = source_def.output_socket(&source_socket).ok_or_else(|| {
                GraphError::UnknownSocket {
                    node: source.clone(),
                    side: "output",
                    socket: source_socket.clone(),
                }
            })?;
            let in_socket = target_def.input_socket(&target_socket).ok_or_else(|| {
                GraphError::UnknownSocket {
                    node: target.clone(),
                    side: "input",
                    socket: target_socket.clone(),
                }
            })?;

            edges.push(WorkflowEdge {
                id: format!("edge-{}", index),
                source,
                target,
                source_socket,
                target_socket,
                source_type: out_socket.socket_type,
                target_type: in_socket.socket_type,
            });
        }

        let definition = WorkflowDefinition {
            version: DOCUMENT_VERSION,
            name: self.name,
            description: self.description,
            nodes: self.nodes,
            edges,
            groups: Vec::new(),
            viewport: Viewport::default(),
        };
        crate::graph::validate_definition(&definition, catalog)?;
        Ok(definition)
    }
}

pub struct NodeBuilder {
    graph_builder: GraphBuilder,
    id: String,
    node_type: String,
    position: Position,
    config: Map<String, Value>,
}

impl NodeBuilder {
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    pub fn build(mut self) -> GraphBuilder {
        self.graph_builder.nodes.push(WorkflowNode {
            id: self.id,
            node_type: self.node_type,
            position: self.position,
            config: self.config,
        });
        self.graph_builder
    }
}
