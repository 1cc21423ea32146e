use std::collections::HashMap;
use std::sync::Arc;
use serde_json::{Map, Value};

use crate::catalog::{NodeCatalog, SocketDefinition};
use crate::error::GraphError;
use crate::graph::{DOCUMENT_VERSION, WorkflowDefinition};
use crate::ops::NodeOperation;

pub type NodeIndex = usize;

/// Where one input socket gets its value at run time: an upstream output
/// socket when connected, the declared default otherwise.
#[derive(Clone)]
pub struct InputBinding {
    pub socket: SocketDefinition,
    pub source: Option<(NodeIndex, String)>,
}

pub struct PlanNode {
    pub id: String,
    pub type_id: String,
    /// Catalog defaults overlaid with the instance configuration.
    pub config: Map<String, Value>,
    pub inputs: Vec<InputBinding>,
    pub operation: Arc<dyn NodeOperation>,
    pub dependents: Vec<NodeIndex>,
    /// Number of incoming edges still unresolved at run start.
    pub dependencies: usize,
}

/// Compiled form of a definition: node ids flattened to indices, inputs
/// bound to their sources, dependency counts ready for scheduling.
pub struct ExecutionPlan {
    pub nodes: Vec<PlanNode>,
}

impl ExecutionPlan {
    pub fn compile(
        definition: &WorkflowDefinition,
        catalog: &NodeCatalog,
    ) -> Result<Self, GraphError> {
        if definition.version != DOCUMENT_VERSION {
            return Err(GraphError::UnsupportedVersion(definition.version));
        }

        // Pass 1: indexing
        let mut id_map: HashMap<&str, NodeIndex> = HashMap::new();
        for (index, node) in definition.nodes.iter().enumerate() {
            if id_map.insert(node.id.as_str(), index).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        // Pass 2: per-node shells with unbound inputs
        let mut nodes = Vec::with_capacity(definition.nodes.len());
        for node in &definition.nodes {
            let node_def = catalog
                .definition(&node.node_type)
                .ok_or_else(|| GraphError::UnknownNodeType(node.node_type.clone()))?;
            let operation = catalog
                .operation(&node.node_type)
                .ok_or_else(|| GraphError::UnknownNodeType(node.node_type.clone()))?;

            let mut config = node_def.default_config.clone();
            for (key, value) in &node.config {
                config.insert(key.clone(), value.clone());
            }

            let inputs = node_def
                .inputs
                .iter()
                .map(|socket| InputBinding {
                    socket: socket.clone(),
                    source: None,
                })
                .collect();

            nodes.push(PlanNode {
                id: node.id.clone(),
                type_id: node.node_type.clone(),
                config,
                inputs,
                operation,
                dependents: Vec::new(),
                dependencies: 0,
            });
        }

        // Pass 3: bind edges
        for edge in &definition.edges {
            let source = *id_map.get(edge.source.as_str()).ok_or_else(|| {
                GraphError::DanglingEdge {
                    edge: edge.id.clone(),
                    node: edge.source.clone(),
                }
            })?;
            let target = *id_map.get(edge.target.as_str()).ok_or_else(|| {
                GraphError::DanglingEdge {
                    edge: edge.id.clone(),
                    node: edge.target.clone(),
                }
            })?;

            let binding = nodes[target]
                .inputs
                .iter_mut()
                .find(|b| b.socket.id == edge.target_socket)
                .ok_or_else(|| GraphError::UnknownSocket {
                    node: edge.target.clone(),
                    side: "input",
                    socket: edge.target_socket.clone(),
                })?;
            if binding.source.is_some() {
                return Err(GraphError::InputAlreadyConnected {
                    node: edge.target.clone(),
                    socket: edge.target_socket.clone(),
                });
            }
            binding.source = Some((source, edge.source_socket.clone()));

            nodes[source].dependents.push(target);
            nodes[target].dependencies += 1;
        }

        let plan = Self { nodes };
        plan.check_acyclic()?;
        Ok(plan)
    }

    /// Kahn pass over the dependency counts; leftovers sit on a cycle.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut remaining: Vec<usize> = self.nodes.iter().map(|n| n.dependencies).collect();
        let mut queue: Vec<NodeIndex> = remaining
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(index, _)| index)
            .collect();
        let mut visited = 0;

        while let Some(index) = queue.pop() {
            visited += 1;
            for &dependent in &self.nodes[index].dependents {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        if visited != self.nodes.len() {
            return Err(GraphError::CycleDetected);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
