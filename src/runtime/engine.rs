use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use anyhow::Result;
use tokio::sync::mpsc;
use uuid::Uuid;
use tracing::{info, warn};

use crate::catalog::NodeCatalog;
use crate::graph::WorkflowDefinition;
use crate::ops::SocketValues;
use crate::runtime::plan::{ExecutionPlan, NodeIndex, PlanNode};
use crate::runtime::report::{ExecutionReport, NodeRunState, NodeStatus};

/// Best-effort stop signal. Cancelling halts issuance of nodes that have
/// not started; operations already in flight are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Dependency-ordered executor. A node is spawned as its own task the
/// moment all of its inputs are resolved, so independent branches overlap
/// on I/O; the only ordering constraint is the edge structure itself.
/// All run bookkeeping is owned by the scheduling loop; spawned tasks
/// report back over a channel.
pub struct Engine {
    catalog: Arc<NodeCatalog>,
}

impl Engine {
    pub fn new(catalog: Arc<NodeCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn run(&self, definition: &WorkflowDefinition) -> Result<ExecutionReport> {
        self.run_with_cancel(definition, CancelToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        definition: &WorkflowDefinition,
        cancel: CancelToken,
    ) -> Result<ExecutionReport> {
        let plan = ExecutionPlan::compile(definition, &self.catalog)?;
        let run_id = Uuid::new_v4();
        let total = plan.len();
        info!(%run_id, workflow = %definition.name, nodes = total, "run started");

        let mut statuses = vec![NodeStatus::Queued; total];
        let mut errors: Vec<Option<String>> = vec![None; total];
        let mut outputs: Vec<Option<SocketValues>> = vec![None; total];
        let mut remaining: Vec<usize> = plan.nodes.iter().map(|n| n.dependencies).collect();

        let mut ready: VecDeque<NodeIndex> = remaining
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(index, _)| index)
            .collect();

        let (tx, mut rx) = mpsc::channel::<(NodeIndex, Result<SocketValues>)>(total.max(1));
        let mut in_flight = 0usize;

        loop {
            while let Some(index) = ready.pop_front() {
                if statuses[index] != NodeStatus::Queued {
                    continue;
                }
                if cancel.is_cancelled() {
                    statuses[index] = NodeStatus::Skipped;
                    continue;
                }

                match resolve_inputs(&plan.nodes[index], &outputs) {
                    Ok(inputs) => {
                        statuses[index] = NodeStatus::Running;
                        in_flight += 1;
                        let operation = plan.nodes[index].operation.clone();
                        let config = plan.nodes[index].config.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let result = operation.run(&inputs, &config).await;
                            // Receiver only drops after the loop exits, and
                            // it never exits with tasks in flight.
                            let _ = tx.send((index, result)).await;
                        });
                    }
                    Err(message) => {
                        warn!(node = %plan.nodes[index].id, error = %message, "node failed before start");
                        statuses[index] = NodeStatus::Error;
                        errors[index] = Some(message);
                        skip_descendants(index, &plan, &mut statuses);
                    }
                }
            }

            if in_flight == 0 {
                break;
            }
            let Some((index, result)) = rx.recv().await else {
                break;
            };
            in_flight -= 1;

            match result {
                Ok(values) => {
                    statuses[index] = NodeStatus::Success;
                    outputs[index] = Some(values);
                    for &dependent in &plan.nodes[index].dependents {
                        remaining[dependent] -= 1;
                        if remaining[dependent] == 0 && statuses[dependent] == NodeStatus::Queued {
                            ready.push_back(dependent);
                        }
                    }
                }
                Err(error) => {
                    warn!(node = %plan.nodes[index].id, error = %error, "node failed");
                    statuses[index] = NodeStatus::Error;
                    errors[index] = Some(error.to_string());
                    skip_descendants(index, &plan, &mut statuses);
                }
            }
        }

        // Nodes never handed to the ready queue (cancelled mid-run) end as skipped.
        for status in statuses.iter_mut() {
            if *status == NodeStatus::Queued {
                *status = NodeStatus::Skipped;
            }
        }

        let completed = statuses.iter().filter(|s| **s == NodeStatus::Success).count();
        let errored = statuses.iter().filter(|s| **s == NodeStatus::Error).count();
        let skipped = statuses.iter().filter(|s| **s == NodeStatus::Skipped).count();
        info!(%run_id, completed, errored, skipped, "run finished");

        let mut nodes = HashMap::with_capacity(total);
        for (index, plan_node) in plan.nodes.iter().enumerate() {
            nodes.insert(
                plan_node.id.clone(),
                NodeRunState {
                    status: statuses[index],
                    error: errors[index].take(),
                    outputs: outputs[index].take(),
                },
            );
        }

        Ok(ExecutionReport {
            run_id,
            nodes,
            completed,
            errored,
            skipped,
        })
    }
}

/// Resolves every input socket of a node from upstream outputs or
/// declared defaults. A required input with neither fails the node
/// without invoking its operation.
fn resolve_inputs(
    node: &PlanNode,
    outputs: &[Option<SocketValues>],
) -> Result<SocketValues, String> {
    let mut values = SocketValues::new();
    for binding in &node.inputs {
        match &binding.source {
            Some((source, socket)) => {
                match outputs[*source].as_ref().and_then(|o| o.get(socket)) {
                    Some(value) => {
                        values.insert(binding.socket.id.clone(), value.clone());
                    }
                    None => {
                        return Err(format!(
                            "upstream output '{}' produced no value",
                            socket
                        ));
                    }
                }
            }
            None => match &binding.socket.default {
                Some(value) => {
                    values.insert(binding.socket.id.clone(), value.clone());
                }
                None if binding.socket.required => {
                    return Err(format!(
                        "required input '{}' is not connected and has no default",
                        binding.socket.id
                    ));
                }
                None => {}
            },
        }
    }
    Ok(values)
}

/// Marks everything downstream of a failed node as skipped. Only queued
/// nodes can be affected: a descendant by definition has not started.
fn skip_descendants(index: NodeIndex, plan: &ExecutionPlan, statuses: &mut [NodeStatus]) {
    let mut stack: Vec<NodeIndex> = plan.nodes[index].dependents.clone();
    while let Some(current) = stack.pop() {
        if statuses[current] == NodeStatus::Queued {
            statuses[current] = NodeStatus::Skipped;
            stack.extend(plan.nodes[current].dependents.iter().copied());
        }
    }
}
