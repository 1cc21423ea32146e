pub mod engine;
pub mod plan;
pub mod report;

pub use engine::{CancelToken, Engine};
pub use plan::{ExecutionPlan, NodeIndex};
pub use report::{ExecutionReport, NodeRunState, NodeStatus};
