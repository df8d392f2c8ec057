mod workflow;

pub use workflow::{WorkflowRunRequest, WorkflowRunResponse};
