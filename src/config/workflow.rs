use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// TOML: `workflow.api_base`. Default: `https://api.coze.cn/`.
    #[serde(default = "default_api_base")]
    pub api_base: Url,

    /// TOML: `workflow.workflow_id`. Required.
    #[serde(default)]
    pub workflow_id: String,

    /// Parallel enrichment calls. TOML: `workflow.concurrency`. Default: `8`.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Optional cap on enrichment calls per second. TOML: `workflow.workflow_tps`.
    #[serde(default)]
    pub workflow_tps: Option<u32>,

    /// Jobs buffered ahead of the workers before `submit` waits.
    /// TOML: `workflow.queue_capacity`. Default: `256`.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            workflow_id: String::new(),
            concurrency: default_concurrency(),
            workflow_tps: None,
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_api_base() -> Url {
    Url::parse("https://api.coze.cn/").expect("valid Coze API base URL")
}

fn default_concurrency() -> usize {
    8
}

fn default_queue_capacity() -> usize {
    256
}
