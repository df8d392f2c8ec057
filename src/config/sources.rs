use serde::{Deserialize, Serialize};

/// One feed subscription and the workflow parameters attached to its items.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SourceConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub channel_ids: Vec<String>,

    #[serde(default)]
    pub space_id: Option<String>,

    #[serde(default)]
    pub parent_wiki_token: Option<String>,
}
