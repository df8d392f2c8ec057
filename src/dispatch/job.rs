use std::collections::BTreeMap;

/// Per-source workflow parameters attached to every job from that source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelParams {
    pub space_id: Option<String>,
    pub parent_wiki_token: Option<String>,
}

/// One enrichment request for a new feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchJob {
    pub entry_id: String,
    pub title: String,
    pub content: String,
    pub channel_params: ChannelParams,
}

impl DispatchJob {
    /// Workflow parameters with empty values removed.
    ///
    /// The endpoint rejects calls whose optional fields are all empty, so an empty map means
    /// the job must not be sent.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        [
            ("content", Some(self.content.as_str())),
            ("title", Some(self.title.as_str())),
            ("space_id", self.channel_params.space_id.as_deref()),
            (
                "parent_wiki_token",
                self.channel_params.parent_wiki_token.as_deref(),
            ),
        ]
        .into_iter()
        .filter_map(|(k, v)| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (k.to_string(), v.to_string()))
        })
        .collect()
    }
}
