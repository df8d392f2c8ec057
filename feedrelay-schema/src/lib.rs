pub mod cloudflare;
pub mod coze;
pub mod feishu;
pub mod lingowhale;

mod lax;

pub use cloudflare::{CfEnvelope, CfMessage, D1QueryRequest, D1QueryResult};
pub use coze::{WorkflowRunRequest, WorkflowRunResponse};
pub use feishu::FeishuCardMessage;
pub use lingowhale::{
    EntryDetailData, EntryDetailResponse, FeedListItem, FeedSubscriptionData,
    FeedSubscriptionRequest, FeedSubscriptionResponse, UrlInfo,
};
