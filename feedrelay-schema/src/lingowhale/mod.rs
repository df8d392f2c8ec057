mod detail;
mod feed;

pub use detail::{EntryDetailData, EntryDetailResponse, UrlInfo};
pub use feed::{
    FeedListItem, FeedSubscriptionData, FeedSubscriptionRequest, FeedSubscriptionResponse,
};

/// Domain code signalling success on every LingoWhale endpoint.
pub const CODE_OK: i64 = 0;

/// Domain code returned by the detail endpoint when the session headers are no longer valid.
pub const CODE_CREDENTIAL_INVALID: i64 = 22003;
