//! Paginated feed ingestion.
//!
//! - `item.rs`: list entries, full items, page request/response shapes
//! - `source.rs`: [`FeedSource`] and its HTTP implementation
//! - `detail.rs`: [`ItemDetailSource`] and its HTTP implementation
//! - `walker.rs`: [`FeedWalker`], cursor loop with the stop-at-first-seen rule

mod detail;
mod item;
mod source;
mod walker;

pub use detail::{ItemDetailSource, LingoDetailClient, SESSION_HEADER_KEYS};
pub use item::{FeedEntry, FeedFilter, FeedItem, FeedPage, ItemDetail, PageRequest};
pub use source::{FeedSource, LingoFeedClient};
pub use walker::{FeedWalker, WalkStop, WalkSummary};
