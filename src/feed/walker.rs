use super::{FeedEntry, FeedFilter, FeedSource, PageRequest};
use crate::error::RelayError;
use crate::store::DedupLedger;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a walk stopped issuing page requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WalkStop {
    /// Hit an entry already in the ledger; everything after it is older.
    SeenItem { entry_id: String },
    /// The source returned an empty next cursor.
    #[default]
    EndOfFeed,
    EmptyPage,
    /// Page fetch or ledger lookup failed; the next run starts again from page one.
    Aborted { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages_fetched: usize,
    /// Entries handed to the callback.
    pub delivered: usize,
    /// Deliveries whose callback reported a non-fatal error.
    pub delivery_failures: usize,
    pub stop: WalkStop,
}

/// Sequential cursor walker over one feed source.
///
/// Pages are fetched strictly in cursor order and entries are classified in source order.
pub struct FeedWalker {
    source: Arc<dyn FeedSource>,
    ledger: Arc<dyn DedupLedger>,
    sort_type: i64,
    page_size: u32,
}

impl FeedWalker {
    pub fn new(
        source: Arc<dyn FeedSource>,
        ledger: Arc<dyn DedupLedger>,
        sort_type: i64,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            ledger,
            sort_type,
            page_size,
        }
    }

    /// Walks pages from `initial_cursor` until a seen entry, an empty cursor, or a failure.
    ///
    /// Every new entry preceding the first seen one is passed to `on_new_item` and awaited
    /// before the next lookup. Page-level failures end the walk quietly; only fatal errors
    /// (configuration, lock timeout) from the callback or the ledger are returned.
    pub async fn walk<F, Fut>(
        &self,
        initial_cursor: &str,
        filter: &FeedFilter,
        mut on_new_item: F,
    ) -> Result<WalkSummary, RelayError>
    where
        F: FnMut(FeedEntry) -> Fut,
        Fut: Future<Output = Result<(), RelayError>>,
    {
        let mut summary = WalkSummary::default();
        let mut cursor = initial_cursor.to_string();

        loop {
            let request = PageRequest {
                cursor: cursor.clone(),
                sort_type: self.sort_type,
                page_size: self.page_size,
                channel_ids: filter.channel_ids.clone(),
            };

            let page = match self.source.fetch_page(&request).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        cursor = %cursor,
                        error = %e,
                        transient = e.is_transient(),
                        "Feed page fetch failed; abandoning walk"
                    );
                    summary.stop = WalkStop::Aborted {
                        reason: e.to_string(),
                    };
                    return Ok(summary);
                }
            };
            summary.pages_fetched += 1;
            info!(
                cursor = %cursor,
                items = page.items.len(),
                next_cursor = %page.next_cursor,
                "Fetched feed page"
            );

            if page.items.is_empty() {
                summary.stop = WalkStop::EmptyPage;
                return Ok(summary);
            }

            for entry in page.items {
                let seen = match self.ledger.exists(&entry.entry_id).await {
                    Ok(seen) => seen,
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(
                            entry_id = %entry.entry_id,
                            title = %entry.title,
                            error = %e,
                            "Ledger lookup failed; abandoning walk"
                        );
                        summary.stop = WalkStop::Aborted {
                            reason: e.to_string(),
                        };
                        return Ok(summary);
                    }
                };

                if seen {
                    info!(entry_id = %entry.entry_id, title = %entry.title, "Already processed; stopping pagination");
                    summary.stop = WalkStop::SeenItem {
                        entry_id: entry.entry_id,
                    };
                    return Ok(summary);
                }

                info!(entry_id = %entry.entry_id, title = %entry.title, "New entry");
                let entry_id = entry.entry_id.clone();
                let title = entry.title.clone();
                summary.delivered += 1;

                match on_new_item(entry).await {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        summary.delivery_failures += 1;
                        warn!(entry_id = %entry_id, title = %title, error = %e, "Entry not dispatched");
                    }
                }
            }

            if page.next_cursor.is_empty() {
                summary.stop = WalkStop::EndOfFeed;
                return Ok(summary);
            }
            if page.next_cursor == cursor {
                warn!(cursor = %cursor, "Feed cursor did not advance; abandoning walk");
                summary.stop = WalkStop::Aborted {
                    reason: format!("cursor {cursor} did not advance"),
                };
                return Ok(summary);
            }

            debug!(next_cursor = %page.next_cursor, "Continuing to next page");
            cursor = page.next_cursor;
        }
    }
}
