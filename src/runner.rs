use crate::alert::{self, AlertSink};
use crate::config::{Config, SourceConfig};
use crate::dispatch::{
    ChannelParams, CozeWorkflowClient, DispatchJob, DispatchReport, Dispatcher,
    DispatcherSettings, WorkflowEndpoint,
};
use crate::error::RelayError;
use crate::feed::{
    FeedEntry, FeedFilter, FeedItem, FeedSource, FeedWalker, ItemDetailSource, LingoDetailClient,
    LingoFeedClient, WalkSummary,
};
use crate::http::{BROWSER_USER_AGENT, build_http_client};
use crate::store::{DedupLedger, Stores};
use crate::token::{self, OauthTokenAuthority, TokenManager};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

const SOURCE_CREDENTIAL_INVALID_TITLE: &str = "Feed source credential invalid";

/// Collaborators wired together for one run.
#[derive(Clone)]
pub struct RelayComponents {
    pub tokens: Arc<TokenManager>,
    pub feed: Arc<dyn FeedSource>,
    pub detail: Arc<dyn ItemDetailSource>,
    pub endpoint: Arc<dyn WorkflowEndpoint>,
    pub ledger: Arc<dyn DedupLedger>,
    pub alerts: Arc<dyn AlertSink>,
}

impl RelayComponents {
    /// Builds the production collaborators for `cfg`.
    ///
    /// The feed endpoints get a browser user agent; every other upstream gets the crate one.
    pub async fn from_config(cfg: &Config) -> Result<Self, RelayError> {
        let api_http = build_http_client(&cfg.basic, concat!("feedrelay/", env!("CARGO_PKG_VERSION")))?;
        let feed_http = build_http_client(&cfg.basic, BROWSER_USER_AGENT)?;

        let stores = Stores::from_config(cfg, api_http.clone()).await?;
        let alerts = alert::from_config(&cfg.alert, api_http.clone());
        let authority = Arc::new(OauthTokenAuthority::new(&cfg.token, api_http.clone())?);
        let tokens = Arc::new(TokenManager::new(
            stores.credentials.clone(),
            authority,
            token::lock_from_config(&cfg.token),
            alerts.clone(),
            cfg.token.refresh_token_key.clone(),
        ));

        Ok(Self {
            tokens,
            feed: Arc::new(LingoFeedClient::new(cfg.feed.feed_url.clone(), feed_http.clone())),
            detail: Arc::new(LingoDetailClient::new(
                cfg.feed.detail_url.clone(),
                stores.credentials,
                feed_http,
            )),
            endpoint: Arc::new(CozeWorkflowClient::new(
                &cfg.workflow.api_base,
                &cfg.workflow.workflow_id,
                api_http,
            )?),
            ledger: stores.ledger,
            alerts,
        })
    }
}

/// Run-shaping knobs lifted out of [`Config`].
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub sources: Vec<SourceConfig>,
    pub sort_type: i64,
    pub page_size: u32,
    pub default_channel_id: String,
    pub default_entry_type: i64,
    pub dispatcher: DispatcherSettings,
}

impl From<&Config> for RunSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            sources: cfg.sources.clone(),
            sort_type: cfg.feed.sort_type,
            page_size: cfg.feed.page_size,
            default_channel_id: cfg.feed.default_channel_id.clone(),
            default_entry_type: cfg.feed.default_entry_type,
            dispatcher: DispatcherSettings::from(&cfg.workflow),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub walk: WalkSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub sources: Vec<SourceReport>,
    pub dispatch: DispatchReport,
}

/// One pass over every configured source: walk, fetch details, dispatch, drain.
pub struct RelayRunner {
    components: RelayComponents,
    settings: RunSettings,
}

impl RelayRunner {
    pub fn new(components: RelayComponents, settings: RunSettings) -> Self {
        Self {
            components,
            settings,
        }
    }

    pub async fn run(&self) -> Result<RunReport, RelayError> {
        let run_id = Uuid::new_v4();
        self.run_inner(run_id)
            .instrument(info_span!("run", run_id = %run_id))
            .await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<RunReport, RelayError> {
        info!(sources = self.settings.sources.len(), "Relay run started");

        self.components.tokens.current_credential().await?;

        let dispatcher = Dispatcher::spawn(
            self.settings.dispatcher,
            self.components.endpoint.clone(),
            self.components.tokens.clone(),
            self.components.ledger.clone(),
            self.components.alerts.clone(),
        );
        let walker = FeedWalker::new(
            self.components.feed.clone(),
            self.components.ledger.clone(),
            self.settings.sort_type,
            self.settings.page_size,
        );
        let source_alerted = AtomicBool::new(false);

        let mut sources = Vec::with_capacity(self.settings.sources.len());
        let mut fatal = None;

        for source in &self.settings.sources {
            let filter = self.filter_for(source);
            let params = ChannelParams {
                space_id: source.space_id.clone(),
                parent_wiki_token: source.parent_wiki_token.clone(),
            };

            let dispatcher = &dispatcher;
            let params = &params;
            let source_alerted = &source_alerted;
            let walked = walker
                .walk("", &filter, move |entry| {
                    self.deliver(entry, params, dispatcher, source_alerted)
                })
                .instrument(info_span!("source", source = %source.name))
                .await;

            match walked {
                Ok(walk) => {
                    info!(
                        source = %source.name,
                        pages = walk.pages_fetched,
                        delivered = walk.delivered,
                        stop = ?walk.stop,
                        "Source walk finished"
                    );
                    sources.push(SourceReport {
                        name: source.name.clone(),
                        walk,
                    });
                }
                Err(e) => {
                    error!(source = %source.name, error = %e, "Fatal error; skipping remaining sources");
                    fatal = Some(e);
                    break;
                }
            }
        }

        let dispatch = dispatcher.shutdown(fatal.is_none()).await;
        if let Some(e) = fatal {
            return Err(e);
        }

        info!(
            completed = dispatch.completed,
            dropped = dispatch.dropped,
            "Relay run finished"
        );
        Ok(RunReport {
            run_id,
            sources,
            dispatch,
        })
    }

    fn filter_for(&self, source: &SourceConfig) -> FeedFilter {
        let channel_ids = if source.channel_ids.is_empty() {
            vec![self.settings.default_channel_id.clone()]
        } else {
            source.channel_ids.clone()
        };
        FeedFilter { channel_ids }
    }

    /// Fetches the body of a new entry and queues it for enrichment.
    ///
    /// A failed detail fetch leaves the entry out of the ledger so the next run picks it up.
    async fn deliver(
        &self,
        entry: FeedEntry,
        params: &ChannelParams,
        dispatcher: &Dispatcher,
        source_alerted: &AtomicBool,
    ) -> Result<(), RelayError> {
        let entry_type = entry.entry_type.unwrap_or(self.settings.default_entry_type);

        let detail = match self.components.detail.fetch_detail(&entry, entry_type).await {
            Ok(detail) => detail,
            Err(RelayError::SourceCredentialInvalid { code, message }) => {
                if !source_alerted.swap(true, Ordering::AcqRel) {
                    self.components.alerts.notify(
                        SOURCE_CREDENTIAL_INVALID_TITLE,
                        &format!(
                            "**Code**: {code}\n**Message**: {message}\n**Action**: refresh the LINGOWHALE_* session values in the credential store"
                        ),
                    );
                }
                warn!(entry_id = %entry.entry_id, code, "Feed session rejected; skipping entry");
                return Err(RelayError::SourceCredentialInvalid { code, message });
            }
            Err(e) => return Err(e),
        };

        let item = FeedItem::new(entry, entry_type, detail);
        let job = DispatchJob {
            entry_id: item.entry_id.clone(),
            content: item.content().to_string(),
            title: item.title,
            channel_params: params.clone(),
        };
        dispatcher.submit(job).await
    }
}
