#![allow(dead_code)]

use async_trait::async_trait;
use feedrelay::alert::AlertSink;
use feedrelay::dispatch::{WorkflowEndpoint, WorkflowReceipt};
use feedrelay::error::{OauthError, RelayError, WorkflowError};
use feedrelay::feed::{FeedEntry, FeedPage, FeedSource, ItemDetail, ItemDetailSource, PageRequest};
use feedrelay::store::{CredentialStore, DedupLedger};
use feedrelay::token::{Credential, LocalRotationLock, TokenAuthority, TokenManager, TokenPair};
use reqwest::StatusCode;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

pub const REFRESH_KEY: &str = "COZE_LINGGO_REFRESH_TOKEN";

pub async fn spawn_test_server(app: axum::Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{}", addr)).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    base
}

pub fn entry(id: &str) -> FeedEntry {
    FeedEntry {
        entry_id: id.to_string(),
        entry_type: None,
        title: format!("title {id}"),
    }
}

pub fn page(ids: &[&str], next_cursor: &str) -> FeedPage {
    FeedPage {
        items: ids.iter().map(|id| entry(id)).collect(),
        next_cursor: next_cursor.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    pub fail_set: AtomicBool,
    pub sets: AtomicUsize,
}

impl MemoryStore {
    pub fn with(key: &str, value: &str) -> Arc<Self> {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Arc::new(store)
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RelayError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RelayError> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(RelayError::TransientRequest("store write rejected".to_string()));
        }
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryLedger {
    ids: Mutex<HashSet<String>>,
    pub fail_exists: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fatal_exists: AtomicBool,
    pub inserts: AtomicUsize,
}

impl MemoryLedger {
    pub fn seeded(ids: &[&str]) -> Arc<Self> {
        let ledger = Self::default();
        ledger
            .ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|s| s.to_string()));
        Arc::new(ledger)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.lock().unwrap().contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap().len()
    }
}

#[async_trait]
impl DedupLedger for MemoryLedger {
    async fn exists(&self, id: &str) -> Result<bool, RelayError> {
        if self.fatal_exists.load(Ordering::SeqCst) {
            return Err(RelayError::Configuration("ledger misconfigured".to_string()));
        }
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(RelayError::TransientRequest("ledger unavailable".to_string()));
        }
        Ok(self.contains(id))
    }

    async fn insert(&self, id: &str) -> Result<(), RelayError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(RelayError::TransientRequest("ledger unavailable".to_string()));
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.ids.lock().unwrap().insert(id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Feed and detail sources
// ---------------------------------------------------------------------------

/// Pages keyed by the cursor that requests them; unknown cursors fail.
#[derive(Default)]
pub struct ScriptedFeed {
    pages: Mutex<HashMap<String, FeedPage>>,
    pub requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedFeed {
    pub fn new(pages: Vec<(&str, FeedPage)>) -> Arc<Self> {
        let feed = Self::default();
        feed.pages
            .lock()
            .unwrap()
            .extend(pages.into_iter().map(|(c, p)| (c.to_string(), p)));
        Arc::new(feed)
    }

    pub fn cursors(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.cursor.clone())
            .collect()
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage, RelayError> {
        self.requests.lock().unwrap().push(request.clone());
        self.pages
            .lock()
            .unwrap()
            .get(&request.cursor)
            .cloned()
            .ok_or_else(|| {
                RelayError::TransientRequest(format!("no page for cursor {:?}", request.cursor))
            })
    }
}

#[derive(Debug, Clone)]
pub enum DetailReply {
    CredentialInvalid,
    Fail,
}

/// Returns `<p>{entry_id}</p>` unless a reply is scripted for the entry.
#[derive(Default)]
pub struct ScriptedDetail {
    replies: Mutex<HashMap<String, DetailReply>>,
    pub calls: Mutex<Vec<(String, i64)>>,
}

impl ScriptedDetail {
    pub fn new(replies: Vec<(&str, DetailReply)>) -> Arc<Self> {
        let detail = Self::default();
        detail
            .replies
            .lock()
            .unwrap()
            .extend(replies.into_iter().map(|(id, r)| (id.to_string(), r)));
        Arc::new(detail)
    }
}

#[async_trait]
impl ItemDetailSource for ScriptedDetail {
    async fn fetch_detail(&self, entry: &FeedEntry, entry_type: i64) -> Result<ItemDetail, RelayError> {
        self.calls
            .lock()
            .unwrap()
            .push((entry.entry_id.clone(), entry_type));
        let reply = self.replies.lock().unwrap().get(&entry.entry_id).cloned();
        match reply {
            None => Ok(ItemDetail {
                html_content: format!("<p>{}</p>", entry.entry_id),
                plain_content: entry.entry_id.clone(),
                ..Default::default()
            }),
            Some(DetailReply::CredentialInvalid) => Err(RelayError::SourceCredentialInvalid {
                code: 22003,
                message: "login expired".to_string(),
            }),
            Some(DetailReply::Fail) => Err(RelayError::TransientRequest("detail timeout".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Token authority
// ---------------------------------------------------------------------------

/// Issues `access-N`/`refresh-N` on the N-th exchange.
#[derive(Default)]
pub struct CountingAuthority {
    pub exchanges: AtomicUsize,
    pub seeds: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
}

impl CountingAuthority {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenAuthority for CountingAuthority {
    async fn exchange(&self, refresh_token: &str) -> Result<TokenPair, OauthError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.seeds.lock().unwrap().push(refresh_token.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(OauthError::Rejected {
                error: "invalid_grant".to_string(),
                description: None,
            });
        }
        let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TokenPair {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh-{n}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingAlerts {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingAlerts {
    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl AlertSink for RecordingAlerts {
    fn notify(&self, title: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Workflow endpoint
// ---------------------------------------------------------------------------

/// Rejects listed access tokens with 401 and listed titles with a non-auth API error.
#[derive(Default)]
pub struct ScriptedEndpoint {
    rejected_tokens: Mutex<HashSet<String>>,
    pub reject_all_tokens: AtomicBool,
    failing_titles: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<(String, BTreeMap<String, String>)>>,
    pub delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedEndpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn reject_token(self: &Arc<Self>, token: &str) -> Arc<Self> {
        self.rejected_tokens.lock().unwrap().insert(token.to_string());
        self.clone()
    }

    pub fn fail_title(self: &Arc<Self>, title: &str) -> Arc<Self> {
        self.failing_titles.lock().unwrap().insert(title.to_string());
        self.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn tokens_used(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl WorkflowEndpoint for ScriptedEndpoint {
    async fn run(
        &self,
        credential: &Credential,
        parameters: &BTreeMap<String, String>,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls
            .lock()
            .unwrap()
            .push((credential.access_token().to_string(), parameters.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let token = credential.access_token();
        if self.reject_all_tokens.load(Ordering::SeqCst)
            || self.rejected_tokens.lock().unwrap().contains(token)
        {
            return Err(WorkflowError::UpstreamStatus {
                status: StatusCode::UNAUTHORIZED,
                body: "token expired".to_string(),
            });
        }
        let title = parameters.get("title").cloned().unwrap_or_default();
        if self.failing_titles.lock().unwrap().contains(&title) {
            return Err(WorkflowError::Api {
                code: 4000,
                message: "invalid parameter".to_string(),
            });
        }
        Ok(WorkflowReceipt {
            execute_id: Some(format!("exec-{}", self.call_count())),
        })
    }
}

// ---------------------------------------------------------------------------
// Wiring helpers
// ---------------------------------------------------------------------------

pub fn token_manager(
    store: Arc<MemoryStore>,
    authority: Arc<CountingAuthority>,
    alerts: Arc<RecordingAlerts>,
) -> Arc<TokenManager> {
    Arc::new(TokenManager::new(
        store,
        authority,
        Arc::new(LocalRotationLock::new(Duration::from_secs(5))),
        alerts,
        REFRESH_KEY,
    ))
}
