mod common;

use common::{
    CountingAuthority, MemoryLedger, MemoryStore, REFRESH_KEY, RecordingAlerts, ScriptedEndpoint,
    token_manager,
};
use feedrelay::dispatch::{ChannelParams, DispatchJob, Dispatcher, DispatcherSettings};
use feedrelay::token::{LocalRotationLock, RotationLock, TokenManager};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn settings(concurrency: usize) -> DispatcherSettings {
    DispatcherSettings {
        concurrency,
        queue_capacity: 4,
        workflow_tps: None,
    }
}

fn job(id: &str) -> DispatchJob {
    DispatchJob {
        entry_id: id.to_string(),
        title: format!("title {id}"),
        content: format!("<p>{id}</p>"),
        channel_params: ChannelParams {
            space_id: Some("space-1".to_string()),
            parent_wiki_token: None,
        },
    }
}

fn spawn(
    settings: DispatcherSettings,
    endpoint: Arc<ScriptedEndpoint>,
    tokens: Arc<TokenManager>,
    ledger: Arc<MemoryLedger>,
) -> Dispatcher {
    Dispatcher::spawn(
        settings,
        endpoint,
        tokens,
        ledger,
        Arc::new(RecordingAlerts::default()),
    )
}

fn tokens_with(authority: Arc<CountingAuthority>) -> Arc<TokenManager> {
    token_manager(
        MemoryStore::with(REFRESH_KEY, "seed-0"),
        authority,
        Arc::default(),
    )
}

#[tokio::test]
async fn successful_jobs_are_recorded_with_filtered_parameters() {
    let endpoint = ScriptedEndpoint::new();
    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = spawn(
        settings(2),
        endpoint.clone(),
        tokens_with(CountingAuthority::new()),
        ledger.clone(),
    );

    dispatcher.submit(job("a")).await.expect("submit");
    dispatcher.submit(job("b")).await.expect("submit");
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.submitted, 2);
    assert_eq!(report.completed, 2);
    assert!(ledger.contains("a") && ledger.contains("b"));

    let calls = endpoint.calls.lock().unwrap();
    let (token, params) = &calls[0];
    assert_eq!(token, "access-1");
    assert_eq!(params.len(), 3);
    assert_eq!(params.get("space_id").map(String::as_str), Some("space-1"));
    assert!(!params.contains_key("parent_wiki_token"));
}

#[tokio::test]
async fn auth_failure_rotates_and_retries_with_the_fresh_credential() {
    let endpoint = ScriptedEndpoint::new().reject_token("access-1");
    let authority = CountingAuthority::new();
    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = spawn(
        settings(1),
        endpoint.clone(),
        tokens_with(authority.clone()),
        ledger.clone(),
    );

    dispatcher.submit(job("a")).await.expect("submit");
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.completed, 1);
    assert_eq!(endpoint.tokens_used(), vec!["access-1", "access-2"]);
    assert_eq!(authority.count(), 2);
    assert!(ledger.contains("a"));
}

#[tokio::test]
async fn persistent_auth_failure_stops_after_one_retry_without_recording() {
    let endpoint = ScriptedEndpoint::new();
    endpoint.reject_all_tokens.store(true, Ordering::SeqCst);
    let ledger = MemoryLedger::seeded(&[]);
    let alerts = Arc::new(RecordingAlerts::default());
    let dispatcher = Dispatcher::spawn(
        settings(1),
        endpoint.clone(),
        tokens_with(CountingAuthority::new()),
        ledger.clone(),
        alerts.clone(),
    );

    dispatcher.submit(job("a")).await.expect("submit");
    dispatcher.submit(job("b")).await.expect("submit");
    let report = dispatcher.shutdown(true).await;

    // "a" fails, rotates, and retries; "b" reuses the rotated credential and retries once too.
    assert_eq!(endpoint.call_count(), 4);
    assert_eq!(report.dropped, 2);
    assert_eq!(ledger.inserts.load(Ordering::SeqCst), 0);
    assert!(!ledger.contains("a"));
    assert_eq!(
        alerts.titles(),
        vec!["Workflow credential rejected after rotation"]
    );
}

#[tokio::test]
async fn simultaneous_auth_failures_trigger_a_single_rotation() {
    let endpoint =
        Arc::new(ScriptedEndpoint::slow(Duration::from_millis(10))).reject_token("access-1");
    let authority = CountingAuthority::slow(Duration::from_millis(20));
    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = spawn(
        settings(4),
        endpoint.clone(),
        tokens_with(authority.clone()),
        ledger.clone(),
    );

    for i in 0..10 {
        dispatcher.submit(job(&format!("e{i}"))).await.expect("submit");
    }
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.completed, 10);
    assert_eq!(authority.count(), 2, "initial exchange plus one forced rotation");
    assert_eq!(ledger.len(), 10);
    let calls = endpoint.call_count();
    assert!((10..=20).contains(&calls), "calls = {calls}");
    assert!(
        endpoint
            .tokens_used()
            .iter()
            .all(|t| t == "access-1" || t == "access-2")
    );
}

#[tokio::test]
async fn drain_finishes_every_submitted_job_within_the_concurrency_bound() {
    let endpoint = Arc::new(ScriptedEndpoint::slow(Duration::from_millis(5)));
    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = spawn(
        settings(3),
        endpoint.clone(),
        tokens_with(CountingAuthority::new()),
        ledger.clone(),
    );

    for i in 0..40 {
        dispatcher.submit(job(&format!("e{i}"))).await.expect("submit");
    }
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.submitted, 40);
    assert_eq!(report.completed, 40);
    assert_eq!(report.finished(), report.submitted);
    assert_eq!(ledger.len(), 40);
    assert!(endpoint.max_in_flight.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn job_with_only_empty_parameters_is_skipped_without_a_call() {
    let endpoint = ScriptedEndpoint::new();
    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = spawn(
        settings(1),
        endpoint.clone(),
        tokens_with(CountingAuthority::new()),
        ledger.clone(),
    );

    let empty = DispatchJob {
        entry_id: "blank".to_string(),
        title: String::new(),
        content: "  ".to_string(),
        channel_params: ChannelParams::default(),
    };
    dispatcher.submit(empty).await.expect("submit");
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.skipped, 1);
    assert_eq!(endpoint.call_count(), 0);
    assert!(!ledger.contains("blank"));
}

#[tokio::test]
async fn non_auth_failure_drops_the_job_without_rotation() {
    let endpoint = ScriptedEndpoint::new().fail_title("title bad");
    let authority = CountingAuthority::new();
    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = spawn(
        settings(2),
        endpoint.clone(),
        tokens_with(authority.clone()),
        ledger.clone(),
    );

    dispatcher.submit(job("bad")).await.expect("submit");
    dispatcher.submit(job("good")).await.expect("submit");
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.dropped, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(endpoint.call_count(), 2);
    assert_eq!(authority.count(), 1);
    assert!(!ledger.contains("bad"));
    assert!(ledger.contains("good"));
}

#[tokio::test]
async fn ledger_failure_after_enrichment_is_reported_as_unrecorded() {
    let endpoint = ScriptedEndpoint::new();
    let ledger = MemoryLedger::seeded(&[]);
    ledger.fail_insert.store(true, Ordering::SeqCst);
    let dispatcher = spawn(
        settings(1),
        endpoint.clone(),
        tokens_with(CountingAuthority::new()),
        ledger.clone(),
    );

    dispatcher.submit(job("a")).await.expect("submit");
    let report = dispatcher.shutdown(true).await;

    assert_eq!(endpoint.call_count(), 1);
    assert_eq!(report.unrecorded, 1);
    assert_eq!(report.completed, 0);
}

#[tokio::test]
async fn shutdown_without_drain_abandons_queued_jobs() {
    let endpoint = Arc::new(ScriptedEndpoint::slow(Duration::from_millis(100)));
    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = spawn(
        settings(1),
        endpoint.clone(),
        tokens_with(CountingAuthority::new()),
        ledger.clone(),
    );

    for i in 0..4 {
        dispatcher.submit(job(&format!("e{i}"))).await.expect("submit");
    }
    let report = dispatcher.shutdown(false).await;

    assert_eq!(report.submitted, 4);
    assert_eq!(report.finished(), 4);
    assert!(report.abandoned >= 3, "{report:?}");
    assert_eq!(report.completed, endpoint.call_count());
    assert_eq!(ledger.len(), report.completed);
}

#[tokio::test]
async fn failed_forced_rotation_drops_the_job_and_is_counted() {
    let endpoint = ScriptedEndpoint::new().reject_token("access-1");
    let authority = CountingAuthority::new();
    let tokens = tokens_with(authority.clone());
    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = spawn(settings(1), endpoint.clone(), tokens.clone(), ledger.clone());

    tokens.current_credential().await.expect("initial credential");
    // The authority rejects the rotated seed on the forced rotation.
    authority.fail.store(true, Ordering::SeqCst);

    dispatcher.submit(job("a")).await.expect("submit");
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.dropped, 1);
    assert_eq!(report.fatal_rotations, 0, "an OAuth rejection does not halt the run");
    assert_eq!(endpoint.call_count(), 1);
    assert!(!ledger.contains("a"));
}

#[tokio::test]
async fn lock_timeout_during_forced_rotation_is_counted_as_fatal() {
    let endpoint =
        Arc::new(ScriptedEndpoint::slow(Duration::from_millis(50))).reject_token("access-1");
    let lock = Arc::new(LocalRotationLock::new(Duration::from_millis(50)));
    let tokens = Arc::new(TokenManager::new(
        MemoryStore::with(REFRESH_KEY, "seed-0"),
        CountingAuthority::new(),
        lock.clone(),
        Arc::new(RecordingAlerts::default()),
        REFRESH_KEY,
    ));
    let dispatcher = spawn(
        settings(1),
        endpoint.clone(),
        tokens,
        MemoryLedger::seeded(&[]),
    );

    dispatcher.submit(job("a")).await.expect("submit");
    let _held = lock.acquire().await.expect("hold lock");
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.dropped, 1);
    assert_eq!(report.fatal_rotations, 1);
}

#[tokio::test]
async fn burst_of_auth_failures_shares_one_failed_rotation() {
    let endpoint =
        Arc::new(ScriptedEndpoint::slow(Duration::from_millis(20))).reject_token("access-1");
    let authority = CountingAuthority::slow(Duration::from_millis(20));
    let alerts = Arc::new(RecordingAlerts::default());
    let tokens = token_manager(
        MemoryStore::with(REFRESH_KEY, "seed-0"),
        authority.clone(),
        alerts.clone(),
    );
    tokens.current_credential().await.expect("initial credential");
    authority.fail.store(true, Ordering::SeqCst);

    let ledger = MemoryLedger::seeded(&[]);
    let dispatcher = Dispatcher::spawn(
        settings(8),
        endpoint.clone(),
        tokens,
        ledger.clone(),
        alerts.clone(),
    );
    for i in 0..8 {
        dispatcher.submit(job(&format!("e{i}"))).await.expect("submit");
    }
    let report = dispatcher.shutdown(true).await;

    assert_eq!(report.dropped, 8);
    assert_eq!(report.fatal_rotations, 0);
    assert_eq!(endpoint.call_count(), 8, "no retry without a fresh credential");
    assert_eq!(authority.seeds.lock().unwrap().len(), 2);
    assert_eq!(alerts.titles(), vec!["Refresh token rotation failed"]);
    assert_eq!(ledger.len(), 0);
}
