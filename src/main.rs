use feedrelay::config::DEFAULT_CONFIG_FILE;
use feedrelay::{Config, RelayComponents, RelayRunner, RunSettings};
use mimalloc::MiMalloc;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const ALERT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load(Path::new(DEFAULT_CONFIG_FILE))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        store = ?cfg.store.backend,
        database_url = %cfg.basic.database_url,
        proxy = %cfg.basic.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.basic.loglevel,
        token_url = %cfg.token.token_url,
        lock = ?cfg.token.lock,
        workflow_id = %cfg.workflow.workflow_id,
        concurrency = cfg.workflow.concurrency,
        sources = cfg.sources.len(),
        "Configuration loaded"
    );

    let components = RelayComponents::from_config(&cfg).await?;
    let alerts = components.alerts.clone();
    let runner = RelayRunner::new(components, RunSettings::from(&cfg));

    let result = runner.run().await;
    alerts.flush(ALERT_FLUSH_TIMEOUT).await;

    match result {
        Ok(report) if report.dispatch.fatal_rotations > 0 => {
            error!(
                run_id = %report.run_id,
                "Credential rotation failed during dispatch; the stored refresh token needs attention"
            );
            Err("credential rotation failed during dispatch".into())
        }
        Ok(report) => {
            info!(
                run_id = %report.run_id,
                submitted = report.dispatch.submitted,
                completed = report.dispatch.completed,
                skipped = report.dispatch.skipped,
                dropped = report.dispatch.dropped,
                unrecorded = report.dispatch.unrecorded,
                "Run complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run aborted");
            Err(e.into())
        }
    }
}
