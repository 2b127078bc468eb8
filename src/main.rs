//! BIDFEED — simulated real-time bidding feed
//!
//! Entry point. Loads configuration, initialises structured logging,
//! validates the configured campaign, then runs one engine session with
//! its dashboard API until Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use bidfeed::config::AppConfig;
use bidfeed::dashboard;
use bidfeed::engine::{EngineSession, Roster};

const BANNER: &str = r#"
 ____  ___ ____  _____ _____ _____ ____
| __ )|_ _|  _ \|  ___| ____| ____|  _ \
|  _ \ | || | | | |_  |  _| |  _| | | | |
| |_) || || |_| |  _| | |___| |___| |_| |
|____/|___|____/|_|   |_____|_____|____/

  Simulated real-time bidding feed
  v0.1.0
"#;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path =
        std::env::var("BIDFEED_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load_or_default(&config_path)?;

    println!("{BANNER}");
    info!(
        config = %config_path,
        tick_ms = cfg.engine.tick_interval_ms,
        budget_total = %cfg.engine.budget_total,
        seeded = cfg.engine.rng_seed.is_some(),
        "BIDFEED starting up"
    );

    // -- Campaign gate -----------------------------------------------------

    let submission = cfg.campaign.submission();
    let preview = submission.preview();
    info!(
        ad_copy = %preview.ad_copy,
        targets = %preview.targets,
        daily_budget = %preview.daily_budget,
        balance = %submission.account_balance,
        "Campaign submitted"
    );
    if let Err(reason) = submission.validate() {
        error!(%reason, "Campaign rejected");
        return Err(reason).context("Campaign configuration is invalid");
    }

    // -- Engine session ----------------------------------------------------

    let session = Arc::new(
        EngineSession::new(cfg.engine.clone(), Roster::new(cfg.agents.candidates.clone()))
            .context("Failed to create engine session")?,
    );
    for candidate in session.snapshot().candidates {
        info!(candidate = %candidate.candidate, "Agent candidate");
    }

    let dashboard_task = if cfg.dashboard.enabled {
        Some(dashboard::spawn_dashboard(Arc::clone(&session), cfg.dashboard.port).await?)
    } else {
        None
    };

    if let Some(id) = cfg.agents.auto_approve.as_deref() {
        if let Err(e) = session.approve(id) {
            warn!(candidate = id, error = %e, "Auto-approval rejected");
        }
    }

    // -- Main loop -------------------------------------------------------

    run_until_shutdown(&session).await;

    session.shutdown();
    if let Some(task) = dashboard_task {
        task.abort();
    }

    let last = session.snapshot();
    info!(
        session = %last.session_id,
        status = %last.status,
        total_bids = last.total_bids.unwrap_or(0),
        used_pct = format!("{:.1}%", last.budget_used_percent),
        remaining = %last.budget_remaining,
        "BIDFEED shut down cleanly."
    );

    Ok(())
}

/// Log state changes until Ctrl+C.
async fn run_until_shutdown(session: &EngineSession) {
    let mut updates = session.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Waiting for agent approval. Press Ctrl+C to stop.");
    let mut last_status = updates.borrow().status;
    let mut warned = false;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = updates.borrow_and_update().clone();
                if snap.status != last_status {
                    info!(
                        from = %last_status,
                        to = %snap.status,
                        hint = %snap.status_hint,
                        "Status changed"
                    );
                    last_status = snap.status;
                }
                if let (Some(warning), false) = (snap.warning.as_deref(), warned) {
                    warn!(remaining = %snap.budget_remaining, "{warning}");
                    warned = true;
                }
                debug!(
                    total_bids = snap.total_bids.unwrap_or(0),
                    used_pct = format!("{:.1}%", snap.budget_used_percent),
                    latest = ?snap.bid_samples.last(),
                    "Feed update"
                );
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bidfeed=info"));

    let json_logging = std::env::var("BIDFEED_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
