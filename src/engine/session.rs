//! Engine session — owns a [`BiddingFeed`] and its scheduled work.
//!
//! The first successful approval starts two tokio tasks: the recurring
//! ticker and the one-shot `Bidding → Delivering` transition. Both are
//! aborted together by [`EngineSession::shutdown`] (or on drop), so no
//! update can land on a discarded session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use super::clock::SystemClock;
use super::feed::{ApprovalOutcome, BiddingFeed};
use super::roster::Roster;
use crate::config::EngineConfig;
use crate::types::{ApprovalRejected, CampaignSnapshot, ConfigError};

type SharedFeed = Arc<Mutex<BiddingFeed>>;
type SnapshotTx = Arc<watch::Sender<CampaignSnapshot>>;

fn lock(feed: &SharedFeed) -> MutexGuard<'_, BiddingFeed> {
    feed.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct EngineSession {
    feed: SharedFeed,
    updates: SnapshotTx,
    tick_interval: Duration,
    delivering_delay: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl EngineSession {
    /// Session with an entropy- or config-seeded RNG and the system clock.
    pub fn new(config: EngineConfig, roster: Roster) -> Result<Self, ConfigError> {
        let rng = config.make_rng();
        let feed = BiddingFeed::new(config, roster, rng, Box::new(SystemClock))?;
        Ok(Self::with_parts(feed))
    }

    /// Session around a prepared feed (custom RNG or clock).
    pub fn with_parts(feed: BiddingFeed) -> Self {
        let tick_interval = feed.config().tick_interval();
        let delivering_delay = feed.config().delivering_delay();
        let (tx, _rx) = watch::channel(feed.snapshot());
        info!(
            session = %feed.session_id(),
            tick_ms = tick_interval.as_millis() as u64,
            delivering_delay_ms = delivering_delay.as_millis() as u64,
            candidates = feed.roster().len(),
            "Engine session created"
        );
        Self {
            feed: Arc::new(Mutex::new(feed)),
            updates: Arc::new(tx),
            tick_interval,
            delivering_delay,
            tasks: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn session_id(&self) -> Uuid {
        lock(&self.feed).session_id()
    }

    pub fn snapshot(&self) -> CampaignSnapshot {
        lock(&self.feed).snapshot()
    }

    pub fn is_budget_insufficient(&self) -> bool {
        lock(&self.feed).is_budget_insufficient()
    }

    /// Receiver that sees a fresh snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<CampaignSnapshot> {
        self.updates.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Approve a candidate. The first approval starts the feed; must be
    /// called from within a tokio runtime.
    pub fn approve(&self, candidate_id: &str) -> Result<CampaignSnapshot, ApprovalRejected> {
        if self.is_closed() {
            return Err(ApprovalRejected::SessionClosed);
        }
        let (outcome, snapshot) = {
            let mut feed = lock(&self.feed);
            let outcome = feed.approve(candidate_id)?;
            (outcome, feed.snapshot())
        };
        self.updates.send_replace(snapshot.clone());

        if outcome == ApprovalOutcome::Activated {
            self.start_schedule();
        }
        Ok(snapshot)
    }

    fn start_schedule(&self) {
        let ticker = tokio::spawn(run_ticker(
            Arc::clone(&self.feed),
            Arc::clone(&self.updates),
            self.tick_interval,
        ));
        let delivering = tokio::spawn(run_delivering(
            Arc::clone(&self.feed),
            Arc::clone(&self.updates),
            self.delivering_delay,
        ));
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.push(ticker);
        tasks.push(delivering);
        debug!("Ticker and delivering transition scheduled");
    }

    /// Cancel the ticker and any pending delivering transition.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let cancelled = tasks.len();
        for task in tasks.drain(..) {
            task.abort();
        }
        info!(cancelled, "Engine session shut down");
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Recurring tick. The first tick lands one interval after activation;
/// missed ticks are not backfilled.
async fn run_ticker(feed: SharedFeed, updates: SnapshotTx, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let snapshot = {
            let mut feed = lock(&feed);
            feed.tick();
            feed.snapshot()
        };
        updates.send_replace(snapshot);
    }
}

async fn run_delivering(feed: SharedFeed, updates: SnapshotTx, delay: Duration) {
    tokio::time::sleep(delay).await;
    let snapshot = {
        let mut feed = lock(&feed);
        if !feed.mark_delivering() {
            return;
        }
        feed.snapshot()
    };
    updates.send_replace(snapshot);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
