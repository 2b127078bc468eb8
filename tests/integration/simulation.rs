//! Session simulation harness.
//!
//! Runs full engine sessions on tokio's paused clock and checks the feed
//! invariants at every update a display collaborator would observe.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use std::time::Duration;

use bidfeed::config::{AppConfig, EngineConfig};
use bidfeed::engine::{BiddingFeed, EngineSession, Roster};
use bidfeed::types::{ApprovalRejected, CampaignSnapshot, CampaignStatus};

use crate::mock_clock::ManualClock;

fn session_with(config: EngineConfig, clock: ManualClock, seed: u64) -> EngineSession {
    let rng = StdRng::seed_from_u64(seed);
    let feed = BiddingFeed::new(config, Roster::default(), rng, Box::new(clock)).unwrap();
    EngineSession::with_parts(feed)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn check_invariants(snap: &CampaignSnapshot) {
    assert!(snap.bid_samples.len() <= 12);
    assert!(snap.budget_used_percent <= 85.0);
    assert!(snap.approved_candidates().count() <= 1);

    let total = snap.budget_total.to_f64().unwrap();
    let remaining = snap.budget_remaining.to_f64().unwrap();
    let expected = total * (1.0 - snap.budget_used_percent / 100.0);
    assert!((remaining - expected).abs() < 0.01, "{remaining} vs {expected}");

    assert_eq!(snap.budget_insufficient, remaining < 100000.0);
}

#[tokio::test(start_paused = true)]
async fn test_full_session_observed_through_updates() {
    let clock = ManualClock::at(10, 0, 0);
    let session = session_with(EngineConfig::default(), clock, 2024);
    let mut rx = session.subscribe();

    session.approve("agent-a").unwrap();

    let mut statuses = vec![CampaignStatus::Unapproved];
    let mut last_total = 0;
    let deadline = tokio::time::Instant::now() + ms(600_000);
    while tokio::time::Instant::now() < deadline {
        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        check_invariants(&snap);

        if *statuses.last().unwrap() != snap.status {
            statuses.push(snap.status);
        }
        let total = snap.total_bids.unwrap();
        assert!(total >= last_total);
        last_total = total;
    }

    assert_eq!(
        statuses,
        [CampaignStatus::Unapproved, CampaignStatus::Bidding, CampaignStatus::Delivering]
    );
    let last = session.snapshot();
    assert_eq!(last.bid_samples.len(), 12);
    // ~300 ticks at ≤1.5% each hits the cap
    assert_eq!(last.budget_used_percent, 85.0);
    assert!(last.budget_insufficient);
    assert!(last.warning.is_some());
    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_sample_labels_follow_wall_clock() {
    let clock = ManualClock::at(9, 30, 0);
    let session = session_with(EngineConfig::default(), clock.clone(), 1);

    let snap = session.approve("agent-b").unwrap();
    let labels: Vec<_> = snap.bid_samples.iter().map(|s| s.time.as_str()).collect();
    assert_eq!(
        labels,
        [
            "09:29:46", "09:29:48", "09:29:50", "09:29:52", "09:29:54", "09:29:56", "09:29:58",
            "09:30:00",
        ]
    );

    clock.advance_secs(2);
    tokio::time::sleep(ms(2_001)).await;
    let snap = session.snapshot();
    assert_eq!(snap.bid_samples.last().unwrap().time, "09:30:02");
    assert_eq!(snap.bid_samples.first().unwrap().time, "09:29:46");
}

#[tokio::test(start_paused = true)]
async fn test_sliding_window_evicts_fifo() {
    let clock = ManualClock::at(12, 0, 0);
    let session = session_with(EngineConfig::default(), clock.clone(), 9);
    session.approve("agent-c").unwrap();

    for _ in 0..4 {
        clock.advance_secs(2);
        tokio::time::sleep(ms(2_000)).await;
    }
    tokio::time::sleep(ms(1)).await;
    let full = session.snapshot().bid_samples;
    assert_eq!(full.len(), 12);

    clock.advance_secs(2);
    tokio::time::sleep(ms(2_000)).await;
    let slid = session.snapshot().bid_samples;
    assert_eq!(slid.len(), 12);
    assert_eq!(slid[..11], full[1..]);
    assert_eq!(slid[11].time, "12:00:10");
}

#[tokio::test(start_paused = true)]
async fn test_teardown_before_delivering() {
    let session = session_with(EngineConfig::default(), ManualClock::at(8, 0, 0), 5);
    session.approve("agent-a").unwrap();
    tokio::time::sleep(ms(3_000)).await;
    session.shutdown();

    tokio::time::sleep(ms(60_000)).await;
    let snap = session.snapshot();
    assert_eq!(snap.status, CampaignStatus::Bidding);
    assert_eq!(snap.bid_samples.len(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_small_budget_refuses_approval() {
    let config = EngineConfig { budget_total: dec!(99999), ..EngineConfig::default() };
    let session = session_with(config, ManualClock::at(8, 0, 0), 5);
    assert!(session.is_budget_insufficient());

    let err = session.approve("agent-a").unwrap_err();
    assert!(matches!(err, ApprovalRejected::BudgetInsufficient { .. }));

    tokio::time::sleep(ms(10_000)).await;
    let snap = session.snapshot();
    assert_eq!(snap.status, CampaignStatus::Unapproved);
    assert!(snap.selected_agent_id.is_none());
    assert!(snap.bid_samples.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_custom_cadence_from_config() {
    let config = AppConfig::parse(
        r#"
        [engine]
        tick_interval_ms = 500
        delivering_delay_ms = 1000
        window_size = 5
        seed_samples = 3
        rng_seed = 11
        "#,
    )
    .unwrap();
    let session = EngineSession::new(config.engine, Roster::new(config.agents.candidates)).unwrap();

    assert_eq!(session.approve("agent-a").unwrap().bid_samples.len(), 3);
    tokio::time::sleep(ms(1_001)).await;
    let snap = session.snapshot();
    assert_eq!(snap.status, CampaignStatus::Delivering);
    assert_eq!(snap.bid_samples.len(), 5);

    tokio::time::sleep(ms(5_000)).await;
    assert_eq!(session.snapshot().bid_samples.len(), 5);
}

#[test]
fn test_shipped_config_is_valid() {
    let cfg = AppConfig::load("config.toml").unwrap();
    assert_eq!(cfg.engine.window_size, 12);
    assert_eq!(cfg.engine.budget_total, dec!(500000));
    assert!(cfg.campaign.submission().validate().is_ok());
    assert_eq!(cfg.agents.candidates.len(), 3);
}
