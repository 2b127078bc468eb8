//! Simulated bidding feed — the campaign state machine.
//!
//! Synchronous core of an engine session. Approval moves the campaign out of
//! `Unapproved`, seeds the bid window, and from then on every `tick` appends
//! a bid sample, grows the bid total, and consumes budget up to the cap.
//! Scheduling lives in [`super::session`]; this type never sleeps or spawns.

use rand::rngs::StdRng;
use rand::Rng;
use rust_decimal::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::{sample_label, Clock};
use super::roster::Roster;
use crate::config::{EngineConfig, RangeConfig};
use crate::types::{
    ApprovalRejected, BidSample, CampaignSnapshot, CampaignState, CampaignStatus, CandidateView,
    ConfigError,
};

const BUDGET_WARNING: &str = "Insufficient budget remaining: please top up";

/// Result of a successful approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// First approval: the campaign is now bidding and the feed is live.
    /// The caller must schedule the delivering transition and the ticker.
    Activated,
    /// The selection moved to another candidate while still bidding.
    Switched { previous: String },
}

pub struct BiddingFeed {
    session_id: Uuid,
    config: EngineConfig,
    roster: Roster,
    state: CampaignState,
    rng: StdRng,
    clock: Box<dyn Clock>,
}

impl BiddingFeed {
    pub fn new(
        config: EngineConfig,
        roster: Roster,
        rng: StdRng,
        clock: Box<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        roster.validate()?;
        let state = CampaignState::new(config.budget_total);
        Ok(Self {
            session_id: Uuid::new_v4(),
            config,
            roster,
            state,
            rng,
            clock,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> &CampaignState {
        &self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Remaining budget is below the absolute insufficiency threshold.
    pub fn is_budget_insufficient(&self) -> bool {
        self.state.budget_remaining < self.config.insufficiency_threshold
    }

    /// Approve a candidate. Rejections leave the state untouched.
    pub fn approve(&mut self, candidate_id: &str) -> Result<ApprovalOutcome, ApprovalRejected> {
        let result = self.try_approve(candidate_id);
        if let Err(ref reason) = result {
            warn!(
                session = %self.session_id,
                candidate = candidate_id,
                %reason,
                "Approval rejected"
            );
        }
        result
    }

    fn try_approve(&mut self, candidate_id: &str) -> Result<ApprovalOutcome, ApprovalRejected> {
        if !self.roster.contains(candidate_id) {
            return Err(ApprovalRejected::UnknownCandidate(candidate_id.to_string()));
        }
        if self.state.is_approved(candidate_id) || self.state.status == CampaignStatus::Delivering {
            let holder = self
                .state
                .selected_agent_id
                .clone()
                .unwrap_or_else(|| candidate_id.to_string());
            return Err(ApprovalRejected::AlreadyApproved(holder));
        }
        if self.is_budget_insufficient() {
            return Err(ApprovalRejected::BudgetInsufficient {
                remaining: self.state.budget_remaining,
                threshold: self.config.insufficiency_threshold,
            });
        }

        let previous = self.state.selected_agent_id.replace(candidate_id.to_string());
        match previous {
            Some(previous) => {
                info!(
                    session = %self.session_id,
                    from = %previous,
                    to = candidate_id,
                    "Approval switched"
                );
                Ok(ApprovalOutcome::Switched { previous })
            }
            None => {
                self.state.status = CampaignStatus::Bidding;
                self.seed_window();
                info!(
                    session = %self.session_id,
                    candidate = candidate_id,
                    samples = self.state.bid_samples.len(),
                    "Agent approved, campaign bidding"
                );
                Ok(ApprovalOutcome::Activated)
            }
        }
    }

    /// One-shot `Bidding → Delivering` transition. Returns whether it fired.
    pub fn mark_delivering(&mut self) -> bool {
        if self.state.status != CampaignStatus::Bidding {
            return false;
        }
        self.state.status = CampaignStatus::Delivering;
        info!(
            session = %self.session_id,
            agent = self.state.selected_agent_id.as_deref().unwrap_or("-"),
            "Campaign delivering"
        );
        true
    }

    /// Advance the feed by one interval. No-op (returns false) while unapproved.
    pub fn tick(&mut self) -> bool {
        if !self.state.status.is_active() {
            return false;
        }

        let bids = self.draw(self.config.tick_bid_range);
        let sample = BidSample { time: sample_label(self.clock.now()), bids };
        self.push_sample(sample);

        let increment = self.draw(self.config.bid_increment_range);
        self.state.total_bids += u64::from(increment);

        let step = self.rng.gen_range(0.0..self.config.budget_step_max);
        self.state.budget_used_percent =
            (self.state.budget_used_percent + step).min(self.config.budget_cap_percent);
        self.recompute_remaining();

        debug!(
            session = %self.session_id,
            bids,
            total_bids = self.state.total_bids,
            used_pct = format!("{:.2}", self.state.budget_used_percent),
            remaining = %self.state.budget_remaining,
            "Tick"
        );
        true
    }

    pub fn snapshot(&self) -> CampaignSnapshot {
        let active = self.state.status.is_active();
        let selected_agent_name = self
            .state
            .selected_agent_id
            .as_deref()
            .and_then(|id| self.roster.get(id))
            .map(|c| c.name.clone());
        let insufficient = self.is_budget_insufficient();

        CampaignSnapshot {
            session_id: self.session_id,
            status: self.state.status,
            status_hint: self.state.status.hint().to_string(),
            budget_total: self.state.budget_total,
            budget_used_percent: self.state.budget_used_percent,
            budget_remaining: self.state.budget_remaining,
            budget_insufficient: insufficient,
            total_bids: active.then_some(self.state.total_bids),
            bid_samples: self.state.bid_samples.iter().cloned().collect(),
            candidates: self
                .roster
                .iter()
                .map(|c| CandidateView {
                    candidate: c.clone(),
                    approved: self.state.is_approved(&c.id),
                })
                .collect(),
            selected_agent_id: self.state.selected_agent_id.clone(),
            selected_agent_name,
            warning: insufficient.then(|| BUDGET_WARNING.to_string()),
        }
    }

    // -- internals -------------------------------------------------------

    /// Backfill the window with the samples of the preceding intervals,
    /// newest stamped now.
    fn seed_window(&mut self) {
        if !self.state.bid_samples.is_empty() {
            return;
        }
        let now = self.clock.now();
        let count = self.config.seed_samples;
        let step_ms = i64::try_from(self.config.tick_interval_ms).unwrap_or(i64::MAX);
        for i in 0..count {
            let back = i64::try_from(count - 1 - i).unwrap_or(i64::MAX);
            // Out-of-range offsets cannot be labelled; skip rather than overflow.
            let Some(at) = step_ms
                .checked_mul(back)
                .and_then(chrono::Duration::try_milliseconds)
                .and_then(|offset| now.checked_sub_signed(offset))
            else {
                continue;
            };
            let bids = self.draw(self.config.seed_bid_range);
            self.push_sample(BidSample { time: sample_label(at), bids });
        }
    }

    fn push_sample(&mut self, sample: BidSample) {
        self.state.bid_samples.push_back(sample);
        while self.state.bid_samples.len() > self.config.window_size {
            self.state.bid_samples.pop_front();
        }
    }

    fn draw(&mut self, range: RangeConfig) -> u32 {
        self.rng.gen_range(range.min..=range.max)
    }

    fn recompute_remaining(&mut self) {
        let fraction = Decimal::from_f64(1.0 - self.state.budget_used_percent / 100.0)
            .unwrap_or(Decimal::ZERO);
        self.state.budget_remaining = (self.state.budget_total * fraction).round_dp(2);
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut CampaignState {
        &mut self.state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
