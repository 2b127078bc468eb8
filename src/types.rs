//! Shared types for the BIDFEED engine.
//!
//! These types form the data model used across all modules: the campaign
//! lifecycle, the bid time series, the agent candidates, and the snapshot
//! handed to display collaborators.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// Campaign status
// ---------------------------------------------------------------------------

/// Lifecycle stage of the simulated campaign.
///
/// Only ever moves forward: `Unapproved → Bidding → Delivering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Unapproved,
    Bidding,
    Delivering,
}

impl CampaignStatus {
    /// Whether the simulated feed runs in this status.
    pub fn is_active(&self) -> bool {
        matches!(self, CampaignStatus::Bidding | CampaignStatus::Delivering)
    }

    /// Short operator-facing explanation of the status.
    pub fn hint(&self) -> &'static str {
        match self {
            CampaignStatus::Unapproved => "Select an agent to approve",
            CampaignStatus::Bidding => "AI agent is bidding automatically",
            CampaignStatus::Delivering => "AI agent is optimising delivery automatically",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignStatus::Unapproved => write!(f, "UNAPPROVED"),
            CampaignStatus::Bidding => write!(f, "BIDDING"),
            CampaignStatus::Delivering => write!(f, "DELIVERING"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bid samples
// ---------------------------------------------------------------------------

/// One point of the bid-count time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidSample {
    /// Local wall-clock label, `HH:MM:SS`.
    pub time: String,
    pub bids: u32,
}

impl fmt::Display for BidSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} bids", self.time, self.bids)
    }
}

// ---------------------------------------------------------------------------
// Agent candidates
// ---------------------------------------------------------------------------

/// Historical performance figures shown for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    /// Click-through rate, percent.
    pub ctr: f64,
    pub conversions: u32,
    /// Return on investment, percent.
    pub roi: f64,
}

/// A delivery agent the operator can approve. Static reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCandidate {
    pub id: String,
    pub name: String,
    /// Predicted bid per impression, in currency units.
    pub predicted_bid: Decimal,
    pub performance: AgentPerformance,
}

impl fmt::Display for AgentCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} | bid=¥{} ctr={:.1}% cv={} roi={:.0}%",
            self.id,
            self.name,
            self.predicted_bid,
            self.performance.ctr,
            self.performance.conversions,
            self.performance.roi,
        )
    }
}

/// A candidate together with its derived approval flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: AgentCandidate,
    pub approved: bool,
}

// ---------------------------------------------------------------------------
// Campaign state
// ---------------------------------------------------------------------------

/// Mutable state of one engine session.
///
/// Approval is held only as `selected_agent_id`; per-candidate `approved`
/// flags are derived from it, so at most one candidate can be approved.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignState {
    pub status: CampaignStatus,
    pub budget_total: Decimal,
    pub budget_used_percent: f64,
    pub budget_remaining: Decimal,
    pub total_bids: u64,
    pub bid_samples: VecDeque<BidSample>,
    pub selected_agent_id: Option<String>,
}

impl CampaignState {
    /// Fresh, unapproved state with the whole budget remaining.
    pub fn new(budget_total: Decimal) -> Self {
        Self {
            status: CampaignStatus::Unapproved,
            budget_total,
            budget_used_percent: 0.0,
            budget_remaining: budget_total,
            total_bids: 0,
            bid_samples: VecDeque::new(),
            selected_agent_id: None,
        }
    }

    /// Whether the given candidate currently holds the approval.
    pub fn is_approved(&self, candidate_id: &str) -> bool {
        self.selected_agent_id.as_deref() == Some(candidate_id)
    }
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | used={:.1}% remaining=¥{} | bids={} | samples={} | agent={}",
            self.status,
            self.budget_used_percent,
            self.budget_remaining,
            self.total_bids,
            self.bid_samples.len(),
            self.selected_agent_id.as_deref().unwrap_or("-"),
        )
    }
}

/// Immutable copy of the campaign state for display collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub session_id: uuid::Uuid,
    pub status: CampaignStatus,
    pub status_hint: String,
    pub budget_total: Decimal,
    pub budget_used_percent: f64,
    pub budget_remaining: Decimal,
    pub budget_insufficient: bool,
    /// Present only while the feed is active (the dashboard shows `---` otherwise).
    pub total_bids: Option<u64>,
    pub bid_samples: Vec<BidSample>,
    pub candidates: Vec<CandidateView>,
    pub selected_agent_id: Option<String>,
    pub selected_agent_name: Option<String>,
    /// Operator warning, set while the remaining budget is insufficient.
    pub warning: Option<String>,
}

impl CampaignSnapshot {
    /// Candidates currently flagged as approved (zero or one).
    pub fn approved_candidates(&self) -> impl Iterator<Item = &CandidateView> {
        self.candidates.iter().filter(|c| c.approved)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons an approval request is rejected. A rejection leaves the state
/// untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApprovalRejected {
    #[error("Unknown agent candidate: {0}")]
    UnknownCandidate(String),

    #[error("Insufficient budget remaining: ¥{remaining} is below ¥{threshold}")]
    BudgetInsufficient { remaining: Decimal, threshold: Decimal },

    #[error("Agent already approved: {0}")]
    AlreadyApproved(String),

    #[error("Engine session has been shut down")]
    SessionClosed,
}

/// Campaign submission validation failures. The message is the single
/// human-readable reason shown to the operator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CampaignValidationError {
    #[error("Please set targeting conditions and ad copy")]
    MissingTargetingOrCopy,

    #[error("Daily budget exceeds account balance")]
    BudgetExceedsBalance { requested: Decimal, balance: Decimal },

    #[error("Daily budget must be between 0 and {max} units")]
    DailyBudgetOutOfRange { max: u32 },
}

/// Inconsistent engine configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid range for {name}: [{min}, {max}]")]
    InvalidRange { name: &'static str, min: u32, max: u32 },

    #[error("Configuration error: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
