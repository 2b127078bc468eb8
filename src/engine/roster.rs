//! The fixed set of agent candidates an operator can approve.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;

use crate::types::{AgentCandidate, AgentPerformance, ConfigError};

/// Ordered, immutable candidate reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    candidates: Vec<AgentCandidate>,
}

impl Roster {
    pub fn new(candidates: Vec<AgentCandidate>) -> Self {
        Self { candidates }
    }

    pub fn get(&self, id: &str) -> Option<&AgentCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentCandidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// First id that appears more than once, if any.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.candidates
            .iter()
            .map(|c| c.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    /// Reject rosters the approval view cannot represent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::Invalid("roster has no candidates".into()));
        }
        if let Some(id) = self.duplicate_id() {
            return Err(ConfigError::Invalid(format!("duplicate agent candidate id: {id}")));
        }
        Ok(())
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(default_candidates())
    }
}

fn candidate(
    id: &str,
    name: &str,
    predicted_bid: Decimal,
    perf: AgentPerformance,
) -> AgentCandidate {
    AgentCandidate {
        id: id.to_string(),
        name: name.to_string(),
        predicted_bid,
        performance: perf,
    }
}

/// The three stock candidates.
pub fn default_candidates() -> Vec<AgentCandidate> {
    vec![
        candidate(
            "agent-a",
            "AI Agent A",
            dec!(120),
            AgentPerformance { ctr: 2.4, conversions: 156, roi: 340.0 },
        ),
        candidate(
            "agent-b",
            "AI Agent B",
            dec!(95),
            AgentPerformance { ctr: 1.8, conversions: 203, roi: 280.0 },
        ),
        candidate(
            "agent-c",
            "AI Agent C",
            dec!(150),
            AgentPerformance { ctr: 3.1, conversions: 89, roi: 420.0 },
        ),
    ]
}
