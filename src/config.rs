//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! field carries a serde default, so an absent section or key falls back to
//! the built-in engine constants.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::campaign::{CampaignSubmission, Targeting};
use crate::engine::roster::{self, Roster};
use crate::types::{AgentCandidate, ConfigError};

/// Upper bound for the tick interval and the delivering delay: one day.
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub campaign: CampaignConfig,
    pub agents: AgentsConfig,
    pub dashboard: DashboardConfig,
}

/// Inclusive integer range used for the random draws.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RangeConfig {
    pub min: u32,
    pub max: u32,
}

impl RangeConfig {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvalidRange { name, min: self.min, max: self.max });
        }
        Ok(())
    }
}

/// Tunables of the simulated bidding feed.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_interval_ms: u64,
    pub delivering_delay_ms: u64,
    /// Maximum number of bid samples kept in the sliding window.
    pub window_size: usize,
    /// Samples synthesized on activation.
    pub seed_samples: usize,
    pub budget_total: Decimal,
    pub budget_cap_percent: f64,
    /// Absolute remaining-budget floor below which approvals are refused.
    pub insufficiency_threshold: Decimal,
    pub seed_bid_range: RangeConfig,
    pub tick_bid_range: RangeConfig,
    pub bid_increment_range: RangeConfig,
    /// Upper (exclusive) bound of the per-tick budget-used increment, percent.
    pub budget_step_max: f64,
    /// Fixed RNG seed for reproducible feeds. Entropy-seeded when absent.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            delivering_delay_ms: 4000,
            window_size: 12,
            seed_samples: 8,
            budget_total: dec!(500000),
            budget_cap_percent: 85.0,
            insufficiency_threshold: dec!(100000),
            seed_bid_range: RangeConfig::new(20, 59),
            tick_bid_range: RangeConfig::new(20, 69),
            bid_increment_range: RangeConfig::new(5, 19),
            budget_step_max: 1.5,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn delivering_delay(&self) -> Duration {
        Duration::from_millis(self.delivering_delay_ms)
    }

    /// Build the feed's random source, honouring `rng_seed`.
    pub fn make_rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Reject constants the feed cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.tick_interval_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "tick_interval_ms must be at most {MAX_INTERVAL_MS}, got {}",
                self.tick_interval_ms
            )));
        }
        if self.delivering_delay_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "delivering_delay_ms must be at most {MAX_INTERVAL_MS}, got {}",
                self.delivering_delay_ms
            )));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Invalid("window_size must be positive".into()));
        }
        if self.seed_samples > self.window_size {
            return Err(ConfigError::Invalid(format!(
                "seed_samples ({}) exceeds window_size ({})",
                self.seed_samples, self.window_size
            )));
        }
        if self.budget_total <= Decimal::ZERO {
            return Err(ConfigError::Invalid("budget_total must be positive".into()));
        }
        if !(self.budget_cap_percent > 0.0 && self.budget_cap_percent <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "budget_cap_percent must be in (0, 100], got {}",
                self.budget_cap_percent
            )));
        }
        if !(self.budget_step_max > 0.0 && self.budget_step_max.is_finite()) {
            return Err(ConfigError::Invalid("budget_step_max must be positive".into()));
        }
        self.seed_bid_range.check("seed_bid_range")?;
        self.tick_bid_range.check("tick_bid_range")?;
        self.bid_increment_range.check("bid_increment_range")?;
        Ok(())
    }
}

/// The campaign submitted before the engine session starts. The defaults
/// form a complete submission so a config-less start passes validation.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CampaignConfig {
    pub targeting: Targeting,
    pub ad_copy: String,
    /// Slider units; one unit is 10,000 currency.
    pub daily_budget: u32,
    pub account_balance: Decimal,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            targeting: Targeting { tokyo: true, tech: true, ..Targeting::default() },
            ad_copy: "Autumn launch: try the new AI-optimised plan today".to_string(),
            daily_budget: 50,
            account_balance: dec!(1000000),
        }
    }
}

impl CampaignConfig {
    pub fn submission(&self) -> CampaignSubmission {
        CampaignSubmission {
            targeting: self.targeting.clone(),
            ad_copy: self.ad_copy.clone(),
            daily_budget: self.daily_budget,
            account_balance: self.account_balance,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentsConfig {
    /// Candidate to approve as soon as the session starts.
    pub auto_approve: Option<String>,
    pub candidates: Vec<AgentCandidate>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            auto_approve: None,
            candidates: roster::default_candidates(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { enabled: true, port: 8080 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    /// Load the file if present, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).context("Failed to parse config TOML")?;
        config.engine.validate()?;
        Roster::new(config.agents.candidates.clone()).validate()?;
        Ok(config)
    }
}
