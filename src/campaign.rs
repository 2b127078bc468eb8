//! Campaign submission validation.
//!
//! A campaign must target at least one segment, carry non-empty ad copy, and
//! fit its daily budget within the account balance before an engine session
//! may start. Validation is pure and never touches the engine.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::CampaignValidationError;

/// Currency amount represented by one daily-budget slider unit.
pub const DAILY_BUDGET_UNIT: Decimal = dec!(10000);

/// Largest daily-budget slider position.
pub const DAILY_BUDGET_MAX_UNITS: u32 = 100;

const PREVIEW_PLACEHOLDER: &str = "Your ad copy will appear here...";
const NO_TARGETS: &str = "Not set";

/// Audience segments a campaign can target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Targeting {
    pub tokyo: bool,
    pub osaka: bool,
    pub tech: bool,
    pub business: bool,
}

impl Targeting {
    pub fn any(&self) -> bool {
        self.tokyo || self.osaka || self.tech || self.business
    }

    /// Labels of the selected segments, in display order.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.tokyo, "Tokyo"),
            (self.osaka, "Osaka"),
            (self.tech, "Technology"),
            (self.business, "Business"),
        ]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect()
    }
}

/// Everything the operator submits on the campaign setup screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSubmission {
    pub targeting: Targeting,
    pub ad_copy: String,
    /// Slider units, see [`DAILY_BUDGET_UNIT`].
    pub daily_budget: u32,
    pub account_balance: Decimal,
}

/// Live preview of the ad and its delivery settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignPreview {
    pub ad_copy: String,
    pub targets: String,
    pub daily_budget: Decimal,
}

impl CampaignSubmission {
    /// Daily budget in currency units.
    pub fn daily_budget_amount(&self) -> Decimal {
        Decimal::from(self.daily_budget) * DAILY_BUDGET_UNIT
    }

    /// Targeting and copy are filled in (the submit button is enabled).
    pub fn is_form_complete(&self) -> bool {
        self.targeting.any() && !self.ad_copy.trim().is_empty()
    }

    pub fn is_budget_exceeded(&self) -> bool {
        self.daily_budget_amount() > self.account_balance
    }

    /// Check the submission, returning the first failure reason.
    pub fn validate(&self) -> Result<(), CampaignValidationError> {
        if !self.is_form_complete() {
            return Err(CampaignValidationError::MissingTargetingOrCopy);
        }
        if self.is_budget_exceeded() {
            return Err(CampaignValidationError::BudgetExceedsBalance {
                requested: self.daily_budget_amount(),
                balance: self.account_balance,
            });
        }
        if self.daily_budget > DAILY_BUDGET_MAX_UNITS {
            return Err(CampaignValidationError::DailyBudgetOutOfRange {
                max: DAILY_BUDGET_MAX_UNITS,
            });
        }
        debug!(
            daily_budget = %self.daily_budget_amount(),
            targets = ?self.targeting.labels(),
            "Campaign submission valid"
        );
        Ok(())
    }

    pub fn preview(&self) -> CampaignPreview {
        let labels = self.targeting.labels();
        CampaignPreview {
            ad_copy: if self.ad_copy.is_empty() {
                PREVIEW_PLACEHOLDER.to_string()
            } else {
                self.ad_copy.clone()
            },
            targets: if labels.is_empty() {
                NO_TARGETS.to_string()
            } else {
                labels.join(", ")
            },
            daily_budget: self.daily_budget_amount(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(targeting: Targeting, copy: &str, daily_budget: u32) -> CampaignSubmission {
        CampaignSubmission {
            targeting,
            ad_copy: copy.to_string(),
            daily_budget,
            account_balance: dec!(1000000),
        }
    }

    fn tokyo() -> Targeting {
        Targeting { tokyo: true, ..Targeting::default() }
    }

    #[test]
    fn test_valid_submission() {
        assert!(submission(tokyo(), "Spring sale", 50).validate().is_ok());
    }

    #[test]
    fn test_requires_targeting() {
        let err = submission(Targeting::default(), "Spring sale", 50).validate().unwrap_err();
        assert_eq!(err, CampaignValidationError::MissingTargetingOrCopy);
    }

    #[test]
    fn test_requires_trimmed_copy() {
        let err = submission(tokyo(), "   \n\t", 50).validate().unwrap_err();
        assert_eq!(err, CampaignValidationError::MissingTargetingOrCopy);
    }

    #[test]
    fn test_budget_at_balance_is_allowed() {
        // 100 units × 10,000 == 1,000,000 balance
        assert!(submission(tokyo(), "ad", 100).validate().is_ok());
    }

    #[test]
    fn test_budget_over_balance_rejected() {
        let mut sub = submission(tokyo(), "ad", 60);
        sub.account_balance = dec!(500000);
        assert!(sub.is_budget_exceeded());
        let err = sub.validate().unwrap_err();
        assert_eq!(
            err,
            CampaignValidationError::BudgetExceedsBalance {
                requested: dec!(600000),
                balance: dec!(500000),
            }
        );
        assert_eq!(err.to_string(), "Daily budget exceeds account balance");
    }

    #[test]
    fn test_missing_copy_reported_before_budget() {
        let mut sub = submission(tokyo(), "", 90);
        sub.account_balance = dec!(10);
        assert_eq!(sub.validate().unwrap_err(), CampaignValidationError::MissingTargetingOrCopy);
    }

    #[test]
    fn test_slider_out_of_range() {
        let mut sub = submission(tokyo(), "ad", 101);
        sub.account_balance = dec!(5000000);
        assert!(matches!(
            sub.validate(),
            Err(CampaignValidationError::DailyBudgetOutOfRange { max: 100 })
        ));
    }

    #[test]
    fn test_preview_defaults() {
        let preview = submission(Targeting::default(), "", 5).preview();
        assert_eq!(preview.ad_copy, PREVIEW_PLACEHOLDER);
        assert_eq!(preview.targets, "Not set");
        assert_eq!(preview.daily_budget, dec!(50000));
    }

    #[test]
    fn test_preview_labels_in_order() {
        let targeting = Targeting { business: true, osaka: true, ..Targeting::default() };
        let preview = submission(targeting, "Hello", 1).preview();
        assert_eq!(preview.targets, "Osaka, Business");
        assert_eq!(preview.ad_copy, "Hello");
    }
}
