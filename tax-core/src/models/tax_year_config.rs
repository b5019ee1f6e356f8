use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::benefit::validate_benefits;
use crate::models::credit::validate_credits;
use crate::models::tax_bracket::validate_tax_brackets;
use crate::models::{Benefit, Credit, TaxBracket};

/// Malformed tax-year configuration. Raised when a year is loaded, never
/// tolerated at calculation time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no {0} brackets configured")]
    NoBrackets(String),

    #[error("{table} brackets must start at 0, first starts at {income_from}")]
    FirstBracketNotAtZero { table: String, income_from: Decimal },

    #[error("{table} bracket order must be contiguous: expected {expected}, found {found}")]
    BracketOrderGap {
        table: String,
        expected: u32,
        found: u32,
    },

    #[error("{table} bracket {order} starts at {found_from}, expected {expected_from}")]
    BracketNotContiguous {
        table: String,
        order: u32,
        expected_from: Decimal,
        found_from: Decimal,
    },

    #[error("{table} bracket {order} has empty range {income_from}..{income_to}")]
    InvalidBracketRange {
        table: String,
        order: u32,
        income_from: Decimal,
        income_to: Decimal,
    },

    #[error("{table} bracket {order} is unbounded but is not the last bracket")]
    UnboundedBracketNotLast { table: String, order: u32 },

    #[error("{table} bracket {order} is the last bracket and must be unbounded")]
    LastBracketBounded { table: String, order: u32 },

    #[error("{context} has rate {rate} outside the allowed range")]
    InvalidRate { context: String, rate: Decimal },

    #[error("{context} has negative amount {amount}")]
    NegativeAmount { context: String, amount: Decimal },

    #[error("benefit '{0}' sets both an amount and a percentage")]
    BenefitValueConflict(String),

    #[error("benefit '{0}' sets neither an amount nor a percentage")]
    BenefitValueMissing(String),

    #[error("benefit {benefit} must be configured as an {expected}")]
    BenefitShapeMismatch {
        benefit: String,
        expected: &'static str,
    },

    #[error("benefit type '{0}' must be lowercase letters, digits and underscores")]
    InvalidBenefitType(String),

    #[error("benefit {0} is defined more than once")]
    DuplicateBenefit(String),

    #[error("credit {0} has partial phaseout settings; start and rate go together")]
    IncompletePhaseout(String),

    #[error("credit {credit} phaseout ends at {end}, not after its start {start}")]
    InvalidPhaseoutRange {
        credit: String,
        start: Decimal,
        end: Decimal,
    },

    #[error("credit {credit} floor {floor} must lie between 0 and {max_amount}")]
    InvalidCreditFloor {
        credit: String,
        floor: Decimal,
        max_amount: Decimal,
    },

    #[error("tax year {0} is not configured")]
    UnknownTaxYear(i32),

    #[error("tax year {0} is configured more than once")]
    DuplicateTaxYear(i32),
}

/// How several percentage exemptions in one year combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionStacking {
    /// Percentages are summed and applied once to the same base.
    #[default]
    Additive,
    /// Each percentage applies to what the previous ones left.
    Compound,
}

/// Everything the engine needs to know about one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    pub brackets: Vec<TaxBracket>,
    #[serde(default)]
    pub benefits: Vec<Benefit>,
    #[serde(default)]
    pub credits: Vec<Credit>,
    #[serde(default)]
    pub exemption_stacking: ExemptionStacking,
}

impl TaxYearConfig {
    /// Validates brackets, benefits and credits.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_tax_brackets(&self.brackets)?;
        validate_benefits(&self.benefits)?;
        validate_credits(&self.credits)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{BenefitKind, BenefitValue};

    fn config() -> TaxYearConfig {
        TaxYearConfig {
            tax_year: 2025,
            brackets: vec![TaxBracket {
                bracket_order: 1,
                income_from: dec!(0),
                income_to: None,
                rate: dec!(37),
            }],
            benefits: vec![Benefit {
                kind: BenefitKind::SmeProfitExemption,
                name: "MKB-winstvrijstelling".to_string(),
                value: BenefitValue::Percentage(dec!(12.7)),
                requires_hours_criterion: false,
                minimum_hours_required: None,
                max_usage_count: None,
                eligibility_criteria: None,
            }],
            credits: Vec::new(),
            exemption_stacking: ExemptionStacking::Additive,
        }
    }

    #[test]
    fn validate_accepts_minimal_year() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn validate_reports_bracket_errors_first() {
        let config = TaxYearConfig {
            brackets: Vec::new(),
            ..config()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigurationError::NoBrackets("income tax".to_string()))
        );
    }

    #[test]
    fn exemption_stacking_defaults_to_additive_when_absent() {
        let json = r#"{"tax_year":2025,"brackets":[]}"#;

        let config: TaxYearConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.exemption_stacking, ExemptionStacking::Additive);
        assert!(config.benefits.is_empty());
    }

    #[test]
    fn error_messages_name_the_offending_row() {
        let error = ConfigurationError::BracketNotContiguous {
            table: "income tax".to_string(),
            order: 2,
            expected_from: dec!(75000),
            found_from: dec!(76000),
        };

        assert_eq!(
            error.to_string(),
            "income tax bracket 2 starts at 76000, expected 75000"
        );
    }
}
