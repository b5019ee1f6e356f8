use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ConfigurationError;

/// Hours per year the self-employed deduction asks for when a benefit
/// requires the hours criterion but does not state its own minimum.
pub const DEFAULT_MINIMUM_HOURS: u32 = 1225;

/// The starter deduction is only available within this many years of
/// starting the business.
pub const STARTER_WINDOW_YEARS: u32 = 5;

static CUSTOM_BENEFIT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid benefit id pattern"));

/// Identifies a benefit definition and the taxpayer's election of it.
///
/// The three core entrepreneur benefits are closed variants; anything else a
/// user configures is a `Custom` id such as `research_deduction`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BenefitKind {
    /// Zelfstandigenaftrek.
    SelfEmployedDeduction,
    /// Startersaftrek.
    StarterDeduction,
    /// MKB-winstvrijstelling.
    SmeProfitExemption,
    Custom(String),
}

impl BenefitKind {
    pub fn key(&self) -> &str {
        match self {
            Self::SelfEmployedDeduction => "zelfstandigenaftrek",
            Self::StarterDeduction => "startersaftrek",
            Self::SmeProfitExemption => "mkb_winstvrijstelling",
            Self::Custom(id) => id,
        }
    }

    pub fn parse(key: &str) -> Self {
        match key {
            "zelfstandigenaftrek" => Self::SelfEmployedDeduction,
            "startersaftrek" => Self::StarterDeduction,
            "mkb_winstvrijstelling" => Self::SmeProfitExemption,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn is_core(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for BenefitKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<String> for BenefitKind {
    fn from(key: String) -> Self {
        Self::parse(&key)
    }
}

impl From<BenefitKind> for String {
    fn from(kind: BenefitKind) -> Self {
        kind.key().to_string()
    }
}

/// What a benefit is worth: a fixed euro deduction or an exemption
/// percentage applied to profit after fixed deductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BenefitValue {
    Amount(Decimal),
    Percentage(Decimal),
}

impl BenefitValue {
    /// Builds the value from the two nullable storage columns, exactly one of
    /// which must be populated.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::{BenefitValue, ConfigurationError};
    ///
    /// let value = BenefitValue::from_columns("MKB-winstvrijstelling", None, Some(dec!(12.7)));
    /// assert_eq!(value, Ok(BenefitValue::Percentage(dec!(12.7))));
    ///
    /// let conflict = BenefitValue::from_columns("Broken", Some(dec!(100)), Some(dec!(5)));
    /// assert_eq!(conflict, Err(ConfigurationError::BenefitValueConflict("Broken".to_string())));
    /// ```
    pub fn from_columns(
        name: &str,
        amount: Option<Decimal>,
        percentage: Option<Decimal>,
    ) -> Result<Self, ConfigurationError> {
        match (amount, percentage) {
            (Some(amount), None) => Ok(Self::Amount(amount)),
            (None, Some(percentage)) => Ok(Self::Percentage(percentage)),
            (Some(_), Some(_)) => Err(ConfigurationError::BenefitValueConflict(name.to_string())),
            (None, None) => Err(ConfigurationError::BenefitValueMissing(name.to_string())),
        }
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Amount(amount) => Some(*amount),
            Self::Percentage(_) => None,
        }
    }

    pub fn percentage(&self) -> Option<Decimal> {
        match self {
            Self::Amount(_) => None,
            Self::Percentage(percentage) => Some(*percentage),
        }
    }
}

/// A deduction or exemption defined for one tax year.
///
/// Definitions are policy; whether a taxpayer uses one is recorded separately
/// in [`TaxpayerElection`](crate::TaxpayerElection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefit {
    pub kind: BenefitKind,
    pub name: String,
    pub value: BenefitValue,
    pub requires_hours_criterion: bool,
    pub minimum_hours_required: Option<u32>,
    /// E.g. the starter deduction may be used at most 3 times.
    pub max_usage_count: Option<u32>,
    /// Advisory text only; never evaluated.
    pub eligibility_criteria: Option<String>,
}

impl Benefit {
    /// Hours threshold used when the hours criterion applies.
    pub fn minimum_hours(&self) -> u32 {
        self.minimum_hours_required.unwrap_or(DEFAULT_MINIMUM_HOURS)
    }
}

pub(crate) fn validate_benefits(benefits: &[Benefit]) -> Result<(), ConfigurationError> {
    let mut seen = BTreeSet::new();

    for benefit in benefits {
        if !seen.insert(&benefit.kind) {
            return Err(ConfigurationError::DuplicateBenefit(benefit.kind.to_string()));
        }
        if let BenefitKind::Custom(id) = &benefit.kind {
            if !CUSTOM_BENEFIT_ID.is_match(id) {
                return Err(ConfigurationError::InvalidBenefitType(id.clone()));
            }
        }

        match (&benefit.kind, benefit.value) {
            (BenefitKind::SmeProfitExemption, BenefitValue::Amount(_)) => {
                return Err(ConfigurationError::BenefitShapeMismatch {
                    benefit: benefit.kind.to_string(),
                    expected: "percentage",
                });
            }
            (
                BenefitKind::SelfEmployedDeduction | BenefitKind::StarterDeduction,
                BenefitValue::Percentage(_),
            ) => {
                return Err(ConfigurationError::BenefitShapeMismatch {
                    benefit: benefit.kind.to_string(),
                    expected: "amount",
                });
            }
            (_, BenefitValue::Amount(amount)) if amount < Decimal::ZERO => {
                return Err(ConfigurationError::NegativeAmount {
                    context: format!("benefit {}", benefit.kind),
                    amount,
                });
            }
            (_, BenefitValue::Percentage(rate))
                if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED =>
            {
                return Err(ConfigurationError::InvalidRate {
                    context: format!("benefit {}", benefit.kind),
                    rate,
                });
            }
            _ => {}
        }
    }

    Ok(())
}
