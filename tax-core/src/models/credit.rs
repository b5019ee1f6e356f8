use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ConfigurationError;
use crate::models::tax_bracket::{IncomeRange, check_contiguous, sorted_by_order};

/// Kind of tax credit (heffingskorting).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CreditKind {
    /// Algemene heffingskorting.
    GeneralTaxCredit,
    /// Arbeidskorting.
    LaborTaxCredit,
    Other(String),
}

impl CreditKind {
    pub fn key(&self) -> &str {
        match self {
            Self::GeneralTaxCredit => "algemene_heffingskorting",
            Self::LaborTaxCredit => "arbeidskorting",
            Self::Other(id) => id,
        }
    }

    pub fn parse(key: &str) -> Self {
        match key {
            "algemene_heffingskorting" => Self::GeneralTaxCredit,
            "arbeidskorting" => Self::LaborTaxCredit,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CreditKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<String> for CreditKind {
    fn from(key: String) -> Self {
        Self::parse(&key)
    }
}

impl From<CreditKind> for String {
    fn from(kind: CreditKind) -> Self {
        kind.key().to_string()
    }
}

/// One row of a piecewise credit curve.
///
/// Unlike income-tax brackets these are mutually exclusive: the single row
/// whose range contains the income decides the credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBracket {
    pub bracket_order: u32,
    pub income_from: Decimal,
    pub income_to: Option<Decimal>,
    /// Percentage; negative rates model the phase-out part of the curve.
    pub rate: Decimal,
    pub base_amount: Decimal,
    /// When set, `rate` applies to income above `income_from`; otherwise to
    /// the whole income.
    pub rate_applies_to_excess: bool,
}

impl IncomeRange for CreditBracket {
    fn order(&self) -> u32 {
        self.bracket_order
    }
    fn lower(&self) -> Decimal {
        self.income_from
    }
    fn upper(&self) -> Option<Decimal> {
        self.income_to
    }
}

/// A tax credit definition for one year.
///
/// A credit with a non-empty `brackets` table follows that curve and ignores
/// the phaseout fields. Otherwise it phases out linearly when
/// `phaseout_start` is set, and is flat when it is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub kind: CreditKind,
    pub name: String,
    pub max_amount: Decimal,
    pub phaseout_start: Option<Decimal>,
    pub phaseout_end: Option<Decimal>,
    /// Euro reduction per €1000 of income above `phaseout_start`.
    pub phaseout_rate: Option<Decimal>,
    /// Floor the phased credit never drops below.
    pub minimum_amount: Option<Decimal>,
    #[serde(default)]
    pub brackets: Vec<CreditBracket>,
    pub is_enabled: bool,
}

/// How a credit's value is derived from income.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditCurve<'a> {
    Flat,
    Phased {
        start: Decimal,
        end: Option<Decimal>,
        rate: Decimal,
        floor: Decimal,
    },
    Bracketed(&'a [CreditBracket]),
}

impl Credit {
    /// Resolves which rule governs this credit. Assumes a validated credit.
    pub fn curve(&self) -> CreditCurve<'_> {
        if !self.brackets.is_empty() {
            return CreditCurve::Bracketed(&self.brackets);
        }
        match (self.phaseout_start, self.phaseout_rate) {
            (Some(start), Some(rate)) => CreditCurve::Phased {
                start,
                end: self.phaseout_end,
                rate,
                floor: self.minimum_amount.unwrap_or(Decimal::ZERO),
            },
            _ => CreditCurve::Flat,
        }
    }

    /// Returns the credit with its bracket table sorted by order.
    pub(crate) fn normalized(&self) -> Self {
        Self {
            brackets: sorted_by_order(&self.brackets),
            ..self.clone()
        }
    }
}

pub(crate) fn validate_credits(credits: &[Credit]) -> Result<(), ConfigurationError> {
    for credit in credits {
        let context = format!("credit {}", credit.kind);

        if credit.max_amount < Decimal::ZERO {
            return Err(ConfigurationError::NegativeAmount {
                context,
                amount: credit.max_amount,
            });
        }
        if let Some(floor) = credit.minimum_amount {
            if floor < Decimal::ZERO || floor > credit.max_amount {
                return Err(ConfigurationError::InvalidCreditFloor {
                    credit: credit.kind.to_string(),
                    floor,
                    max_amount: credit.max_amount,
                });
            }
        }

        if !credit.brackets.is_empty() {
            validate_credit_brackets(credit)?;
            continue;
        }

        match (credit.phaseout_start, credit.phaseout_rate) {
            (Some(start), Some(rate)) => {
                if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                    return Err(ConfigurationError::InvalidRate { context, rate });
                }
                if let Some(end) = credit.phaseout_end {
                    if end <= start {
                        return Err(ConfigurationError::InvalidPhaseoutRange {
                            credit: credit.kind.to_string(),
                            start,
                            end,
                        });
                    }
                }
            }
            (None, None) if credit.phaseout_end.is_none() => {}
            _ => {
                return Err(ConfigurationError::IncompletePhaseout(
                    credit.kind.to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_credit_brackets(credit: &Credit) -> Result<(), ConfigurationError> {
    let table = format!("credit {}", credit.kind);
    let sorted = sorted_by_order(&credit.brackets);
    check_contiguous(&table, &sorted)?;

    for bracket in &sorted {
        if bracket.rate < -Decimal::ONE_HUNDRED || bracket.rate > Decimal::ONE_HUNDRED {
            return Err(ConfigurationError::InvalidRate {
                context: format!("{table} bracket {}", bracket.bracket_order),
                rate: bracket.rate,
            });
        }
        if bracket.base_amount < Decimal::ZERO {
            return Err(ConfigurationError::NegativeAmount {
                context: format!("{table} bracket {}", bracket.bracket_order),
                amount: bracket.base_amount,
            });
        }
    }
    Ok(())
}
