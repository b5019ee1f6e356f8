//! Tax credits (heffingskortingen) offset against tax before credits.
//!
//! Each enabled credit follows one of three curves, see [`CreditCurve`]:
//!
//! | Curve     | Value at taxable income `y` |
//! |-----------|-----------------------------|
//! | Flat      | `min(max_amount, tax_before_credits)` |
//! | Phased    | `max_amount` up to `phaseout_start`, then `max_amount - rate × (y - start) / 1000`, clamped to `[floor, max_amount]`; the floor from `phaseout_end` on |
//! | Bracketed | `base_amount + rate% × (y - income_from)` (or `× y`) of the one bracket containing `y`, clamped to `[0, max_amount]` |
//!
//! Final tax is `max(0, tax_before_credits - total_credit)`; credits never
//! produce a refund. The part that could not be used is reported as
//! `unused_credit`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{non_negative, percent_of, round_half_up};
use crate::calculations::warnings::CalculationWarning;
use crate::models::{Credit, CreditBracket, CreditCurve, CreditKind, ConfigurationError, validate_credits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    Applied,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLine {
    pub kind: CreditKind,
    pub name: String,
    pub status: CreditStatus,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditResult {
    /// One line per configured credit, in configuration order.
    pub per_credit: Vec<CreditLine>,
    pub total_credit: Decimal,
    pub final_tax: Decimal,
    /// Credit that exceeded the tax and was lost.
    pub unused_credit: Decimal,
    pub warnings: Vec<CalculationWarning>,
}

impl CreditResult {
    /// Cent-rounded copy for reporting.
    pub fn rounded(&self) -> Self {
        Self {
            per_credit: self
                .per_credit
                .iter()
                .map(|line| CreditLine {
                    amount: round_half_up(line.amount),
                    ..line.clone()
                })
                .collect(),
            total_credit: round_half_up(self.total_credit),
            final_tax: round_half_up(self.final_tax),
            unused_credit: round_half_up(self.unused_credit),
            warnings: self.warnings.clone(),
        }
    }
}

/// Evaluates a year's credits against tax before credits.
#[derive(Debug, Clone)]
pub struct CreditPhaseoutEngine {
    credits: Vec<Credit>,
}

impl CreditPhaseoutEngine {
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for negative ceilings, partial
    /// phaseout settings or malformed credit bracket tables.
    pub fn new(credits: &[Credit]) -> Result<Self, ConfigurationError> {
        validate_credits(credits)?;
        Ok(Self {
            credits: credits.iter().map(Credit::normalized).collect(),
        })
    }

    pub fn credits(&self) -> &[Credit] {
        &self.credits
    }

    pub fn apply(
        &self,
        tax_before_credits: Decimal,
        taxable_income: Decimal,
    ) -> CreditResult {
        let per_credit: Vec<CreditLine> = self
            .credits
            .iter()
            .map(|credit| {
                let (status, amount) = if credit.is_enabled {
                    (
                        CreditStatus::Applied,
                        credit_amount(credit, tax_before_credits, taxable_income),
                    )
                } else {
                    (CreditStatus::Disabled, Decimal::ZERO)
                };
                debug!(credit = %credit.kind, amount = %amount, "credit evaluated");

                CreditLine {
                    kind: credit.kind.clone(),
                    name: credit.name.clone(),
                    status,
                    amount,
                }
            })
            .collect();

        let total_credit: Decimal = per_credit.iter().map(|line| line.amount).sum();
        let final_tax = non_negative(tax_before_credits - total_credit);
        let unused_credit = non_negative(total_credit - tax_before_credits);

        let mut warnings = Vec::new();
        if unused_credit > Decimal::ZERO {
            warn!(
                tax_before_credits = %tax_before_credits,
                total_credit = %total_credit,
                "Credits exceed tax before credits; final tax clamped to zero"
            );
            warnings.push(CalculationWarning::CreditExceedsTax {
                tax_before_credits,
                total_credit,
            });
        }

        CreditResult {
            per_credit,
            total_credit,
            final_tax,
            unused_credit,
            warnings,
        }
    }
}

fn credit_amount(
    credit: &Credit,
    tax_before_credits: Decimal,
    taxable_income: Decimal,
) -> Decimal {
    match credit.curve() {
        CreditCurve::Flat => credit.max_amount.min(non_negative(tax_before_credits)),
        CreditCurve::Phased {
            start,
            end,
            rate,
            floor,
        } => phased_amount(credit.max_amount, start, end, rate, floor, taxable_income),
        CreditCurve::Bracketed(brackets) => {
            bracketed_amount(credit.max_amount, brackets, taxable_income)
        }
    }
}

fn phased_amount(
    max_amount: Decimal,
    start: Decimal,
    end: Option<Decimal>,
    rate: Decimal,
    floor: Decimal,
    income: Decimal,
) -> Decimal {
    if income <= start {
        return max_amount;
    }
    if end.is_some_and(|end| income >= end) {
        return floor;
    }

    let reduction = rate * ((income - start) / Decimal::ONE_THOUSAND);
    (max_amount - reduction).clamp(floor, max_amount)
}

/// Value of the single bracket whose range contains `income`. Brackets
/// are sorted and tile `[0, ∞)`.
fn bracketed_amount(
    max_amount: Decimal,
    brackets: &[CreditBracket],
    income: Decimal,
) -> Decimal {
    let income = non_negative(income);
    let governing = brackets
        .iter()
        .find(|bracket| bracket.income_to.is_none_or(|to| income < to));

    let Some(bracket) = governing else {
        return Decimal::ZERO;
    };

    let base = if bracket.rate_applies_to_excess {
        income - bracket.income_from
    } else {
        income
    };
    let value = bracket.base_amount + percent_of(base, bracket.rate);
    value.clamp(Decimal::ZERO, max_amount)
}
