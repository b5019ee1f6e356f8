//! Progressive income tax over an ordered bracket table.
//!
//! Each bracket taxes only the slice of income that falls inside its range:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Skip everything when income is zero or negative |
//! | 2    | For each bracket with `income_from < income`, slice = `min(income, income_to) - income_from` |
//! | 3    | Bracket tax = slice × rate / 100 |
//! | 4    | Stop at the first bracket that starts at or above the income |
//!
//! Intermediate figures are not rounded, so the per-bracket lines always sum
//! to the total exactly.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxBracket;
//! use tax_core::calculations::BracketTaxCalculator;
//!
//! let brackets = vec![
//!     TaxBracket { bracket_order: 1, income_from: dec!(0), income_to: Some(dec!(75000)), rate: dec!(33) },
//!     TaxBracket { bracket_order: 2, income_from: dec!(75000), income_to: None, rate: dec!(45) },
//! ];
//!
//! let calculator = BracketTaxCalculator::new(&brackets).unwrap();
//! let result = calculator.compute(dec!(90000));
//!
//! assert_eq!(result.total_tax, dec!(31500));
//! assert_eq!(result.per_bracket.len(), 2);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::{percent_of, round_half_up};
use crate::models::{ConfigurationError, TaxBracket, sorted_by_order, validate_tax_brackets};

/// Tax owed within one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTaxLine {
    pub bracket_order: u32,
    /// E.g. `€0 - €75,000`.
    pub range_label: String,
    pub rate: Decimal,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
}

/// Result of a bracket walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTaxResult {
    pub total_tax: Decimal,
    /// One line per bracket with a non-zero slice, in bracket order.
    pub per_bracket: Vec<BracketTaxLine>,
}

impl BracketTaxResult {
    fn zero() -> Self {
        Self {
            total_tax: Decimal::ZERO,
            per_bracket: Vec::new(),
        }
    }

    /// Cent-rounded copy for reporting.
    pub fn rounded(&self) -> Self {
        Self {
            total_tax: round_half_up(self.total_tax),
            per_bracket: self
                .per_bracket
                .iter()
                .map(|line| BracketTaxLine {
                    taxable_amount: round_half_up(line.taxable_amount),
                    tax_amount: round_half_up(line.tax_amount),
                    ..line.clone()
                })
                .collect(),
        }
    }
}

/// Calculator over a validated, order-sorted bracket table.
#[derive(Debug, Clone)]
pub struct BracketTaxCalculator {
    brackets: Vec<TaxBracket>,
}

impl BracketTaxCalculator {
    /// Creates a calculator, sorting the brackets by order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the table does not tile `[0, ∞)`
    /// contiguously or a rate lies outside 0–100%.
    pub fn new(brackets: &[TaxBracket]) -> Result<Self, ConfigurationError> {
        validate_tax_brackets(brackets)?;
        Ok(Self {
            brackets: sorted_by_order(brackets),
        })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Computes the tax on `income`. Zero or negative income yields zero tax
    /// and no lines.
    pub fn compute(
        &self,
        income: Decimal,
    ) -> BracketTaxResult {
        if income <= Decimal::ZERO {
            return BracketTaxResult::zero();
        }

        let mut result = BracketTaxResult::zero();
        for bracket in &self.brackets {
            if income <= bracket.income_from {
                break;
            }

            let upper = match bracket.income_to {
                Some(to) => income.min(to),
                None => income,
            };
            let taxable_amount = upper - bracket.income_from;
            if taxable_amount <= Decimal::ZERO {
                continue;
            }

            let tax_amount = percent_of(taxable_amount, bracket.rate);
            debug!(
                bracket = bracket.bracket_order,
                taxable = %taxable_amount,
                tax = %tax_amount,
                "bracket slice taxed"
            );

            result.total_tax += tax_amount;
            result.per_bracket.push(BracketTaxLine {
                bracket_order: bracket.bracket_order,
                range_label: bracket.range_label(),
                rate: bracket.rate,
                taxable_amount,
                tax_amount,
            });
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn two_brackets() -> Vec<TaxBracket> {
        vec![
            TaxBracket {
                bracket_order: 1,
                income_from: dec!(0),
                income_to: Some(dec!(75000)),
                rate: dec!(33),
            },
            TaxBracket {
                bracket_order: 2,
                income_from: dec!(75000),
                income_to: None,
                rate: dec!(45),
            },
        ]
    }

    fn dutch_2025_brackets() -> Vec<TaxBracket> {
        vec![
            TaxBracket {
                bracket_order: 1,
                income_from: dec!(0),
                income_to: Some(dec!(38441)),
                rate: dec!(35.82),
            },
            TaxBracket {
                bracket_order: 2,
                income_from: dec!(38441),
                income_to: Some(dec!(76817)),
                rate: dec!(37.48),
            },
            TaxBracket {
                bracket_order: 3,
                income_from: dec!(76817),
                income_to: None,
                rate: dec!(49.50),
            },
        ]
    }

    fn calculator() -> BracketTaxCalculator {
        BracketTaxCalculator::new(&two_brackets()).unwrap()
    }

    // =========================================================================
    // new tests
    // =========================================================================

    #[test]
    fn new_sorts_brackets_by_order() {
        let mut brackets = two_brackets();
        brackets.reverse();

        let calculator = BracketTaxCalculator::new(&brackets).unwrap();

        assert_eq!(calculator.brackets()[0].bracket_order, 1);
        assert_eq!(calculator.brackets()[1].bracket_order, 2);
    }

    #[test]
    fn new_rejects_invalid_table() {
        let result = BracketTaxCalculator::new(&[]);

        assert!(matches!(result, Err(ConfigurationError::NoBrackets(_))));
    }

    // =========================================================================
    // compute tests
    // =========================================================================

    #[test]
    fn compute_returns_zero_for_zero_income() {
        let result = calculator().compute(dec!(0));

        assert_eq!(result.total_tax, dec!(0));
        assert!(result.per_bracket.is_empty());
    }

    #[test]
    fn compute_returns_zero_for_negative_income() {
        let result = calculator().compute(dec!(-5000));

        assert_eq!(result.total_tax, dec!(0));
        assert!(result.per_bracket.is_empty());
    }

    #[test]
    fn compute_taxes_income_spanning_two_brackets() {
        let result = calculator().compute(dec!(90000));

        assert_eq!(result.total_tax, dec!(31500));
        assert_eq!(
            result.per_bracket,
            vec![
                BracketTaxLine {
                    bracket_order: 1,
                    range_label: "€0 - €75,000".to_string(),
                    rate: dec!(33),
                    taxable_amount: dec!(75000),
                    tax_amount: dec!(24750),
                },
                BracketTaxLine {
                    bracket_order: 2,
                    range_label: "€75,000 - ∞".to_string(),
                    rate: dec!(45),
                    taxable_amount: dec!(15000),
                    tax_amount: dec!(6750),
                },
            ]
        );
    }

    #[test]
    fn compute_stops_at_bracket_boundary() {
        let result = calculator().compute(dec!(75000));

        assert_eq!(result.total_tax, dec!(24750));
        assert_eq!(result.per_bracket.len(), 1);
    }

    #[test]
    fn compute_keeps_full_precision_between_brackets() {
        let calculator = BracketTaxCalculator::new(&dutch_2025_brackets()).unwrap();

        let result = calculator.compute(dec!(40376.25));

        // 38441 × 35.82% = 13769.5662; 1935.25 × 37.48% = 725.3317
        assert_eq!(result.per_bracket[0].tax_amount, dec!(13769.5662));
        assert_eq!(result.per_bracket[1].tax_amount, dec!(725.3317));
        assert_eq!(result.total_tax, dec!(14494.8979));
        assert_eq!(result.rounded().total_tax, dec!(14494.90));
    }

    #[test]
    fn compute_lines_sum_to_total() {
        let calculator = BracketTaxCalculator::new(&dutch_2025_brackets()).unwrap();

        for income in [dec!(0.01), dec!(38441), dec!(50000.33), dec!(76817.01), dec!(250000)] {
            let result = calculator.compute(income);
            let sum: Decimal = result.per_bracket.iter().map(|line| line.tax_amount).sum();

            assert_eq!(sum, result.total_tax, "lines do not sum for income {income}");
        }
    }

    #[test]
    fn compute_is_monotonic_in_income() {
        let calculator = BracketTaxCalculator::new(&dutch_2025_brackets()).unwrap();
        let mut previous = Decimal::ZERO;

        for step in 0..200 {
            let income = Decimal::from(step * 750) + dec!(0.37);
            let tax = calculator.compute(income).total_tax;

            assert!(tax >= previous, "tax decreased at income {income}");
            previous = tax;
        }
    }

    #[test]
    fn rounded_projects_lines_to_cents() {
        let calculator = BracketTaxCalculator::new(&dutch_2025_brackets()).unwrap();

        let rounded = calculator.compute(dec!(40376.25)).rounded();

        assert_eq!(rounded.per_bracket[0].tax_amount, dec!(13769.57));
        assert_eq!(rounded.per_bracket[1].tax_amount, dec!(725.33));
    }
}
