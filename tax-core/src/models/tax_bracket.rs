use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::format_euro;
use crate::models::ConfigurationError;

/// One progressive income-tax bracket.
///
/// `income_from` is inclusive, `income_to` exclusive. Only the last bracket
/// of a year may leave `income_to` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub bracket_order: u32,
    pub income_from: Decimal,
    pub income_to: Option<Decimal>,
    /// Percentage, e.g. `35.82` for 35.82%.
    pub rate: Decimal,
}

impl TaxBracket {
    /// Display label for the bracket range, e.g. `€38,441 - €76,817` or
    /// `€76,817 - ∞`.
    pub fn range_label(&self) -> String {
        range_label(self.income_from, self.income_to)
    }
}

pub(crate) fn range_label(
    from: Decimal,
    to: Option<Decimal>,
) -> String {
    match to {
        Some(to) => format!("{} - {}", format_euro(from), format_euro(to)),
        None => format!("{} - ∞", format_euro(from)),
    }
}

/// Common view over the two bracket tables (income tax and credit curves) so
/// both are checked by the same contiguity rules.
pub(crate) trait IncomeRange {
    fn order(&self) -> u32;
    fn lower(&self) -> Decimal;
    fn upper(&self) -> Option<Decimal>;
}

impl IncomeRange for TaxBracket {
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

/// Returns a copy of `rows` sorted by bracket order.
pub(crate) fn sorted_by_order<T: IncomeRange + Clone>(rows: &[T]) -> Vec<T> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|row| row.order());
    sorted
}

/// Checks that `rows` (already sorted by order) number 1..=n and tile
/// `[0, ∞)` without gaps or overlaps.
pub(crate) fn check_contiguous<T: IncomeRange>(
    table: &str,
    rows: &[T],
) -> Result<(), ConfigurationError> {
    let Some(first) = rows.first() else {
        return Err(ConfigurationError::NoBrackets(table.to_string()));
    };
    if !first.lower().is_zero() {
        return Err(ConfigurationError::FirstBracketNotAtZero {
            table: table.to_string(),
            income_from: first.lower(),
        });
    }

    let mut expected_from = Decimal::ZERO;
    for (index, row) in rows.iter().enumerate() {
        let expected_order = index as u32 + 1;
        if row.order() != expected_order {
            return Err(ConfigurationError::BracketOrderGap {
                table: table.to_string(),
                expected: expected_order,
                found: row.order(),
            });
        }
        if row.lower() != expected_from {
            return Err(ConfigurationError::BracketNotContiguous {
                table: table.to_string(),
                order: row.order(),
                expected_from,
                found_from: row.lower(),
            });
        }

        let is_last = index + 1 == rows.len();
        match row.upper() {
            Some(to) if to <= row.lower() => {
                return Err(ConfigurationError::InvalidBracketRange {
                    table: table.to_string(),
                    order: row.order(),
                    income_from: row.lower(),
                    income_to: to,
                });
            }
            Some(_) if is_last => {
                return Err(ConfigurationError::LastBracketBounded {
                    table: table.to_string(),
                    order: row.order(),
                });
            }
            Some(to) => expected_from = to,
            None if !is_last => {
                return Err(ConfigurationError::UnboundedBracketNotLast {
                    table: table.to_string(),
                    order: row.order(),
                });
            }
            None => {}
        }
    }

    Ok(())
}

/// Validates an income-tax bracket table: contiguous coverage of `[0, ∞)` and
/// every rate within 0–100%.
pub(crate) fn validate_tax_brackets(brackets: &[TaxBracket]) -> Result<(), ConfigurationError> {
    let sorted = sorted_by_order(brackets);
    check_contiguous("income tax", &sorted)?;

    for bracket in &sorted {
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE_HUNDRED {
            return Err(ConfigurationError::InvalidRate {
                context: format!("income tax bracket {}", bracket.bracket_order),
                rate: bracket.rate,
            });
        }
    }
    Ok(())
}
