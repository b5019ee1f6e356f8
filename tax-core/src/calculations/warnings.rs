use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Non-fatal anomaly found while calculating. Inputs are clamped and the
/// calculation completes; the warning travels in the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalculationWarning {
    /// Gross profit was below zero and treated as zero taxable profit.
    NegativeGrossProfit { gross_profit: Decimal },
    /// Credits were larger than the tax they offset; the excess is lost.
    CreditExceedsTax {
        tax_before_credits: Decimal,
        total_credit: Decimal,
    },
    /// More than one percentage exemption applied in the same year.
    StackedExemptions { count: usize },
}
