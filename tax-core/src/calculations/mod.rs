//! The tax and VAT settlement engine.
//!
//! [`TaxEngine`] is the entry point for income tax; the benefit, bracket and
//! credit stages it chains are exported for callers that need a single
//! stage. [`VatSettlementAggregator`] is independent of income tax.

pub mod benefits;
pub mod brackets;
pub mod common;
pub mod credits;
pub mod income_tax;
pub mod vat;
pub mod warnings;

pub use benefits::{
    BenefitEngine, BenefitOutcome, BenefitResult, BenefitStatus, BenefitSummaryLine, Deduction,
    IneligibilityReason, benefit_summary, eligibility,
};
pub use brackets::{BracketTaxCalculator, BracketTaxLine, BracketTaxResult};
pub use credits::{CreditLine, CreditPhaseoutEngine, CreditResult, CreditStatus};
pub use income_tax::{
    MAX_GROSS_PROFIT, TaxCalculationError, TaxCalculationResult, TaxEngine, TaxSavings,
};
pub use vat::{
    SettlementStatus, SettlementView, VatSettlementAggregator, VatSettlementError, VatYearRollup,
};
pub use warnings::CalculationWarning;
