//! Income tax for a self-employed taxpayer.
//!
//! [`TaxEngine`] holds one validated pipeline per configured year and runs
//! the stages in a fixed order:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Gross profit reduced by elected benefits (final taxable income) |
//! | 2    | Bracket walk over final taxable income (tax before credits) |
//! | 3    | Credits evaluated on final taxable income, subtracted from step 2 (final tax) |
//! | 4    | Effective rate `final_tax / gross_profit`, net profit `gross_profit - final_tax` |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::TaxEngine;
//! use tax_core::{ExemptionStacking, TaxBracket, TaxYearConfig, TaxpayerElection};
//!
//! let config = TaxYearConfig {
//!     tax_year: 2025,
//!     brackets: vec![
//!         TaxBracket { bracket_order: 1, income_from: dec!(0), income_to: Some(dec!(75000)), rate: dec!(33) },
//!         TaxBracket { bracket_order: 2, income_from: dec!(75000), income_to: None, rate: dec!(45) },
//!     ],
//!     benefits: Vec::new(),
//!     credits: Vec::new(),
//!     exemption_stacking: ExemptionStacking::Additive,
//! };
//!
//! let engine = TaxEngine::new(vec![config]).unwrap();
//! let result = engine.calculate(2025, dec!(90000), &TaxpayerElection::default()).unwrap();
//!
//! assert_eq!(result.final_tax, dec!(31500));
//! assert_eq!(result.net_profit_after_tax, dec!(58500));
//! ```

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::benefits::{BenefitEngine, BenefitResult, BenefitSummaryLine, benefit_summary};
use crate::calculations::brackets::{BracketTaxCalculator, BracketTaxResult};
use crate::calculations::common::round_half_up;
use crate::calculations::credits::{CreditPhaseoutEngine, CreditResult};
use crate::calculations::warnings::CalculationWarning;
use crate::models::{ConfigurationError, TaxYearConfig, TaxpayerElection};

/// Full breakdown of one income-tax calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    pub tax_year: i32,
    pub gross_profit: Decimal,
    pub benefits: BenefitResult,
    pub taxable_income: Decimal,
    pub brackets: BracketTaxResult,
    pub tax_before_credits: Decimal,
    pub credits: CreditResult,
    pub final_tax: Decimal,
    /// Fraction of gross profit, e.g. `0.2665`. Zero when profit is not
    /// positive.
    pub effective_rate: Decimal,
    pub net_profit_after_tax: Decimal,
    /// Every warning raised by the stages, in pipeline order.
    pub warnings: Vec<CalculationWarning>,
}

impl TaxCalculationResult {
    pub fn effective_rate_percentage(&self) -> Decimal {
        self.effective_rate * Decimal::ONE_HUNDRED
    }

    /// Copy with money rounded to cents and the effective rate to four
    /// places.
    pub fn rounded(&self) -> Self {
        let benefits = &self.benefits;
        Self {
            tax_year: self.tax_year,
            gross_profit: round_half_up(self.gross_profit),
            benefits: BenefitResult {
                total_fixed_deduction: round_half_up(benefits.total_fixed_deduction),
                taxable_after_fixed: round_half_up(benefits.taxable_after_fixed),
                mkb_exemption_amount: round_half_up(benefits.mkb_exemption_amount),
                final_taxable_income: round_half_up(benefits.final_taxable_income),
                ..benefits.clone()
            },
            taxable_income: round_half_up(self.taxable_income),
            brackets: self.brackets.rounded(),
            tax_before_credits: round_half_up(self.tax_before_credits),
            credits: self.credits.rounded(),
            final_tax: round_half_up(self.final_tax),
            effective_rate: self
                .effective_rate
                .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
            net_profit_after_tax: round_half_up(self.net_profit_after_tax),
            warnings: self.warnings.clone(),
        }
    }
}

/// Tax with and without the taxpayer's benefits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSavings {
    pub with_benefits: Decimal,
    pub without_benefits: Decimal,
    pub savings: Decimal,
    /// Savings as a percentage of the tax without benefits.
    pub savings_percentage: Decimal,
}

impl TaxSavings {
    pub fn rounded(&self) -> Self {
        Self {
            with_benefits: round_half_up(self.with_benefits),
            without_benefits: round_half_up(self.without_benefits),
            savings: round_half_up(self.savings),
            savings_percentage: round_half_up(self.savings_percentage),
        }
    }
}

/// Validated stages for one year.
/// Largest gross profit or loss, in euros, the engine accepts. Keeps every
/// intermediate product well inside `Decimal` range.
pub const MAX_GROSS_PROFIT: Decimal = dec!(1000000000000000);

/// A calculation that cannot be run for the given inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxCalculationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("gross profit {gross_profit} is outside the supported range of ±{limit}")]
    GrossProfitOutOfRange { gross_profit: Decimal, limit: Decimal },
}

#[derive(Debug, Clone)]
struct YearPipeline {
    config: TaxYearConfig,
    benefits: BenefitEngine,
    brackets: BracketTaxCalculator,
    credits: CreditPhaseoutEngine,
}

impl YearPipeline {
    fn new(config: TaxYearConfig) -> Result<Self, ConfigurationError> {
        let benefits = BenefitEngine::new(&config.benefits, config.exemption_stacking)?;
        let brackets = BracketTaxCalculator::new(&config.brackets)?;
        let credits = CreditPhaseoutEngine::new(&config.credits)?;

        Ok(Self {
            config,
            benefits,
            brackets,
            credits,
        })
    }

    fn run(
        &self,
        gross_profit: Decimal,
        election: &TaxpayerElection,
    ) -> TaxCalculationResult {
        let mut benefits = self.benefits.apply(gross_profit, election);
        let taxable_income = benefits.final_taxable_income;

        let brackets = self.brackets.compute(taxable_income);
        let tax_before_credits = brackets.total_tax;

        let mut credits = self.credits.apply(tax_before_credits, taxable_income);
        let final_tax = credits.final_tax;

        let effective_rate = if gross_profit > Decimal::ZERO {
            final_tax / gross_profit
        } else {
            Decimal::ZERO
        };

        let mut warnings = std::mem::take(&mut benefits.warnings);
        warnings.append(&mut credits.warnings);

        debug!(
            tax_year = self.config.tax_year,
            gross_profit = %gross_profit,
            taxable_income = %taxable_income,
            tax_before_credits = %tax_before_credits,
            final_tax = %final_tax,
            "income tax calculated"
        );

        TaxCalculationResult {
            tax_year: self.config.tax_year,
            gross_profit,
            benefits,
            taxable_income,
            brackets,
            tax_before_credits,
            credits,
            final_tax,
            effective_rate,
            net_profit_after_tax: gross_profit - final_tax,
            warnings,
        }
    }
}

/// The income-tax entry point over a set of configured years.
///
/// Every year is validated when the engine is built; calculations are pure
/// and can run concurrently on a shared engine.
#[derive(Debug, Clone, Default)]
pub struct TaxEngine {
    years: BTreeMap<i32, YearPipeline>,
}

impl TaxEngine {
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for the first malformed year, or
    /// [`ConfigurationError::DuplicateTaxYear`] if a year appears twice.
    pub fn new(configs: impl IntoIterator<Item = TaxYearConfig>) -> Result<Self, ConfigurationError> {
        let mut years = BTreeMap::new();
        for config in configs {
            let year = config.tax_year;
            if years.contains_key(&year) {
                return Err(ConfigurationError::DuplicateTaxYear(year));
            }
            years.insert(year, YearPipeline::new(config)?);
        }
        Ok(Self { years })
    }

    pub fn tax_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownTaxYear`] if `year` is not configured.
    pub fn config(
        &self,
        year: i32,
    ) -> Result<&TaxYearConfig, ConfigurationError> {
        self.pipeline(year).map(|pipeline| &pipeline.config)
    }

    /// Runs the full pipeline for `year`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownTaxYear`] if `year` is not configured,
    /// or [`TaxCalculationError::GrossProfitOutOfRange`] beyond [`MAX_GROSS_PROFIT`].
    pub fn calculate(
        &self,
        year: i32,
        gross_profit: Decimal,
        election: &TaxpayerElection,
    ) -> Result<TaxCalculationResult, TaxCalculationError> {
        let pipeline = self.pipeline(year)?;
        check_gross_profit(gross_profit)?;
        Ok(pipeline.run(gross_profit, election))
    }

    /// Compares the tax owed with the election against the tax owed with
    /// no benefits elected.
    ///
    /// # Errors
    ///
    /// Same as [`TaxEngine::calculate`].
    pub fn calculate_savings(
        &self,
        year: i32,
        gross_profit: Decimal,
        election: &TaxpayerElection,
    ) -> Result<TaxSavings, TaxCalculationError> {
        let pipeline = self.pipeline(year)?;
        check_gross_profit(gross_profit)?;
        let with_benefits = pipeline.run(gross_profit, election).final_tax;
        let without_benefits = pipeline
            .run(gross_profit, &election.without_benefits())
            .final_tax;

        let savings = without_benefits - with_benefits;
        let savings_percentage = if without_benefits > Decimal::ZERO {
            savings / without_benefits * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Ok(TaxSavings {
            with_benefits,
            without_benefits,
            savings,
            savings_percentage,
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownTaxYear`] if `year` is not configured.
    pub fn benefit_summary(
        &self,
        year: i32,
        election: &TaxpayerElection,
    ) -> Result<Vec<BenefitSummaryLine>, ConfigurationError> {
        Ok(benefit_summary(self.config(year)?, election))
    }

    fn pipeline(
        &self,
        year: i32,
    ) -> Result<&YearPipeline, ConfigurationError> {
        self.years
            .get(&year)
            .ok_or(ConfigurationError::UnknownTaxYear(year))
    }
}

fn check_gross_profit(gross_profit: Decimal) -> Result<(), TaxCalculationError> {
    if gross_profit.abs() > MAX_GROSS_PROFIT {
        return Err(TaxCalculationError::GrossProfitOutOfRange {
            gross_profit,
            limit: MAX_GROSS_PROFIT,
        });
    }
    Ok(())
}
