//! Entrepreneur deductions and exemptions.
//!
//! Gross profit is reduced to taxable income in two stages:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Keep benefits the taxpayer elected and is eligible for |
//! | 2    | Subtract every fixed-amount benefit, floored at 0 (taxable after fixed) |
//! | 3    | Apply percentage exemptions to the step 2 figure |
//! | 4    | Subtract the exemption, floored at 0 (final taxable income) |
//!
//! Several percentage exemptions combine according to the year's
//! [`ExemptionStacking`].
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::BenefitEngine;
//! use tax_core::{Benefit, BenefitKind, BenefitValue, ExemptionStacking, TaxpayerElection};
//!
//! let benefits = vec![Benefit {
//!     kind: BenefitKind::SmeProfitExemption,
//!     name: "MKB-winstvrijstelling".to_string(),
//!     value: BenefitValue::Percentage(dec!(12.7)),
//!     requires_hours_criterion: false,
//!     minimum_hours_required: None,
//!     max_usage_count: None,
//!     eligibility_criteria: None,
//! }];
//! let engine = BenefitEngine::new(&benefits, ExemptionStacking::Additive).unwrap();
//! let election = TaxpayerElection::default().elect(BenefitKind::SmeProfitExemption);
//!
//! let result = engine.apply(dec!(50000), &election);
//!
//! assert_eq!(result.mkb_exemption_amount, dec!(6350));
//! assert_eq!(result.final_taxable_income, dec!(43650));
//! ```

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{format_euro, format_percentage, non_negative, percent_of};
use crate::calculations::warnings::CalculationWarning;
use crate::models::{
    Benefit, BenefitKind, BenefitValue, ConfigurationError, ExemptionStacking,
    STARTER_WINDOW_YEARS, TaxYearConfig, TaxpayerElection, validate_benefits,
};

/// Why an elected benefit did not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibilityReason {
    HoursCriterionUnmet {
        required: u32,
        hours_worked: Option<u32>,
    },
    UsageLimitReached { used: u32, max: u32 },
    StarterWindowExceeded { years_as_entrepreneur: u32 },
}

impl fmt::Display for IneligibilityReason {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::HoursCriterionUnmet { .. } => f.write_str("hours criterion unmet"),
            Self::UsageLimitReached { used, max } => {
                write!(f, "usage limit reached ({used} of {max})")
            }
            Self::StarterWindowExceeded {
                years_as_entrepreneur,
            } => write!(
                f,
                "starter window exceeded ({years_as_entrepreneur} years as entrepreneur)"
            ),
        }
    }
}

/// Checks whether `election` qualifies for `benefit`, ignoring whether it
/// was elected.
///
/// A recorded hour count takes precedence over the self-declared flag.
/// Missing facts count as "not met", except an unknown number of years as
/// entrepreneur, which does not disqualify.
pub fn eligibility(
    benefit: &Benefit,
    election: &TaxpayerElection,
) -> Result<(), IneligibilityReason> {
    if benefit.requires_hours_criterion {
        let required = benefit.minimum_hours();
        // Recorded hours decide; the flag only stands in when none are recorded.
        let met = match election.hours_worked {
            Some(hours) => hours >= required,
            None => election.meets_hours_criterion,
        };
        if !met {
            return Err(IneligibilityReason::HoursCriterionUnmet {
                required,
                hours_worked: election.hours_worked,
            });
        }
    }

    if let Some(max) = benefit.max_usage_count {
        let used = election.usage_count(&benefit.kind);
        if used >= max {
            return Err(IneligibilityReason::UsageLimitReached { used, max });
        }
    }

    if benefit.kind == BenefitKind::StarterDeduction {
        if let Some(years) = election.years_as_entrepreneur {
            if years > STARTER_WINDOW_YEARS {
                return Err(IneligibilityReason::StarterWindowExceeded {
                    years_as_entrepreneur: years,
                });
            }
        }
    }

    Ok(())
}

/// What happened to one configured benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BenefitStatus {
    /// Fixed deduction subtracted from profit.
    Applied { amount: Decimal },
    /// Percentage exemption; `amount` may be zero when nothing was left to
    /// exempt.
    Exempted { percentage: Decimal, amount: Decimal },
    NotElected,
    NotApplied(IneligibilityReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitOutcome {
    pub kind: BenefitKind,
    pub name: String,
    pub status: BenefitStatus,
}

/// A fixed deduction that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub name: String,
    pub amount: Decimal,
}

/// Profit reduced by the taxpayer's benefits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitResult {
    pub deductions: Vec<Deduction>,
    pub total_fixed_deduction: Decimal,
    /// Combined exemption percentage actually applied.
    pub exemption_percentage_applied: Decimal,
    pub taxable_after_fixed: Decimal,
    /// Total of all percentage exemptions.
    pub mkb_exemption_amount: Decimal,
    pub final_taxable_income: Decimal,
    /// One entry per configured benefit, in configuration order.
    pub outcomes: Vec<BenefitOutcome>,
    pub warnings: Vec<CalculationWarning>,
}

/// Applies a year's benefit definitions to gross profit.
#[derive(Debug, Clone)]
pub struct BenefitEngine {
    benefits: Vec<Benefit>,
    stacking: ExemptionStacking,
}

impl BenefitEngine {
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for duplicate, malformed or mis-shaped
    /// benefit definitions.
    pub fn new(
        benefits: &[Benefit],
        stacking: ExemptionStacking,
    ) -> Result<Self, ConfigurationError> {
        validate_benefits(benefits)?;
        Ok(Self {
            benefits: benefits.to_vec(),
            stacking,
        })
    }

    pub fn benefits(&self) -> &[Benefit] {
        &self.benefits
    }

    pub fn apply(
        &self,
        gross_profit: Decimal,
        election: &TaxpayerElection,
    ) -> BenefitResult {
        let mut warnings = Vec::new();
        if gross_profit < Decimal::ZERO {
            warn!(
                gross_profit = %gross_profit,
                "Gross profit is negative; taxable income will be zero"
            );
            warnings.push(CalculationWarning::NegativeGrossProfit { gross_profit });
        }

        let mut outcomes = Vec::with_capacity(self.benefits.len());
        let mut deductions = Vec::new();
        let mut percentages = Vec::new();

        for (index, benefit) in self.benefits.iter().enumerate() {
            let status = if !election.is_elected(&benefit.kind) {
                BenefitStatus::NotElected
            } else if let Err(reason) = eligibility(benefit, election) {
                debug!(benefit = %benefit.kind, %reason, "benefit not applied");
                BenefitStatus::NotApplied(reason)
            } else {
                match benefit.value {
                    BenefitValue::Amount(amount) => {
                        deductions.push(Deduction {
                            name: benefit.name.clone(),
                            amount,
                        });
                        BenefitStatus::Applied { amount }
                    }
                    BenefitValue::Percentage(percentage) => {
                        // Amount is known once fixed deductions are summed.
                        percentages.push((index, percentage));
                        BenefitStatus::Exempted {
                            percentage,
                            amount: Decimal::ZERO,
                        }
                    }
                }
            };

            outcomes.push(BenefitOutcome {
                kind: benefit.kind.clone(),
                name: benefit.name.clone(),
                status,
            });
        }

        let total_fixed_deduction: Decimal = deductions.iter().map(|d| d.amount).sum();
        let taxable_after_fixed = non_negative(gross_profit - total_fixed_deduction);

        if percentages.len() > 1 {
            warn!(
                count = percentages.len(),
                stacking = ?self.stacking,
                "Several percentage exemptions apply in one year"
            );
            warnings.push(CalculationWarning::StackedExemptions {
                count: percentages.len(),
            });
        }

        let mut remaining = taxable_after_fixed;
        let mut mkb_exemption_amount = Decimal::ZERO;
        for &(index, percentage) in &percentages {
            let base = match self.stacking {
                ExemptionStacking::Additive => taxable_after_fixed,
                ExemptionStacking::Compound => remaining,
            };
            let amount = percent_of(base, percentage);
            remaining -= amount;
            mkb_exemption_amount += amount;
            outcomes[index].status = BenefitStatus::Exempted { percentage, amount };
        }

        let exemption_percentage_applied = combined_percentage(
            percentages.iter().map(|&(_, percentage)| percentage),
            self.stacking,
        );
        let final_taxable_income = non_negative(taxable_after_fixed - mkb_exemption_amount);

        debug!(
            gross_profit = %gross_profit,
            total_fixed_deduction = %total_fixed_deduction,
            exemption = %mkb_exemption_amount,
            final_taxable_income = %final_taxable_income,
            "benefits applied"
        );

        BenefitResult {
            deductions,
            total_fixed_deduction,
            exemption_percentage_applied,
            taxable_after_fixed,
            mkb_exemption_amount,
            final_taxable_income,
            outcomes,
            warnings,
        }
    }
}

/// The single percentage equivalent to applying `percentages` together.
fn combined_percentage(
    percentages: impl Iterator<Item = Decimal>,
    stacking: ExemptionStacking,
) -> Decimal {
    match stacking {
        ExemptionStacking::Additive => percentages.sum(),
        ExemptionStacking::Compound => {
            let kept = percentages.fold(Decimal::ONE, |kept, percentage| {
                kept * (Decimal::ONE - percentage / Decimal::ONE_HUNDRED)
            });
            (Decimal::ONE - kept) * Decimal::ONE_HUNDRED
        }
    }
}

/// One benefit as shown in the settings overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitSummaryLine {
    pub kind: BenefitKind,
    pub name: String,
    /// `€2,470` or `12.7%`.
    pub value: String,
    /// Whether the taxpayer elected it.
    pub applies: bool,
    pub requires_hours: bool,
    pub max_usage_count: Option<u32>,
    pub eligibility_criteria: Option<String>,
}

/// Lists every benefit configured for the year alongside the taxpayer's
/// election, without evaluating eligibility.
pub fn benefit_summary(
    config: &TaxYearConfig,
    election: &TaxpayerElection,
) -> Vec<BenefitSummaryLine> {
    config
        .benefits
        .iter()
        .map(|benefit| BenefitSummaryLine {
            kind: benefit.kind.clone(),
            name: benefit.name.clone(),
            value: match benefit.value {
                BenefitValue::Amount(amount) => format_euro(amount),
                BenefitValue::Percentage(percentage) => format_percentage(percentage),
            },
            applies: election.is_elected(&benefit.kind),
            requires_hours: benefit.requires_hours_criterion,
            max_usage_count: benefit.max_usage_count,
            eligibility_criteria: benefit.eligibility_criteria.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;

    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn benefit(
        kind: BenefitKind,
        value: BenefitValue,
    ) -> Benefit {
        Benefit {
            name: kind.to_string(),
            kind,
            value,
            requires_hours_criterion: false,
            minimum_hours_required: None,
            max_usage_count: None,
            eligibility_criteria: None,
        }
    }

    fn self_employed_deduction(amount: Decimal) -> Benefit {
        Benefit {
            name: "Zelfstandigenaftrek".to_string(),
            requires_hours_criterion: true,
            minimum_hours_required: Some(1225),
            ..benefit(BenefitKind::SelfEmployedDeduction, BenefitValue::Amount(amount))
        }
    }

    fn starter_deduction() -> Benefit {
        Benefit {
            name: "Startersaftrek".to_string(),
            requires_hours_criterion: true,
            max_usage_count: Some(3),
            ..benefit(BenefitKind::StarterDeduction, BenefitValue::Amount(dec!(2123)))
        }
    }

    fn sme_exemption() -> Benefit {
        Benefit {
            name: "MKB-winstvrijstelling".to_string(),
            ..benefit(
                BenefitKind::SmeProfitExemption,
                BenefitValue::Percentage(dec!(12.7)),
            )
        }
    }

    fn engine(benefits: Vec<Benefit>) -> BenefitEngine {
        BenefitEngine::new(&benefits, ExemptionStacking::Additive).unwrap()
    }

    fn hours_met() -> TaxpayerElection {
        TaxpayerElection {
            meets_hours_criterion: true,
            ..TaxpayerElection::default()
        }
    }

    // =========================================================================
    // eligibility tests
    // =========================================================================

    #[test]
    fn eligibility_uses_flag_when_hours_unknown() {
        let benefit = self_employed_deduction(dec!(2470));

        assert_eq!(eligibility(&benefit, &hours_met()), Ok(()));
        assert_eq!(
            eligibility(&benefit, &TaxpayerElection::default()),
            Err(IneligibilityReason::HoursCriterionUnmet {
                required: 1225,
                hours_worked: None,
            })
        );
    }

    #[test]
    fn eligibility_prefers_recorded_hours_over_flag() {
        let benefit = self_employed_deduction(dec!(2470));
        let short = TaxpayerElection {
            meets_hours_criterion: true,
            hours_worked: Some(1000),
            ..TaxpayerElection::default()
        };
        let enough = TaxpayerElection {
            meets_hours_criterion: false,
            hours_worked: Some(1225),
            ..TaxpayerElection::default()
        };

        assert_eq!(
            eligibility(&benefit, &short),
            Err(IneligibilityReason::HoursCriterionUnmet {
                required: 1225,
                hours_worked: Some(1000),
            })
        );
        assert_eq!(eligibility(&benefit, &enough), Ok(()));
    }

    #[test]
    fn eligibility_defaults_minimum_hours() {
        let benefit = Benefit {
            minimum_hours_required: None,
            ..self_employed_deduction(dec!(2470))
        };
        let election = TaxpayerElection {
            hours_worked: Some(1224),
            ..TaxpayerElection::default()
        };

        assert!(matches!(
            eligibility(&benefit, &election),
            Err(IneligibilityReason::HoursCriterionUnmet { required: 1225, .. })
        ));
    }

    #[test]
    fn eligibility_enforces_usage_cap() {
        let mut election = hours_met();
        election.usage_counts.insert(BenefitKind::StarterDeduction, 3);

        assert_eq!(
            eligibility(&starter_deduction(), &election),
            Err(IneligibilityReason::UsageLimitReached { used: 3, max: 3 })
        );

        election.usage_counts.insert(BenefitKind::StarterDeduction, 2);
        assert_eq!(eligibility(&starter_deduction(), &election), Ok(()));
    }

    #[test]
    fn eligibility_enforces_starter_window() {
        let within = TaxpayerElection {
            years_as_entrepreneur: Some(5),
            ..hours_met()
        };
        let beyond = TaxpayerElection {
            years_as_entrepreneur: Some(6),
            ..hours_met()
        };

        assert_eq!(eligibility(&starter_deduction(), &within), Ok(()));
        assert_eq!(
            eligibility(&starter_deduction(), &beyond),
            Err(IneligibilityReason::StarterWindowExceeded {
                years_as_entrepreneur: 6,
            })
        );
    }

    #[test]
    fn eligibility_ignores_starter_window_for_other_benefits() {
        let election = TaxpayerElection {
            years_as_entrepreneur: Some(20),
            ..hours_met()
        };

        assert_eq!(eligibility(&self_employed_deduction(dec!(2470)), &election), Ok(()));
    }

    #[test]
    fn ineligibility_reason_displays_for_humans() {
        let reason = IneligibilityReason::HoursCriterionUnmet {
            required: 1225,
            hours_worked: None,
        };

        assert_eq!(reason.to_string(), "hours criterion unmet");
        assert_eq!(
            IneligibilityReason::UsageLimitReached { used: 3, max: 3 }.to_string(),
            "usage limit reached (3 of 3)"
        );
    }

    // =========================================================================
    // BenefitEngine::new tests
    // =========================================================================

    #[test]
    fn new_rejects_duplicate_benefits() {
        let result = BenefitEngine::new(
            &[sme_exemption(), sme_exemption()],
            ExemptionStacking::Additive,
        );

        assert!(matches!(result, Err(ConfigurationError::DuplicateBenefit(_))));
    }

    // =========================================================================
    // BenefitEngine::apply tests
    // =========================================================================

    #[test]
    fn apply_deduction_then_exemption() {
        let engine = engine(vec![self_employed_deduction(dec!(3750)), sme_exemption()]);
        let election = hours_met()
            .elect(BenefitKind::SelfEmployedDeduction)
            .elect(BenefitKind::SmeProfitExemption);

        let result = engine.apply(dec!(50000), &election);

        assert_eq!(result.total_fixed_deduction, dec!(3750));
        assert_eq!(result.taxable_after_fixed, dec!(46250));
        assert_eq!(result.exemption_percentage_applied, dec!(12.7));
        assert_eq!(result.mkb_exemption_amount, dec!(5873.75));
        assert_eq!(result.final_taxable_income, dec!(40376.25));
        assert_eq!(
            result.deductions,
            vec![Deduction {
                name: "Zelfstandigenaftrek".to_string(),
                amount: dec!(3750),
            }]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn apply_skips_deduction_when_hours_unmet() {
        let engine = engine(vec![self_employed_deduction(dec!(3750))]);
        let election = TaxpayerElection::default().elect(BenefitKind::SelfEmployedDeduction);

        let result = engine.apply(dec!(50000), &election);

        assert_eq!(result.final_taxable_income, dec!(50000));
        assert!(result.deductions.is_empty());
        assert_eq!(
            result.outcomes[0].status,
            BenefitStatus::NotApplied(IneligibilityReason::HoursCriterionUnmet {
                required: 1225,
                hours_worked: None,
            })
        );
    }

    #[test]
    fn apply_grants_deduction_on_recorded_hours_despite_unset_flag() {
        let engine = engine(vec![self_employed_deduction(dec!(3750))]);
        let election = TaxpayerElection {
            meets_hours_criterion: false,
            hours_worked: Some(1400),
            ..TaxpayerElection::default()
        }
        .elect(BenefitKind::SelfEmployedDeduction);

        let result = engine.apply(dec!(50000), &election);

        assert_eq!(result.final_taxable_income, dec!(46250));
        assert_eq!(
            result.outcomes[0].status,
            BenefitStatus::Applied { amount: dec!(3750) }
        );
    }

    #[test]
    fn apply_reports_unelected_benefits() {
        let engine = engine(vec![self_employed_deduction(dec!(2470)), sme_exemption()]);

        let result = engine.apply(dec!(50000), &hours_met());

        assert_eq!(result.final_taxable_income, dec!(50000));
        assert!(
            result
                .outcomes
                .iter()
                .all(|outcome| outcome.status == BenefitStatus::NotElected)
        );
    }

    #[test]
    fn apply_keeps_zero_exemption_distinct_from_not_applied() {
        let engine = engine(vec![self_employed_deduction(dec!(3750)), sme_exemption()]);
        let election = hours_met()
            .elect(BenefitKind::SelfEmployedDeduction)
            .elect(BenefitKind::SmeProfitExemption);

        let result = engine.apply(dec!(2000), &election);

        assert_eq!(result.taxable_after_fixed, dec!(0));
        assert_eq!(result.final_taxable_income, dec!(0));
        assert_eq!(
            result.outcomes[1].status,
            BenefitStatus::Exempted {
                percentage: dec!(12.7),
                amount: dec!(0),
            }
        );
    }

    #[test]
    fn apply_clamps_negative_profit_and_warns() {
        let _guard = init_test_tracing();
        let engine = engine(vec![sme_exemption()]);
        let election = TaxpayerElection::default().elect(BenefitKind::SmeProfitExemption);

        let result = engine.apply(dec!(-5000), &election);

        assert_eq!(result.final_taxable_income, dec!(0));
        assert_eq!(
            result.warnings,
            vec![CalculationWarning::NegativeGrossProfit {
                gross_profit: dec!(-5000),
            }]
        );
    }

    #[test]
    fn apply_elects_custom_benefits_by_id() {
        let research = Benefit {
            name: "Research deduction".to_string(),
            ..benefit(
                BenefitKind::Custom("research_deduction".to_string()),
                BenefitValue::Amount(dec!(1000)),
            )
        };
        let engine = engine(vec![research]);
        let election = TaxpayerElection::default().with_custom_enabled(["research_deduction"]);

        let result = engine.apply(dec!(30000), &election);

        assert_eq!(result.final_taxable_income, dec!(29000));
    }

    #[test]
    fn apply_stacks_exemptions_additively() {
        let _guard = init_test_tracing();
        let innovation = benefit(
            BenefitKind::Custom("innovation_box".to_string()),
            BenefitValue::Percentage(dec!(20)),
        );
        let sme = benefit(
            BenefitKind::SmeProfitExemption,
            BenefitValue::Percentage(dec!(10)),
        );
        let engine = engine(vec![sme, innovation]);
        let election = TaxpayerElection::default()
            .elect(BenefitKind::SmeProfitExemption)
            .with_custom_enabled(["innovation_box"]);

        let result = engine.apply(dec!(10000), &election);

        assert_eq!(result.exemption_percentage_applied, dec!(30));
        assert_eq!(result.mkb_exemption_amount, dec!(3000));
        assert_eq!(result.final_taxable_income, dec!(7000));
        assert_eq!(
            result.warnings,
            vec![CalculationWarning::StackedExemptions { count: 2 }]
        );
    }

    #[test]
    fn apply_compounds_exemptions_when_configured() {
        let _guard = init_test_tracing();
        let innovation = benefit(
            BenefitKind::Custom("innovation_box".to_string()),
            BenefitValue::Percentage(dec!(20)),
        );
        let sme = benefit(
            BenefitKind::SmeProfitExemption,
            BenefitValue::Percentage(dec!(10)),
        );
        let engine = BenefitEngine::new(&[sme, innovation], ExemptionStacking::Compound).unwrap();
        let election = TaxpayerElection::default()
            .elect(BenefitKind::SmeProfitExemption)
            .with_custom_enabled(["innovation_box"]);

        let result = engine.apply(dec!(10000), &election);

        // 10% of 10000, then 20% of the remaining 9000
        assert_eq!(result.mkb_exemption_amount, dec!(2800));
        assert_eq!(result.exemption_percentage_applied, dec!(28));
        assert_eq!(result.final_taxable_income, dec!(7200));
    }

    #[test]
    fn apply_never_returns_negative_taxable_income() {
        let engine = engine(vec![self_employed_deduction(dec!(3750)), sme_exemption()]);
        let election = hours_met()
            .elect(BenefitKind::SelfEmployedDeduction)
            .elect(BenefitKind::SmeProfitExemption);

        for profit in [dec!(-100000), dec!(0), dec!(3749.99), dec!(3750), dec!(1000000)] {
            let result = engine.apply(profit, &election);

            assert!(result.final_taxable_income >= Decimal::ZERO);
        }
    }

    // =========================================================================
    // benefit_summary tests
    // =========================================================================

    #[test]
    fn benefit_summary_formats_values() {
        let config = TaxYearConfig {
            tax_year: 2025,
            brackets: Vec::new(),
            benefits: vec![self_employed_deduction(dec!(2470)), sme_exemption()],
            credits: Vec::new(),
            exemption_stacking: ExemptionStacking::Additive,
        };
        let election = TaxpayerElection::default().elect(BenefitKind::SmeProfitExemption);

        let summary = benefit_summary(&config, &election);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].value, "€2,470");
        assert!(!summary[0].applies);
        assert!(summary[0].requires_hours);
        assert_eq!(summary[1].value, "12.7%");
        assert!(summary[1].applies);
    }
}
