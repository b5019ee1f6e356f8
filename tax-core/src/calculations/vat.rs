//! Quarterly VAT (BTW) settlement.
//!
//! A quarter's position is derived from its recorded figures on every read:
//!
//! | Figure | Derivation |
//! |--------|------------|
//! | `net_vat_to_pay` | high + low rate VAT collected − input VAT (negative is a refund position) |
//! | `balance` | `net_vat_to_pay − amount_paid` |
//! | status | owed when `balance > 0`, refund when `balance < 0`, settled at zero |
//!
//! Import VAT is reverse-charged: declared and deducted in the same return,
//! so it is reported but does not move `net_vat_to_pay`.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::{SettlementStatus, VatSettlementAggregator};
//! use tax_core::{Quarter, VatPeriod, VatQuarter};
//!
//! let quarter = VatQuarter {
//!     high_rate_vat_collected: dec!(2100),
//!     low_rate_vat_collected: dec!(450),
//!     input_vat: dec!(800),
//!     ..VatQuarter::empty(VatPeriod::new(2025, Quarter::Q1))
//! };
//!
//! let view = VatSettlementAggregator::settle(&quarter);
//!
//! assert_eq!(view.balance, dec!(1750));
//! assert_eq!(view.status, SettlementStatus::OwedToTaxOffice);
//! ```

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::round_half_up;
use crate::models::{Quarter, VatPeriod, VatQuarter};

/// Quarter data that cannot be rolled up into one year.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VatSettlementError {
    #[error("VAT period {0} appears more than once")]
    DuplicatePeriod(VatPeriod),

    #[error("VAT period {period} does not belong to year {year}")]
    PeriodOutsideYear { period: VatPeriod, year: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    OwedToTaxOffice,
    TaxOfficeOwesYou,
    Settled,
}

impl SettlementStatus {
    pub fn classify(balance: Decimal) -> Self {
        if balance > Decimal::ZERO {
            Self::OwedToTaxOffice
        } else if balance < Decimal::ZERO {
            Self::TaxOfficeOwesYou
        } else {
            Self::Settled
        }
    }
}

/// Refund owed to the taxpayer when the balance is negative.
fn expected_refund(balance: Decimal) -> Option<Decimal> {
    (balance < Decimal::ZERO).then(|| -balance)
}

/// Derived settlement position of one quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementView {
    pub period: VatPeriod,
    pub high_rate_vat_collected: Decimal,
    pub low_rate_vat_collected: Decimal,
    pub vat_collected_total: Decimal,
    pub input_vat: Decimal,
    pub net_vat_to_pay: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub status: SettlementStatus,
    pub expected_refund: Option<Decimal>,
    pub exports_eu: Decimal,
    pub exports_non_eu: Decimal,
    /// Zero-rated revenue (exports), declared in box 1e.
    pub zero_rate_revenue: Decimal,
    pub imports_eu_revenue: Decimal,
    pub imports_eu_vat: Decimal,
    pub imports_non_eu_revenue: Decimal,
    pub imports_non_eu_vat: Decimal,
    /// Self-assessed import VAT; deducted again in the same return.
    pub reverse_charge_vat: Decimal,
}

impl SettlementView {
    /// Cent-rounded copy for reporting.
    pub fn rounded(&self) -> Self {
        Self {
            period: self.period,
            high_rate_vat_collected: round_half_up(self.high_rate_vat_collected),
            low_rate_vat_collected: round_half_up(self.low_rate_vat_collected),
            vat_collected_total: round_half_up(self.vat_collected_total),
            input_vat: round_half_up(self.input_vat),
            net_vat_to_pay: round_half_up(self.net_vat_to_pay),
            amount_paid: round_half_up(self.amount_paid),
            balance: round_half_up(self.balance),
            status: self.status,
            expected_refund: self.expected_refund.map(round_half_up),
            exports_eu: round_half_up(self.exports_eu),
            exports_non_eu: round_half_up(self.exports_non_eu),
            zero_rate_revenue: round_half_up(self.zero_rate_revenue),
            imports_eu_revenue: round_half_up(self.imports_eu_revenue),
            imports_eu_vat: round_half_up(self.imports_eu_vat),
            imports_non_eu_revenue: round_half_up(self.imports_non_eu_revenue),
            imports_non_eu_vat: round_half_up(self.imports_non_eu_vat),
            reverse_charge_vat: round_half_up(self.reverse_charge_vat),
        }
    }
}

/// All quarters of one year, and the total outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatYearRollup {
    pub year: i32,
    /// Settled views sorted by quarter.
    pub quarters: Vec<SettlementView>,
    /// Quarters with no recorded figures.
    pub missing_quarters: Vec<Quarter>,
    pub net_vat_to_pay: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub status: SettlementStatus,
    pub expected_refund: Option<Decimal>,
}

impl VatYearRollup {
    pub fn rounded(&self) -> Self {
        Self {
            year: self.year,
            quarters: self.quarters.iter().map(SettlementView::rounded).collect(),
            missing_quarters: self.missing_quarters.clone(),
            net_vat_to_pay: round_half_up(self.net_vat_to_pay),
            amount_paid: round_half_up(self.amount_paid),
            balance: round_half_up(self.balance),
            status: self.status,
            expected_refund: self.expected_refund.map(round_half_up),
        }
    }
}

/// Derives settlement views from recorded quarter figures.
#[derive(Debug, Clone, Copy, Default)]
pub struct VatSettlementAggregator;

impl VatSettlementAggregator {
    pub fn settle(quarter: &VatQuarter) -> SettlementView {
        let net_vat_to_pay = quarter.net_vat_to_pay();
        let balance = quarter.balance();
        let status = SettlementStatus::classify(balance);

        debug!(
            period = %quarter.period,
            net_vat_to_pay = %net_vat_to_pay,
            balance = %balance,
            ?status,
            "VAT quarter settled"
        );

        SettlementView {
            period: quarter.period,
            high_rate_vat_collected: quarter.high_rate_vat_collected,
            low_rate_vat_collected: quarter.low_rate_vat_collected,
            vat_collected_total: quarter.vat_collected_total(),
            input_vat: quarter.input_vat,
            net_vat_to_pay,
            amount_paid: quarter.amount_paid,
            balance,
            status,
            expected_refund: expected_refund(balance),
            exports_eu: quarter.exports_eu,
            exports_non_eu: quarter.exports_non_eu,
            zero_rate_revenue: quarter.exports_eu + quarter.exports_non_eu,
            imports_eu_revenue: quarter.imports_eu_revenue,
            imports_eu_vat: quarter.imports_eu_vat,
            imports_non_eu_revenue: quarter.imports_non_eu_revenue,
            imports_non_eu_vat: quarter.imports_non_eu_vat,
            reverse_charge_vat: quarter.imports_eu_vat + quarter.imports_non_eu_vat,
        }
    }

    /// Sums the recorded quarters of `year` and classifies the total.
    ///
    /// # Errors
    ///
    /// Returns [`VatSettlementError`] if a period is repeated or belongs to
    /// another year.
    pub fn settle_year(
        year: i32,
        quarters: &[VatQuarter],
    ) -> Result<VatYearRollup, VatSettlementError> {
        let mut seen = BTreeSet::new();
        for quarter in quarters {
            if quarter.period.year != year {
                return Err(VatSettlementError::PeriodOutsideYear {
                    period: quarter.period,
                    year,
                });
            }
            if !seen.insert(quarter.period.quarter) {
                return Err(VatSettlementError::DuplicatePeriod(quarter.period));
            }
        }

        let mut views: Vec<SettlementView> = quarters.iter().map(Self::settle).collect();
        views.sort_by_key(|view| view.period);

        let net_vat_to_pay: Decimal = views.iter().map(|view| view.net_vat_to_pay).sum();
        let amount_paid: Decimal = views.iter().map(|view| view.amount_paid).sum();
        let balance = net_vat_to_pay - amount_paid;

        Ok(VatYearRollup {
            year,
            missing_quarters: Quarter::ALL
                .into_iter()
                .filter(|quarter| !seen.contains(quarter))
                .collect(),
            quarters: views,
            net_vat_to_pay,
            amount_paid,
            balance,
            status: SettlementStatus::classify(balance),
            expected_refund: expected_refund(balance),
        })
    }
}
