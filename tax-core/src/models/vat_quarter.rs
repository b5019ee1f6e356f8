use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Calendar quarter of a VAT return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    pub fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Q1),
            2 => Some(Self::Q2),
            3 => Some(Self::Q3),
            4 => Some(Self::Q4),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Quarter {
    type Error = String;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Self::from_number(number).ok_or_else(|| format!("quarter must be 1-4, got {number}"))
    }
}

impl From<Quarter> for u8 {
    fn from(quarter: Quarter) -> Self {
        quarter.number()
    }
}

/// Year and quarter; the unique key of a [`VatQuarter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VatPeriod {
    pub year: i32,
    pub quarter: Quarter,
}

impl VatPeriod {
    pub fn new(
        year: i32,
        quarter: Quarter,
    ) -> Self {
        Self { year, quarter }
    }

    /// The period a transaction dated `date` is declared in.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use tax_core::{Quarter, VatPeriod};
    ///
    /// let date = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
    /// assert_eq!(VatPeriod::containing(date), VatPeriod::new(2025, Quarter::Q3));
    /// ```
    pub fn containing(date: NaiveDate) -> Self {
        let quarter = match date.month() {
            1..=3 => Quarter::Q1,
            4..=6 => Quarter::Q2,
            7..=9 => Quarter::Q3,
            _ => Quarter::Q4,
        };
        Self::new(date.year(), quarter)
    }
}

impl fmt::Display for VatPeriod {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter.number())
    }
}

/// VAT figures recorded upstream for one quarter.
///
/// Import figures are reverse-charged: the VAT is declared and deducted in
/// the same return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatQuarter {
    pub period: VatPeriod,
    pub high_rate_vat_collected: Decimal,
    pub low_rate_vat_collected: Decimal,
    pub input_vat: Decimal,
    #[serde(default)]
    pub exports_eu: Decimal,
    #[serde(default)]
    pub exports_non_eu: Decimal,
    #[serde(default)]
    pub imports_eu_revenue: Decimal,
    #[serde(default)]
    pub imports_eu_vat: Decimal,
    #[serde(default)]
    pub imports_non_eu_revenue: Decimal,
    #[serde(default)]
    pub imports_non_eu_vat: Decimal,
    /// Payments recorded against this quarter so far.
    #[serde(default)]
    pub amount_paid: Decimal,
}

impl VatQuarter {
    /// A quarter with every figure at zero.
    pub fn empty(period: VatPeriod) -> Self {
        Self {
            period,
            high_rate_vat_collected: Decimal::ZERO,
            low_rate_vat_collected: Decimal::ZERO,
            input_vat: Decimal::ZERO,
            exports_eu: Decimal::ZERO,
            exports_non_eu: Decimal::ZERO,
            imports_eu_revenue: Decimal::ZERO,
            imports_eu_vat: Decimal::ZERO,
            imports_non_eu_revenue: Decimal::ZERO,
            imports_non_eu_vat: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
        }
    }

    pub fn vat_collected_total(&self) -> Decimal {
        self.high_rate_vat_collected + self.low_rate_vat_collected
    }

    /// Negative when more input VAT was paid than collected.
    pub fn net_vat_to_pay(&self) -> Decimal {
        self.vat_collected_total() - self.input_vat
    }

    pub fn balance(&self) -> Decimal {
        self.net_vat_to_pay() - self.amount_paid
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn date(
        year: i32,
        month: u32,
        day: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn containing_maps_quarter_boundaries() {
        assert_eq!(VatPeriod::containing(date(2025, 1, 1)).quarter, Quarter::Q1);
        assert_eq!(VatPeriod::containing(date(2025, 3, 31)).quarter, Quarter::Q1);
        assert_eq!(VatPeriod::containing(date(2025, 4, 1)).quarter, Quarter::Q2);
        assert_eq!(VatPeriod::containing(date(2025, 9, 30)).quarter, Quarter::Q3);
        assert_eq!(VatPeriod::containing(date(2025, 12, 31)).quarter, Quarter::Q4);
    }

    #[test]
    fn period_displays_year_and_quarter() {
        assert_eq!(VatPeriod::new(2025, Quarter::Q3).to_string(), "2025-Q3");
    }

    #[test]
    fn quarter_rejects_out_of_range_number() {
        assert_eq!(Quarter::from_number(0), None);
        assert_eq!(Quarter::from_number(5), None);
        assert_eq!(Quarter::try_from(2), Ok(Quarter::Q2));
    }

    #[test]
    fn derived_figures_follow_collected_minus_input() {
        let quarter = VatQuarter {
            high_rate_vat_collected: dec!(2100),
            low_rate_vat_collected: dec!(450),
            input_vat: dec!(800),
            amount_paid: dec!(1000),
            ..VatQuarter::empty(VatPeriod::new(2025, Quarter::Q1))
        };

        assert_eq!(quarter.vat_collected_total(), dec!(2550));
        assert_eq!(quarter.net_vat_to_pay(), dec!(1750));
        assert_eq!(quarter.balance(), dec!(750));
    }
}
