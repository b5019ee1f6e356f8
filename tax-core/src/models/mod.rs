mod benefit;
mod credit;
mod election;
mod tax_bracket;
mod tax_year_config;
mod vat_quarter;

pub use benefit::{
    Benefit, BenefitKind, BenefitValue, DEFAULT_MINIMUM_HOURS, STARTER_WINDOW_YEARS,
};
pub use credit::{Credit, CreditBracket, CreditCurve, CreditKind};
pub use election::{TaxpayerElection, TaxpayerSettings};
pub use tax_bracket::TaxBracket;
pub use tax_year_config::{ConfigurationError, ExemptionStacking, TaxYearConfig};
pub use vat_quarter::{Quarter, VatPeriod, VatQuarter};

pub(crate) use benefit::validate_benefits;
pub(crate) use credit::validate_credits;
pub(crate) use tax_bracket::{sorted_by_order, validate_tax_brackets};
