use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ConfigurationError, TaxYearConfig, TaxpayerElection, VatQuarter};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

/// Read access to tax-year configuration, taxpayer elections and recorded
/// VAT figures. The engine never calls this itself; callers load through
/// it and hand plain values to the engine.
#[async_trait]
pub trait TaxRepository: Send + Sync {
    // Tax year config
    async fn get_tax_year_config(
        &self,
        year: i32,
    ) -> Result<TaxYearConfig, RepositoryError>;
    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError>;

    /// The taxpayer's election for `year`; a year without a stored election
    /// yields the default (nothing elected).
    async fn get_taxpayer_election(
        &self,
        year: i32,
    ) -> Result<TaxpayerElection, RepositoryError>;

    // VAT
    async fn list_vat_quarters(
        &self,
        year: i32,
    ) -> Result<Vec<VatQuarter>, RepositoryError>;
}
