use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tax_core::db::{RepositoryFactory, RepositoryRegistry, SourceConfig};
use tax_core::{RepositoryError, TaxRepository, TaxYearConfig, TaxpayerElection, VatQuarter};

use crate::loader::{ConfigLoader, LoadedConfig, LoaderError};

impl From<LoaderError> for RepositoryError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::Configuration { source, .. } => RepositoryError::Invalid(source),
            other => RepositoryError::Source(other.to_string()),
        }
    }
}

/// Read-only repository over a configuration directory, loaded and
/// validated once when opened.
#[derive(Debug, Clone)]
pub struct CsvRepository {
    root: PathBuf,
    years: BTreeMap<i32, TaxYearConfig>,
    elections: BTreeMap<i32, TaxpayerElection>,
    vat_quarters: Vec<VatQuarter>,
}

impl CsvRepository {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let root = dir.as_ref().to_path_buf();
        let loaded = ConfigLoader::load_dir(&root)?;
        Ok(Self::from_loaded(root, loaded))
    }

    pub fn from_loaded(
        root: PathBuf,
        loaded: LoadedConfig,
    ) -> Self {
        Self {
            root,
            years: loaded
                .years
                .into_iter()
                .map(|config| (config.tax_year, config))
                .collect(),
            elections: loaded.elections,
            vat_quarters: loaded.vat_quarters,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl TaxRepository for CsvRepository {
    async fn get_tax_year_config(
        &self,
        year: i32,
    ) -> Result<TaxYearConfig, RepositoryError> {
        self.years
            .get(&year)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("tax year {year}")))
    }

    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
        Ok(self.years.keys().copied().collect())
    }

    async fn get_taxpayer_election(
        &self,
        year: i32,
    ) -> Result<TaxpayerElection, RepositoryError> {
        Ok(self.elections.get(&year).cloned().unwrap_or_default())
    }

    async fn list_vat_quarters(
        &self,
        year: i32,
    ) -> Result<Vec<VatQuarter>, RepositoryError> {
        let mut quarters: Vec<VatQuarter> = self
            .vat_quarters
            .iter()
            .filter(|quarter| quarter.period.year == year)
            .cloned()
            .collect();
        quarters.sort_by_key(|quarter| quarter.period);
        Ok(quarters)
    }
}

/// Opens a [`CsvRepository`] from `SourceConfig::location`.
pub struct CsvRepositoryFactory;

#[async_trait]
impl RepositoryFactory for CsvRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "csv"
    }

    async fn create(
        &self,
        config: &SourceConfig,
    ) -> Result<Box<dyn TaxRepository>, RepositoryError> {
        let location = config.location.clone();
        let repo = tokio::task::spawn_blocking(move || CsvRepository::open(location))
            .await
            .map_err(|e| RepositoryError::Source(format!("loader task failed: {e}")))??;
        Ok(Box::new(repo))
    }
}

/// A registry with every backend this crate provides.
pub fn default_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(CsvRepositoryFactory));
    registry
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tax_core::{BenefitKind, ConfigurationError, Quarter, VatPeriod};

    use super::*;

    fn repository() -> CsvRepository {
        let mut elections = BTreeMap::new();
        elections.insert(
            2025,
            TaxpayerElection::default().elect(BenefitKind::SmeProfitExemption),
        );

        CsvRepository::from_loaded(
            PathBuf::from("tax-config"),
            LoadedConfig {
                years: vec![TaxYearConfig {
                    tax_year: 2025,
                    brackets: Vec::new(),
                    benefits: Vec::new(),
                    credits: Vec::new(),
                    exemption_stacking: Default::default(),
                }],
                elections,
                vat_quarters: vec![
                    VatQuarter::empty(VatPeriod::new(2025, Quarter::Q2)),
                    VatQuarter::empty(VatPeriod::new(2024, Quarter::Q4)),
                    VatQuarter::empty(VatPeriod::new(2025, Quarter::Q1)),
                ],
            },
        )
    }

    #[tokio::test]
    async fn get_tax_year_config_reports_missing_year() {
        let repo = repository();

        let result = repo.get_tax_year_config(2019).await;

        assert!(matches!(result, Err(RepositoryError::NotFound(msg)) if msg == "tax year 2019"));
        assert_eq!(repo.list_tax_years().await.unwrap(), vec![2025]);
    }

    #[tokio::test]
    async fn get_taxpayer_election_defaults_when_absent() {
        let repo = repository();

        let stored = repo.get_taxpayer_election(2025).await.unwrap();
        let absent = repo.get_taxpayer_election(2024).await.unwrap();

        assert!(stored.is_elected(&BenefitKind::SmeProfitExemption));
        assert_eq!(absent, TaxpayerElection::default());
    }

    #[tokio::test]
    async fn list_vat_quarters_filters_and_sorts() {
        let repo = repository();

        let quarters = repo.list_vat_quarters(2025).await.unwrap();

        let periods: Vec<_> = quarters.iter().map(|q| q.period.quarter).collect();
        assert_eq!(periods, vec![Quarter::Q1, Quarter::Q2]);
    }

    #[test]
    fn loader_configuration_error_keeps_its_source() {
        let err = LoaderError::Configuration {
            tax_year: 2025,
            source: ConfigurationError::UnknownTaxYear(2025),
        };

        let converted = RepositoryError::from(err);

        assert!(matches!(
            converted,
            RepositoryError::Invalid(ConfigurationError::UnknownTaxYear(2025))
        ));
    }

    #[test]
    fn default_registry_offers_csv() {
        assert_eq!(default_registry().available_backends(), vec!["csv"]);
    }

    #[tokio::test]
    async fn csv_factory_reports_missing_directory() {
        let config = SourceConfig {
            backend: "csv".to_string(),
            location: "does/not/exist".to_string(),
        };

        let result = default_registry().create(&config).await;

        assert!(matches!(result, Err(RepositoryError::Source(msg)) if msg.contains("tax_years.csv")));
    }
}
