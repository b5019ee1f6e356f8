use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tax_core::{
    Benefit, BenefitKind, BenefitValue, ConfigurationError, Credit, CreditBracket, CreditKind,
    ExemptionStacking, Quarter, TaxBracket, TaxYearConfig, TaxpayerElection, TaxpayerSettings,
    VatPeriod, VatQuarter,
};
use thiserror::Error;
use tracing::{debug, info};

pub const TAX_YEARS_FILE: &str = "tax_years.csv";
pub const TAX_BRACKETS_FILE: &str = "tax_brackets.csv";
pub const TAX_BENEFITS_FILE: &str = "tax_benefits.csv";
pub const TAX_CREDITS_FILE: &str = "tax_credits.csv";
pub const CREDIT_BRACKETS_FILE: &str = "credit_brackets.csv";
pub const VAT_QUARTERS_FILE: &str = "vat_quarters.csv";
pub const ELECTIONS_FILE: &str = "elections.toml";

/// Errors that can occur when loading a configuration directory.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} refers to tax year {tax_year}, which is not listed in tax_years.csv")]
    UnknownTaxYear { file: &'static str, tax_year: i32 },

    #[error("elections.toml has more than one election for {0}")]
    DuplicateElection(i32),

    #[error("credit bracket for {credit_type} in {tax_year} has no matching credit")]
    OrphanCreditBracket { tax_year: i32, credit_type: String },

    #[error("tax year {tax_year}: {source}")]
    Configuration {
        tax_year: i32,
        #[source]
        source: ConfigurationError,
    },
}

impl From<csv::Error> for LoaderError {
    fn from(err: csv::Error) -> Self {
        LoaderError::CsvParse(err.to_string())
    }
}

impl From<toml::de::Error> for LoaderError {
    fn from(err: toml::de::Error) -> Self {
        LoaderError::TomlParse(err.to_string())
    }
}

/// A row of `tax_years.csv`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxYearRecord {
    pub tax_year: i32,
    /// Empty means [`ExemptionStacking::Additive`].
    pub exemption_stacking: Option<ExemptionStacking>,
}

/// A row of `tax_brackets.csv`; `income_to` is empty for the top bracket.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub tax_year: i32,
    pub bracket_order: u32,
    pub income_from: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub income_to: Option<Decimal>,
    pub rate: Decimal,
}

/// A row of `tax_benefits.csv`. Exactly one of `amount` and `percentage`
/// is filled in.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenefitRecord {
    pub tax_year: i32,
    pub benefit_type: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub amount: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub percentage: Option<Decimal>,
    pub requires_hours_criterion: bool,
    pub minimum_hours_required: Option<u32>,
    pub max_usage_count: Option<u32>,
    pub eligibility_criteria: Option<String>,
}

/// A row of `tax_credits.csv`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CreditRecord {
    pub tax_year: i32,
    pub credit_type: String,
    pub name: String,
    pub max_amount: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub phaseout_start: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub phaseout_end: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub phaseout_rate: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub minimum_amount: Option<Decimal>,
    pub is_enabled: bool,
}

/// A row of `credit_brackets.csv`, attached to the credit with the same
/// year and type.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CreditBracketRecord {
    pub tax_year: i32,
    pub credit_type: String,
    pub bracket_order: u32,
    pub income_from: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub income_to: Option<Decimal>,
    pub rate: Decimal,
    pub base_amount: Decimal,
    pub rate_applies_to_excess: bool,
}

/// A row of `vat_quarters.csv`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VatQuarterRecord {
    pub year: i32,
    pub quarter: Quarter,
    pub high_rate_vat_collected: Decimal,
    pub low_rate_vat_collected: Decimal,
    pub input_vat: Decimal,
    pub exports_eu: Decimal,
    pub exports_non_eu: Decimal,
    pub imports_eu_revenue: Decimal,
    pub imports_eu_vat: Decimal,
    pub imports_non_eu_revenue: Decimal,
    pub imports_non_eu_vat: Decimal,
    pub amount_paid: Decimal,
}

impl From<VatQuarterRecord> for VatQuarter {
    fn from(record: VatQuarterRecord) -> Self {
        Self {
            period: VatPeriod::new(record.year, record.quarter),
            high_rate_vat_collected: record.high_rate_vat_collected,
            low_rate_vat_collected: record.low_rate_vat_collected,
            input_vat: record.input_vat,
            exports_eu: record.exports_eu,
            exports_non_eu: record.exports_non_eu,
            imports_eu_revenue: record.imports_eu_revenue,
            imports_eu_vat: record.imports_eu_vat,
            imports_non_eu_revenue: record.imports_non_eu_revenue,
            imports_non_eu_vat: record.imports_non_eu_vat,
            amount_paid: record.amount_paid,
        }
    }
}

/// One `[[election]]` table of `elections.toml`: the settings record plus
/// the facts it has no column for.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ElectionRecord {
    pub year: i32,
    #[serde(flatten)]
    pub settings: TaxpayerSettings,
    pub hours_worked: Option<u32>,
    pub years_as_entrepreneur: Option<u32>,
    /// Ids of custom benefits switched on for this year.
    #[serde(default)]
    pub custom_enabled: Vec<String>,
    /// Prior uses per benefit id; overrides `starter_years_used`.
    #[serde(default)]
    pub usage_counts: BTreeMap<String, u32>,
}

impl From<ElectionRecord> for TaxpayerElection {
    fn from(record: ElectionRecord) -> Self {
        let mut election = TaxpayerElection::from(record.settings)
            .with_custom_enabled(&record.custom_enabled);
        election.hours_worked = record.hours_worked;
        election.years_as_entrepreneur = record.years_as_entrepreneur;
        election.usage_counts.extend(
            record
                .usage_counts
                .into_iter()
                .map(|(id, count)| (BenefitKind::parse(&id), count)),
        );
        election
    }
}

#[derive(Debug, Deserialize)]
struct ElectionsFile {
    #[serde(default)]
    election: Vec<ElectionRecord>,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Everything read from a configuration directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    /// Validated years, sorted by year.
    pub years: Vec<TaxYearConfig>,
    pub elections: BTreeMap<i32, TaxpayerElection>,
    pub vat_quarters: Vec<VatQuarter>,
}

/// Reads tax-year configuration from CSV and TOML files.
///
/// `tax_years.csv` and `tax_brackets.csv` are required; every other file
/// may be absent, which reads as no rows.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse records of any row type from a CSV reader.
    pub fn parse<T, R>(reader: R) -> Result<Vec<T>, LoaderError>
    where
        T: DeserializeOwned,
        R: Read,
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: T = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parse `[[election]]` tables into elections keyed by year. Each year
    /// may appear once.
    pub fn parse_elections(source: &str) -> Result<BTreeMap<i32, TaxpayerElection>, LoaderError> {
        let file: ElectionsFile = toml::from_str(source)?;
        let mut elections = BTreeMap::new();
        for record in file.election {
            let year = record.year;
            if elections.insert(year, TaxpayerElection::from(record)).is_some() {
                return Err(LoaderError::DuplicateElection(year));
            }
        }
        Ok(elections)
    }

    /// Group rows by year into validated [`TaxYearConfig`]s.
    ///
    /// # Errors
    ///
    /// Fails on rows for unlisted years, credit brackets without a credit,
    /// and any [`ConfigurationError`] in an assembled year.
    pub fn assemble(
        years: &[TaxYearRecord],
        brackets: &[TaxBracketRecord],
        benefits: &[BenefitRecord],
        credits: &[CreditRecord],
        credit_brackets: &[CreditBracketRecord],
    ) -> Result<Vec<TaxYearConfig>, LoaderError> {
        let mut configs: BTreeMap<i32, TaxYearConfig> = BTreeMap::new();
        for record in years {
            let config = TaxYearConfig {
                tax_year: record.tax_year,
                brackets: Vec::new(),
                benefits: Vec::new(),
                credits: Vec::new(),
                exemption_stacking: record.exemption_stacking.unwrap_or_default(),
            };
            if configs.insert(record.tax_year, config).is_some() {
                return Err(LoaderError::Configuration {
                    tax_year: record.tax_year,
                    source: ConfigurationError::DuplicateTaxYear(record.tax_year),
                });
            }
        }

        for record in brackets {
            year_mut(&mut configs, TAX_BRACKETS_FILE, record.tax_year)?
                .brackets
                .push(TaxBracket {
                    bracket_order: record.bracket_order,
                    income_from: record.income_from,
                    income_to: record.income_to,
                    rate: record.rate,
                });
        }

        for record in benefits {
            let value = BenefitValue::from_columns(&record.name, record.amount, record.percentage)
                .map_err(|source| LoaderError::Configuration {
                    tax_year: record.tax_year,
                    source,
                })?;
            year_mut(&mut configs, TAX_BENEFITS_FILE, record.tax_year)?
                .benefits
                .push(Benefit {
                    kind: BenefitKind::parse(&record.benefit_type),
                    name: record.name.clone(),
                    value,
                    requires_hours_criterion: record.requires_hours_criterion,
                    minimum_hours_required: record.minimum_hours_required,
                    max_usage_count: record.max_usage_count,
                    eligibility_criteria: record.eligibility_criteria.clone(),
                });
        }

        for record in credits {
            year_mut(&mut configs, TAX_CREDITS_FILE, record.tax_year)?
                .credits
                .push(Credit {
                    kind: CreditKind::parse(&record.credit_type),
                    name: record.name.clone(),
                    max_amount: record.max_amount,
                    phaseout_start: record.phaseout_start,
                    phaseout_end: record.phaseout_end,
                    phaseout_rate: record.phaseout_rate,
                    minimum_amount: record.minimum_amount,
                    brackets: Vec::new(),
                    is_enabled: record.is_enabled,
                });
        }

        for record in credit_brackets {
            let kind = CreditKind::parse(&record.credit_type);
            let credit = year_mut(&mut configs, CREDIT_BRACKETS_FILE, record.tax_year)?
                .credits
                .iter_mut()
                .find(|credit| credit.kind == kind)
                .ok_or_else(|| LoaderError::OrphanCreditBracket {
                    tax_year: record.tax_year,
                    credit_type: record.credit_type.clone(),
                })?;
            credit.brackets.push(CreditBracket {
                bracket_order: record.bracket_order,
                income_from: record.income_from,
                income_to: record.income_to,
                rate: record.rate,
                base_amount: record.base_amount,
                rate_applies_to_excess: record.rate_applies_to_excess,
            });
        }

        for config in configs.values() {
            config
                .validate()
                .map_err(|source| LoaderError::Configuration {
                    tax_year: config.tax_year,
                    source,
                })?;
            debug!(
                tax_year = config.tax_year,
                brackets = config.brackets.len(),
                benefits = config.benefits.len(),
                credits = config.credits.len(),
                "tax year assembled"
            );
        }

        Ok(configs.into_values().collect())
    }

    /// Load and validate every file in `dir`.
    pub fn load_dir(dir: &Path) -> Result<LoadedConfig, LoaderError> {
        let years: Vec<TaxYearRecord> = Self::parse(open(&dir.join(TAX_YEARS_FILE))?)?;
        let brackets: Vec<TaxBracketRecord> = Self::parse(open(&dir.join(TAX_BRACKETS_FILE))?)?;
        let benefits: Vec<BenefitRecord> = parse_optional(&dir.join(TAX_BENEFITS_FILE))?;
        let credits: Vec<CreditRecord> = parse_optional(&dir.join(TAX_CREDITS_FILE))?;
        let credit_brackets: Vec<CreditBracketRecord> =
            parse_optional(&dir.join(CREDIT_BRACKETS_FILE))?;
        let vat_records: Vec<VatQuarterRecord> = parse_optional(&dir.join(VAT_QUARTERS_FILE))?;

        let configs = Self::assemble(&years, &brackets, &benefits, &credits, &credit_brackets)?;

        let elections_path = dir.join(ELECTIONS_FILE);
        let elections = if elections_path.exists() {
            let source = std::fs::read_to_string(&elections_path).map_err(|source| {
                LoaderError::Io {
                    path: elections_path.clone(),
                    source,
                }
            })?;
            Self::parse_elections(&source)?
        } else {
            BTreeMap::new()
        };

        info!(
            dir = %dir.display(),
            years = configs.len(),
            elections = elections.len(),
            vat_quarters = vat_records.len(),
            "configuration loaded"
        );

        Ok(LoadedConfig {
            years: configs,
            elections,
            vat_quarters: vat_records.into_iter().map(VatQuarter::from).collect(),
        })
    }
}

fn year_mut<'a>(
    configs: &'a mut BTreeMap<i32, TaxYearConfig>,
    file: &'static str,
    tax_year: i32,
) -> Result<&'a mut TaxYearConfig, LoaderError> {
    configs
        .get_mut(&tax_year)
        .ok_or(LoaderError::UnknownTaxYear { file, tax_year })
}

fn open(path: &Path) -> Result<File, LoaderError> {
    File::open(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoaderError> {
    if path.exists() {
        ConfigLoader::parse(open(path)?)
    } else {
        debug!(path = %path.display(), "optional file absent");
        Ok(Vec::new())
    }
}
