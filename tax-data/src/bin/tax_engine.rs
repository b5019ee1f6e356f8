use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tax_core::db::SourceConfig;
use tax_core::{Quarter, TaxEngine, TaxRepository, VatSettlementAggregator};
use tax_data::{default_registry, logging};
use tracing::info;

/// Calculate Dutch entrepreneur income tax and settle quarterly VAT.
///
/// Reads a tax-year configuration directory containing:
/// - tax_years.csv and tax_brackets.csv (required)
/// - tax_benefits.csv, tax_credits.csv, credit_brackets.csv
/// - vat_quarters.csv and elections.toml
///
/// Results are printed to stdout as JSON, rounded to cents.
#[derive(Parser, Debug)]
#[command(name = "tax-engine")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the tax-year configuration files
    #[arg(short, long, default_value = "tax-config")]
    dir: PathBuf,

    /// Log filter directive (e.g. debug, tax_core=trace); overrides RUST_LOG
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Income tax for one year's gross profit
    Income {
        #[arg(short, long)]
        year: i32,

        /// Gross profit in euros
        #[arg(short, long, allow_negative_numbers = true)]
        profit: Decimal,

        /// Print the tax saved by the elected benefits instead
        #[arg(short, long, default_value_t = false)]
        compare: bool,
    },
    /// VAT settlement for one quarter or the whole year
    Vat {
        #[arg(short, long)]
        year: i32,

        /// Quarter number, 1 to 4
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=4))]
        quarter: Option<u8>,
    },
    /// The configured benefits and whether the taxpayer elected them
    Benefits {
        #[arg(short, long)]
        year: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_level.as_deref())?;

    let source = SourceConfig {
        backend: "csv".to_string(),
        location: args.dir.display().to_string(),
    };
    let repo = default_registry()
        .create(&source)
        .await
        .with_context(|| format!("Failed to load configuration from: {}", args.dir.display()))?;

    match args.command {
        Command::Income {
            year,
            profit,
            compare,
        } => {
            let engine = build_engine(repo.as_ref()).await?;
            let election = repo
                .get_taxpayer_election(year)
                .await
                .with_context(|| format!("Failed to read election for {year}"))?;

            if compare {
                let savings = engine
                    .calculate_savings(year, profit, &election)
                    .context("Failed to compare tax with and without benefits")?;
                print_json(&savings.rounded())
            } else {
                let result = engine
                    .calculate(year, profit, &election)
                    .context("Failed to calculate income tax")?;
                info!(
                    year,
                    final_tax = %result.final_tax,
                    effective_rate = %result.effective_rate_percentage(),
                    "Income tax calculated"
                );
                print_json(&result.rounded())
            }
        }
        Command::Vat { year, quarter } => {
            let quarters = repo
                .list_vat_quarters(year)
                .await
                .with_context(|| format!("Failed to read VAT quarters for {year}"))?;

            match quarter.and_then(Quarter::from_number) {
                Some(quarter) => {
                    let Some(recorded) = quarters.iter().find(|q| q.period.quarter == quarter)
                    else {
                        bail!("No VAT figures recorded for {year}-Q{}", quarter.number());
                    };
                    print_json(&VatSettlementAggregator::settle(recorded).rounded())
                }
                None => {
                    let rollup = VatSettlementAggregator::settle_year(year, &quarters)
                        .with_context(|| format!("Failed to settle VAT year {year}"))?;
                    print_json(&rollup.rounded())
                }
            }
        }
        Command::Benefits { year } => {
            let engine = build_engine(repo.as_ref()).await?;
            let election = repo
                .get_taxpayer_election(year)
                .await
                .with_context(|| format!("Failed to read election for {year}"))?;
            let summary = engine
                .benefit_summary(year, &election)
                .context("Failed to summarise benefits")?;
            print_json(&summary)
        }
    }
}

async fn build_engine(repo: &dyn TaxRepository) -> Result<TaxEngine> {
    let years = repo
        .list_tax_years()
        .await
        .context("Failed to list tax years")?;

    let mut configs = Vec::with_capacity(years.len());
    for year in years {
        configs.push(
            repo.get_tax_year_config(year)
                .await
                .with_context(|| format!("Failed to read tax year {year}"))?,
        );
    }

    let engine = TaxEngine::new(configs).context("Invalid tax-year configuration")?;
    info!(years = ?engine.tax_years().collect::<Vec<_>>(), "Tax engine ready");
    Ok(engine)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{json}");
    Ok(())
}
