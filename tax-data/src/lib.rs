//! File-backed configuration for the tax engine.
//!
//! [`ConfigLoader`] reads a tax-year configuration directory,
//! [`CsvRepository`] serves it through [`tax_core::TaxRepository`], and
//! [`logging`] sets up tracing for the `tax-engine` binary.

pub mod loader;
pub mod logging;
pub mod repository;

pub use loader::{ConfigLoader, LoadedConfig, LoaderError};
pub use repository::{CsvRepository, CsvRepositoryFactory, default_registry};
