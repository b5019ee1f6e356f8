pub mod factory;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryRegistry, SourceConfig};
pub use repository::{RepositoryError, TaxRepository};
