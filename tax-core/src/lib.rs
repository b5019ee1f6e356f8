pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::{TaxEngine, VatSettlementAggregator};
pub use db::repository::{RepositoryError, TaxRepository};
pub use models::*;
