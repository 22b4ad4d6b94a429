// PostgreSQL module - the tokio-postgres implementation of the executor capabilities
//
// - config: connection URL parsing and validation
// - params: binding `RowValues` as Postgres parameters
// - query: row value extraction and the streaming row cursor
// - executor: the `Database` implementation over a single client connection
// - transaction: the `TransactionHandle` implementation

pub mod config;
pub mod executor;
pub mod params;
pub mod query;
pub mod transaction;

pub use config::ExecutorConfig;
pub use executor::PgDatabase;
pub use params::Params;
pub use query::{PgRows, postgres_extract_value};
pub use transaction::PgTransaction;
