//! Convenient imports for common functionality.

pub use crate::error::PgExecError;
pub use crate::executor::{Database, Executor, Transaction, TransactionHandle};
pub use crate::postgres::{ExecutorConfig, PgDatabase};
pub use crate::query::QueryAndParams;
pub use crate::results::{
    Deserializable, FetchedRow, QueryResult, RowCursor, ScanTarget, ScannerFunction, scan_row,
};
pub use crate::serialize::{Serializable, Serializer, serialize, serialize_string_array};
pub use crate::types::RowValues;
