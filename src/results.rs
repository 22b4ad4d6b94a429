mod cursor;
mod scan;

pub use cursor::{FetchedRow, QueryResult, RowCursor};
pub use scan::{Deserializable, ScanTarget, ScannerFunction, scan_row};
