use std::future::Future;

use crate::error::PgExecError;
use crate::types::RowValues;

use super::scan::{Deserializable, scanner};

/// One row pulled from a backend.
///
/// A column the backend could not decode holds `Null` in [`values`](Self::values)
/// and keeps its decode error; scanning that column reports the error, while the
/// rest of the row and the remaining rows stay readable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedRow {
    values: Vec<RowValues>,
    undecodable: Vec<(usize, String)>,
}

impl FetchedRow {
    #[must_use]
    pub fn new(values: Vec<RowValues>) -> Self {
        Self {
            values,
            undecodable: Vec::new(),
        }
    }

    /// Mark `column` as undecodable with `message`.
    #[must_use]
    pub fn with_undecodable(mut self, column: usize, message: impl Into<String>) -> Self {
        if let Some(slot) = self.values.get_mut(column) {
            *slot = RowValues::Null;
        }
        self.undecodable.push((column, message.into()));
        self
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    /// The decode error of `column`, if it had one.
    #[must_use]
    pub fn decode_error(&self, column: usize) -> Option<&str> {
        self.undecodable
            .iter()
            .find(|(idx, _)| *idx == column)
            .map(|(_, message)| message.as_str())
    }
}

impl From<Vec<RowValues>> for FetchedRow {
    fn from(values: Vec<RowValues>) -> Self {
        Self::new(values)
    }
}

/// Backend row source driven by [`QueryResult`].
pub trait RowCursor {
    /// Fetch the next row, or `None` once the row set is exhausted.
    #[allow(clippy::manual_async_fn)]
    fn next_row(
        &mut self,
    ) -> impl Future<Output = Result<Option<FetchedRow>, PgExecError>>;

    /// Release the underlying resources. Called at most once by `QueryResult`.
    ///
    /// # Errors
    /// Returns the backend's error if releasing fails.
    fn close(&mut self) -> Result<(), PgExecError>;
}

/// Cursor over the rows of one query.
///
/// Drive it with [`next`](Self::next) and pull each row out with
/// [`read`](Self::read). Iteration stops at the end of the rows or at the first
/// error, which is then available from [`err`](Self::err). Both close the cursor.
pub struct QueryResult<C: RowCursor> {
    cursor: C,
    current: Option<FetchedRow>,
    err: Option<PgExecError>,
    closed: bool,
}

impl<C: RowCursor> QueryResult<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            current: None,
            err: None,
            closed: false,
        }
    }

    /// Advance to the next row. Returns `false` when the rows are exhausted, an
    /// error occurred, or the cursor was closed.
    pub async fn next(&mut self) -> bool {
        if self.closed {
            return false;
        }
        match self.cursor.next_row().await {
            Ok(Some(row)) => {
                self.current = Some(row);
                true
            }
            Ok(None) => {
                if let Err(e) = self.close() {
                    self.err = Some(e);
                }
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "row iteration stopped on error");
                // the iteration error wins over a close error
                let _ = self.close();
                self.err = Some(e);
                false
            }
        }
    }

    /// The error that stopped iteration, if any.
    #[must_use]
    pub fn err(&self) -> Option<&PgExecError> {
        self.err.as_ref()
    }

    /// Populate `dest` from the current row.
    ///
    /// # Errors
    /// Returns `PgExecError::ExecutionError` if there is no current row (before the
    /// first `next`, after exhaustion, or after `close`), or the scan error raised
    /// by `dest`.
    pub fn read<D: Deserializable + ?Sized>(&self, dest: &mut D) -> Result<(), PgExecError> {
        let row = self.current.as_ref().ok_or_else(|| {
            if self.closed {
                PgExecError::ExecutionError("read on a closed result".to_string())
            } else {
                PgExecError::ExecutionError("read called without a successful next".to_string())
            }
        })?;
        let mut scan = scanner(row);
        dest.from_row(&mut scan)
    }

    /// Raw values of the current row. Columns that failed to decode read as
    /// `Null` here; [`read`](Self::read) reports them instead.
    #[must_use]
    pub fn current_row(&self) -> Option<&[RowValues]> {
        self.current.as_ref().map(FetchedRow::values)
    }

    /// Close the cursor. Further calls are no-ops.
    ///
    /// # Errors
    /// Returns the backend's error from the first close.
    pub fn close(&mut self) -> Result<(), PgExecError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.current = None;
        self.cursor.close()
    }

    /// Whether the cursor has been closed, explicitly or by exhaustion.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
