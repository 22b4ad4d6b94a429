//! Recording substitute for a database connection.
//!
//! [`MockDatabase`] implements [`Database`] without a server: it records every
//! forwarded call and serves canned rows, so executor and cursor behavior can be
//! checked directly.
//!
//! ```rust
//! use pgexec::prelude::*;
//! use pgexec::test_utils::{MockCall, MockDatabase};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let executor = Executor::from_database(MockDatabase::new()).await.unwrap();
//! executor.exec("DELETE FROM t WHERE id = $1", &[RowValues::Int(3)]).await.unwrap();
//! assert_eq!(
//!     executor.database().last_call(),
//!     Some(MockCall::Exec {
//!         query: "DELETE FROM t WHERE id = $1".into(),
//!         params: vec![RowValues::Int(3)],
//!     })
//! );
//! # });
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::PgExecError;
use crate::executor::{Database, TransactionHandle};
use crate::results::{FetchedRow, RowCursor};
use crate::types::RowValues;

/// One call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Close,
    Ping,
    Exec { query: String, params: Vec<RowValues> },
    Query { query: String, params: Vec<RowValues> },
    Begin,
    TxExec { query: String, params: Vec<RowValues> },
    TxQuery { query: String, params: Vec<RowValues> },
    Commit,
    Rollback,
    CursorClose,
}

type CallLog = Rc<RefCell<Vec<MockCall>>>;

/// A database connection that records calls and answers from canned data.
#[derive(Debug, Default)]
pub struct MockDatabase {
    calls: CallLog,
    rows: Vec<Vec<RowValues>>,
    rows_affected: u64,
    ping_error: Option<String>,
    exec_error: Option<String>,
    row_error: Option<(usize, String)>,
    undecodable: Option<(usize, String)>,
}

impl MockDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows served by every `query`.
    #[must_use]
    pub fn with_rows(mut self, rows: Vec<Vec<RowValues>>) -> Self {
        self.rows = rows;
        self
    }

    /// Count reported by every successful `exec`.
    #[must_use]
    pub fn with_rows_affected(mut self, rows_affected: u64) -> Self {
        self.rows_affected = rows_affected;
        self
    }

    /// Make `ping` fail with a connection error.
    #[must_use]
    pub fn failing_ping(mut self, message: &str) -> Self {
        self.ping_error = Some(message.to_string());
        self
    }

    /// Make every `exec` fail with an execution error.
    #[must_use]
    pub fn failing_exec(mut self, message: &str) -> Self {
        self.exec_error = Some(message.to_string());
        self
    }

    /// Make cursors fail when asked for row `index` (0-based).
    #[must_use]
    pub fn failing_at_row(mut self, index: usize, message: &str) -> Self {
        self.row_error = Some((index, message.to_string()));
        self
    }

    /// Report `column` of every served row as undecodable with `message`.
    #[must_use]
    pub fn undecodable_column(mut self, column: usize, message: &str) -> Self {
        self.undecodable = Some((column, message.to_string()));
        self
    }

    /// All calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.borrow().clone()
    }

    #[must_use]
    pub fn last_call(&self) -> Option<MockCall> {
        self.calls.borrow().last().cloned()
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.count(&MockCall::Close)
    }

    #[must_use]
    pub fn count(&self, call: &MockCall) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: MockCall) {
        self.calls.borrow_mut().push(call);
    }

    fn exec_outcome(&self) -> Result<u64, PgExecError> {
        match &self.exec_error {
            Some(message) => Err(PgExecError::ExecutionError(message.clone())),
            None => Ok(self.rows_affected),
        }
    }

    fn rows(&self) -> MockRows {
        MockRows {
            rows: self.rows.iter().cloned().collect(),
            served: 0,
            row_error: self.row_error.clone(),
            undecodable: self.undecodable.clone(),
            calls: Rc::clone(&self.calls),
        }
    }
}

impl Database for MockDatabase {
    type Rows = MockRows;
    type Tx<'a> = MockTransaction<'a>;

    async fn close(&mut self) -> Result<(), PgExecError> {
        self.record(MockCall::Close);
        Ok(())
    }

    async fn ping(&self) -> Result<(), PgExecError> {
        self.record(MockCall::Ping);
        match &self.ping_error {
            Some(message) => Err(PgExecError::ConnectionError(message.clone())),
            None => Ok(()),
        }
    }

    async fn exec(&self, query: &str, params: &[RowValues]) -> Result<u64, PgExecError> {
        self.record(MockCall::Exec {
            query: query.to_string(),
            params: params.to_vec(),
        });
        self.exec_outcome()
    }

    async fn query(&self, query: &str, params: &[RowValues]) -> Result<MockRows, PgExecError> {
        self.record(MockCall::Query {
            query: query.to_string(),
            params: params.to_vec(),
        });
        Ok(self.rows())
    }

    async fn begin(&mut self) -> Result<MockTransaction<'_>, PgExecError> {
        self.record(MockCall::Begin);
        Ok(MockTransaction { db: self })
    }
}

/// Transaction handle of [`MockDatabase`].
#[derive(Debug)]
pub struct MockTransaction<'a> {
    db: &'a MockDatabase,
}

impl TransactionHandle for MockTransaction<'_> {
    type Rows = MockRows;

    async fn exec(&self, query: &str, params: &[RowValues]) -> Result<u64, PgExecError> {
        self.db.record(MockCall::TxExec {
            query: query.to_string(),
            params: params.to_vec(),
        });
        self.db.exec_outcome()
    }

    async fn query(&self, query: &str, params: &[RowValues]) -> Result<MockRows, PgExecError> {
        self.db.record(MockCall::TxQuery {
            query: query.to_string(),
            params: params.to_vec(),
        });
        Ok(self.db.rows())
    }

    async fn commit(self) -> Result<(), PgExecError> {
        self.db.record(MockCall::Commit);
        Ok(())
    }

    async fn rollback(self) -> Result<(), PgExecError> {
        self.db.record(MockCall::Rollback);
        Ok(())
    }
}

/// Cursor over canned rows.
#[derive(Debug)]
pub struct MockRows {
    rows: VecDeque<Vec<RowValues>>,
    served: usize,
    row_error: Option<(usize, String)>,
    undecodable: Option<(usize, String)>,
    calls: CallLog,
}

impl RowCursor for MockRows {
    async fn next_row(&mut self) -> Result<Option<FetchedRow>, PgExecError> {
        if let Some((index, message)) = &self.row_error
            && *index == self.served
        {
            return Err(PgExecError::ExecutionError(message.clone()));
        }
        self.served += 1;
        let Some(values) = self.rows.pop_front() else {
            return Ok(None);
        };
        let row = FetchedRow::new(values);
        Ok(Some(match &self.undecodable {
            Some((column, message)) => row.with_undecodable(*column, message.as_str()),
            None => row,
        }))
    }

    fn close(&mut self) -> Result<(), PgExecError> {
        self.calls.borrow_mut().push(MockCall::CursorClose);
        Ok(())
    }
}
