use std::future::Future;

use crate::error::PgExecError;
use crate::postgres::{ExecutorConfig, PgDatabase};
use crate::query::QueryAndParams;
use crate::results::{QueryResult, RowCursor};
use crate::serialize::Serializable;
use crate::types::RowValues;

/// Capability set of a database connection that [`Executor`] forwards to.
///
/// [`PgDatabase`] is the tokio-postgres implementation; tests substitute a
/// recording client.
pub trait Database {
    /// Row source returned by `query`.
    type Rows: RowCursor;
    /// Transaction handle returned by `begin`, borrowing the connection.
    type Tx<'a>: TransactionHandle
    where
        Self: 'a;

    #[allow(clippy::manual_async_fn)]
    fn close(&mut self) -> impl Future<Output = Result<(), PgExecError>>;

    #[allow(clippy::manual_async_fn)]
    fn ping(&self) -> impl Future<Output = Result<(), PgExecError>>;

    /// Run a statement and return the number of rows affected.
    #[allow(clippy::manual_async_fn)]
    fn exec(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, PgExecError>>;

    #[allow(clippy::manual_async_fn)]
    fn query(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<Self::Rows, PgExecError>>;

    #[allow(clippy::manual_async_fn)]
    fn begin(&mut self) -> impl Future<Output = Result<Self::Tx<'_>, PgExecError>>;
}

/// Capability set of an open transaction.
pub trait TransactionHandle {
    type Rows: RowCursor;

    #[allow(clippy::manual_async_fn)]
    fn exec(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<u64, PgExecError>>;

    #[allow(clippy::manual_async_fn)]
    fn query(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> impl Future<Output = Result<Self::Rows, PgExecError>>;

    #[allow(clippy::manual_async_fn)]
    fn commit(self) -> impl Future<Output = Result<(), PgExecError>>;

    #[allow(clippy::manual_async_fn)]
    fn rollback(self) -> impl Future<Output = Result<(), PgExecError>>;
}

/// Connects to a SQL database and forwards queries to it.
///
/// Every call is passed through unchanged: no retries, no timeouts, no pooling.
pub struct Executor<D: Database = PgDatabase> {
    db: D,
}

impl Executor<PgDatabase> {
    /// Connect to the Postgres database at `db_url` and verify it with a ping.
    ///
    /// # Errors
    /// Returns `PgExecError::ConfigError` for an invalid URL, or the client's
    /// error if connecting or pinging fails.
    pub async fn new(db_url: &str) -> Result<Self, PgExecError> {
        let config = ExecutorConfig::from_url(db_url)?;
        Self::from_config(&config).await
    }

    /// Connect using an already parsed configuration and verify it with a ping.
    ///
    /// # Errors
    /// Returns the client's error if connecting or pinging fails.
    pub async fn from_config(config: &ExecutorConfig) -> Result<Self, PgExecError> {
        let db = PgDatabase::connect(config).await?;
        Self::from_database(db).await
    }
}

impl<D: Database> Executor<D> {
    /// Wrap an open connection after checking that it answers a ping.
    ///
    /// # Errors
    /// Returns the ping error; the connection is dropped in that case.
    pub async fn from_database(db: D) -> Result<Self, PgExecError> {
        db.ping().await?;
        Ok(Self { db })
    }

    /// Close the underlying connection.
    ///
    /// # Errors
    /// Returns the client's close error.
    pub async fn close(&mut self) -> Result<(), PgExecError> {
        tracing::info!("closing executor connection");
        self.db.close().await
    }

    /// Execute a statement that does not return rows.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn exec(&self, query: &str, params: &[RowValues]) -> Result<u64, PgExecError> {
        tracing::debug!(query, params = params.len(), "exec");
        self.db.exec(query, params).await
    }

    /// Execute a query that returns rows and wrap them in a cursor.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn query(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<QueryResult<D::Rows>, PgExecError> {
        tracing::debug!(query, params = params.len(), "query");
        let rows = self.db.query(query, params).await?;
        Ok(QueryResult::new(rows))
    }

    /// Start a transaction on this connection.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn begin(&mut self) -> Result<Transaction<D::Tx<'_>>, PgExecError> {
        tracing::debug!("begin");
        let tx = self.db.begin().await?;
        Ok(Transaction { tx })
    }

    /// Execute the insert statement generated by `item`.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn insert<S: Serializable + ?Sized>(&self, item: &S) -> Result<u64, PgExecError> {
        self.exec(&item.generate_insert_sql(), &[]).await
    }

    /// Execute a statement together with its collected parameters.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn exec_query_and_params(&self, qp: &QueryAndParams) -> Result<u64, PgExecError> {
        self.exec(&qp.query, &qp.params).await
    }

    /// Borrow the wrapped connection.
    #[must_use]
    pub fn database(&self) -> &D {
        &self.db
    }
}

/// An open transaction. Nothing is rolled back automatically on error; call
/// [`commit`](Self::commit) or [`rollback`](Self::rollback).
pub struct Transaction<T: TransactionHandle> {
    tx: T,
}

impl<T: TransactionHandle> Transaction<T> {
    /// Execute a statement inside the transaction.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn exec(&self, query: &str, params: &[RowValues]) -> Result<u64, PgExecError> {
        tracing::debug!(query, params = params.len(), "tx exec");
        self.tx.exec(query, params).await
    }

    /// Run a query inside the transaction.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn query(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<QueryResult<T::Rows>, PgExecError> {
        tracing::debug!(query, params = params.len(), "tx query");
        let rows = self.tx.query(query, params).await?;
        Ok(QueryResult::new(rows))
    }

    /// Execute a statement together with its collected parameters.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn exec_query_and_params(&self, qp: &QueryAndParams) -> Result<u64, PgExecError> {
        self.exec(&qp.query, &qp.params).await
    }

    /// Commit the transaction.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn commit(self) -> Result<(), PgExecError> {
        tracing::debug!("commit");
        self.tx.commit().await
    }

    /// Roll back the transaction.
    ///
    /// # Errors
    /// Returns the client's error unchanged.
    pub async fn rollback(self) -> Result<(), PgExecError> {
        tracing::debug!("rollback");
        self.tx.rollback().await
    }
}
