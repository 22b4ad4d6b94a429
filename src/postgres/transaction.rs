use tokio_postgres::Transaction as PgTx;

use crate::error::PgExecError;
use crate::executor::TransactionHandle;
use crate::types::RowValues;

use super::{Params, PgRows};

/// Lightweight transaction wrapper for Postgres.
pub struct PgTransaction<'a> {
    tx: PgTx<'a>,
}

impl<'a> PgTransaction<'a> {
    pub(crate) fn new(tx: PgTx<'a>) -> Self {
        Self { tx }
    }
}

impl TransactionHandle for PgTransaction<'_> {
    type Rows = PgRows;

    async fn exec(&self, query: &str, params: &[RowValues]) -> Result<u64, PgExecError> {
        let converted = Params::convert(params);
        Ok(self.tx.execute(query, converted.as_refs()).await?)
    }

    async fn query(&self, query: &str, params: &[RowValues]) -> Result<PgRows, PgExecError> {
        let stream = self.tx.query_raw(query, params.iter()).await?;
        Ok(PgRows::new(stream))
    }

    async fn commit(self) -> Result<(), PgExecError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), PgExecError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
