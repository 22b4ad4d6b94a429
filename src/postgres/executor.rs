use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::error::PgExecError;
use crate::executor::Database;
use crate::types::RowValues;

use super::{ExecutorConfig, Params, PgRows, PgTransaction};

/// A single tokio-postgres connection.
///
/// The connection driver runs on a spawned task; [`Database::close`] drops the
/// client and waits for that task to finish. Calls after close fail with
/// `PgExecError::ConnectionError`.
pub struct PgDatabase {
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
}

impl PgDatabase {
    /// Open a connection. Does not ping; [`Executor`](crate::Executor) does that.
    ///
    /// # Errors
    /// Returns the client's error if the connection cannot be established.
    pub async fn connect(config: &ExecutorConfig) -> Result<Self, PgExecError> {
        let (client, connection) = config.pg_config().connect(NoTls).await?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection error");
            }
        });
        tracing::info!(
            dbname = config.pg_config().get_dbname().unwrap_or_default(),
            "connected to postgres"
        );
        Ok(Self {
            client: Some(client),
            driver: Some(driver),
        })
    }

    fn client(&self) -> Result<&Client, PgExecError> {
        self.client
            .as_ref()
            .ok_or_else(|| PgExecError::ConnectionError("connection is closed".to_string()))
    }
}

impl Database for PgDatabase {
    type Rows = PgRows;
    type Tx<'a> = PgTransaction<'a>;

    async fn close(&mut self) -> Result<(), PgExecError> {
        drop(self.client.take());
        if let Some(driver) = self.driver.take() {
            driver.await.map_err(|e| {
                PgExecError::ConnectionError(format!("connection task failed: {e}"))
            })?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), PgExecError> {
        self.client()?.batch_execute("SELECT 1").await?;
        Ok(())
    }

    async fn exec(&self, query: &str, params: &[RowValues]) -> Result<u64, PgExecError> {
        let converted = Params::convert(params);
        Ok(self.client()?.execute(query, converted.as_refs()).await?)
    }

    async fn query(&self, query: &str, params: &[RowValues]) -> Result<PgRows, PgExecError> {
        let stream = self.client()?.query_raw(query, params.iter()).await?;
        Ok(PgRows::new(stream))
    }

    async fn begin(&mut self) -> Result<PgTransaction<'_>, PgExecError> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| PgExecError::ConnectionError("connection is closed".to_string()))?;
        let tx = client.transaction().await?;
        Ok(PgTransaction::new(tx))
    }
}
