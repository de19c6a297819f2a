//! Async executor over [`tokio_postgres`].

use crate::ddl::create_statements;
use crate::error::classify;
use crate::values::{PgValue, decode_row};
use sqlweave_core::executor::{Executor, QueryResult};
use sqlweave_core::plan::StatementPlan;
use sqlweave_core::{Dialect, Result, Row, Schema, SqlweaveError};
use std::future::Future;
use std::sync::Arc;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

/// Runs statement plans on a PostgreSQL connection.
///
/// Clones share the client. The client pipelines concurrent statements over
/// its single connection.
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    client: Arc<Client>,
}

impl PostgresExecutor {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Gets a reference to the underlying client
    #[inline]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl From<Client> for PostgresExecutor {
    fn from(client: Client) -> Self {
        Self::new(client)
    }
}

/// Connects to `url` and drives the connection on a spawned tokio task.
///
/// A malformed URL is a [`Config`](SqlweaveError::Config) error; failing to
/// reach the server is a [`Connection`](SqlweaveError::Connection) error.
pub async fn connect(url: &str) -> Result<PostgresExecutor> {
    let config: tokio_postgres::Config = url
        .parse()
        .map_err(|err: tokio_postgres::Error| SqlweaveError::Config(err.to_string()))?;

    let (client, connection) = config.connect(NoTls).await.map_err(|err| match classify(err) {
        SqlweaveError::Execution(message) => SqlweaveError::Connection(message),
        other => other,
    })?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %err, "sqlweave.postgres.connection");
            #[cfg(not(feature = "tracing"))]
            drop(err);
        }
    });

    Ok(PostgresExecutor::new(client))
}

impl Executor for PostgresExecutor {
    fn run(&self, plan: &StatementPlan) -> impl Future<Output = Result<QueryResult>> + Send {
        let (sql, params) = plan.build(Dialect::PostgreSQL);
        let labels = plan.labels();
        let returns_rows = plan.returns_rows();

        async move {
            sqlweave_core::weave_trace_query!(&sql, params.len());

            let values: Vec<PgValue<'_>> = params.iter().map(PgValue).collect();
            let refs: Vec<&(dyn ToSql + Sync)> = values
                .iter()
                .map(|v| v as &(dyn ToSql + Sync))
                .collect();

            if !returns_rows {
                let affected = self.client.execute(&sql, &refs).await.map_err(classify)?;
                return Ok(QueryResult::new(Vec::new(), affected));
            }

            let rows = self.client.query(&sql, &refs).await.map_err(classify)?;
            let rows = rows
                .iter()
                .map(|row| Ok(Row::new(labels.clone(), decode_row(row)?)))
                .collect::<Result<Vec<_>>>()?;
            let affected = rows.len() as u64;
            Ok(QueryResult::new(rows, affected))
        }
    }

    fn create(&self, schema: &Schema) -> impl Future<Output = Result<()>> + Send {
        let statements = create_statements(schema);

        async move {
            for statement in &statements {
                sqlweave_core::weave_trace_query!(statement, 0);
                self.client.batch_execute(statement).await.map_err(classify)?;
            }
            Ok(())
        }
    }
}
