use sqlweave_core::builder::{DeleteBuilder, InsertBuilder, IntoPlan, SelectBuilder, UpdateBuilder};
use sqlweave_core::executor::{Executor, QueryResult};
use sqlweave_core::expr::SelectItem;
use sqlweave_core::provider::{SystemValues, ValueProvider};
use sqlweave_core::query::{FindOptions, compile};
use sqlweave_core::{QueryRow, Result, Row, Schema, SqlweaveError, Table};
use std::sync::Arc;

/// A schema bound to an executor.
///
/// Provides query building methods (`select`, `insert`, `update`, `delete`)
/// and execution methods (`all`, `get`, `execute`, `query`). Cloning is as
/// cheap as cloning the executor; clones share the schema and value provider.
#[derive(Debug, Clone)]
pub struct Database<E> {
    executor: E,
    schema: Schema,
    provider: Arc<dyn ValueProvider>,
}

impl<E: Executor> Database<E> {
    /// Binds `schema` to `executor`, generating defaults from [`SystemValues`]
    pub fn new(executor: E, schema: Schema) -> Self {
        Self {
            executor,
            schema,
            provider: Arc::new(SystemValues),
        }
    }

    /// Replaces the source of generated identifiers and timestamps
    pub fn with_provider(mut self, provider: impl ValueProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Handle to a registered table
    pub fn table(&self, name: &str) -> Result<Table> {
        self.schema.table(name)
    }

    /// Creates a SELECT query builder.
    pub fn select<I>(&self, items: I) -> SelectBuilder
    where
        I: IntoIterator,
        I::Item: Into<SelectItem>,
    {
        SelectBuilder::new(&self.schema, items)
    }

    /// Creates a SELECT over every column of every table in the statement.
    pub fn select_all(&self) -> SelectBuilder {
        SelectBuilder::all(&self.schema)
    }

    /// Creates a SELECT DISTINCT query builder.
    pub fn select_distinct<I>(&self, items: I) -> SelectBuilder
    where
        I: IntoIterator,
        I::Item: Into<SelectItem>,
    {
        self.select(items).distinct()
    }

    /// Creates an INSERT query builder.
    pub fn insert(&self, table: &Table) -> InsertBuilder {
        InsertBuilder::new(table, Arc::clone(&self.provider))
    }

    /// Creates an UPDATE query builder.
    pub fn update(&self, table: &Table) -> UpdateBuilder {
        UpdateBuilder::new(table)
    }

    /// Creates a DELETE query builder.
    pub fn delete(&self, table: &Table) -> DeleteBuilder {
        DeleteBuilder::new(table)
    }

    /// Starts a nested, relation-aware read rooted at `table`.
    pub fn query(&self, table: &Table) -> RelationalQuery<'_, E> {
        RelationalQuery {
            db: self,
            table: table.clone(),
        }
    }

    /// Runs the query and returns its result unchanged
    pub async fn run<Q: IntoPlan>(&self, query: &Q) -> Result<QueryResult> {
        let plan = query.into_plan()?;
        self.executor.run(&plan).await
    }

    /// Runs the query and returns all rows (selected, or returned by a write)
    pub async fn all<Q: IntoPlan>(&self, query: &Q) -> Result<Vec<Row>> {
        Ok(self.run(query).await?.rows)
    }

    /// Runs the query and returns its first row
    pub async fn get<Q: IntoPlan>(&self, query: &Q) -> Result<Row> {
        self.all(query)
            .await?
            .into_iter()
            .next()
            .ok_or(SqlweaveError::NotFound)
    }

    /// Runs the query and returns the number of affected rows
    pub async fn execute<Q: IntoPlan>(&self, query: &Q) -> Result<u64> {
        Ok(self.run(query).await?.affected)
    }

    /// Creates the schema's enums and tables in the store
    pub async fn create(&self) -> Result<()> {
        self.executor.create(&self.schema).await
    }
}

/// A nested read rooted at one table.
#[derive(Debug)]
pub struct RelationalQuery<'a, E> {
    db: &'a Database<E>,
    table: Table,
}

impl<E: Executor> RelationalQuery<'_, E> {
    /// Root rows with their requested relations nested inside
    pub async fn find_many(&self, options: &FindOptions) -> Result<Vec<QueryRow>> {
        let compiled = compile(&self.table, options)?;
        let result = self.db.executor.run(compiled.plan()).await?;
        let rows = compiled.reshape(&result.rows);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            table = self.table.name(),
            flat = result.rows.len(),
            nested = rows.len(),
            "sqlweave.find_many"
        );

        Ok(rows)
    }

    /// The first root row, or `None` when nothing matches
    pub async fn find_first(&self, options: &FindOptions) -> Result<Option<QueryRow>> {
        let options = options.clone().limit(1);
        Ok(self.find_many(&options).await?.into_iter().next())
    }
}
