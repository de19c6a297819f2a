//! The boundary to a store.

use crate::error::Result;
use crate::plan::StatementPlan;
use crate::schema::Schema;
use crate::value::Row;
use std::future::Future;

/// Rows and affected-row count of one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Selected rows, or the RETURNING rows of a write
    pub rows: Vec<Row>,
    /// Rows written; for selects, the number of rows returned
    pub affected: u64,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>, affected: u64) -> Self {
        Self { rows, affected }
    }
}

/// Runs statement plans against a store.
///
/// Implementations classify store failures once:
/// [`ConstraintViolation`](crate::SqlweaveError::ConstraintViolation) and
/// [`TypeMismatch`](crate::SqlweaveError::TypeMismatch) are permanent,
/// [`Connection`](crate::SqlweaveError::Connection) is transient. Nothing is
/// retried here; callers decide.
pub trait Executor: Send + Sync {
    /// Runs one statement; a plan is applied entirely or not at all
    fn run(&self, plan: &StatementPlan) -> impl Future<Output = Result<QueryResult>> + Send;

    /// Creates the enums and tables of `schema` in the store
    fn create(&self, schema: &Schema) -> impl Future<Output = Result<()>> + Send;
}

impl<E: Executor> Executor for &E {
    fn run(&self, plan: &StatementPlan) -> impl Future<Output = Result<QueryResult>> + Send {
        (**self).run(plan)
    }

    fn create(&self, schema: &Schema) -> impl Future<Output = Result<()>> + Send {
        (**self).create(schema)
    }
}

impl<E: Executor> Executor for std::sync::Arc<E> {
    fn run(&self, plan: &StatementPlan) -> impl Future<Output = Result<QueryResult>> + Send {
        (**self).run(plan)
    }

    fn create(&self, schema: &Schema) -> impl Future<Output = Result<()>> + Send {
        (**self).create(schema)
    }
}
