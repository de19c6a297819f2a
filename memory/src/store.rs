use crate::select::run_select;
use crate::write;
use indexmap::IndexMap;
use sqlweave_core::executor::{Executor, QueryResult};
use sqlweave_core::plan::StatementPlan;
use sqlweave_core::schema::TableInfo;
use sqlweave_core::{Result, Row, Schema, SqlweaveError, Value};
use std::future::{Future, ready};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Default)]
pub(crate) struct TableData {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<Value>>,
}

#[derive(Debug, Default)]
pub(crate) struct State {
    schema: Option<Schema>,
    tables: IndexMap<String, TableData>,
}

impl State {
    pub(crate) fn schema(&self) -> Result<&Schema> {
        self.schema
            .as_ref()
            .ok_or_else(|| SqlweaveError::Execution("no schema has been created in this store".into()))
    }

    pub(crate) fn table(&self, name: &str) -> Result<&TableData> {
        self.tables
            .get(name)
            .ok_or_else(|| SqlweaveError::Execution(format!("relation \"{name}\" does not exist")))
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Result<&mut TableData> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| SqlweaveError::Execution(format!("relation \"{name}\" does not exist")))
    }
}

pub(crate) fn table_info<'s>(schema: &'s Schema, name: &str) -> Result<&'s TableInfo> {
    schema
        .table_id(name)
        .map(|id| schema.info(id))
        .ok_or_else(|| SqlweaveError::Execution(format!("relation \"{name}\" does not exist")))
}

/// A store that keeps tables in process memory.
///
/// Statements run under a single lock and are applied whole: a write that
/// fails any constraint leaves every table untouched. Clones share the same
/// tables.
///
/// ```
/// use sqlweave_memory::MemoryStore;
///
/// let store = MemoryStore::new();
/// assert!(store.row_count("user").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the tables of `schema`; existing tables keep their rows
    pub fn create_tables(&self, schema: &Schema) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        for info in schema.tables() {
            let columns: Vec<String> = info.columns.iter().map(|c| c.name.clone()).collect();
            if let Some(existing) = state.tables.get(&info.name) {
                if existing.columns != columns {
                    return Err(SqlweaveError::Execution(format!(
                        "relation \"{}\" already exists with different columns",
                        info.name
                    )));
                }
                continue;
            }
            state.tables.insert(
                info.name.clone(),
                TableData {
                    columns,
                    rows: Vec::new(),
                },
            );
        }
        state.schema = Some(schema.clone());
        Ok(())
    }

    /// Number of rows currently stored in `table`
    pub fn row_count(&self, table: &str) -> Result<usize> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.table(table)?.rows.len())
    }

    /// Runs one plan synchronously
    pub fn execute(&self, plan: &StatementPlan) -> Result<QueryResult> {
        sqlweave_core::weave_trace_query!(
            sqlweave_core::ToSQL::to_sql(plan).sql(sqlweave_core::Dialect::PostgreSQL),
            sqlweave_core::ToSQL::to_sql(plan).params().count()
        );

        let labels = plan.labels();
        let (rows, affected) = match plan {
            StatementPlan::Select(select) => {
                let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
                let rows = run_select(&state, select)?;
                let count = rows.len() as u64;
                (rows, count)
            }
            StatementPlan::Insert(insert) => {
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                write::insert(&mut state, insert)?
            }
            StatementPlan::Update(update) => {
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                write::update(&mut state, update)?
            }
            StatementPlan::Delete(delete) => {
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                write::delete(&mut state, delete)?
            }
        };

        let rows = rows
            .into_iter()
            .map(|values| Row::new(labels.clone(), values))
            .collect();
        Ok(QueryResult::new(rows, affected))
    }
}

impl Executor for MemoryStore {
    fn run(&self, plan: &StatementPlan) -> impl Future<Output = Result<QueryResult>> + Send {
        ready(self.execute(plan))
    }

    fn create(&self, schema: &Schema) -> impl Future<Output = Result<()>> + Send {
        ready(self.create_tables(schema))
    }
}
