use super::{IntoPlan, Returning, assignments, build_err, returning_items, validate_value};
use crate::error::Result;
use crate::expr::{Expr, SelectItem};
use crate::plan::{Conflict, InsertPlan, StatementPlan};
use crate::provider::ValueProvider;
use crate::schema::{Column, ColumnDefault, Table};
use crate::value::{Record, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum OnConflict {
    DoNothing(Vec<Column>),
    DoUpdate(Vec<Column>, Record),
}

/// Builds INSERT statements.
///
/// Rows are completed at build time: omitted columns take their declared
/// default, with random ids and timestamps drawn from the builder's
/// [`ValueProvider`].
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: Table,
    provider: Arc<dyn ValueProvider>,
    rows: Vec<Record>,
    on_conflict: Option<OnConflict>,
    returning: Returning,
}

impl InsertBuilder {
    pub fn new(table: &Table, provider: Arc<dyn ValueProvider>) -> Self {
        Self {
            table: table.clone(),
            provider,
            rows: Vec::new(),
            on_conflict: None,
            returning: Returning::Nothing,
        }
    }

    /// Appends rows to insert
    pub fn values(&self, rows: impl IntoIterator<Item = Record>) -> Self {
        let mut next = self.clone();
        next.rows.extend(rows);
        next
    }

    pub fn returning<I>(&self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SelectItem>,
    {
        let mut next = self.clone();
        next.returning = Returning::Items(items.into_iter().map(Into::into).collect());
        next
    }

    pub fn returning_all(&self) -> Self {
        let mut next = self.clone();
        next.returning = Returning::All;
        next
    }

    /// Skips rows that collide on `target`, or on any unique key when `target` is empty
    pub fn on_conflict_do_nothing(&self, target: &[Column]) -> Self {
        let mut next = self.clone();
        next.on_conflict = Some(OnConflict::DoNothing(target.to_vec()));
        next
    }

    /// Updates the existing row instead when a row collides on `target`
    pub fn on_conflict_do_update(&self, target: &[Column], set: Record) -> Self {
        let mut next = self.clone();
        next.on_conflict = Some(OnConflict::DoUpdate(target.to_vec(), set));
        next
    }

    fn complete_row(&self, record: &Record) -> Result<Vec<Value>> {
        let info = self.table.info();
        for (name, _) in record.iter() {
            if info.column_index(name).is_none() {
                return Err(build_err(format!(
                    "unknown column '{name}' on table '{}'",
                    info.name
                )));
            }
        }

        info.columns
            .iter()
            .map(|column| match record.get(&column.name) {
                Some(Expr::Value(value)) => {
                    if value.is_null() && column.not_null {
                        return Err(build_err(format!(
                            "column '{}.{}' cannot be null",
                            info.name, column.name
                        )));
                    }
                    validate_value(self.table.schema(), &info.name, column, value)?;
                    Ok(value.clone())
                }
                Some(_) => Err(build_err(format!(
                    "inserted value for '{}.{}' must be a literal",
                    info.name, column.name
                ))),
                None => match &column.default {
                    ColumnDefault::Static(value) => Ok(value.clone()),
                    ColumnDefault::RandomId => Ok(Value::Uuid(self.provider.random_id())),
                    ColumnDefault::Now => Ok(Value::Timestamp(self.provider.now())),
                    ColumnDefault::None if column.not_null => Err(build_err(format!(
                        "missing value for required column '{}.{}'",
                        info.name, column.name
                    ))),
                    ColumnDefault::None => Ok(Value::Null),
                },
            })
            .collect()
    }

    fn conflict_target(&self, target: &[Column]) -> Result<Vec<String>> {
        let mut indexes = Vec::with_capacity(target.len());
        for column in target {
            if column.table().id() != self.table.id() || !column.table().schema().same_as(self.table.schema()) {
                return Err(build_err(format!(
                    "conflict target '{}' is not a column of '{}'",
                    column.name(),
                    self.table.name()
                )));
            }
            indexes.push(column.index());
        }
        if !self.table.info().has_unique_key(&indexes) {
            return Err(build_err(format!(
                "conflict target ({}) is not a primary key or unique constraint of '{}'",
                target.iter().map(Column::name).collect::<Vec<_>>().join(", "),
                self.table.name()
            )));
        }
        Ok(target.iter().map(|c| c.name().to_string()).collect())
    }

    pub fn to_plan(&self) -> Result<InsertPlan> {
        if self.table.is_aliased() {
            return Err(build_err("cannot insert into an aliased table"));
        }
        if self.rows.is_empty() {
            return Err(build_err(format!("insert into '{}' has no rows", self.table.name())));
        }
        let rows = self
            .rows
            .iter()
            .map(|record| self.complete_row(record))
            .collect::<Result<Vec<_>>>()?;

        let on_conflict = match &self.on_conflict {
            None => None,
            Some(OnConflict::DoNothing(target)) if target.is_empty() => {
                Some(Conflict::DoNothing { target: Vec::new() })
            }
            Some(OnConflict::DoNothing(target)) => Some(Conflict::DoNothing {
                target: self.conflict_target(target)?,
            }),
            Some(OnConflict::DoUpdate(target, set)) => {
                if target.is_empty() {
                    return Err(build_err("a conflict update needs a target"));
                }
                Some(Conflict::DoUpdate {
                    target: self.conflict_target(target)?,
                    set: assignments(&self.table, set, true)?,
                })
            }
        };

        Ok(InsertPlan {
            table: self.table.name().to_string(),
            columns: self
                .table
                .info()
                .columns
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            rows,
            on_conflict,
            returning: returning_items(&self.table, &self.returning)?,
        })
    }

    pub fn build(&self) -> Result<StatementPlan> {
        self.to_plan().map(StatementPlan::Insert)
    }
}

impl IntoPlan for InsertBuilder {
    fn into_plan(&self) -> Result<StatementPlan> {
        self.build()
    }
}
