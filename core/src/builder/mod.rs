//! Expression-style statement builders.
//!
//! Every step takes `&self` and returns a new builder, so a base query can be
//! shared and extended by several callers. Shape errors are carried along and
//! reported by `build()`, before anything reaches an executor.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

use crate::error::{Result, SqlweaveError};
use crate::expr::{ColumnRef, CompareOp, Condition, Expr, SelectItem};
use crate::plan::{Assignment, StatementPlan};
use crate::schema::{ColumnDef, Schema, Table};
use crate::value::{Record, Value};
use sqlweave_types::SQLType;

/// Anything that compiles to a [`StatementPlan`].
pub trait IntoPlan {
    fn into_plan(&self) -> Result<StatementPlan>;
}

impl IntoPlan for StatementPlan {
    fn into_plan(&self) -> Result<StatementPlan> {
        Ok(self.clone())
    }
}

fn build_err(msg: impl Into<String>) -> SqlweaveError {
    SqlweaveError::Build(msg.into())
}

/// What RETURNING (or a bare select) projects.
#[derive(Debug, Clone, Default)]
pub(crate) enum Returning {
    #[default]
    Nothing,
    All,
    Items(Vec<SelectItem>),
}

/// Tables visible to a statement, by qualifier.
#[derive(Debug, Default)]
pub(crate) struct Scope<'t> {
    tables: Vec<&'t Table>,
}

impl<'t> Scope<'t> {
    pub(crate) fn add(&mut self, table: &'t Table) -> Result<()> {
        if self.tables.iter().any(|t| t.qualifier() == table.qualifier()) {
            return Err(build_err(format!(
                "table '{}' appears twice in one statement; alias one of them",
                table.qualifier()
            )));
        }
        self.tables.push(table);
        Ok(())
    }

    pub(crate) fn check_column(&self, column: &ColumnRef) -> Result<()> {
        let table = self
            .tables
            .iter()
            .find(|t| t.qualifier() == column.qualifier)
            .ok_or_else(|| {
                build_err(format!(
                    "column '{}.{}' refers to a table that is not part of this statement",
                    column.qualifier, column.name
                ))
            })?;
        if table.name() != column.table || table.info().column_index(&column.name).is_none() {
            return Err(build_err(format!(
                "'{}' has no column '{}'",
                column.qualifier, column.name
            )));
        }
        Ok(())
    }

    pub(crate) fn check_expr(&self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Excluded(_) => Err(build_err("excluded(..) is only valid inside a conflict update")),
            Expr::Aggregate { arg: Some(arg), .. } if arg.is_aggregate() => {
                Err(build_err("aggregate functions cannot be nested"))
            }
            _ => expr.columns().into_iter().try_for_each(|c| self.check_column(c)),
        }
    }

    pub(crate) fn check_condition(&self, condition: &Condition) -> Result<()> {
        let mut result = Ok(());
        condition.visit_exprs(&mut |e| {
            if result.is_ok() {
                result = self.check_expr(e);
            }
        });
        result?;
        check_types(condition)
    }
}

/// Whether two expressions may be compared
fn comparable(left: &Expr, right: &Expr) -> bool {
    let (Some(l), Some(r)) = (left.sql_type(), right.sql_type()) else {
        return true;
    };
    if l.is_compatible(&r) || (l.is_numeric() && r.is_numeric()) {
        return true;
    }
    match (left, right) {
        (Expr::Value(v), _) => v.fits(&r),
        (_, Expr::Value(v)) => v.fits(&l),
        _ => false,
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Column(c) | Expr::Excluded(c) => format!("{}.{}", c.qualifier, c.name),
        Expr::Value(v) => v.to_string(),
        Expr::Aggregate { func, .. } => format!("{}(..)", func.as_str()),
    }
}

pub(crate) fn check_types(condition: &Condition) -> Result<()> {
    match condition {
        Condition::Compare { left, op, right } => {
            if *op == CompareOp::Like
                && !left
                    .sql_type()
                    .is_none_or(|t| t.is_textual() || t.enum_name().is_some())
            {
                return Err(build_err(format!("LIKE needs a text operand, got {}", describe(left))));
            }
            if !comparable(left, right) {
                return Err(build_err(format!(
                    "cannot compare {} with {}",
                    describe(left),
                    describe(right)
                )));
            }
            Ok(())
        }
        Condition::In { expr, values, .. } => values.iter().try_for_each(|v| {
            if comparable(expr, v) {
                Ok(())
            } else {
                Err(build_err(format!("cannot compare {} with {}", describe(expr), describe(v))))
            }
        }),
        Condition::Null { .. } => Ok(()),
        Condition::And(items) | Condition::Or(items) => items.iter().try_for_each(check_types),
        Condition::Not(inner) => check_types(inner),
    }
}

pub(crate) fn contains_aggregate(condition: &Condition) -> bool {
    condition.exprs().iter().any(|e| e.is_aggregate())
}

/// Checks a literal against the column it is written to.
pub(crate) fn validate_value(
    schema: &Schema,
    table: &str,
    column: &ColumnDef,
    value: &Value,
) -> Result<()> {
    if !value.fits(&column.sql_type) {
        return Err(build_err(format!(
            "value {value} does not fit column '{table}.{}' of type {}",
            column.name, column.sql_type
        )));
    }
    if let Value::Text(text) = value {
        match &column.sql_type {
            SQLType::Enum(name) => {
                if let Some(def) = schema.enum_def(name) {
                    def.validate(text)
                        .map_err(|e| SqlweaveError::Validation(format!("{table}.{}: {e}", column.name)))?;
                }
            }
            SQLType::Varchar(max) if text.chars().count() > *max as usize => {
                return Err(SqlweaveError::Validation(format!(
                    "{table}.{}: value is longer than {max} characters",
                    column.name
                )));
            }
            _ => {}
        }
    }
    if let Some(allowed) = &column.check
        && !value.is_null()
        && !allowed.contains(value)
    {
        let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        return Err(SqlweaveError::Validation(format!(
            "{table}.{}: {value} is not one of {}",
            column.name,
            allowed.join(", ")
        )));
    }
    Ok(())
}

/// Resolves and checks SET assignments against `table`.
pub(crate) fn assignments(table: &Table, record: &Record, allow_excluded: bool) -> Result<Vec<Assignment>> {
    if record.is_empty() {
        return Err(build_err(format!("no columns to set on '{}'", table.name())));
    }
    let mut scope = Scope::default();
    scope.add(table)?;

    record
        .iter()
        .map(|(name, expr)| {
            let column = table.col(name)?;
            match expr {
                Expr::Value(value) => {
                    validate_value(table.schema(), table.name(), column.def(), value)?;
                }
                Expr::Excluded(col) if allow_excluded => {
                    if col.table != table.name() || table.info().column_index(&col.name).is_none() {
                        return Err(build_err(format!(
                            "excluded column '{}' does not belong to '{}'",
                            col.name,
                            table.name()
                        )));
                    }
                }
                Expr::Aggregate { .. } => {
                    return Err(build_err("aggregates cannot be assigned to a column"));
                }
                other => scope.check_expr(other)?,
            }
            if let Some(ty) = expr.sql_type()
                && !matches!(expr, Expr::Value(_))
                && !(ty.is_compatible(column.sql_type())
                    || (ty.is_numeric() && column.sql_type().is_numeric()))
            {
                return Err(build_err(format!(
                    "cannot assign {} to '{}.{}'",
                    describe(expr),
                    table.name(),
                    column.name()
                )));
            }
            Ok(Assignment {
                column: column.name().to_string(),
                value: expr.clone(),
            })
        })
        .collect()
}

/// Resolves a RETURNING list against the single written table.
pub(crate) fn returning_items(table: &Table, returning: &Returning) -> Result<Vec<SelectItem>> {
    match returning {
        Returning::Nothing => Ok(Vec::new()),
        Returning::All => Ok(table.columns().iter().map(SelectItem::from).collect()),
        Returning::Items(items) => {
            let mut scope = Scope::default();
            scope.add(table)?;
            for item in items {
                if item.expr.is_aggregate() {
                    return Err(build_err("RETURNING cannot contain aggregates"));
                }
                scope.check_expr(&item.expr)?;
            }
            check_labels(items)?;
            Ok(items.clone())
        }
    }
}

pub(crate) fn check_labels(items: &[SelectItem]) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        if items[..i].iter().any(|other| other.label == item.label) {
            return Err(build_err(format!("two projected fields are labelled '{}'", item.label)));
        }
    }
    Ok(())
}
