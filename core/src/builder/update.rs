use super::{IntoPlan, Returning, Scope, assignments, build_err, contains_aggregate, returning_items};
use crate::error::Result;
use crate::expr::{Condition, Expr, SelectItem};
use crate::plan::{StatementPlan, UpdatePlan};
use crate::schema::Table;
use crate::value::{Record, Value};

/// Builds UPDATE statements.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: Table,
    set: Record,
    filter: Option<Condition>,
    returning: Returning,
}

impl UpdateBuilder {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            set: Record::new(),
            filter: None,
            returning: Returning::Nothing,
        }
    }

    /// Adds assignments; later ones win for the same column
    pub fn set(&self, record: Record) -> Self {
        let mut next = self.clone();
        for (column, expr) in record.iter() {
            next.set = next.set.set_expr(column, expr);
        }
        next
    }

    pub fn r#where(&self, condition: Condition) -> Self {
        let mut next = self.clone();
        next.filter = Some(condition);
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

    pub fn to_plan(&self) -> Result<UpdatePlan> {
        if self.table.is_aliased() {
            return Err(build_err("cannot update an aliased table"));
        }
        let set = assignments(&self.table, &self.set, false)?;
        for assignment in &set {
            let column = self.table.col(&assignment.column)?;
            if column.def().not_null && matches!(assignment.value, Expr::Value(Value::Null)) {
                return Err(build_err(format!(
                    "column '{}.{}' cannot be null",
                    self.table.name(),
                    column.name()
                )));
            }
        }
        if let Some(filter) = &self.filter {
            if contains_aggregate(filter) {
                return Err(build_err("aggregates are not allowed in an update filter"));
            }
            let mut scope = Scope::default();
            scope.add(&self.table)?;
            scope.check_condition(filter)?;
        }
        Ok(UpdatePlan {
            table: self.table.name().to_string(),
            set,
            filter: self.filter.clone(),
            returning: returning_items(&self.table, &self.returning)?,
        })
    }

    pub fn build(&self) -> Result<StatementPlan> {
        self.to_plan().map(StatementPlan::Update)
    }
}

impl IntoPlan for UpdateBuilder {
    fn into_plan(&self) -> Result<StatementPlan> {
        self.build()
    }
}
