use super::{IntoPlan, Returning, Scope, build_err, contains_aggregate, returning_items};
use crate::error::Result;
use crate::expr::{Condition, SelectItem};
use crate::plan::{DeletePlan, StatementPlan};
use crate::schema::Table;

/// Builds DELETE statements. Without a filter every row is removed.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: Table,
    filter: Option<Condition>,
    returning: Returning,
}

impl DeleteBuilder {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            filter: None,
            returning: Returning::Nothing,
        }
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

    pub fn to_plan(&self) -> Result<DeletePlan> {
        if self.table.is_aliased() {
            return Err(build_err("cannot delete from an aliased table"));
        }
        if let Some(filter) = &self.filter {
            if contains_aggregate(filter) {
                return Err(build_err("aggregates are not allowed in a delete filter"));
            }
            let mut scope = Scope::default();
            scope.add(&self.table)?;
            scope.check_condition(filter)?;
        }
        Ok(DeletePlan {
            table: self.table.name().to_string(),
            filter: self.filter.clone(),
            returning: returning_items(&self.table, &self.returning)?,
        })
    }

    pub fn build(&self) -> Result<StatementPlan> {
        self.to_plan().map(StatementPlan::Delete)
    }
}

impl IntoPlan for DeleteBuilder {
    fn into_plan(&self) -> Result<StatementPlan> {
        self.build()
    }
}
