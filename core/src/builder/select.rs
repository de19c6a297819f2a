use super::{IntoPlan, Scope, build_err, check_labels, contains_aggregate};
use crate::error::{Result, SqlweaveError};
use crate::expr::{Condition, Expr, OrderBy, SelectItem};
use crate::plan::{Join, JoinType, SelectPlan, Source, StatementPlan};
use crate::schema::{Schema, Table};

#[derive(Debug, Clone)]
enum Projection {
    /// Every column of the from table, then `alias.column` for each join
    All,
    Items(Vec<SelectItem>),
}

/// Builds SELECT statements.
///
/// ```
/// # use sqlweave_core::prelude::*;
/// # fn demo(user: &Table) -> Result<()> {
/// let name = user.col("name")?;
/// let plan = SelectBuilder::new(user.schema(), [SelectItem::from(&name)])
///     .from(user)
///     .r#where(eq(&name, "Kyle"))
///     .build()?;
/// # let _ = plan;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    schema: Schema,
    distinct: bool,
    projection: Projection,
    from: Option<Table>,
    joins: Vec<(JoinType, Table, Condition)>,
    filter: Option<Condition>,
    group_by: Vec<Expr>,
    having: Option<Condition>,
    order_by: Vec<OrderBy>,
    limit: Option<usize>,
    offset: Option<usize>,
    error: Option<SqlweaveError>,
}

impl SelectBuilder {
    pub fn new<I>(schema: &Schema, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SelectItem>,
    {
        Self::with_projection(
            schema,
            Projection::Items(items.into_iter().map(Into::into).collect()),
        )
    }

    /// Selects every column of every table in the statement
    pub fn all(schema: &Schema) -> Self {
        Self::with_projection(schema, Projection::All)
    }

    fn with_projection(schema: &Schema, projection: Projection) -> Self {
        Self {
            schema: schema.clone(),
            distinct: false,
            projection,
            from: None,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            error: None,
        }
    }

    fn step(&self, f: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        f(&mut next);
        next
    }

    fn own_table(&mut self, table: &Table) -> bool {
        if table.schema().same_as(&self.schema) {
            return true;
        }
        self.error.get_or_insert_with(|| {
            build_err(format!("table '{}' belongs to a different schema", table.name()))
        });
        false
    }

    pub fn distinct(&self) -> Self {
        self.step(|b| b.distinct = true)
    }

    pub fn from(&self, table: &Table) -> Self {
        self.step(|b| {
            if b.own_table(table) {
                b.from = Some(table.clone());
            }
        })
    }

    pub fn inner_join(&self, table: &Table, on: Condition) -> Self {
        self.join(JoinType::Inner, table, on)
    }

    pub fn left_join(&self, table: &Table, on: Condition) -> Self {
        self.join(JoinType::Left, table, on)
    }

    fn join(&self, kind: JoinType, table: &Table, on: Condition) -> Self {
        self.step(|b| {
            if b.own_table(table) {
                b.joins.push((kind, table.clone(), on));
            }
        })
    }

    /// Sets the WHERE condition, replacing any earlier one
    pub fn r#where(&self, condition: Condition) -> Self {
        self.step(|b| b.filter = Some(condition))
    }

    pub fn group_by<I>(&self, exprs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        let exprs: Vec<Expr> = exprs.into_iter().map(Into::into).collect();
        self.step(|b| b.group_by.extend(exprs))
    }

    pub fn having(&self, condition: Condition) -> Self {
        self.step(|b| b.having = Some(condition))
    }

    pub fn order_by(&self, order: impl IntoIterator<Item = OrderBy>) -> Self {
        let order: Vec<OrderBy> = order.into_iter().collect();
        self.step(|b| b.order_by.extend(order))
    }

    pub fn limit(&self, n: usize) -> Self {
        self.step(|b| b.limit = Some(n))
    }

    pub fn offset(&self, n: usize) -> Self {
        self.step(|b| b.offset = Some(n))
    }

    /// The expression projected under `label`, for reuse in having or order by
    pub fn field(&self, label: &str) -> Result<Expr> {
        let found = match &self.projection {
            Projection::Items(items) => items
                .iter()
                .find(|item| item.label == label)
                .map(|item| item.expr.clone()),
            Projection::All => self.all_items().into_iter().find(|i| i.label == label).map(|i| i.expr),
        };
        found.ok_or_else(|| build_err(format!("no projected field is labelled '{label}'")))
    }

    fn all_items(&self) -> Vec<SelectItem> {
        let mut items: Vec<SelectItem> = self
            .from
            .iter()
            .flat_map(|t| t.columns())
            .map(SelectItem::from)
            .collect();
        for (_, table, _) in &self.joins {
            items.extend(table.columns().iter().map(|c| {
                c.expr().alias(format!("{}.{}", table.qualifier(), c.name()))
            }));
        }
        items
    }

    /// Validates the statement shape and produces its plan
    pub fn to_plan(&self) -> Result<SelectPlan> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let from = self
            .from
            .as_ref()
            .ok_or_else(|| build_err("select has no from table"))?;

        let mut scope = Scope::default();
        scope.add(from)?;
        let mut joins = Vec::with_capacity(self.joins.len());
        for (kind, table, on) in &self.joins {
            scope.add(table)?;
            if contains_aggregate(on) {
                return Err(build_err("join conditions cannot contain aggregates"));
            }
            scope.check_condition(on)?;
            joins.push(Join {
                kind: *kind,
                source: source(table),
                on: on.clone(),
            });
        }

        let projection = match &self.projection {
            Projection::All => self.all_items(),
            Projection::Items(items) => items.clone(),
        };
        if projection.is_empty() {
            return Err(build_err("select projects no fields"));
        }
        check_labels(&projection)?;
        for item in &projection {
            scope.check_expr(&item.expr)?;
        }

        if let Some(filter) = &self.filter {
            if contains_aggregate(filter) {
                return Err(build_err("aggregates belong in having, not where"));
            }
            scope.check_condition(filter)?;
        }

        let has_aggregate = projection.iter().any(|i| i.expr.is_aggregate())
            || self.having.as_ref().is_some_and(contains_aggregate);
        let mut group_by = self.group_by.clone();
        for expr in &group_by {
            if expr.is_aggregate() {
                return Err(build_err("cannot group by an aggregate"));
            }
            scope.check_expr(expr)?;
        }
        if group_by.is_empty() && has_aggregate {
            group_by = projection
                .iter()
                .filter(|i| matches!(i.expr, Expr::Column(_)))
                .map(|i| i.expr.clone())
                .collect();
        }
        let grouped = has_aggregate || !group_by.is_empty() || self.having.is_some();
        if grouped {
            let is_key = |e: &Expr| !matches!(e, Expr::Column(_)) || group_by.contains(e);
            for item in &projection {
                if !item.expr.is_aggregate() && !is_key(&item.expr) {
                    return Err(build_err(format!(
                        "field '{}' must be aggregated or listed in group by",
                        item.label
                    )));
                }
            }
            if let Some(having) = &self.having {
                scope.check_condition(having)?;
                if let Some(e) = having.exprs().into_iter().find(|e| !is_key(e)) {
                    return Err(build_err(format!(
                        "having may only use aggregates and grouping keys; '{}' is neither",
                        e.default_label()
                    )));
                }
            }
            for order in &self.order_by {
                if !order.expr.is_aggregate() && !is_key(&order.expr) {
                    return Err(build_err(format!(
                        "cannot order a grouped select by '{}'",
                        order.expr.default_label()
                    )));
                }
            }
        }
        for order in &self.order_by {
            scope.check_expr(&order.expr)?;
        }

        Ok(SelectPlan {
            distinct: self.distinct,
            projection,
            from: source(from),
            joins,
            filter: self.filter.clone(),
            group_by,
            having: self.having.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
        })
    }

    pub fn build(&self) -> Result<StatementPlan> {
        self.to_plan().map(StatementPlan::Select)
    }
}

impl IntoPlan for SelectBuilder {
    fn into_plan(&self) -> Result<StatementPlan> {
        self.build()
    }
}

fn source(table: &Table) -> Source {
    Source::Table {
        name: table.name().to_string(),
        alias: table.qualifier().to_string(),
    }
}
