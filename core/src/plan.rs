//! Statement plans: the executor-agnostic form of one SQL operation.
//!
//! Plans are self-describing. Every table and column is named and every
//! column reference carries its qualifier, so an executor can run or render a
//! plan without consulting the schema.

use crate::expr::{Condition, Expr, OrderBy, SelectItem};
use crate::sql::{SQL, ToSQL, Token};
use crate::value::Value;
use sqlweave_types::Dialect;
use std::borrow::Cow;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementPlan {
    Select(SelectPlan),
    Insert(InsertPlan),
    Update(UpdatePlan),
    Delete(DeletePlan),
}

impl StatementPlan {
    pub fn kind(&self) -> StatementKind {
        match self {
            StatementPlan::Select(_) => StatementKind::Select,
            StatementPlan::Insert(_) => StatementKind::Insert,
            StatementPlan::Update(_) => StatementKind::Update,
            StatementPlan::Delete(_) => StatementKind::Delete,
        }
    }

    /// Projected items of a select, or the RETURNING list of a write
    pub fn output(&self) -> &[SelectItem] {
        match self {
            StatementPlan::Select(plan) => &plan.projection,
            StatementPlan::Insert(plan) => &plan.returning,
            StatementPlan::Update(plan) => &plan.returning,
            StatementPlan::Delete(plan) => &plan.returning,
        }
    }

    /// Result column labels, shared by every returned row
    pub fn labels(&self) -> Arc<[String]> {
        self.output().iter().map(|item| item.label.clone()).collect()
    }

    /// Whether executing this plan yields rows
    pub fn returns_rows(&self) -> bool {
        matches!(self, StatementPlan::Select(_)) || !self.output().is_empty()
    }

    /// Renders SQL text and parameters for `dialect`
    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        self.to_sql().build(dialect)
    }
}

// =============================================================================
// Select
// =============================================================================

/// Table or derived table in a FROM / JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table { name: String, alias: String },
    Subquery { plan: Box<SelectPlan>, alias: String },
}

impl Source {
    pub fn table(name: impl Into<String>) -> Self {
        let name = name.into();
        Source::Table {
            alias: name.clone(),
            name,
        }
    }

    /// The name columns of this source are qualified by
    pub fn alias(&self) -> &str {
        match self {
            Source::Table { alias, .. } | Source::Subquery { alias, .. } => alias,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinType,
    pub source: Source,
    pub on: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    pub distinct: bool,
    pub projection: Vec<SelectItem>,
    pub from: Source,
    pub joins: Vec<Join>,
    pub filter: Option<Condition>,
    pub group_by: Vec<Expr>,
    pub having: Option<Condition>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SelectPlan {
    pub fn new(from: Source) -> Self {
        Self {
            distinct: false,
            projection: Vec::new(),
            from,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Whether rows are aggregated into groups
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
            || self.projection.iter().any(|item| item.expr.is_aggregate())
            || self.having.is_some()
    }
}

// =============================================================================
// Writes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Conflict {
    /// `target` empty: any unique or primary-key conflict
    DoNothing { target: Vec<String> },
    DoUpdate {
        target: Vec<String>,
        set: Vec<Assignment>,
    },
}

/// Complete rows: every column of the table, in declaration order, defaults filled.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub on_conflict: Option<Conflict>,
    pub returning: Vec<SelectItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub table: String,
    pub set: Vec<Assignment>,
    pub filter: Option<Condition>,
    pub returning: Vec<SelectItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan {
    pub table: String,
    pub filter: Option<Condition>,
    pub returning: Vec<SelectItem>,
}

// =============================================================================
// Rendering
// =============================================================================

fn list<'a, T: ToSQL + 'a>(items: impl IntoIterator<Item = &'a T>) -> SQL<'a> {
    SQL::join(items.into_iter().map(ToSQL::to_sql), Token::COMMA)
}

fn returning(items: &[SelectItem]) -> SQL<'_> {
    if items.is_empty() {
        SQL::empty()
    } else {
        SQL::token(Token::RETURNING).append(list(items))
    }
}

fn filter(condition: Option<&Condition>) -> SQL<'_> {
    match condition {
        Some(condition) => SQL::token(Token::WHERE).append(condition.to_sql()),
        None => SQL::empty(),
    }
}

fn assignments(set: &[Assignment]) -> SQL<'_> {
    SQL::join(
        set.iter().map(|a| {
            SQL::ident(a.column.as_str())
                .push(Token::EQ)
                .append(a.value.to_sql())
        }),
        Token::COMMA,
    )
}

fn idents(names: &[String]) -> SQL<'_> {
    SQL::join(names.iter().map(|n| SQL::ident(n.as_str())), Token::COMMA)
}

impl ToSQL for Source {
    fn to_sql(&self) -> SQL<'_> {
        match self {
            Source::Table { name, alias } if name == alias => SQL::ident(name.as_str()),
            Source::Table { name, alias } => SQL::ident(name.as_str()).alias(alias.as_str()),
            Source::Subquery { plan, alias } => plan.to_sql().parens().alias(alias.as_str()),
        }
    }
}

impl ToSQL for Join {
    fn to_sql(&self) -> SQL<'_> {
        let kind = match self.kind {
            JoinType::Inner => Token::INNER,
            JoinType::Left => Token::LEFT,
        };
        SQL::token(kind)
            .push(Token::JOIN)
            .append(self.source.to_sql())
            .push(Token::ON)
            .append(self.on.to_sql())
    }
}

impl ToSQL for SelectPlan {
    fn to_sql(&self) -> SQL<'_> {
        let mut sql = SQL::token(Token::SELECT);
        if self.distinct {
            sql.push_mut(Token::DISTINCT);
        }
        sql.append_mut(list(&self.projection));
        sql.push_mut(Token::FROM);
        sql.append_mut(self.from.to_sql());
        for join in &self.joins {
            sql.append_mut(join.to_sql());
        }
        sql.append_mut(filter(self.filter.as_ref()));
        if !self.group_by.is_empty() {
            sql.push_mut(Token::GROUP);
            sql.push_mut(Token::BY);
            sql.append_mut(list(&self.group_by));
        }
        if let Some(having) = &self.having {
            sql.push_mut(Token::HAVING);
            sql.append_mut(having.to_sql());
        }
        if !self.order_by.is_empty() {
            sql.push_mut(Token::ORDER);
            sql.push_mut(Token::BY);
            sql.append_mut(list(&self.order_by));
        }
        if let Some(limit) = self.limit {
            sql.push_mut(Token::LIMIT);
            sql.append_mut(SQL::number(limit));
        }
        if let Some(offset) = self.offset {
            sql.push_mut(Token::OFFSET);
            sql.append_mut(SQL::number(offset));
        }
        sql
    }
}

impl ToSQL for InsertPlan {
    fn to_sql(&self) -> SQL<'_> {
        let rows = self.rows.iter().map(|row| {
            SQL::join(row.iter().map(|v| SQL::param(Cow::Borrowed(v))), Token::COMMA).parens()
        });

        let mut sql = SQL::token(Token::INSERT)
            .push(Token::INTO)
            .append(SQL::ident(self.table.as_str()))
            .append(idents(&self.columns).parens())
            .push(Token::VALUES)
            .append(SQL::join(rows, Token::COMMA));

        match &self.on_conflict {
            None => {}
            Some(Conflict::DoNothing { target }) => {
                sql.push_mut(Token::ON);
                sql.push_mut(Token::CONFLICT);
                if !target.is_empty() {
                    sql.append_mut(idents(target).parens());
                }
                sql.push_mut(Token::DO);
                sql.push_mut(Token::NOTHING);
            }
            Some(Conflict::DoUpdate { target, set }) => {
                sql.push_mut(Token::ON);
                sql.push_mut(Token::CONFLICT);
                sql.append_mut(idents(target).parens());
                sql.push_mut(Token::DO);
                sql.push_mut(Token::UPDATE);
                sql.push_mut(Token::SET);
                sql.append_mut(assignments(set));
            }
        }

        sql.append(returning(&self.returning))
    }
}

impl ToSQL for UpdatePlan {
    fn to_sql(&self) -> SQL<'_> {
        SQL::token(Token::UPDATE)
            .append(SQL::ident(self.table.as_str()))
            .push(Token::SET)
            .append(assignments(&self.set))
            .append(filter(self.filter.as_ref()))
            .append(returning(&self.returning))
    }
}

impl ToSQL for DeletePlan {
    fn to_sql(&self) -> SQL<'_> {
        SQL::token(Token::DELETE)
            .push(Token::FROM)
            .append(SQL::ident(self.table.as_str()))
            .append(filter(self.filter.as_ref()))
            .append(returning(&self.returning))
    }
}

impl ToSQL for StatementPlan {
    fn to_sql(&self) -> SQL<'_> {
        match self {
            StatementPlan::Select(plan) => plan.to_sql(),
            StatementPlan::Insert(plan) => plan.to_sql(),
            StatementPlan::Update(plan) => plan.to_sql(),
            StatementPlan::Delete(plan) => plan.to_sql(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ColumnRef, count_all};
    use sqlweave_types::SQLType;

    fn name(qualifier: &str) -> Expr {
        Expr::Column(ColumnRef::new(qualifier, "user", "name", SQLType::Text))
    }

    #[test]
    fn renders_derived_table_and_distinct() {
        let mut inner = SelectPlan::new(Source::table("user"));
        inner.projection = vec![SelectItem::from(name("user"))];
        inner.limit = Some(3);
        inner.offset = Some(1);

        let mut outer = SelectPlan::new(Source::Subquery {
            plan: Box::new(inner),
            alias: "u".into(),
        });
        outer.distinct = true;
        outer.projection = vec![SelectItem::from(name("u"))];

        let (sql, params) = StatementPlan::Select(outer).build(Dialect::PostgreSQL);
        assert_eq!(
            sql,
            r#"SELECT DISTINCT "u"."name" AS "name" FROM (SELECT "user"."name" AS "name" FROM "user" LIMIT 3 OFFSET 1) AS "u""#
        );
        assert!(params.is_empty());
    }

    #[test]
    fn insert_placeholders_follow_dialect() {
        let plan = StatementPlan::Insert(InsertPlan {
            table: "user".into(),
            columns: vec!["id".into(), "name".into()],
            rows: vec![vec![1.into(), "a".into()], vec![2.into(), "b".into()]],
            on_conflict: Some(Conflict::DoNothing { target: Vec::new() }),
            returning: Vec::new(),
        });
        let (pg, params) = plan.build(Dialect::PostgreSQL);
        assert_eq!(
            pg,
            r#"INSERT INTO "user" ("id", "name") VALUES ($1, $2), ($3, $4) ON CONFLICT DO NOTHING"#
        );
        assert_eq!(params.len(), 4);
        let (sqlite, _) = plan.build(Dialect::SQLite);
        assert!(sqlite.contains("VALUES (?, ?), (?, ?)"), "{sqlite}");
        assert!(!plan.returns_rows());
    }

    #[test]
    fn labels_come_from_output() {
        let mut select = SelectPlan::new(Source::table("user"));
        select.projection = vec![count_all().alias("total")];
        let plan = StatementPlan::Select(select);
        assert_eq!(&*plan.labels(), ["total".to_string()]);
        assert!(plan.returns_rows());
        assert_eq!(plan.kind(), StatementKind::Select);
    }
}
