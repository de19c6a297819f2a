//! Expressions, conditions and ordering for the expression-style builder.

mod aggregate;
mod condition;

pub use aggregate::*;
pub use condition::*;

use crate::schema::Column;
use crate::sql::{SQL, SQLChunk, ToSQL, Token};
use crate::value::Value;
use chrono::NaiveDateTime;
use sqlweave_types::SQLType;
use std::borrow::Cow;
use uuid::Uuid;

/// A column as it appears inside a statement: qualified by table name or alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Table name or alias the column is referenced through
    pub qualifier: String,
    /// Name of the table that owns the column
    pub table: String,
    pub name: String,
    pub sql_type: SQLType,
}

impl ColumnRef {
    pub fn new(
        qualifier: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        sql_type: SQLType,
    ) -> Self {
        Self {
            qualifier: qualifier.into(),
            table: table.into(),
            name: name.into(),
            sql_type,
        }
    }
}

impl From<&Column> for ColumnRef {
    fn from(column: &Column) -> Self {
        ColumnRef::new(
            column.qualifier(),
            column.table().name(),
            column.name(),
            column.sql_type().clone(),
        )
    }
}

/// A scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    /// Literal, always bound as a parameter
    Value(Value),
    Aggregate {
        func: AggregateFn,
        /// `None` for `count(*)`
        arg: Option<Box<Expr>>,
        distinct: bool,
    },
    /// The row proposed for insertion, inside `ON CONFLICT DO UPDATE`
    Excluded(ColumnRef),
}

impl Expr {
    /// Result type, `None` for a NULL literal
    pub fn sql_type(&self) -> Option<SQLType> {
        match self {
            Expr::Column(col) | Expr::Excluded(col) => Some(col.sql_type.clone()),
            Expr::Value(value) => value.sql_type_hint(),
            Expr::Aggregate { func, arg, .. } => match func {
                AggregateFn::Count => Some(SQLType::Integer),
                AggregateFn::Avg => Some(SQLType::Real),
                AggregateFn::Sum | AggregateFn::Min | AggregateFn::Max => {
                    arg.as_ref().and_then(|a| a.sql_type())
                }
            },
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Expr::Aggregate { .. })
    }

    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(col) => Some(col),
            _ => None,
        }
    }

    /// Label used when the expression is projected without an explicit alias
    pub fn default_label(&self) -> String {
        match self {
            Expr::Column(col) | Expr::Excluded(col) => col.name.clone(),
            Expr::Value(_) => "value".to_string(),
            Expr::Aggregate { func, .. } => func.as_str().to_string(),
        }
    }

    /// Projects this expression under `label`
    pub fn alias(self, label: impl Into<String>) -> SelectItem {
        SelectItem {
            label: label.into(),
            expr: self,
        }
    }

    /// Column references in this expression, excluded ones included
    pub fn columns(&self) -> Vec<&ColumnRef> {
        match self {
            Expr::Column(col) | Expr::Excluded(col) => vec![col],
            Expr::Value(_) => Vec::new(),
            Expr::Aggregate { arg, .. } => arg.as_ref().map(|a| a.columns()).unwrap_or_default(),
        }
    }
}

impl ToSQL for Expr {
    fn to_sql(&self) -> SQL<'_> {
        match self {
            Expr::Column(col) => SQL::column(col.qualifier.as_str(), col.name.as_str()),
            Expr::Value(value) => SQL::param(Cow::Borrowed(value)),
            Expr::Excluded(col) => SQL::column("excluded", col.name.as_str()),
            Expr::Aggregate {
                func,
                arg,
                distinct,
            } => {
                let mut args = if *distinct {
                    SQL::token(Token::DISTINCT)
                } else {
                    SQL::empty()
                };
                match arg {
                    Some(arg) => args.append_mut(arg.to_sql()),
                    None => args.push_mut(Token::STAR),
                }
                let call = SQL::func(func.as_str(), args);
                // avg over integers is NUMERIC in PostgreSQL; keep it a float
                if *func == AggregateFn::Avg {
                    SQL::raw("CAST")
                        .push(Token::LPAREN)
                        .append(call)
                        .push(Token::AS)
                        .push(SQLChunk::raw("DOUBLE PRECISION"))
                        .push(Token::RPAREN)
                } else {
                    call
                }
            }
        }
    }
}

// ==================== From implementations ====================

impl From<&Column> for Expr {
    fn from(column: &Column) -> Self {
        Expr::Column(ColumnRef::from(column))
    }
}

impl From<Column> for Expr {
    fn from(column: Column) -> Self {
        Expr::from(&column)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

macro_rules! impl_from_for_expr {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                #[inline]
                fn from(value: $ty) -> Self {
                    Expr::Value(Value::from(value))
                }
            }
        )*
    };
}

impl_from_for_expr!(&str, String, i64, i32, f64, bool, Uuid, NaiveDateTime);

// =============================================================================
// Projection and ordering
// =============================================================================

/// One projected expression and the label its result column carries.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub label: String,
    pub expr: Expr,
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        SelectItem {
            label: expr.default_label(),
            expr,
        }
    }
}

impl From<&Column> for SelectItem {
    fn from(column: &Column) -> Self {
        SelectItem::from(Expr::from(column))
    }
}

impl From<Column> for SelectItem {
    fn from(column: Column) -> Self {
        SelectItem::from(Expr::from(&column))
    }
}

impl ToSQL for SelectItem {
    fn to_sql(&self) -> SQL<'_> {
        self.expr.to_sql().alias(self.label.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: Direction,
}

/// Creates an ascending ORDER BY item: "column ASC"
pub fn asc(expr: impl Into<Expr>) -> OrderBy {
    OrderBy {
        expr: expr.into(),
        direction: Direction::Asc,
    }
}

/// Creates a descending ORDER BY item: "column DESC"
pub fn desc(expr: impl Into<Expr>) -> OrderBy {
    OrderBy {
        expr: expr.into(),
        direction: Direction::Desc,
    }
}

impl ToSQL for OrderBy {
    fn to_sql(&self) -> SQL<'_> {
        self.expr.to_sql().push(match self.direction {
            Direction::Asc => Token::ASC,
            Direction::Desc => Token::DESC,
        })
    }
}

/// The proposed row's value for `column` inside a conflict update
pub fn excluded(column: &Column) -> Expr {
    Expr::Excluded(ColumnRef::from(column))
}
