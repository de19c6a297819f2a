//! Nested, relation-aware reads.
//!
//! A [`FindOptions`] request names the columns to return and the declared
//! relations to traverse. [`compile`] turns it into one flat select with a
//! left join per traversed relation, plus a [`Reshaper`] that folds the flat
//! rows back into [`QueryRow`](crate::value::QueryRow) trees.

mod compiler;
mod reshape;

pub use compiler::{CompiledQuery, compile};
pub use reshape::Reshaper;

use crate::expr::{Condition, OrderBy};
use indexmap::IndexMap;

/// Columns and relations to return for one table in a nested read.
///
/// Columns default to all. Listing columns with `true` returns only those;
/// listing only `false` entries returns everything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub(crate) columns: Vec<(String, bool)>,
    pub(crate) with: IndexMap<String, Shape>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        self.columns
            .extend(columns.into_iter().map(|(name, include)| (name.into(), include)));
        self
    }

    /// Traverses `relation`, returning the related rows shaped by `shape`
    pub fn with(mut self, relation: impl Into<String>, shape: Shape) -> Self {
        self.with.insert(relation.into(), shape);
        self
    }
}

/// A `find_many` / `find_first` request.
///
/// ```
/// use sqlweave_core::query::{FindOptions, Shape};
///
/// let options = FindOptions::new()
///     .columns([("name", true), ("id", true)])
///     .with("preferences", Shape::new())
///     .limit(10);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) shape: Shape,
    pub(crate) filter: Option<Condition>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<usize>,
    pub(crate) offset: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        self.shape = self.shape.columns(columns);
        self
    }

    pub fn with(mut self, relation: impl Into<String>, shape: Shape) -> Self {
        self.shape = self.shape.with(relation, shape);
        self
    }

    /// Filters root rows
    pub fn r#where(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    /// Orders root rows
    pub fn order_by(mut self, order: impl IntoIterator<Item = OrderBy>) -> Self {
        self.order_by.extend(order);
        self
    }

    /// Limits the number of root rows; related rows are never truncated
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}
