use super::column::ColumnDef;
use crate::relation::RelationDecl;

/// Named unique index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIndexDef {
    pub name: String,
    pub columns: Vec<String>,
}

/// Table declaration, registered through [`SchemaBuilder::table`](super::SchemaBuilder::table).
///
/// ```
/// use sqlweave_core::schema::{ColumnDef, TableDef};
///
/// let post_category = TableDef::new("postCategory")
///     .column(ColumnDef::uuid("postId").not_null().references("post", "id"))
///     .column(ColumnDef::uuid("categoryId").not_null().references("category", "id"))
///     .primary_key(["postId", "categoryId"]);
/// assert_eq!(post_category.columns.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<Vec<String>>,
    pub unique_indexes: Vec<UniqueIndexDef>,
    pub relations: Vec<RelationDecl>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Table-level (usually composite) primary key
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn unique_index<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_indexes.push(UniqueIndexDef {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Explicit relation, required only to name or disambiguate foreign keys
    pub fn relation(mut self, relation: RelationDecl) -> Self {
        self.relations.push(relation);
        self
    }
}
