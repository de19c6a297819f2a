//! The schema model: tables, columns, constraints and enums.
//!
//! A [`Schema`] is an immutable, `Arc`-shared arena of resolved tables
//! addressed by [`TableId`]. [`Table`] and [`Column`] are cheap handles into it.

mod builder;
mod column;
mod table;

pub use builder::SchemaBuilder;
pub use column::{ColumnDef, ColumnDefault, ForeignKeyDef};
pub use table::{TableDef, UniqueIndexDef};

use crate::error::{Result, SqlweaveError};
use crate::expr::Expr;
use crate::relation::{self, RelationDecl, RelationGraph};
use indexmap::IndexMap;
use sqlweave_types::{EnumDef, SQLType};
use std::sync::{Arc, OnceLock};

/// Stable identifier of a table inside one [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub(crate) usize);

impl TableId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Resolved foreign key: `column` of the owning table references
/// `target_column` of `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: usize,
    pub target: TableId,
    pub target_column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    /// `None` for a column-level `unique()`
    pub name: Option<String>,
    pub columns: Vec<usize>,
}

/// A registered table with every name resolved to an index.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub id: TableId,
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<usize>,
    pub uniques: Vec<UniqueConstraint>,
    pub foreign_keys: Vec<ForeignKey>,
    pub relations: Vec<RelationDecl>,
}

impl TableInfo {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, index: usize) -> &ColumnDef {
        &self.columns[index]
    }

    /// True when the column alone is the primary key or carries a unique constraint
    pub fn is_unique_column(&self, index: usize) -> bool {
        self.primary_key == [index] || self.uniques.iter().any(|u| u.columns == [index])
    }

    /// Primary key first, then unique constraints in declaration order
    pub fn unique_keys(&self) -> impl Iterator<Item = &[usize]> {
        let pk = (!self.primary_key.is_empty()).then_some(self.primary_key.as_slice());
        pk.into_iter()
            .chain(self.uniques.iter().map(|u| u.columns.as_slice()))
    }

    /// Whether `columns` (in any order) is exactly the primary key or a unique constraint
    pub fn has_unique_key(&self, columns: &[usize]) -> bool {
        let mut wanted = columns.to_vec();
        wanted.sort_unstable();
        self.unique_keys().any(|key| {
            let mut key = key.to_vec();
            key.sort_unstable();
            key == wanted
        })
    }

    /// Columns identifying a row: the primary key, or every column when there is none
    pub fn identity_columns(&self) -> Vec<usize> {
        if self.primary_key.is_empty() {
            (0..self.columns.len()).collect()
        } else {
            self.primary_key.clone()
        }
    }

    pub fn foreign_key(&self, column: usize) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}

pub(crate) struct SchemaInner {
    tables: Vec<TableInfo>,
    by_name: IndexMap<String, TableId>,
    enums: IndexMap<String, EnumDef>,
    relations: OnceLock<Result<RelationGraph>>,
}

/// Immutable schema registry, shared by every query compiled against it.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub(crate) fn from_parts(
        tables: Vec<TableInfo>,
        by_name: IndexMap<String, TableId>,
        enums: IndexMap<String, EnumDef>,
    ) -> Self {
        Self {
            inner: Arc::new(SchemaInner {
                tables,
                by_name,
                enums,
                relations: OnceLock::new(),
            }),
        }
    }

    /// Handle for the table named `name`
    pub fn table(&self, name: &str) -> Result<Table> {
        let id = self
            .table_id(name)
            .ok_or_else(|| SqlweaveError::Build(format!("unknown table '{name}'")))?;
        Ok(self.table_by_id(id))
    }

    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.inner.by_name.get(name).copied()
    }

    pub fn table_by_id(&self, id: TableId) -> Table {
        Table {
            schema: self.clone(),
            id,
            alias: None,
        }
    }

    /// Tables in registration order
    pub fn tables(&self) -> impl Iterator<Item = &TableInfo> {
        self.inner.tables.iter()
    }

    pub fn info(&self, id: TableId) -> &TableInfo {
        &self.inner.tables[id.0]
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
        self.inner.enums.values()
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.inner.enums.get(name)
    }

    /// The relation graph, resolved on first access and cached with its outcome.
    pub fn relations(&self) -> Result<&RelationGraph> {
        self.inner
            .relations
            .get_or_init(|| {
                let graph = relation::resolve(&self.inner.tables, &self.inner.by_name);
                match &graph {
                    Ok(graph) => {
                        crate::weave_trace_schema!(resolved, graph.len());
                    }
                    Err(err) => {
                        crate::weave_trace_schema!(failed, err);
                    }
                }
                graph
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Whether both handles point at the same registry
    pub fn same_as(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl core::fmt::Debug for Schema {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Schema")
            .field("tables", &self.inner.by_name.keys().collect::<Vec<_>>())
            .field("enums", &self.inner.enums.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Handles
// =============================================================================

/// A table reference, optionally aliased for self-joins.
#[derive(Clone)]
pub struct Table {
    schema: Schema,
    id: TableId,
    alias: Option<Arc<str>>,
}

impl Table {
    #[inline]
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn info(&self) -> &TableInfo {
        self.schema.info(self.id)
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    /// The name this table is referenced by inside a statement
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.name())
    }

    pub fn is_aliased(&self) -> bool {
        self.alias.is_some()
    }

    /// The same table under another name, for joining a table to itself
    pub fn alias(&self, alias: impl AsRef<str>) -> Table {
        Table {
            schema: self.schema.clone(),
            id: self.id,
            alias: Some(Arc::from(alias.as_ref())),
        }
    }

    pub fn col(&self, name: &str) -> Result<Column> {
        let index = self.info().column_index(name).ok_or_else(|| {
            SqlweaveError::Build(format!("unknown column '{name}' on table '{}'", self.name()))
        })?;
        Ok(Column {
            table: self.clone(),
            index,
        })
    }

    pub fn columns(&self) -> Vec<Column> {
        (0..self.info().columns.len())
            .map(|index| Column {
                table: self.clone(),
                index,
            })
            .collect()
    }

    pub fn primary_key(&self) -> Vec<Column> {
        self.info()
            .primary_key
            .iter()
            .map(|&index| Column {
                table: self.clone(),
                index,
            })
            .collect()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.schema.same_as(&other.schema) && self.id == other.id && self.alias == other.alias
    }
}

impl core::fmt::Debug for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "Table({} AS {alias})", self.name()),
            None => write!(f, "Table({})", self.name()),
        }
    }
}

/// A column of a (possibly aliased) table.
#[derive(Clone, PartialEq)]
pub struct Column {
    table: Table,
    index: usize,
}

impl Column {
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn def(&self) -> &ColumnDef {
        self.table.info().column(self.index)
    }

    pub fn name(&self) -> &str {
        &self.def().name
    }

    pub fn sql_type(&self) -> &SQLType {
        &self.def().sql_type
    }

    pub fn qualifier(&self) -> &str {
        self.table.qualifier()
    }

    pub fn expr(&self) -> Expr {
        Expr::from(self)
    }
}

impl core::fmt::Debug for Column {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Column({}.{})", self.qualifier(), self.name())
    }
}
