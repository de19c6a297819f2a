//! Schema model, relation graph, statement builders and the nested query
//! compiler. Nothing in this crate performs I/O; statements leave it as
//! [`StatementPlan`]s for an [`Executor`].

pub mod builder;
pub mod error;
pub mod executor;
pub mod expr;
pub mod plan;
pub mod provider;
pub mod query;
pub mod relation;
pub mod schema;
pub mod sql;
mod trace;
pub mod value;

pub use builder::{DeleteBuilder, InsertBuilder, IntoPlan, SelectBuilder, UpdateBuilder};
pub use error::{ErrorKind, Result, SqlweaveError};
pub use executor::{Executor, QueryResult};
pub use plan::{StatementKind, StatementPlan};
pub use provider::{SeededValues, SystemValues, ValueProvider};
pub use schema::{Column, Schema, SchemaBuilder, Table, TableId};
pub use sql::{SQL, SQLChunk, ToSQL, Token};
pub use value::{Nested, QueryRow, Record, Row, Value};

pub use sqlweave_types::{Dialect, EnumDef, SQLType};

pub mod prelude {
    pub use crate::builder::{DeleteBuilder, InsertBuilder, IntoPlan, SelectBuilder, UpdateBuilder};
    pub use crate::error::{Result, SqlweaveError};
    pub use crate::executor::{Executor, QueryResult};
    pub use crate::expr::*;
    pub use crate::query::{FindOptions, Shape};
    pub use crate::relation::{Cardinality, RelationDecl};
    pub use crate::schema::{Column, ColumnDef, Schema, Table, TableDef};
    pub use crate::value::{Nested, QueryRow, Record, Row, Value};
    pub use sqlweave_types::{Dialect, EnumDef, SQLType};
}
