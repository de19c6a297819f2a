//! # sqlweave
//!
//! A runtime relational schema, relation graph and query compiler for SQL
//! stores.
//!
//! ## Quick Start
//!
//! ```rust
//! use sqlweave::prelude::*;
//! use sqlweave::memory::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> sqlweave::Result<()> {
//! let schema = Schema::builder()
//!     .table(
//!         TableDef::new("user")
//!             .column(ColumnDef::integer("id").primary_key())
//!             .column(ColumnDef::varchar("name", 255).not_null()),
//!     )?
//!     .table(
//!         TableDef::new("post")
//!             .column(ColumnDef::integer("id").primary_key())
//!             .column(ColumnDef::integer("authorId").not_null().references("user", "id")),
//!     )?
//!     .build();
//!
//! let db = Database::new(MemoryStore::new(), schema);
//! db.create().await?;
//!
//! let user = db.table("user")?;
//! db.execute(&db.insert(&user).values([Record::new().set("id", 1).set("name", "Kyle")]))
//!     .await?;
//!
//! let users = db
//!     .query(&user)
//!     .find_many(&FindOptions::new().with("posts", Shape::new()))
//!     .await?;
//! assert_eq!(users[0].get("name"), Some(&Value::from("Kyle")));
//! assert!(users[0].many("posts").is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Executors
//!
//! | Store      | Crate               | Feature Flag     |
//! |------------|---------------------|------------------|
//! | In-memory  | `sqlweave-memory`   | always           |
//! | PostgreSQL | `sqlweave-postgres` | `tokio-postgres` |

mod config;
mod database;

pub use config::Config;
pub use database::{Database, RelationalQuery};

// =============================================================================
// Root-level exports
// =============================================================================

/// Result type for sqlweave operations
pub use sqlweave_core::Result;

/// Database dialect enum
pub use sqlweave_types::Dialect;

/// Error types
pub mod error {
    pub use sqlweave_core::error::{ErrorKind, SqlweaveError};
}

/// Shared column types and enum definitions
pub use sqlweave_types as types;

/// Schema model, builders, plans and the nested query compiler.
///
/// ```rust,ignore
/// use sqlweave::core::expr::{eq, gt, and, count};
/// use sqlweave::core::query::compile;
/// ```
pub use sqlweave_core as core;

/// In-process executor
pub use sqlweave_memory as memory;

/// PostgreSQL executor over tokio-postgres
#[cfg(feature = "tokio-postgres")]
pub use sqlweave_postgres as postgres;

pub mod prelude {
    pub use crate::{Config, Database, RelationalQuery};
    pub use sqlweave_core::prelude::*;
}
