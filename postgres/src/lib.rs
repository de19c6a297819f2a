//! PostgreSQL support for sqlweave.
//!
//! DDL generation and SQLSTATE classification are always available. The
//! `tokio-postgres` feature adds [`PostgresExecutor`], which binds plan
//! parameters, decodes rows and reports store failures as
//! [`SqlweaveError`](sqlweave_core::SqlweaveError) kinds.
//!
//! ```no_run
//! # #[cfg(feature = "tokio-postgres")]
//! # async fn run() -> sqlweave_core::Result<()> {
//! use sqlweave_core::Executor;
//! use sqlweave_core::prelude::*;
//!
//! let schema = Schema::builder()
//!     .table(TableDef::new("user").column(ColumnDef::integer("id").primary_key()))?
//!     .build();
//!
//! let executor = sqlweave_postgres::connect("postgres://postgres@localhost/app").await?;
//! executor.create(&schema).await?;
//! # Ok(())
//! # }
//! ```

mod ddl;
mod error;

#[cfg(feature = "tokio-postgres")]
mod executor;
#[cfg(feature = "tokio-postgres")]
mod values;

pub use ddl::{create_enum_sql, create_statements, create_table_sql, literal};
pub use error::classify_sqlstate;

#[cfg(feature = "tokio-postgres")]
pub use executor::{PostgresExecutor, connect};
#[cfg(feature = "tokio-postgres")]
pub use values::PgValue;
