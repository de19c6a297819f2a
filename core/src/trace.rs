//! Tracing utilities for query and schema observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site. The calling crate needs its own `tracing` feature and
//! dependency, as the driver crates have.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// weave_trace_query!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! weave_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "sqlweave.query");
    };
}

/// Emit a schema lifecycle event.
///
/// ```ignore
/// weave_trace_schema!(built, tables.len(), enums.len());
/// weave_trace_schema!(resolved, relation_count);
/// weave_trace_schema!(failed, &err);
/// ```
#[macro_export]
macro_rules! weave_trace_schema {
    (built, $tables:expr, $enums:expr) => {
        #[cfg(feature = "tracing")]
        tracing::info!(tables = $tables, enums = $enums, "sqlweave.schema.built");
    };
    (resolved, $relations:expr) => {
        #[cfg(feature = "tracing")]
        tracing::info!(relations = $relations, "sqlweave.relations.resolved");
    };
    (failed, $err:expr) => {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %$err, "sqlweave.relations.failed");
    };
}
