//! In-process executor for sqlweave statement plans.
//!
//! [`MemoryStore`] interprets plans directly: nested-loop joins, three-valued
//! predicates, grouping and ordering with NULLs last. Writes enforce the
//! schema's NOT NULL, primary-key, unique, foreign-key, enum and check
//! constraints and report violations the way a SQL store would.

mod eval;
mod select;
mod store;
mod truth;
mod write;

pub use store::MemoryStore;
