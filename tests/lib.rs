#![allow(dead_code, clippy::bool_assert_comparison)]

pub mod common;

mod memory;

#[cfg(feature = "tokio-postgres")]
mod postgres;
