//! Generated default values.
//!
//! Random identifiers and timestamps are the only effectful part of statement
//! compilation, so they come from a [`ValueProvider`] that tests can swap for
//! the deterministic [`SeededValues`].

use chrono::{DateTime, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Source of generated column defaults.
pub trait ValueProvider: Send + Sync + core::fmt::Debug {
    /// A fresh identifier for `default_random` columns
    fn random_id(&self) -> Uuid;

    /// The current instant for `default_now` columns
    fn now(&self) -> NaiveDateTime;
}

/// Random v4 identifiers and the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemValues;

impl ValueProvider for SystemValues {
    fn random_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// 2024-01-01T00:00:00
const DEFAULT_START: i64 = 1_704_067_200;

/// Deterministic values: identifiers from a seeded [`StdRng`], and a clock that
/// starts at a fixed instant and advances one second per call.
#[derive(Debug)]
pub struct SeededValues {
    rng: Mutex<StdRng>,
    start: i64,
    ticks: AtomicI64,
}

impl SeededValues {
    pub fn new(seed: u64) -> Self {
        Self::with_start(seed, DEFAULT_START)
    }

    /// `start` is a unix timestamp in seconds
    pub fn with_start(seed: u64, start: i64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            start,
            ticks: AtomicI64::new(0),
        }
    }
}

impl ValueProvider for SeededValues {
    fn random_id(&self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    fn now(&self) -> NaiveDateTime {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        DateTime::<Utc>::from_timestamp(self.start.saturating_add(tick), 0)
            .unwrap_or_default()
            .naive_utc()
    }
}
