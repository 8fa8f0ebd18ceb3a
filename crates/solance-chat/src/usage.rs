//! Daily message quota.
//!
//! The persisted [`UsageRecord`] is reset lazily: any read that finds a
//! record dated before today replaces it with `{0, today}` and writes that
//! back before returning. There is no scheduled reset job.
//!
//! Read-modify-write is not atomic across processes sharing the same store;
//! the last writer wins.

use std::sync::Arc;

use serde::Serialize;
use solance_core::models::usage::UsageRecord;
use solance_core::store_keys;
use solance_storage::LocalStore;
use solance_storage::state::{load_state, save_state};
use tracing::{info, warn};

use crate::clock::Clock;

/// Point-in-time view of the quota for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub date: jiff::civil::Date,
    pub resets_in: jiff::SignedDuration,
}

pub struct UsageGovernor {
    store: Arc<LocalStore>,
    clock: Arc<dyn Clock>,
    limit: u32,
}

impl UsageGovernor {
    pub fn new(store: Arc<LocalStore>, clock: Arc<dyn Clock>, limit: u32) -> Self {
        Self {
            store,
            clock,
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Today's record, resetting and persisting it first if it is stale,
    /// missing or malformed.
    pub fn read(&self) -> UsageRecord {
        let today = self.clock.now().date();
        match load_state::<UsageRecord>(&self.store, store_keys::USAGE) {
            Some(record) if record.is_current(today) => record,
            stale => {
                if let Some(old) = stale {
                    info!(previous_date = %old.date, previous_count = old.count, %today, "new day, resetting usage");
                }
                let fresh = UsageRecord::fresh(today);
                save_state(&self.store, store_keys::USAGE, &fresh);
                fresh
            }
        }
    }

    /// Count one message against today's quota.
    pub fn increment(&self) -> UsageRecord {
        let mut record = self.read();
        record.count = record.count.saturating_add(1);
        save_state(&self.store, store_keys::USAGE, &record);
        record
    }

    pub fn is_limit_reached(&self) -> bool {
        self.read().count >= self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.read().remaining(self.limit)
    }

    /// Time until the count next resets (local midnight).
    pub fn resets_in(&self) -> jiff::SignedDuration {
        let now = self.clock.now();
        let midnight = now
            .date()
            .tomorrow()
            .and_then(|d| d.to_zoned(now.time_zone().clone()));
        match midnight {
            Ok(next) => now.duration_until(&next),
            Err(e) => {
                warn!(error = %e, "cannot compute next local midnight");
                jiff::SignedDuration::ZERO
            }
        }
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let record = self.read();
        UsageSnapshot {
            count: record.count,
            limit: self.limit,
            remaining: record.remaining(self.limit),
            date: record.date,
            resets_in: self.resets_in(),
        }
    }
}
