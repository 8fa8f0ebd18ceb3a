use serde::{Deserialize, Serialize};

/// Messages a user may send per local calendar day.
pub const MAX_DAILY_MESSAGES: u32 = 25;

/// Per-day message counter.
///
/// `date` is the local calendar day the count belongs to. A record whose
/// date is not today is stale and must be reset before it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub count: u32,
    pub date: jiff::civil::Date,
}

impl UsageRecord {
    pub fn fresh(today: jiff::civil::Date) -> Self {
        Self {
            count: 0,
            date: today,
        }
    }

    pub fn is_current(&self, today: jiff::civil::Date) -> bool {
        self.date == today
    }

    pub fn remaining(&self, limit: u32) -> u32 {
        limit.saturating_sub(self.count)
    }
}
