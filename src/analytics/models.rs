//! Data models for visitor analytics

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Visit count for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVisitors {
    /// Calendar day, serialized in ISO `YYYY-MM-DD` form.
    pub date: NaiveDate,

    /// Unique visits counted on that day.
    pub visitors: u64,
}
