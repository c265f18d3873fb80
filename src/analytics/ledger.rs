use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::analytics::models::DailyVisitors;
use crate::storage::codec::decode_json;
use crate::storage::KeyValueStore;

/// Durable key holding the JSON array of per-day counts.
const DAILY_COUNTS_KEY: &str = "visitor.daily_counts";

/// Caller-side dated visitor counter.
///
/// The tracker reports the new-visit decision; this ledger owns the per-day
/// counts derived from it. A corrupt stored ledger restarts empty rather
/// than failing.
pub struct VisitorLedger {
    durable: Arc<dyn KeyValueStore>,
}

impl VisitorLedger {
    pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
        Self { durable }
    }

    /// Count one unique visit on `date`, returning the day's updated total.
    ///
    /// Increments an existing entry for `date` or appends a fresh one.
    pub async fn record_visit(&self, date: NaiveDate) -> Result<u64> {
        let mut counts = self.counts().await?;

        let total = match counts.iter_mut().find(|entry| entry.date == date) {
            Some(entry) => {
                entry.visitors += 1;
                entry.visitors
            }
            None => {
                counts.push(DailyVisitors { date, visitors: 1 });
                1
            }
        };

        let raw = serde_json::to_string(&counts)?;
        self.durable.put(DAILY_COUNTS_KEY, &raw).await?;

        Ok(total)
    }

    /// All per-day counts, in stored (append) order.
    pub async fn counts(&self) -> Result<Vec<DailyVisitors>> {
        let raw = self.durable.get(DAILY_COUNTS_KEY).await?;
        Ok(decode_json(raw.as_deref()).unwrap_or_default())
    }
}
