//! Session and marker records persisted by the tracker

use rand::distr::Alphanumeric;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-tab session record kept in the tab-scoped store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    /// Last activity, milliseconds since epoch.
    pub last_activity_ms: i64,
    /// Whether the visit that opened this session counted as new.
    pub is_new_visitor: bool,
    /// Present under fingerprint dedup; absent under the simple strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl SessionRecord {
    pub fn new(now_ms: i64, is_new_visitor: bool, fingerprint: Option<String>) -> Self {
        Self {
            session_id: generate_session_id(now_ms),
            last_activity_ms: now_ms,
            is_new_visitor,
            fingerprint,
        }
    }

    /// Whether this session saw activity within `timeout_ms` of `now_ms`.
    pub fn is_active(&self, now_ms: i64, timeout_ms: i64) -> bool {
        now_ms - self.last_activity_ms < timeout_ms
    }
}

/// Opaque session identifier: `session_<epoch-ms>_<9 alphanumerics>`.
pub fn generate_session_id(now_ms: i64) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();

    format!("session_{}_{}", now_ms, suffix.to_lowercase())
}

/// Durable fingerprint to last-seen-timestamp map.
///
/// `BTreeMap` keeps the serialized form stable across rewrites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentVisitors(pub BTreeMap<String, i64>);

impl RecentVisitors {
    pub fn last_seen(&self, fingerprint: &str) -> Option<i64> {
        self.0.get(fingerprint).copied()
    }

    pub fn mark(&mut self, fingerprint: &str, now_ms: i64) {
        self.0.insert(fingerprint.to_string(), now_ms);
    }

    /// Drop entries last seen before `cutoff_ms`, returning how many were
    /// removed.
    pub fn prune(&mut self, cutoff_ms: i64) -> usize {
        let before = self.0.len();
        self.0.retain(|_, last_seen_ms| *last_seen_ms >= cutoff_ms);
        before - self.0.len()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
