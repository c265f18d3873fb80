//! Unique-visit determination
//!
//! One `VisitTracker` belongs to one page lifetime. The first call to
//! [`VisitTracker::track_unique_visit`] evaluates the session and durable
//! state and resolves the new-visit decision; every later call returns
//! `false` without re-evaluating.
//!
//! Storage problems never cross this module's boundary: corrupt records
//! read as absent and failed writes are logged and dropped, so degradation
//! over-counts visitors instead of erroring or under-counting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, warn};

use crate::config::{DedupStrategy, TrackingConfig};
use crate::storage::codec::decode_json;
use crate::storage::KeyValueStore;
use crate::tracker::clock::Clock;
use crate::tracker::fingerprint::EnvironmentInfo;
use crate::tracker::session::{RecentVisitors, SessionRecord};

/// Tab-scoped key holding the current [`SessionRecord`].
pub const SESSION_KEY: &str = "visitor.session";

/// Durable key holding the global last-visit timestamp (simple strategy).
pub const LAST_VISIT_KEY: &str = "visitor.last_visit";

/// Durable key holding the [`RecentVisitors`] map (fingerprint strategy).
pub const RECENT_FINGERPRINTS_KEY: &str = "visitor.recent_fingerprints";

pub struct VisitTracker {
    durable: Arc<dyn KeyValueStore>,
    session_store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    environment: EnvironmentInfo,
    config: TrackingConfig,
    /// Set once the first determination for this page lifetime resolves.
    tracked: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl VisitTracker {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        environment: EnvironmentInfo,
        config: TrackingConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            durable,
            session_store,
            clock,
            environment,
            config,
            tracked: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Whether this page lifetime has already resolved its determination.
    pub fn has_tracked_visit(&self) -> bool {
        self.tracked.load(Ordering::SeqCst)
    }

    /// Decide whether this page load is a new unique visit.
    ///
    /// Returns `true` at most once per tracker lifetime: the first call
    /// resolves the determination, every later call short-circuits to
    /// `false`. A visit counts as new only when no tab session is active
    /// AND the durable marker is absent or outside its window.
    pub async fn track_unique_visit(&self) -> bool {
        if self.tracked.swap(true, Ordering::SeqCst) {
            return false;
        }

        let now_ms = self.clock.now_ms();

        let fingerprint = match self.config.strategy {
            DedupStrategy::Simple => None,
            DedupStrategy::Fingerprint => Some(self.environment.fingerprint()),
        };

        let existing = self.read_session().await;
        let session_active = existing.as_ref().is_some_and(|record| {
            record.is_active(now_ms, self.config.session_timeout_ms)
                && (fingerprint.is_none() || record.fingerprint == fingerprint)
        });

        let is_new = match fingerprint.as_deref() {
            None => {
                let marker_new = self
                    .last_visit_ms()
                    .await
                    .map_or(true, |ms| now_ms - ms >= self.config.revisit_cooldown_ms);

                let is_new = !session_active && marker_new;
                if is_new {
                    self.write_last_visit(now_ms).await;
                }
                is_new
            }
            Some(fp) => {
                let mut visitors = self.recent_visitors().await;
                visitors.prune(now_ms - self.config.retention_ms);

                let marker_new = visitors
                    .last_seen(fp)
                    .map_or(true, |ms| now_ms - ms >= self.config.fingerprint_window_ms);

                let is_new = !session_active && marker_new;
                if is_new {
                    visitors.mark(fp, now_ms);
                }
                // Persist regardless of outcome so the prune takes effect
                self.write_recent_visitors(&visitors).await;
                is_new
            }
        };

        if session_active {
            // Reloading within an active session still counts as activity
            if let Some(mut record) = existing {
                record.last_activity_ms = now_ms;
                self.write_session(&record).await;
            }
        } else {
            let record = SessionRecord::new(now_ms, is_new, fingerprint);
            self.write_session(&record).await;
        }

        if is_new {
            debug!(strategy = ?self.config.strategy, "counted new unique visit");
        }

        is_new
    }

    /// Refresh the tab session's last-activity timestamp, if one exists.
    ///
    /// Keeps an idle-but-open tab from timing out mid-visit; the keep-alive
    /// task calls this on a fixed interval.
    pub async fn refresh_session_activity(&self) {
        if let Some(mut record) = self.read_session().await {
            record.last_activity_ms = self.clock.now_ms();
            self.write_session(&record).await;
        }
    }

    /// Delete fingerprint map entries older than the retention horizon.
    ///
    /// No-op under the simple strategy. Returns how many entries were
    /// removed.
    pub async fn prune_recent_fingerprints(&self) -> usize {
        if self.config.strategy != DedupStrategy::Fingerprint {
            return 0;
        }

        let mut visitors = self.recent_visitors().await;
        let removed = visitors.prune(self.clock.now_ms() - self.config.retention_ms);

        // Only rewrite when the prune changed something
        if removed > 0 {
            self.write_recent_visitors(&visitors).await;
            debug!(removed, "pruned expired visitor fingerprints");
        }

        removed
    }

    /// Spawn the keep-alive task refreshing session activity on a fixed
    /// interval until [`VisitTracker::shutdown`] is called.
    pub fn start_keepalive_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let tracker = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut interval =
                time::interval(Duration::from_secs(tracker.config.keepalive_interval_secs));

            // Skip the first tick which fires immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        tracker.refresh_session_activity().await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!("keep-alive task stopping");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Spawn the prune task: one pass immediately, then on a fixed interval
    /// until [`VisitTracker::shutdown`] is called.
    pub fn start_prune_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let tracker = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            tracker.prune_recent_fingerprints().await;

            let mut interval =
                time::interval(Duration::from_secs(tracker.config.prune_interval_secs));

            // Skip the first tick which fires immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        tracker.prune_recent_fingerprints().await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!("prune task stopping");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Stop the background tasks. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    async fn read_session(&self) -> Option<SessionRecord> {
        match self.session_store.get(SESSION_KEY).await {
            Ok(raw) => decode_json(raw.as_deref()),
            Err(err) => {
                warn!(error = %err, "failed to read session record");
                None
            }
        }
    }

    async fn write_session(&self, record: &SessionRecord) {
        match serde_json::to_string(record) {
            Ok(raw) => {
                if let Err(err) = self.session_store.put(SESSION_KEY, &raw).await {
                    warn!(error = %err, "failed to persist session record");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode session record"),
        }
    }

    async fn last_visit_ms(&self) -> Option<i64> {
        match self.durable.get(LAST_VISIT_KEY).await {
            Ok(Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    warn!("discarding malformed last-visit marker");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read last-visit marker");
                None
            }
        }
    }

    async fn recent_visitors(&self) -> RecentVisitors {
        match self.durable.get(RECENT_FINGERPRINTS_KEY).await {
            Ok(raw) => decode_json(raw.as_deref()).unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "failed to read fingerprint map");
                RecentVisitors::default()
            }
        }
    }

    async fn write_recent_visitors(&self, visitors: &RecentVisitors) {
        match serde_json::to_string(visitors) {
            Ok(raw) => {
                if let Err(err) = self.durable.put(RECENT_FINGERPRINTS_KEY, &raw).await {
                    warn!(error = %err, "failed to persist fingerprint map");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode fingerprint map"),
        }
    }

    async fn write_last_visit(&self, now_ms: i64) {
        if let Err(err) = self.durable.put(LAST_VISIT_KEY, &now_ms.to_string()).await {
            warn!(error = %err, "failed to persist last-visit marker");
        }
    }
}
