//! Integration tests for the visit tracker state machine.
//!
//! All tests drive the tracker through injected in-memory stores and a
//! manually advanced clock, so every window boundary is exercised
//! deterministically.

use footfall::config::{DedupStrategy, TrackingConfig};
use footfall::storage::{KeyValueStore, MemoryStore};
use footfall::tracker::visit::{LAST_VISIT_KEY, RECENT_FINGERPRINTS_KEY, SESSION_KEY};
use footfall::tracker::{Clock, EnvironmentInfo, RecentVisitors, SessionRecord, VisitTracker};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::time::{timeout, Duration};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Manually advanced clock.
struct ManualClock(AtomicI64);

impl ManualClock {
    fn new(start_ms: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(start_ms)))
    }

    fn advance(&self, delta_ms: i64) {
        self.0.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn environment() -> EnvironmentInfo {
    EnvironmentInfo {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/128.0".to_string(),
        language: "en-US".to_string(),
        timezone: "Europe/Berlin".to_string(),
        screen_resolution: "1920x1080".to_string(),
        color_depth: 24,
    }
}

fn config(strategy: DedupStrategy) -> TrackingConfig {
    TrackingConfig {
        strategy,
        ..TrackingConfig::default()
    }
}

/// A tracker simulating one page load in one tab.
fn page_load(
    strategy: DedupStrategy,
    durable: &Arc<dyn KeyValueStore>,
    session: &Arc<dyn KeyValueStore>,
    clock: &Arc<ManualClock>,
) -> VisitTracker {
    VisitTracker::new(
        Arc::clone(durable),
        Arc::clone(session),
        Arc::clone(clock) as Arc<dyn Clock>,
        environment(),
        config(strategy),
    )
}

fn stores() -> (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) {
    (Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
}

#[tokio::test]
async fn first_call_counts_then_short_circuits() {
    let (durable, session) = stores();
    let clock = ManualClock::new(1_700_000_000_000);
    let tracker = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);

    assert!(!tracker.has_tracked_visit());
    assert!(tracker.track_unique_visit().await);
    assert!(tracker.has_tracked_visit());

    // Idempotent within one page lifetime, even with elapsed time
    clock.advance(10 * MINUTE_MS);
    assert!(!tracker.track_unique_visit().await);
}

#[tokio::test]
async fn not_new_determination_still_sets_the_tracked_flag() {
    let (durable, session) = stores();
    let clock = ManualClock::new(1_700_000_000_000);

    let first = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert!(first.track_unique_visit().await);

    // Reload one minute later in the same tab
    clock.advance(MINUTE_MS);
    let reload = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert!(!reload.track_unique_visit().await);
    assert!(reload.has_tracked_visit());
}

#[tokio::test]
async fn simple_cooldown_boundaries_are_strict() {
    let cooldown = TrackingConfig::default().revisit_cooldown_ms;
    let now = 1_700_000_000_000;

    // 1 ms inside the cooldown: not a new visit
    let (durable, _) = stores();
    durable
        .put(LAST_VISIT_KEY, &(now - (cooldown - 1)).to_string())
        .await
        .unwrap();
    let clock = ManualClock::new(now);
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let tracker = page_load(DedupStrategy::Simple, &durable, &session, &clock);
    assert!(!tracker.track_unique_visit().await);

    // 1 ms past the cooldown: a new visit, and the marker advances
    let (durable, _) = stores();
    durable
        .put(LAST_VISIT_KEY, &(now - (cooldown + 1)).to_string())
        .await
        .unwrap();
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let tracker = page_load(DedupStrategy::Simple, &durable, &session, &clock);
    assert!(tracker.track_unique_visit().await);
    assert_eq!(
        durable.get(LAST_VISIT_KEY).await.unwrap(),
        Some(now.to_string())
    );
}

#[tokio::test]
async fn session_timeout_boundary_gates_new_session_evaluation() {
    let timeout_ms = TrackingConfig::default().session_timeout_ms;
    let cooldown = TrackingConfig::default().revisit_cooldown_ms;
    let now = 1_700_000_000_000;

    // Durable marker far expired, so only the session guard decides.
    let expired_marker = (now - cooldown - HOUR_MS).to_string();

    // Session active (1 ms inside the timeout): not a new visit
    let (durable, session) = stores();
    durable.put(LAST_VISIT_KEY, &expired_marker).await.unwrap();
    let record = SessionRecord {
        session_id: "session_0_abcdefghi".to_string(),
        last_activity_ms: now - (timeout_ms - 1),
        is_new_visitor: true,
        fingerprint: None,
    };
    session
        .put(SESSION_KEY, &serde_json::to_string(&record).unwrap())
        .await
        .unwrap();
    let clock = ManualClock::new(now);
    let tracker = page_load(DedupStrategy::Simple, &durable, &session, &clock);
    assert!(!tracker.track_unique_visit().await);

    // Session expired (1 ms past the timeout): eligible again
    let (durable, session) = stores();
    durable.put(LAST_VISIT_KEY, &expired_marker).await.unwrap();
    let record = SessionRecord {
        last_activity_ms: now - (timeout_ms + 1),
        ..record
    };
    session
        .put(SESSION_KEY, &serde_json::to_string(&record).unwrap())
        .await
        .unwrap();
    let tracker = page_load(DedupStrategy::Simple, &durable, &session, &clock);
    assert!(tracker.track_unique_visit().await);
}

#[tokio::test]
async fn corrupted_records_fail_open_to_a_fresh_visitor() {
    let now = 1_700_000_000_000;
    let clock = ManualClock::new(now);

    // Malformed durable marker and session record under the simple strategy
    let (durable, session) = stores();
    durable.put(LAST_VISIT_KEY, "not-a-number").await.unwrap();
    session.put(SESSION_KEY, "{{{ not json").await.unwrap();
    let tracker = page_load(DedupStrategy::Simple, &durable, &session, &clock);
    assert!(tracker.track_unique_visit().await);

    // Malformed fingerprint map under the fingerprint strategy
    let (durable, session) = stores();
    durable
        .put(RECENT_FINGERPRINTS_KEY, "[1, 2, 3]")
        .await
        .unwrap();
    let tracker = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert!(tracker.track_unique_visit().await);
}

#[tokio::test]
async fn cooldown_scenario_across_tabs() {
    // Marker absent at T: counted, marker set to T. Second call in the
    // same load: idempotent false. New tab at T + 23 h: within cooldown.
    // New tab at T + 25 h: counted again, marker updated.
    let t0 = 1_700_000_000_000;
    let clock = ManualClock::new(t0);
    let durable: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let tab1 = page_load(DedupStrategy::Simple, &durable, &session, &clock);
    assert!(tab1.track_unique_visit().await);
    assert_eq!(
        durable.get(LAST_VISIT_KEY).await.unwrap(),
        Some(t0.to_string())
    );
    assert!(!tab1.track_unique_visit().await);

    clock.advance(23 * HOUR_MS);
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let tab2 = page_load(DedupStrategy::Simple, &durable, &session, &clock);
    assert!(!tab2.track_unique_visit().await);

    clock.advance(2 * HOUR_MS);
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let tab3 = page_load(DedupStrategy::Simple, &durable, &session, &clock);
    assert!(tab3.track_unique_visit().await);
    assert_eq!(
        durable.get(LAST_VISIT_KEY).await.unwrap(),
        Some((t0 + 25 * HOUR_MS).to_string())
    );
}

#[tokio::test]
async fn fingerprint_window_separates_devices() {
    let t0 = 1_700_000_000_000;
    let clock = ManualClock::new(t0);
    let durable: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let tab1 = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert!(tab1.track_unique_visit().await);

    // Same device, new tab inside the 4 h window: not counted
    clock.advance(3 * HOUR_MS);
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let tab2 = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert!(!tab2.track_unique_visit().await);

    // Different device attributes inside the window: counted separately
    let mut other = environment();
    other.screen_resolution = "1366x768".to_string();
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let other_device = VisitTracker::new(
        Arc::clone(&durable),
        session,
        Arc::clone(&clock) as Arc<dyn Clock>,
        other,
        config(DedupStrategy::Fingerprint),
    );
    assert!(other_device.track_unique_visit().await);

    // Same device again past the window: counted
    clock.advance(2 * HOUR_MS);
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let tab3 = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert!(tab3.track_unique_visit().await);
}

#[tokio::test]
async fn prune_drops_only_entries_past_the_retention_horizon() {
    let retention = TrackingConfig::default().retention_ms;
    let now = 1_700_000_000_000;
    let clock = ManualClock::new(now);

    let mut visitors = RecentVisitors::default();
    visitors.mark("fp_stale", now - retention - HOUR_MS);
    visitors.mark("fp_fresh", now - HOUR_MS);

    let (durable, session) = stores();
    durable
        .put(
            RECENT_FINGERPRINTS_KEY,
            &serde_json::to_string(&visitors).unwrap(),
        )
        .await
        .unwrap();

    let tracker = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert_eq!(tracker.prune_recent_fingerprints().await, 1);

    let raw = durable.get(RECENT_FINGERPRINTS_KEY).await.unwrap().unwrap();
    let remaining: RecentVisitors = serde_json::from_str(&raw).unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.last_seen("fp_fresh").is_some());
    assert!(remaining.last_seen("fp_stale").is_none());
}

#[tokio::test]
async fn tracking_pass_prunes_opportunistically() {
    let retention = TrackingConfig::default().retention_ms;
    let t0 = 1_700_000_000_000;
    let clock = ManualClock::new(t0);

    let mut visitors = RecentVisitors::default();
    visitors.mark("fp_stale", t0 - retention - MINUTE_MS);

    let (durable, session) = stores();
    durable
        .put(
            RECENT_FINGERPRINTS_KEY,
            &serde_json::to_string(&visitors).unwrap(),
        )
        .await
        .unwrap();

    let tracker = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert!(tracker.track_unique_visit().await);

    let raw = durable.get(RECENT_FINGERPRINTS_KEY).await.unwrap().unwrap();
    let remaining: RecentVisitors = serde_json::from_str(&raw).unwrap();
    assert!(remaining.last_seen("fp_stale").is_none());
    assert!(remaining.last_seen(&environment().fingerprint()).is_some());
}

#[tokio::test]
async fn write_failures_never_escape_the_tracker() {
    let now = 1_700_000_000_000;
    let clock = ManualClock::new(now);

    // Every write to either store fails with a quota error
    let durable: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::with_capacity_limit(0));
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::with_capacity_limit(0));

    let tracker = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    // The determination still resolves; degradation over-counts
    assert!(tracker.track_unique_visit().await);
    assert!(tracker.has_tracked_visit());
}

#[tokio::test]
async fn keepalive_refresh_extends_the_session() {
    let t0 = 1_700_000_000_000;
    let clock = ManualClock::new(t0);
    let (durable, session) = stores();

    let tracker = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);
    assert!(tracker.track_unique_visit().await);

    clock.advance(25 * MINUTE_MS);
    tracker.refresh_session_activity().await;

    let raw = session.get(SESSION_KEY).await.unwrap().unwrap();
    let record: SessionRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.last_activity_ms, t0 + 25 * MINUTE_MS);

    // 50 minutes after open but only 25 since the refresh: still active,
    // so a reload in this tab is not eligible as a new session
    clock.advance(25 * MINUTE_MS);
    assert!(record.is_active(
        clock.now_ms(),
        TrackingConfig::default().session_timeout_ms
    ));
}

#[tokio::test]
async fn refresh_without_a_session_is_a_no_op() {
    let (durable, session) = stores();
    let clock = ManualClock::new(1_700_000_000_000);
    let tracker = page_load(DedupStrategy::Fingerprint, &durable, &session, &clock);

    tracker.refresh_session_activity().await;
    assert_eq!(session.get(SESSION_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn shutdown_stops_background_tasks() {
    let (durable, session) = stores();
    let clock = ManualClock::new(1_700_000_000_000);
    let tracker = Arc::new(page_load(
        DedupStrategy::Fingerprint,
        &durable,
        &session,
        &clock,
    ));

    let keepalive = tracker.start_keepalive_task();
    let prune = tracker.start_prune_task();

    tracker.shutdown();

    timeout(Duration::from_secs(5), keepalive)
        .await
        .expect("keep-alive task did not stop")
        .unwrap();
    timeout(Duration::from_secs(5), prune)
        .await
        .expect("prune task did not stop")
        .unwrap();
}
