use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

/// How repeat visitors are recognized in the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// One global last-visit timestamp gated by the revisit cooldown.
    Simple,
    /// Per-device fingerprint map gated by the fingerprint window.
    Fingerprint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    pub strategy: DedupStrategy,
    /// Idle time after which a tab session no longer counts as active.
    pub session_timeout_ms: i64,
    /// Minimum elapsed time before the global marker re-qualifies a visit
    /// (simple strategy).
    pub revisit_cooldown_ms: i64,
    /// Minimum elapsed time before a known fingerprint re-qualifies a visit
    /// (fingerprint strategy).
    pub fingerprint_window_ms: i64,
    /// Fingerprint map entries older than this are pruned.
    pub retention_ms: i64,
    pub keepalive_interval_secs: u64,
    pub prune_interval_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            strategy: DedupStrategy::Fingerprint,
            session_timeout_ms: 30 * 60 * 1000,
            revisit_cooldown_ms: 24 * 60 * 60 * 1000,
            fingerprint_window_ms: 4 * 60 * 60 * 1000,
            retention_ms: 24 * 60 * 60 * 1000,
            keepalive_interval_secs: 5 * 60,
            prune_interval_secs: 60 * 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./footfall.db".to_string());

        let strategy_str =
            std::env::var("DEDUP_STRATEGY").unwrap_or_else(|_| "fingerprint".to_string());

        let strategy = match strategy_str.to_lowercase().as_str() {
            "simple" => DedupStrategy::Simple,
            "fingerprint" => DedupStrategy::Fingerprint,
            other => {
                tracing::warn!(
                    "Unknown DEDUP_STRATEGY '{other}', falling back to 'fingerprint'. Supported values: simple, fingerprint"
                );
                DedupStrategy::Fingerprint
            }
        };

        let defaults = TrackingConfig::default();
        let tracking = TrackingConfig {
            strategy,
            session_timeout_ms: env_window_ms("SESSION_TIMEOUT_SECS", defaults.session_timeout_ms)?,
            revisit_cooldown_ms: env_window_ms(
                "REVISIT_COOLDOWN_SECS",
                defaults.revisit_cooldown_ms,
            )?,
            fingerprint_window_ms: env_window_ms(
                "FINGERPRINT_WINDOW_SECS",
                defaults.fingerprint_window_ms,
            )?,
            retention_ms: env_window_ms("RETENTION_SECS", defaults.retention_ms)?,
            keepalive_interval_secs: env_secs(
                "KEEPALIVE_INTERVAL_SECS",
                defaults.keepalive_interval_secs,
            )?,
            prune_interval_secs: env_secs("PRUNE_INTERVAL_SECS", defaults.prune_interval_secs)?,
        };

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
            },
            tracking,
        })
    }
}

/// Read a window from the environment in seconds, stored as milliseconds.
fn env_window_ms(name: &str, default_ms: i64) -> Result<i64> {
    match std::env::var(name) {
        Ok(raw) => Ok(raw.parse::<i64>()? * 1000),
        Err(_) => Ok(default_ms),
    }
}

fn env_secs(name: &str, default_secs: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => Ok(raw.parse::<u64>()?),
        Err(_) => Ok(default_secs),
    }
}
