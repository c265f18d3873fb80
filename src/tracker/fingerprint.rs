use base64::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Attributes of the browsing environment that feed the fingerprint.
///
/// These are pseudo-identifying, not cryptographic: two devices with the
/// same user agent, locale, timezone, and screen setup collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub user_agent: String,
    /// BCP-47 language tag, e.g. "en-US"
    pub language: String,
    /// IANA timezone name, e.g. "Europe/Berlin"
    pub timezone: String,
    /// Screen resolution as "WIDTHxHEIGHT"
    pub screen_resolution: String,
    /// Color depth in bits
    pub color_depth: u8,
}

impl EnvironmentInfo {
    /// Deterministic pseudo-identifier for this environment.
    ///
    /// Identical inputs always produce the same digest; changing any single
    /// attribute produces a different one.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.user_agent.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.language.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.timezone.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.screen_resolution.as_bytes());
        hasher.update([0x1f]);
        hasher.update([self.color_depth]);

        let digest = hasher.finalize();
        format!("fp_{}", BASE64_URL_SAFE_NO_PAD.encode(&digest[..12]))
    }
}
