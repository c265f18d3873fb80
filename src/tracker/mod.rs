//! Visitor uniqueness & session tracking
//!
//! Decides whether the current page load counts as a new unique visit.
//! A tab-scoped session record gates repeat evaluations within one
//! browsing context; a durable marker (global timestamp or per-device
//! fingerprint map, depending on strategy) deduplicates across contexts.
//!
//! The decision is reported as a plain `bool`; callers feed it into the
//! dated counter in the `analytics` module.

pub mod clock;
pub mod fingerprint;
pub mod session;
pub mod visit;

pub use clock::{Clock, SystemClock};
pub use fingerprint::EnvironmentInfo;
pub use session::{RecentVisitors, SessionRecord};
pub use visit::VisitTracker;
