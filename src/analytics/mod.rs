//! Daily visitor analytics
//!
//! The visit tracker only decides whether a load is a new unique visit;
//! this module owns the dated counter fed by that decision.

pub mod ledger;
pub mod models;

pub use ledger::VisitorLedger;
pub use models::DailyVisitors;
