//! Admin-panel content persistence
//!
//! Typed load/save for the site content an admin panel edits. Absent or
//! corrupt stored values load as defaults; only store I/O errors surface.

pub mod models;
pub mod store;

pub use models::{BusinessHours, ContactInfo, Service, SocialLinks, Testimonial};
pub use store::ContentStore;
