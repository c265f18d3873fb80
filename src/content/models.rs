//! Data models for site content

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A service or product offering shown on the site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Display grouping, e.g. "Services" or "Products".
    pub category: String,
}

/// A customer testimonial shown in the carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub designation: String,
    /// Star rating, 1 to 5.
    pub rating: u8,
    pub comment: String,
    /// Avatar image URL or data URI.
    pub avatar: String,
    pub date_added: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub weekdays: String,
    pub saturday: String,
    pub sunday: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub email: String,
    pub linkedin: String,
    pub instagram: String,
    pub facebook: String,
    pub whatsapp: String,
    pub tiktok: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
    pub address: String,
    pub business_hours: BusinessHours,
    pub social_media: SocialLinks,
}
