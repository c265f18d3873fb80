use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::content::models::{ContactInfo, Service, Testimonial};
use crate::storage::codec::decode_json;
use crate::storage::KeyValueStore;

const SERVICES_KEY: &str = "content.services";
const TESTIMONIALS_KEY: &str = "content.testimonials";
const CONTACT_KEY: &str = "content.contact";

/// Typed persistence for admin-editable site content over the durable
/// store.
pub struct ContentStore {
    durable: Arc<dyn KeyValueStore>,
}

impl ContentStore {
    pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
        Self { durable }
    }

    pub async fn services(&self) -> Result<Vec<Service>> {
        self.load(SERVICES_KEY).await
    }

    pub async fn save_services(&self, services: &[Service]) -> Result<()> {
        self.save(SERVICES_KEY, services).await
    }

    pub async fn testimonials(&self) -> Result<Vec<Testimonial>> {
        self.load(TESTIMONIALS_KEY).await
    }

    pub async fn save_testimonials(&self, testimonials: &[Testimonial]) -> Result<()> {
        self.save(TESTIMONIALS_KEY, testimonials).await
    }

    pub async fn contact_info(&self) -> Result<ContactInfo> {
        self.load(CONTACT_KEY).await
    }

    pub async fn save_contact_info(&self, contact: &ContactInfo) -> Result<()> {
        self.save(CONTACT_KEY, contact).await
    }

    async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let raw = self.durable.get(key).await?;
        Ok(decode_json(raw.as_deref()).unwrap_or_default())
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.durable.put(key, &raw).await?;
        Ok(())
    }
}
