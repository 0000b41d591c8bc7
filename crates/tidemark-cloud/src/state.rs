//! Flattened resource state
//!
//! Typed handler state is flattened into a map of attributes for the host,
//! and expanded back into typed state when the host hands it in again.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// State of a single resource as the host stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider-specific resource ID
    pub id: String,

    /// Resource type
    pub resource_type: String,

    /// Resource attributes
    pub attributes: serde_json::Map<String, serde_json::Value>,

    /// When this state was read
    pub read_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            attributes: serde_json::Map::new(),
            read_at: Utc::now(),
        }
    }

    /// Flatten typed state. The state must serialize to a JSON object.
    pub fn flatten<T: Serialize>(
        id: impl Into<String>,
        resource_type: impl Into<String>,
        state: &T,
    ) -> Result<Self> {
        let mut resource = Self::new(id, resource_type);
        match serde_json::to_value(state)? {
            serde_json::Value::Object(attributes) => resource.attributes = attributes,
            other => {
                return Err(CloudError::InvalidConfig(format!(
                    "state of {} ({}) is not an object: {}",
                    resource.resource_type, resource.id, other
                )));
            }
        }
        Ok(resource)
    }

    /// Expand the attributes back into typed state
    pub fn expand<T: DeserializeOwned>(&self) -> Result<T> {
        let value = serde_json::Value::Object(self.attributes.clone());
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn get_attribute<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
