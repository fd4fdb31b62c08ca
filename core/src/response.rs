//! Response envelopes handed to completion handlers.
//!
//! # Design
//! Payloads stay as `serde_json::Value`: the client reads only `id` and the
//! presence of `totalResult`. Callers who want typed entities call
//! `Entity::deserialize`. Every entity carries an `ImageLocator` bound to the
//! resource that produced it.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Configuration;
use crate::error::QueryError;
use crate::image::{ImageLocator, ImageOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    data: Value,
    image: ImageLocator,
}

impl Entity {
    fn new(data: Value, resource: &str, config: &Configuration) -> Self {
        let id = match data.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let image = ImageLocator::new(config, resource, &id);
        Self { data, image }
    }

    pub fn id(&self) -> Option<&str> {
        self.data.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn image_url(&self, options: &ImageOptions) -> Result<String, QueryError> {
        self.image.url(options)
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, QueryError> {
        serde_json::from_value(self.data.clone()).map_err(|e| QueryError::Payload(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Collection { total_result: u64, result: Vec<Entity> },
    Single(Entity),
}

impl Response {
    /// Wrap a raw payload. A `totalResult` key marks a listing; anything else
    /// is a single entity.
    pub fn from_payload(payload: Value, resource: &str, config: &Configuration) -> Self {
        match payload {
            Value::Object(mut map) if map.contains_key("totalResult") => {
                let total_result = map.get("totalResult").and_then(Value::as_u64).unwrap_or(0);
                let result = match map.remove("result") {
                    Some(Value::Array(items)) => items
                        .into_iter()
                        .map(|item| Entity::new(item, resource, config))
                        .collect(),
                    _ => Vec::new(),
                };
                Response::Collection { total_result, result }
            }
            other => Response::Single(Entity::new(other, resource, config)),
        }
    }

    pub fn entities(&self) -> &[Entity] {
        match self {
            Response::Collection { result, .. } => result,
            Response::Single(entity) => std::slice::from_ref(entity),
        }
    }
}
