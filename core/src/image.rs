//! Image locators for catalog entities.
//!
//! Format: `scheme://assetsHost/resourceType/[WxH/]id[(compression)].ext`.

use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::error::QueryError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<ImageFormat>,
    pub compression: Option<u8>,
}

impl ImageOptions {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn jpg(mut self, compression: u8) -> Self {
        self.format = Some(ImageFormat::Jpg);
        self.compression = Some(compression);
        self
    }
}

/// Capability bound to one entity: the resource it came from and its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocator {
    origin: String,
    resource_type: String,
    id: String,
}

impl ImageLocator {
    pub fn new(config: &Configuration, resource_type: &str, id: &str) -> Self {
        Self {
            origin: format!("{}{}", config.scheme(), config.assets_host),
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn url(&self, options: &ImageOptions) -> Result<String, QueryError> {
        if self.resource_type.is_empty() {
            return Err(QueryError::argument("you must provide a resource type"));
        }
        if self.id.is_empty() {
            return Err(QueryError::argument("you must provide the id of the entity"));
        }

        let mut url = format!("{}/{}", self.origin, self.resource_type);
        match (options.width, options.height) {
            (Some(w), Some(h)) => url.push_str(&format!("/{w}x{h}")),
            (None, None) => {}
            _ => {
                return Err(QueryError::argument(
                    "if you provide a size you must provide both width and height",
                ))
            }
        }
        url.push('/');
        url.push_str(&self.id);

        let format = options.format.unwrap_or_default();
        if let Some(compression) = options.compression {
            if format != ImageFormat::Jpg {
                return Err(QueryError::argument("compression requires the jpg format"));
            }
            if !(1..=100).contains(&compression) {
                return Err(QueryError::argument("compression must be between 1 and 100"));
            }
            url.push_str(&format!("({compression})"));
        }
        url.push('.');
        url.push_str(format.extension());
        Ok(url)
    }
}
