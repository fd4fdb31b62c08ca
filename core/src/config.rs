//! Client configuration and the override merge used by `Addb::init`.
//!
//! # Design
//! `Configuration` always holds a complete set of values. Callers never build
//! one field by field; they describe only what differs from the built-in
//! defaults in a `ConfigOverrides` and merge it. Overrides can come from code,
//! from JSON (the options hash a host page would pass) or from the process
//! environment.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::QueryError;
use crate::url::UrlBuilder;

pub const DEFAULT_HOST: &str = "addb.absolutdrinks.com";
pub const DEFAULT_ASSETS_HOST: &str = "assets.absolutdrinks.com";
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Hook invoked with the builder just before a request is issued.
///
/// It runs after `appId` has been injected and before `callback` is, so it
/// can still inspect or rewrite every other parameter.
pub type RequestHook = Arc<dyn Fn(&mut UrlBuilder) + Send + Sync>;

#[derive(Clone)]
pub struct Configuration {
    pub host: String,
    pub assets_host: String,
    pub app_id: Option<String>,
    pub default_page_size: u32,
    /// Whether the hosting page was served over https. Selects the scheme of
    /// every request URL and image locator.
    pub secure_origin: bool,
    /// Opt-in deadline for pending tickets, enforced by
    /// `CallbackRegistry::sweep_expired`.
    pub request_timeout: Option<Duration>,
    pub request_starting: Option<RequestHook>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            assets_host: DEFAULT_ASSETS_HOST.to_string(),
            app_id: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            secure_origin: false,
            request_timeout: None,
            request_starting: None,
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("host", &self.host)
            .field("assets_host", &self.assets_host)
            .field("app_id", &self.app_id)
            .field("default_page_size", &self.default_page_size)
            .field("secure_origin", &self.secure_origin)
            .field("request_timeout", &self.request_timeout)
            .field("request_starting", &self.request_starting.is_some())
            .finish()
    }
}

impl Configuration {
    /// Apply every field present in `overrides`, keeping the rest.
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(assets_host) = overrides.assets_host {
            self.assets_host = assets_host;
        }
        if let Some(app_id) = overrides.app_id {
            self.app_id = Some(app_id);
        }
        if let Some(size) = overrides.default_page_size {
            self.default_page_size = size;
        }
        if let Some(secure) = overrides.secure_origin {
            self.secure_origin = secure;
        }
        if let Some(ms) = overrides.request_timeout_ms {
            self.request_timeout = Some(Duration::from_millis(ms));
        }
        self
    }

    pub fn with_request_starting(
        mut self,
        hook: impl Fn(&mut UrlBuilder) + Send + Sync + 'static,
    ) -> Self {
        self.request_starting = Some(Arc::new(hook));
        self
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure_origin {
            "https://"
        } else {
            "http://"
        }
    }

    /// `scheme://host`, with any scheme the host was configured with dropped.
    pub fn origin(&self) -> String {
        format!("{}{}", self.scheme(), strip_scheme(&self.host))
    }

    pub(crate) fn require_app_id(&self) -> Result<&str, QueryError> {
        match self.app_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(QueryError::missing_app_id()),
        }
    }
}

fn strip_scheme(host: &str) -> &str {
    host.strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host)
}

/// Partial configuration. Absent fields leave the current value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub assets_host: Option<String>,
    pub app_id: Option<String>,
    pub default_page_size: Option<u32>,
    pub secure_origin: Option<bool>,
    pub request_timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Read overrides from `ADDB_*` environment variables.
    pub fn from_env() -> Result<Self, QueryError> {
        Ok(Self {
            host: env::var("ADDB_HOST").ok(),
            assets_host: env::var("ADDB_ASSETS_HOST").ok(),
            app_id: env::var("ADDB_APP_ID").ok(),
            default_page_size: parse_var("ADDB_PAGE_SIZE")?,
            secure_origin: parse_var("ADDB_SECURE")?,
            request_timeout_ms: parse_var("ADDB_TIMEOUT_MS")?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, QueryError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| QueryError::Configuration(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}
