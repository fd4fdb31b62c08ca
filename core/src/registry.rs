//! Pending-request table: turns one logical request into a uniquely named
//! callback, hands it to the transport, and fires the caller's handler
//! exactly once.
//!
//! # Design
//! - Callback names are `addbCallback<n>` where `n` comes from one
//!   process-wide counter, bumped once per dispatch and never reset. Names
//!   are never reused, so intermediary caches see every request as distinct.
//! - A ticket is removed from the table before anything else happens on
//!   completion. Whoever removes it owns the only right to fire it, which is
//!   what makes firing exactly-once even if the transport delivers twice.
//! - No lock is held while a transport or a completion handler runs, so a
//!   handler may dispatch a new request against the same registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Configuration;
use crate::error::QueryError;
use crate::response::Response;
use crate::transport::{encode_uri, Delivery, ScriptElement, Transport};
use crate::url::UrlBuilder;

pub const CALLBACK_PREFIX: &str = "addbCallback";

static CALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Handler invoked once with the outcome of a request.
pub type Completion = Box<dyn FnOnce(Result<Response, QueryError>) + Send>;

struct Ticket {
    resource: String,
    issued_at: Instant,
    on_complete: Completion,
}

pub(crate) struct RegistryInner {
    config: Arc<Configuration>,
    transport: Arc<dyn Transport>,
    pending: Mutex<HashMap<String, Ticket>>,
}

/// Shared handle to the pending-request table. Cheap to clone.
#[derive(Clone)]
pub struct CallbackRegistry {
    inner: Arc<RegistryInner>,
}

impl CallbackRegistry {
    pub fn new(config: Configuration, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config: Arc::new(config),
                transport,
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &Configuration {
        &self.inner.config
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    pub fn is_pending(&self, callback_id: &str) -> bool {
        self.pending().contains_key(callback_id)
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, Ticket>> {
        self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue the request described by `builder`.
    ///
    /// Adds `appId`, runs the request-starting hook, adds `callback`, then
    /// registers the ticket and injects the transport element. Returns the
    /// generated callback name. The URL is captured here, so the builder may
    /// be reused as soon as this returns.
    pub fn dispatch(
        &self,
        builder: &mut UrlBuilder,
        resource: &str,
        on_complete: Completion,
    ) -> Result<String, QueryError> {
        let config = &self.inner.config;
        let app_id = config.require_app_id()?;

        let n = CALLBACK_COUNTER.fetch_add(1, Ordering::SeqCst);
        let callback_id = format!("{CALLBACK_PREFIX}{n}");

        builder.add_parameter("appId", app_id);
        if let Some(hook) = &config.request_starting {
            hook(builder);
        }
        builder.add_parameter("callback", callback_id.as_str());

        let url = builder.url();
        debug!(%callback_id, %url, "dispatching request");

        self.pending().insert(
            callback_id.clone(),
            Ticket {
                resource: resource.to_string(),
                issued_at: Instant::now(),
                on_complete,
            },
        );

        let element = ScriptElement {
            id: callback_id.clone(),
            src: encode_uri(&url),
        };
        let delivery = Delivery::new(Arc::downgrade(&self.inner), callback_id.clone());
        self.inner.transport.inject(element, delivery);
        Ok(callback_id)
    }

    /// Fire the ticket for `callback_id` with `payload`.
    ///
    /// Entities get their image locators, the transport element is removed
    /// and the ticket is gone before the handler runs. Returns `false` for an
    /// unknown or already-fired id.
    pub fn complete(&self, callback_id: &str, payload: Value) -> bool {
        let Some(ticket) = self.pending().remove(callback_id) else {
            warn!(%callback_id, "completion for unknown callback ignored");
            return false;
        };
        let response = Response::from_payload(payload, &ticket.resource, &self.inner.config);
        self.inner.transport.remove(callback_id);
        debug!(%callback_id, resource = %ticket.resource, "request completed");
        (ticket.on_complete)(Ok(response));
        true
    }

    /// Fail every ticket older than the configured request timeout with
    /// `TransportTimeout`. Returns how many were failed. A no-op when no
    /// timeout is configured.
    pub fn sweep_expired(&self) -> usize {
        let Some(timeout) = self.inner.config.request_timeout else {
            return 0;
        };
        let now = Instant::now();
        let expired: Vec<(String, Ticket)> = {
            let mut pending = self.pending();
            let ids: Vec<String> = pending
                .iter()
                .filter(|(_, t)| now.duration_since(t.issued_at) >= timeout)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| pending.remove(&id).map(|t| (id, t)))
                .collect()
        };

        let count = expired.len();
        for (callback_id, ticket) in expired {
            let elapsed = now.duration_since(ticket.issued_at);
            self.inner.transport.remove(&callback_id);
            warn!(%callback_id, ?elapsed, "request timed out");
            (ticket.on_complete)(Err(QueryError::TransportTimeout {
                callback_id,
                elapsed,
            }));
        }
        count
    }
}
