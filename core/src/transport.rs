//! Pluggable transports for cross-origin callback requests.
//!
//! # Design
//! The registry never performs I/O. It hands a `ScriptElement` (the element a
//! page would append to trigger the load) and a `Delivery` handle to a
//! `Transport`, and later asks the transport to remove the element. How the
//! GET happens is the transport's business:
//!
//! - `InMemoryDocument` only records elements. The host pulls them, performs
//!   the request itself and fires the completion (tests, the C ABI).
//! - `HttpTransport` performs a blocking GET on a worker thread and unwraps
//!   the JSONP body.
//!
//! Transport failures are not reported to the registry. A failed request
//! leaves its ticket pending until `CallbackRegistry::sweep_expired` runs with
//! a configured timeout.

use std::sync::{Mutex, PoisonError, Weak};
use std::thread;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::registry::{CallbackRegistry, RegistryInner};

/// Characters `encodeURI` escapes. Reserved URL characters stay as they are.
const URI_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub fn encode_uri(url: &str) -> String {
    utf8_percent_encode(url, URI_ENCODE_SET).to_string()
}

/// The element that triggers one request. `id` is the generated callback name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    pub id: String,
    pub src: String,
}

/// One-shot route back to the registry for a single callback id.
#[derive(Clone)]
pub struct Delivery {
    registry: Weak<RegistryInner>,
    callback_id: String,
}

impl Delivery {
    pub(crate) fn new(registry: Weak<RegistryInner>, callback_id: String) -> Self {
        Self {
            registry,
            callback_id,
        }
    }

    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    /// Complete the ticket with `payload`. Returns `false` if the registry is
    /// gone or the ticket already fired.
    pub fn deliver(&self, payload: Value) -> bool {
        match self.registry.upgrade() {
            Some(inner) => CallbackRegistry::from_inner(inner).complete(&self.callback_id, payload),
            None => false,
        }
    }
}

pub trait Transport: Send + Sync {
    /// Begin loading `element`. Called once per dispatch, after the ticket is
    /// registered and with no registry lock held.
    fn inject(&self, element: ScriptElement, delivery: Delivery);

    /// Remove the element for `id`. Called exactly once, before the
    /// completion handler runs.
    fn remove(&self, id: &str);
}

struct Injected {
    element: ScriptElement,
    delivery: Delivery,
    handed_out: bool,
}

/// A document that only remembers which elements are attached.
#[derive(Default)]
pub struct InMemoryDocument {
    elements: Mutex<Vec<Injected>>,
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> Vec<ScriptElement> {
        let elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
        elements.iter().map(|e| e.element.clone()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        let elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
        elements.iter().any(|e| e.element.id == id)
    }

    /// Hand out the oldest element the host has not fetched yet.
    pub fn poll(&self) -> Option<ScriptElement> {
        let mut elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
        let next = elements.iter_mut().find(|e| !e.handed_out)?;
        next.handed_out = true;
        Some(next.element.clone())
    }

    /// Simulate the script for `id` running with `payload`.
    pub fn fire(&self, id: &str, payload: Value) -> bool {
        let delivery = {
            let elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
            elements
                .iter()
                .find(|e| e.element.id == id)
                .map(|e| e.delivery.clone())
        };
        match delivery {
            Some(delivery) => delivery.deliver(payload),
            None => false,
        }
    }
}

impl Transport for InMemoryDocument {
    fn inject(&self, element: ScriptElement, delivery: Delivery) {
        let mut elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
        elements.push(Injected {
            element,
            delivery,
            handed_out: false,
        });
    }

    fn remove(&self, id: &str) {
        let mut elements = self.elements.lock().unwrap_or_else(PoisonError::into_inner);
        elements.retain(|e| e.element.id != id);
    }
}

/// Fetches each element's source with `ureq` on its own thread.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    fn fetch(agent: &ureq::Agent, element: &ScriptElement) -> Result<Value, QueryError> {
        let mut response = agent
            .get(element.src.as_str())
            .call()
            .map_err(|e| QueryError::Payload(format!("transport error: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| QueryError::Payload(format!("unreadable body: {e}")))?;
        if status != 200 {
            return Err(QueryError::Payload(format!("HTTP {status}: {body}")));
        }
        parse_jsonp(&body, &element.id)
    }
}

impl Transport for HttpTransport {
    fn inject(&self, element: ScriptElement, delivery: Delivery) {
        let agent = self.agent.clone();
        thread::spawn(move || match Self::fetch(&agent, &element) {
            Ok(payload) => {
                delivery.deliver(payload);
            }
            Err(e) => warn!(callback_id = %element.id, error = %e, "request failed, ticket left pending"),
        });
    }

    fn remove(&self, id: &str) {
        debug!(callback_id = %id, "request finished");
    }
}

/// Unwrap `callback(<json>);` into its JSON argument.
pub fn parse_jsonp(body: &str, callback: &str) -> Result<Value, QueryError> {
    let malformed = || QueryError::Payload(format!("body is not a call to {callback}"));
    let args = body
        .trim()
        .strip_prefix(callback)
        .ok_or_else(malformed)?
        .trim_start()
        .strip_prefix('(')
        .ok_or_else(malformed)?
        .trim_end();
    let args = args.strip_suffix(';').unwrap_or(args).trim_end();
    let json = args.strip_suffix(')').ok_or_else(malformed)?;
    serde_json::from_str(json).map_err(|e| QueryError::Payload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_uri_keeps_reserved_characters() {
        assert_eq!(
            encode_uri("http://h/drinks/with/a or b/?find=Name:Mojito AND x&lang=en"),
            "http://h/drinks/with/a%20or%20b/?find=Name:Mojito%20AND%20x&lang=en"
        );
    }

    #[test]
    fn encode_uri_escapes_non_ascii() {
        assert_eq!(encode_uri("h/ä"), "h/%C3%A4");
    }

    #[test]
    fn parse_jsonp_unwraps_argument() {
        let value = parse_jsonp("addbCallback3({\"id\":\"x\"});\n", "addbCallback3").unwrap();
        assert_eq!(value, json!({"id": "x"}));
    }

    #[test]
    fn parse_jsonp_accepts_missing_semicolon() {
        let value = parse_jsonp("cb ( [1,2] )", "cb").unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn parse_jsonp_rejects_other_callback() {
        let err = parse_jsonp("other({})", "cb").unwrap_err();
        assert!(matches!(err, QueryError::Payload(_)));
    }

    #[test]
    fn poll_hands_out_each_element_once() {
        let document = InMemoryDocument::new();
        let delivery = Delivery::new(Weak::new(), "a".to_string());
        document.inject(
            ScriptElement {
                id: "a".to_string(),
                src: "http://h/a/".to_string(),
            },
            delivery,
        );
        assert_eq!(document.poll().map(|e| e.id), Some("a".to_string()));
        assert!(document.poll().is_none());
        assert!(document.contains("a"));
        document.remove("a");
        assert!(!document.contains("a"));
    }

    #[test]
    fn delivery_without_registry_reports_failure() {
        let delivery = Delivery::new(Weak::new(), "gone".to_string());
        assert!(!delivery.deliver(json!({})));
    }
}
