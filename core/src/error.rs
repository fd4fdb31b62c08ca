//! Error types for the catalog query client.
//!
//! # Design
//! `Configuration`, `Argument` and `UnsupportedOperation` are raised
//! synchronously from the call site, before a transport element exists.
//! `TransportTimeout` only ever reaches a completion handler, and only when
//! the host configured a request timeout. `Payload` comes from unwrapping a
//! JSONP body or deserializing an entity; it never reaches a completion.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while building, dispatching or completing a query.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    /// No application identity has been configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required call argument was missing or malformed.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The resource does not offer this operation.
    #[error("`{operation}` is not supported on {resource}")]
    UnsupportedOperation {
        resource: &'static str,
        operation: &'static str,
    },

    /// A ticket outlived the configured request timeout.
    #[error("request {callback_id} timed out after {elapsed:?}")]
    TransportTimeout { callback_id: String, elapsed: Duration },

    /// The transport received something other than a call to the callback.
    #[error("malformed payload: {0}")]
    Payload(String),
}

impl QueryError {
    pub(crate) fn missing_app_id() -> Self {
        QueryError::Configuration("you must initialize and provide an app id".to_string())
    }

    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        QueryError::Argument(msg.into())
    }
}
