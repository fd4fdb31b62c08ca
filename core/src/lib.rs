//! Query client core for the drinks catalog API.
//!
//! # Overview
//! Builds parameterized catalog URLs with a fluent API and retrieves results
//! through cross-origin callback requests (JSONP). Each terminal call turns
//! into a uniquely named callback registered in a shared pending table; the
//! completion handler runs exactly once, after the transport element and the
//! ticket are gone.
//!
//! # Design
//! - `UrlBuilder` accumulates path segments and upserted parameters.
//! - `CallbackRegistry` owns the process-wide callback counter, the pending
//!   table and a pluggable `Transport`. The core never does I/O itself unless
//!   the host picks `HttpTransport`.
//! - `GenericQuery` is the shared base; resource variants wrap it and expose
//!   it through `QueryCapabilities`.
//! - Argument, configuration and unsupported-operation errors are returned
//!   synchronously from the call site, before any element is injected.

pub mod client;
pub mod collections;
pub mod config;
pub mod drinks;
pub mod error;
pub mod ill_have_ones;
pub mod image;
pub mod occasions;
pub mod query;
pub mod registry;
pub mod response;
pub mod text;
pub mod transport;
pub mod url;

pub use client::Addb;
pub use collections::UserCollectionsQuery;
pub use config::{ConfigOverrides, Configuration};
pub use drinks::{DrinkFilter, DrinksQuery};
pub use error::QueryError;
pub use ill_have_ones::{GeoPoint, IllHaveOneFilter, IllHaveOnesQuery};
pub use image::{ImageFormat, ImageOptions};
pub use occasions::OccasionsQuery;
pub use query::{FindCriteria, GenericQuery, QueryCapabilities};
pub use registry::{CallbackRegistry, Completion};
pub use response::{Entity, Response};
pub use transport::{Delivery, HttpTransport, InMemoryDocument, ScriptElement, Transport};
pub use url::{ParamValue, UrlBuilder};
