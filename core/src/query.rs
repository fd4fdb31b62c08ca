//! The query base shared by every resource.
//!
//! # Design
//! `GenericQuery` owns the query state for one resource root: language, the
//! URL builder and a handle to the callback registry. Resource variants wrap
//! a `GenericQuery` and expose it through `QueryCapabilities`, whose default
//! methods delegate to the base. A variant that cannot offer an operation
//! builds its base with `refusing`, so the base itself answers
//! `UnsupportedOperation` whichever way the call arrives.
//!
//! Terminal calls check, in order: the operation is offered, an `appId` is
//! configured, then their own arguments.
//!
//! Terminal calls (`load`, `quick_search`, `find`, and the variant-specific
//! ones) start a new logical request: they reset the builder to the resource
//! root and reapply `lang` and `pageSize` before adding their own state.
//! `load_set` is the exception: it dispatches whatever the fluent filter
//! calls accumulated.

use crate::error::QueryError;
use crate::registry::CallbackRegistry;
use crate::response::Response;
use crate::url::{IntoParam, ParamValue, UrlBuilder};

const DEFAULT_LANGUAGE: &str = "en";

pub struct GenericQuery {
    resource: &'static str,
    language: String,
    builder: UrlBuilder,
    registry: CallbackRegistry,
    refused: &'static [&'static str],
}

impl GenericQuery {
    pub fn new(registry: CallbackRegistry, language: &str, resource: &'static str) -> Self {
        let language = if language.is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            language.to_string()
        };
        let builder = UrlBuilder::new(resource, registry.config());
        let mut query = Self {
            resource,
            language,
            builder,
            registry,
            refused: &[],
        };
        query.apply_defaults();
        query
    }

    /// Mark `operations` as not offered by this resource.
    pub(crate) fn refusing(mut self, operations: &'static [&'static str]) -> Self {
        self.refused = operations;
        self
    }

    fn apply_defaults(&mut self) {
        self.builder.add_parameter("lang", self.language.as_str());
        self.builder
            .add_parameter("pageSize", self.registry.config().default_page_size);
    }

    /// Discard accumulated filters and parameters.
    pub fn restart(&mut self) {
        self.builder.reset(self.resource, self.registry.config());
        self.apply_defaults();
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn builder(&self) -> &UrlBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut UrlBuilder {
        &mut self.builder
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    pub(crate) fn ensure_configured(&self) -> Result<(), QueryError> {
        self.registry.config().require_app_id().map(|_| ())
    }

    pub(crate) fn ensure_offered(&self, operation: &'static str) -> Result<(), QueryError> {
        if self.refused.contains(&operation) {
            return Err(QueryError::UnsupportedOperation {
                resource: self.resource,
                operation,
            });
        }
        Ok(())
    }

    /// Hand the current URL to the registry.
    pub fn dispatch<F>(&mut self, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.registry
            .dispatch(&mut self.builder, self.resource, Box::new(on_complete))
    }

    pub(crate) fn run_load<F>(&mut self, id: &str, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.ensure_offered("load")?;
        self.ensure_configured()?;
        if id.is_empty() {
            return Err(QueryError::argument("you must provide the id to load"));
        }
        self.restart();
        self.builder.append_segment(id);
        self.dispatch(on_complete)
    }

    pub(crate) fn run_load_set<F>(&mut self, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.ensure_configured()?;
        self.dispatch(on_complete)
    }

    pub(crate) fn run_quick_search<F>(&mut self, text: &str, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.ensure_configured()?;
        self.restart();
        self.builder.add_parameter("quickSearch", text);
        self.dispatch(on_complete)
    }

    pub(crate) fn run_find<F>(&mut self, criteria: &FindCriteria, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.ensure_configured()?;
        if criteria.is_empty() {
            return Err(QueryError::argument("you must provide some find options"));
        }
        self.restart();
        self.builder.add_parameter("find", criteria.to_query());
        self.dispatch(on_complete)
    }
}

pub(crate) mod sealed {
    use super::GenericQuery;

    /// Access to the wrapped base. Not nameable outside the crate.
    pub trait QueryBase {
        fn base(&self) -> &GenericQuery;

        fn base_mut(&mut self) -> &mut GenericQuery;
    }
}

use sealed::QueryBase;

/// Operations every resource query offers, unless it says otherwise.
///
/// A refused operation cannot be reached through the wrapped base:
///
/// ```compile_fail
/// use addb_core::{IllHaveOnesQuery, QueryCapabilities};
///
/// fn bypass(feed: &mut IllHaveOnesQuery) {
///     let _ = feed.base_mut().load("x", |_| {});
/// }
/// ```
pub trait QueryCapabilities: QueryBase {
    /// Load one entity by id.
    fn load<F>(&mut self, id: &str, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.base_mut().run_load(id, on_complete)
    }

    /// Load the set matching the filters accumulated so far.
    fn load_set<F>(&mut self, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.base_mut().run_load_set(on_complete)
    }

    /// Name search, e.g. for autocomplete.
    fn quick_search<F>(&mut self, text: &str, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.base_mut().run_quick_search(text, on_complete)
    }

    fn find<F>(&mut self, criteria: &FindCriteria, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.base_mut().run_find(criteria, on_complete)
    }

    /// Start the result at index `amount`.
    fn skip(&mut self, amount: u32) -> Result<&mut Self, QueryError>
    where
        Self: Sized,
    {
        let base = self.base_mut();
        base.ensure_offered("skip")?;
        base.builder_mut().add_parameter("start", amount);
        Ok(self)
    }

    fn take(&mut self, amount: u32) -> &mut Self
    where
        Self: Sized,
    {
        self.base_mut().builder_mut().add_parameter("pageSize", amount);
        self
    }

    fn url(&self) -> String {
        self.base().builder().url()
    }
}

impl QueryBase for GenericQuery {
    fn base(&self) -> &GenericQuery {
        self
    }

    fn base_mut(&mut self) -> &mut GenericQuery {
        self
    }
}

impl QueryCapabilities for GenericQuery {}

/// Field/value clauses joined into the service's query language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindCriteria {
    clauses: Vec<(String, ParamValue)>,
}

impl FindCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field:value`. Absent values are skipped.
    pub fn field(mut self, name: &str, value: impl IntoParam) -> Self {
        if let Some(value) = value.into_param() {
            self.clauses.push((name.to_string(), value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `Field:value AND Field:value`, field names capitalized.
    pub fn to_query(&self) -> String {
        self.clauses
            .iter()
            .map(|(name, value)| format!("{}:{value}", capitalize(name)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, Configuration};
    use crate::transport::InMemoryDocument;
    use std::sync::Arc;

    fn query(app_id: Option<&str>) -> (GenericQuery, Arc<InMemoryDocument>) {
        let document = Arc::new(InMemoryDocument::new());
        let config = Configuration::default().merge(ConfigOverrides {
            app_id: app_id.map(str::to_string),
            ..Default::default()
        });
        let registry = CallbackRegistry::new(config, document.clone());
        (GenericQuery::new(registry, "en", "glasses"), document)
    }

    #[test]
    fn new_query_carries_language_and_page_size() {
        let (q, _) = query(Some("app"));
        assert_eq!(q.url(), "http://addb.absolutdrinks.com/glasses/?lang=en&pageSize=25");
    }

    #[test]
    fn empty_language_falls_back_to_english() {
        let (q, _) = query(Some("app"));
        let q = GenericQuery::new(q.registry().clone(), "", "tools");
        assert_eq!(q.language(), "en");
    }

    #[test]
    fn find_joins_capitalized_clauses() {
        let criteria = FindCriteria::new().field("name", "Mojito").field("alcoholic", true);
        assert_eq!(criteria.to_query(), "Name:Mojito AND Alcoholic:true");
    }

    #[test]
    fn find_sets_single_parameter_on_fresh_state() {
        let (mut q, document) = query(Some("app"));
        q.builder_mut().append_key_value_filter("stale", "1");
        let criteria = FindCriteria::new().field("Name", "Mojito").field("Alcoholic", true);
        let id = q.find(&criteria, |_| {}).unwrap();
        assert_eq!(
            document.elements()[0].src,
            format!(
                "http://addb.absolutdrinks.com/glasses/?lang=en&pageSize=25&find=Name:Mojito%20AND%20Alcoholic:true&appId=app&callback={id}"
            )
        );
    }

    #[test]
    fn find_without_criteria_is_an_argument_error() {
        let (mut q, document) = query(Some("app"));
        let err = q.find(&FindCriteria::new(), |_| {}).unwrap_err();
        assert!(matches!(err, QueryError::Argument(_)));
        assert!(document.elements().is_empty());
    }

    #[test]
    fn load_resets_and_appends_id() {
        let (mut q, _) = query(Some("app"));
        q.take(5).skip(10).unwrap();
        q.builder_mut().append_key_value_filter("with", "x");
        q.load("highball", |_| {}).unwrap();
        let url = q.url();
        assert!(url.starts_with("http://addb.absolutdrinks.com/glasses/highball/?lang=en&pageSize=25&appId=app&callback="));
        assert!(!url.contains("start="));
    }

    #[test]
    fn load_with_empty_id_is_rejected() {
        let (mut q, _) = query(Some("app"));
        assert!(matches!(q.load("", |_| {}), Err(QueryError::Argument(_))));
    }

    #[test]
    fn missing_app_id_is_reported_before_bad_arguments() {
        let (mut q, document) = query(None);
        assert!(matches!(q.load("", |_| {}), Err(QueryError::Configuration(_))));
        assert!(matches!(q.find(&FindCriteria::new(), |_| {}), Err(QueryError::Configuration(_))));
        assert!(document.elements().is_empty());
    }

    #[test]
    fn refused_operations_are_refused_by_the_base() {
        let (q, document) = query(None);
        let mut q = GenericQuery::new(q.registry().clone(), "en", "illhaveones").refusing(&["load", "skip"]);
        let err = q.load("x", |_| {}).unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnsupportedOperation { resource: "illhaveones", operation: "load" }
        ));
        assert!(matches!(
            q.skip(3),
            Err(QueryError::UnsupportedOperation { operation: "skip", .. })
        ));
        assert!(q.builder().parameter("start").is_none());
        assert!(document.elements().is_empty());
    }

    #[test]
    fn quick_search_sets_parameter() {
        let (mut q, _) = query(Some("app"));
        q.quick_search("rocks", |_| {}).unwrap();
        assert_eq!(q.builder().parameter("quickSearch"), Some(&ParamValue::Text("rocks".into())));
    }

    #[test]
    fn terminal_calls_without_app_id_dispatch_nothing() {
        let (mut q, document) = query(None);
        let criteria = FindCriteria::new().field("name", "x");
        assert!(matches!(q.load("x", |_| {}), Err(QueryError::Configuration(_))));
        assert!(matches!(q.load_set(|_| {}), Err(QueryError::Configuration(_))));
        assert!(matches!(q.quick_search("x", |_| {}), Err(QueryError::Configuration(_))));
        assert!(matches!(q.find(&criteria, |_| {}), Err(QueryError::Configuration(_))));
        assert!(document.elements().is_empty());
        assert_eq!(q.registry().pending_count(), 0);
    }

    #[test]
    fn skip_and_take_chain() {
        let (mut q, _) = query(Some("app"));
        q.skip(20).unwrap().take(10);
        assert_eq!(q.url(), "http://addb.absolutdrinks.com/glasses/?lang=en&pageSize=10&start=20");
    }
}
