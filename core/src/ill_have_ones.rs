//! "I'll have one": the recommendation feed.
//!
//! The feed is a stream, so single-entity `load` and offset paging with
//! `skip` are refused. Page forward with `from_id` instead.

use serde::Deserialize;

use crate::error::QueryError;
use crate::query::sealed::QueryBase;
use crate::query::{GenericQuery, QueryCapabilities};
use crate::registry::CallbackRegistry;
use crate::url::ParamValue;

pub const RESOURCE: &str = "illhaveones";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IllHaveOneFilter {
    pub for_drinks: Option<String>,
    pub by_edition: Option<String>,
    pub in_city: Option<String>,
    pub in_country: Option<String>,
    pub near: Option<GeoPoint>,
}

pub struct IllHaveOnesQuery {
    base: GenericQuery,
}

impl IllHaveOnesQuery {
    pub fn new(registry: CallbackRegistry, language: &str) -> Self {
        Self {
            base: GenericQuery::new(registry, language, RESOURCE).refusing(&["load", "skip"]),
        }
    }

    pub fn with_auth_token(&mut self, auth_token: &str) -> &mut Self {
        self.base.builder_mut().add_parameter("authtoken", auth_token);
        self
    }

    pub fn friends_only(&mut self) -> &mut Self {
        self.base.builder_mut().add_parameter("friendsonly", ParamValue::Null);
        self
    }

    /// Continue the feed after the entry with `id`.
    pub fn from_id(&mut self, id: &str) -> &mut Self {
        self.base.builder_mut().add_parameter("fromId", id);
        self
    }

    pub fn for_drinks(&mut self, drinks: &str) -> &mut Self {
        self.base.builder_mut().append_key_value_filter("bydrinks", drinks);
        self
    }

    /// Entries within `radius` of a coordinate. Both coordinates must be
    /// finite numbers.
    pub fn near(&mut self, lat: f64, lng: f64, radius: Option<f64>) -> Result<&mut Self, QueryError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(QueryError::argument("you must provide both lat and lng"));
        }
        let mut location = format!("{lat},{lng}");
        if let Some(radius) = radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(QueryError::argument("radius must be a positive number"));
            }
            location.push_str(&format!(",{radius}"));
        }
        self.base.builder_mut().append_key_value_filter("near", &location);
        Ok(self)
    }

    pub fn by_edition(&mut self, edition: &str) -> &mut Self {
        self.base.builder_mut().append_key_value_filter("byedition", edition);
        self
    }

    pub fn in_city(&mut self, city: &str) -> &mut Self {
        self.base.builder_mut().append_key_value_filter("incity", city);
        self
    }

    pub fn in_country(&mut self, country: &str) -> &mut Self {
        self.base.builder_mut().append_key_value_filter("incountry", country);
        self
    }

    pub fn filter(&mut self, options: &IllHaveOneFilter) -> Result<&mut Self, QueryError> {
        if let Some(v) = &options.for_drinks {
            self.for_drinks(v);
        }
        if let Some(v) = &options.by_edition {
            self.by_edition(v);
        }
        if let Some(v) = &options.in_city {
            self.in_city(v);
        }
        if let Some(v) = &options.in_country {
            self.in_country(v);
        }
        if let Some(point) = options.near {
            self.near(point.lat, point.lng, point.radius)?;
        }
        Ok(self)
    }
}

impl QueryBase for IllHaveOnesQuery {
    fn base(&self) -> &GenericQuery {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GenericQuery {
        &mut self.base
    }
}

impl QueryCapabilities for IllHaveOnesQuery {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, Configuration};
    use crate::transport::InMemoryDocument;
    use std::sync::Arc;

    fn feed() -> (IllHaveOnesQuery, Arc<InMemoryDocument>) {
        let document = Arc::new(InMemoryDocument::new());
        let config = Configuration::default().merge(ConfigOverrides {
            app_id: Some("app".to_string()),
            ..Default::default()
        });
        let registry = CallbackRegistry::new(config, document.clone());
        (IllHaveOnesQuery::new(registry, "en"), document)
    }

    #[test]
    fn load_and_skip_are_refused_without_dispatch() {
        let (mut q, document) = feed();
        let before = q.url();

        let err = q.load("x", |_| {}).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnsupportedOperation {
                resource: "illhaveones",
                operation: "load"
            }
        );
        assert!(matches!(
            q.skip(10),
            Err(QueryError::UnsupportedOperation { operation: "skip", .. })
        ));

        assert_eq!(q.url(), before);
        assert!(document.elements().is_empty());
        assert_eq!(q.base().registry().pending_count(), 0);
    }

    fn drive<Q: QueryCapabilities>(q: &mut Q) -> (QueryError, QueryError) {
        let load = q.load("x", |_| {}).unwrap_err();
        let skip = q.skip(10).err().unwrap();
        (load, skip)
    }

    #[test]
    fn refused_through_every_route() {
        let (mut q, document) = feed();

        let (load, skip) = drive(&mut q);
        assert!(matches!(load, QueryError::UnsupportedOperation { operation: "load", .. }));
        assert!(matches!(skip, QueryError::UnsupportedOperation { operation: "skip", .. }));

        let (load, skip) = drive(q.base_mut());
        assert!(matches!(load, QueryError::UnsupportedOperation { operation: "load", .. }));
        assert!(matches!(skip, QueryError::UnsupportedOperation { operation: "skip", .. }));

        assert!(q.base().builder().parameter("start").is_none());
        assert!(document.elements().is_empty());
        assert_eq!(q.base().registry().pending_count(), 0);
    }

    #[test]
    fn take_and_load_set_still_work() {
        let (mut q, document) = feed();
        q.take(5).with_auth_token("tok").friends_only().from_id("abc");
        q.load_set(|_| {}).unwrap();
        let elements = document.elements();
        assert!(elements[0].src.starts_with(
            "http://addb.absolutdrinks.com/illhaveones/?lang=en&pageSize=5&authtoken=tok&friendsonly=null&fromId=abc&appId=app"
        ));
    }

    #[test]
    fn near_formats_coordinates() {
        let (mut q, _) = feed();
        q.near(59.33, 18.06, Some(10.0)).unwrap();
        assert!(q.url().contains("/near/59.33,18.06,10/"));
    }

    #[test]
    fn near_rejects_malformed_coordinates() {
        let (mut q, _) = feed();
        assert!(matches!(q.near(f64::NAN, 18.0, None), Err(QueryError::Argument(_))));
        assert!(matches!(q.near(59.0, 18.0, Some(-1.0)), Err(QueryError::Argument(_))));
        assert!(!q.url().contains("near"));
    }

    #[test]
    fn filter_applies_location_vocabulary_in_order() {
        let (mut q, _) = feed();
        let options: IllHaveOneFilter = serde_json::from_str(
            r#"{"inCountry":"se","forDrinks":"mojito","inCity":"stockholm"}"#,
        )
        .unwrap();
        q.filter(&options).unwrap();
        assert!(q
            .url()
            .contains("/illhaveones/bydrinks/mojito/incity/stockholm/incountry/se/"));
    }
}
