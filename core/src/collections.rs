//! User-owned drink collections.
//!
//! Every write goes through the same cross-origin GET channel as reads; the
//! verb lives in the path (`create`, `<id>/update`, `<id>/delete`).

use crate::error::QueryError;
use crate::query::sealed::QueryBase;
use crate::query::{GenericQuery, QueryCapabilities};
use crate::registry::CallbackRegistry;
use crate::response::Response;

pub const RESOURCE: &str = "usercollections";

pub struct UserCollectionsQuery {
    base: GenericQuery,
    auth_token: Option<String>,
}

impl UserCollectionsQuery {
    pub fn new(registry: CallbackRegistry, language: &str, auth_token: Option<&str>) -> Self {
        let mut query = Self {
            base: GenericQuery::new(registry, language, RESOURCE),
            auth_token: auth_token.map(str::to_string),
        };
        query.apply_auth_token();
        query
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    fn apply_auth_token(&mut self) {
        let token = self.auth_token.clone();
        self.base.builder_mut().add_parameter("authToken", token);
    }

    fn start(&mut self, segments: &[&str]) -> Result<(), QueryError> {
        self.base.ensure_configured()?;
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(QueryError::argument("you must provide the collection id"));
        }
        self.base.restart();
        self.apply_auth_token();
        for segment in segments {
            self.base.builder_mut().append_segment(segment);
        }
        Ok(())
    }

    fn apply_contents(&mut self, name: &str, drinks: &[&str]) {
        let builder = self.base.builder_mut();
        builder.add_parameter("name", name);
        if !drinks.is_empty() {
            builder.add_parameter("drinklist", drinks.join(","));
        }
    }

    pub fn create<F>(&mut self, name: &str, drinks: &[&str], on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.start(&["create"])?;
        self.apply_contents(name, drinks);
        self.base.dispatch(on_complete)
    }

    pub fn update<F>(
        &mut self,
        id: &str,
        name: &str,
        drinks: &[&str],
        on_complete: F,
    ) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.start(&[id, "update"])?;
        self.apply_contents(name, drinks);
        self.base.dispatch(on_complete)
    }

    pub fn delete<F>(&mut self, id: &str, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.start(&[id, "delete"])?;
        self.base.dispatch(on_complete)
    }

    /// Drinks that can be made from the ingredients of the drinks in the
    /// collection.
    pub fn flipside<F>(&mut self, id: &str, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.start(&[id, "flipside"])?;
        self.base.dispatch(on_complete)
    }
}

impl QueryBase for UserCollectionsQuery {
    fn base(&self) -> &GenericQuery {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GenericQuery {
        &mut self.base
    }
}

impl QueryCapabilities for UserCollectionsQuery {}
