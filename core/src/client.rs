//! Root client: configuration, the shared registry, and one factory per
//! catalog resource.
//!
//! # Design
//! `Addb` holds only a `CallbackRegistry`, which in turn owns the merged
//! configuration, the transport and the pending table. Every query created
//! from the same `Addb` shares that registry, so completions for all of them
//! are routed through one table. Queries are independent builders; two
//! queries never share URL state.

use std::sync::Arc;

use crate::collections::UserCollectionsQuery;
use crate::config::{ConfigOverrides, Configuration};
use crate::drinks::{DrinkFilter, DrinksQuery};
use crate::ill_have_ones::IllHaveOnesQuery;
use crate::occasions::OccasionsQuery;
use crate::query::GenericQuery;
use crate::registry::CallbackRegistry;
use crate::transport::Transport;

#[derive(Clone)]
pub struct Addb {
    registry: CallbackRegistry,
}

impl Addb {
    pub fn new(config: Configuration, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: CallbackRegistry::new(config, transport),
        }
    }

    /// Merge `overrides` over the built-in defaults.
    pub fn init(overrides: ConfigOverrides, transport: Arc<dyn Transport>) -> Self {
        Self::new(Configuration::default().merge(overrides), transport)
    }

    pub fn configuration(&self) -> &Configuration {
        self.registry.config()
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    fn generic(&self, language: &str, resource: &'static str) -> GenericQuery {
        GenericQuery::new(self.registry.clone(), language, resource)
    }

    pub fn actions(&self, language: &str) -> GenericQuery {
        self.generic(language, "actions")
    }

    pub fn drinks(&self, language: &str) -> DrinksQuery {
        DrinksQuery::new(self.registry.clone(), language)
    }

    /// Drinks query with an options hash applied up front.
    pub fn drinks_with(&self, language: &str, filter: &DrinkFilter) -> DrinksQuery {
        let mut query = self.drinks(language);
        query.filter(filter);
        query
    }

    pub fn drink_types(&self, language: &str) -> GenericQuery {
        self.generic(language, "drinktypes")
    }

    pub fn glasses(&self, language: &str) -> GenericQuery {
        self.generic(language, "glasses")
    }

    pub fn ill_have_ones(&self, language: &str) -> IllHaveOnesQuery {
        IllHaveOnesQuery::new(self.registry.clone(), language)
    }

    pub fn ingredients(&self, language: &str) -> GenericQuery {
        self.generic(language, "ingredients")
    }

    pub fn ingredient_types(&self, language: &str) -> GenericQuery {
        self.generic(language, "ingredienttypes")
    }

    pub fn occasions(&self, language: &str) -> OccasionsQuery {
        OccasionsQuery::new(self.registry.clone(), language)
    }

    pub fn tastes(&self, language: &str) -> GenericQuery {
        self.generic(language, "tastes")
    }

    pub fn tools(&self, language: &str) -> GenericQuery {
        self.generic(language, "tools")
    }

    pub fn user_collections(&self, language: &str, auth_token: Option<&str>) -> UserCollectionsQuery {
        UserCollectionsQuery::new(self.registry.clone(), language, auth_token)
    }
}
