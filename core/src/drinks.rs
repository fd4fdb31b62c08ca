//! Drinks: the filterable listing resource.
//!
//! Filters become path segments (`/drinks/with/42/for/7/`). Ids may be
//! combined with `and` / `or`, either inline (`"vodka or gin"`) or with the
//! `and()` / `or()` calls that extend the last segment.

use serde::Deserialize;

use crate::error::QueryError;
use crate::query::sealed::QueryBase;
use crate::query::{GenericQuery, QueryCapabilities};
use crate::registry::CallbackRegistry;
use crate::response::Response;

pub const RESOURCE: &str = "drinks";

/// Options hash for `DrinksQuery::filter`. Present keys are applied in a
/// fixed order, which fixes the segment order of the URL.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrinkFilter {
    pub with_ingredient: Option<String>,
    pub for_occasion: Option<String>,
    pub made_with: Option<String>,
    pub tasting: Option<String>,
    pub of_type: Option<String>,
    pub rating: Option<String>,
    pub served_in: Option<String>,
    pub alcoholic: Option<bool>,
    pub carbonated: Option<bool>,
    pub video: Option<bool>,
    pub skill: Option<String>,
    pub with_type: Option<String>,
}

pub struct DrinksQuery {
    base: GenericQuery,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl DrinksQuery {
    pub fn new(registry: CallbackRegistry, language: &str) -> Self {
        Self {
            base: GenericQuery::new(registry, language, RESOURCE),
        }
    }

    fn filter_segment(&mut self, key: &str, value: &str) -> &mut Self {
        self.base.builder_mut().append_key_value_filter(key, value);
        self
    }

    pub fn with_ingredient(&mut self, ingredient: &str) -> &mut Self {
        self.filter_segment("with", ingredient)
    }

    pub fn with_type(&mut self, ingredient_type: &str) -> &mut Self {
        self.filter_segment("withtype", ingredient_type)
    }

    pub fn for_occasion(&mut self, occasion: &str) -> &mut Self {
        self.filter_segment("for", occasion)
    }

    pub fn made_with(&mut self, tool: &str) -> &mut Self {
        self.filter_segment("madeWith", tool)
    }

    pub fn tasting(&mut self, taste: &str) -> &mut Self {
        self.filter_segment("tasting", taste)
    }

    pub fn of_type(&mut self, drink_type: &str) -> &mut Self {
        self.filter_segment("oftype", drink_type)
    }

    /// `gt50`, `lte30` and so on.
    pub fn rating(&mut self, rating: &str) -> &mut Self {
        self.filter_segment("rating", rating)
    }

    pub fn served_in(&mut self, glass: &str) -> &mut Self {
        self.filter_segment("servedin", glass)
    }

    pub fn alcoholic(&mut self, is_alcoholic: bool) -> &mut Self {
        self.filter_segment("alcoholic", yes_no(is_alcoholic))
    }

    pub fn carbonated(&mut self, is_carbonated: bool) -> &mut Self {
        self.filter_segment("carbonated", yes_no(is_carbonated))
    }

    pub fn video(&mut self, has_video: bool) -> &mut Self {
        self.filter_segment("video", yes_no(has_video))
    }

    pub fn skill(&mut self, skill: &str) -> &mut Self {
        self.filter_segment("skill", skill)
    }

    pub fn and(&mut self, value: &str) -> &mut Self {
        self.base.builder_mut().append(&format!(" and {value}"));
        self
    }

    pub fn or(&mut self, value: &str) -> &mut Self {
        self.base.builder_mut().append(&format!(" or {value}"));
        self
    }

    /// Reset and ask for drinks similar to `drink_id`. Does not dispatch;
    /// follow with `load_set`.
    pub fn like(&mut self, drink_id: &str) -> &mut Self {
        self.base.restart();
        self.base.builder_mut().add_parameter("like", drink_id);
        self
    }

    /// Load the mixing instructions for one drink.
    pub fn how_to_mix<F>(&mut self, drink_id: &str, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.base.ensure_configured()?;
        if drink_id.is_empty() {
            return Err(QueryError::argument("you must provide the drink id"));
        }
        self.base.restart();
        let builder = self.base.builder_mut();
        builder.append_segment(drink_id);
        builder.append_segment("howtomix");
        self.base.dispatch(on_complete)
    }

    pub fn filter(&mut self, options: &DrinkFilter) -> &mut Self {
        if let Some(v) = &options.with_ingredient {
            self.with_ingredient(v);
        }
        if let Some(v) = &options.for_occasion {
            self.for_occasion(v);
        }
        if let Some(v) = &options.made_with {
            self.made_with(v);
        }
        if let Some(v) = &options.tasting {
            self.tasting(v);
        }
        if let Some(v) = &options.of_type {
            self.of_type(v);
        }
        if let Some(v) = &options.rating {
            self.rating(v);
        }
        if let Some(v) = &options.served_in {
            self.served_in(v);
        }
        if let Some(v) = options.alcoholic {
            self.alcoholic(v);
        }
        if let Some(v) = options.carbonated {
            self.carbonated(v);
        }
        if let Some(v) = options.video {
            self.video(v);
        }
        if let Some(v) = &options.skill {
            self.skill(v);
        }
        if let Some(v) = &options.with_type {
            self.with_type(v);
        }
        self
    }
}

impl QueryBase for DrinksQuery {
    fn base(&self) -> &GenericQuery {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GenericQuery {
        &mut self.base
    }
}

impl QueryCapabilities for DrinksQuery {}
