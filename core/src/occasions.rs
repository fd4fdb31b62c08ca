//! Occasions, filterable by the moment they are active.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::QueryError;
use crate::query::sealed::QueryBase;
use crate::query::{GenericQuery, QueryCapabilities};
use crate::registry::CallbackRegistry;
use crate::response::Response;

pub const RESOURCE: &str = "occasions";

/// Date bucket understood by `activeat`:
/// `<year>-<month, 0-based>-<weekday, 0 = Sunday>!<hour + minute>`.
///
/// The last field is the arithmetic sum of hour and minute; the service was
/// built against clients that send it that way.
pub fn date_bucket(at: &NaiveDateTime) -> String {
    format!(
        "{}-{}-{}!{}",
        at.year(),
        at.month0(),
        at.weekday().num_days_from_sunday(),
        at.hour() + at.minute()
    )
}

pub struct OccasionsQuery {
    base: GenericQuery,
}

impl OccasionsQuery {
    pub fn new(registry: CallbackRegistry, language: &str) -> Self {
        Self {
            base: GenericQuery::new(registry, language, RESOURCE),
        }
    }

    /// Load the occasions active at `at`.
    pub fn active_at<F>(&mut self, at: NaiveDateTime, on_complete: F) -> Result<String, QueryError>
    where
        F: FnOnce(Result<Response, QueryError>) + Send + 'static,
    {
        self.base.ensure_configured()?;
        self.base.restart();
        self.base
            .builder_mut()
            .add_parameter("activeat", date_bucket(&at));
        self.base.dispatch(on_complete)
    }
}

impl QueryBase for OccasionsQuery {
    fn base(&self) -> &GenericQuery {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GenericQuery {
        &mut self.base
    }
}

impl QueryCapabilities for OccasionsQuery {}
