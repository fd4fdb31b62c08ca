//! Request URL assembly: path segments plus an ordered parameter set.
//!
//! # Design
//! Filters read as REST path fragments (`/drinks/with/42/for/7`) while control
//! values (language, paging, search terms) stay in the query string. The two
//! are accumulated separately and only joined by `url()`.
//!
//! Values are written verbatim. Percent-encoding happens once, when a
//! transport turns the URL into an element source.

use std::fmt;

use crate::config::Configuration;

/// A scalar query-string value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Rendered as the literal `null`, which the service reads as a bare flag.
    Null,
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Float(n) => write!(f, "{n}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Null => f.write_str("null"),
        }
    }
}

/// Conversion into an optional parameter value. `None` means "absent", and an
/// absent value never creates a parameter.
pub trait IntoParam {
    fn into_param(self) -> Option<ParamValue>;
}

impl IntoParam for ParamValue {
    fn into_param(self) -> Option<ParamValue> {
        Some(self)
    }
}

impl IntoParam for &str {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Text(self.to_string()))
    }
}

impl IntoParam for String {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Text(self))
    }
}

impl IntoParam for &String {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Text(self.clone()))
    }
}

impl IntoParam for bool {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Bool(self))
    }
}

impl IntoParam for f64 {
    fn into_param(self) -> Option<ParamValue> {
        Some(ParamValue::Float(self))
    }
}

macro_rules! int_into_param {
    ($($t:ty),*) => {
        $(impl IntoParam for $t {
            fn into_param(self) -> Option<ParamValue> {
                Some(ParamValue::Int(self as i64))
            }
        })*
    };
}

int_into_param!(i32, i64, u32, u64, usize);

impl<T: IntoParam> IntoParam for Option<T> {
    fn into_param(self) -> Option<ParamValue> {
        self.and_then(IntoParam::into_param)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
}

/// Accumulates a request path and its parameters.
///
/// `path` always starts with the origin (`scheme://host`) computed at the
/// last `reset`.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    path: String,
    parameters: Vec<Parameter>,
}

impl UrlBuilder {
    pub fn new(initial_path: &str, config: &Configuration) -> Self {
        let mut builder = Self {
            path: String::new(),
            parameters: Vec::new(),
        };
        builder.reset(initial_path, config);
        builder
    }

    /// Drop all parameters and segments, then re-seed the path from the
    /// configured origin and `initial_path`.
    pub fn reset(&mut self, initial_path: &str, config: &Configuration) {
        self.parameters.clear();
        self.path = config.origin();
        if !initial_path.is_empty() {
            self.append_segment(initial_path);
        }
    }

    /// Upsert by name. The first insertion fixes the position; later calls
    /// only replace the value. An absent value is ignored.
    pub fn add_parameter(&mut self, name: &str, value: impl IntoParam) {
        let Some(value) = value.into_param() else {
            return;
        };
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.parameters.push(Parameter {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Append `segment` with exactly one `/` between it and the current path.
    pub fn append_segment(&mut self, segment: &str) {
        let segment = segment.trim_start_matches('/');
        if segment.is_empty() {
            return;
        }
        if !self.path.is_empty() && !self.path.ends_with('/') {
            self.path.push('/');
        }
        self.path.push_str(segment);
    }

    pub fn append_key_value_filter(&mut self, key: &str, value: &str) {
        self.append_segment(&format!("{key}/{value}"));
    }

    /// Append raw text to the path, with no separator handling.
    pub fn append(&mut self, text: &str) {
        self.path.push_str(text);
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// `<path>/` followed by `?name=value&...` in insertion order.
    pub fn url(&self) -> String {
        let mut url = self.path.clone();
        if !url.ends_with('/') {
            url.push('/');
        }
        for (i, p) in self.parameters.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&p.name);
            url.push('=');
            url.push_str(&p.value.to_string());
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(initial: &str) -> UrlBuilder {
        UrlBuilder::new(initial, &Configuration::default())
    }

    #[test]
    fn url_has_trailing_slash_and_no_query_without_parameters() {
        assert_eq!(builder("drinks").url(), "http://addb.absolutdrinks.com/drinks/");
    }

    #[test]
    fn same_name_keeps_first_position_and_last_value() {
        let mut b = builder("drinks");
        b.add_parameter("lang", "en");
        b.add_parameter("pageSize", 25u32);
        b.add_parameter("lang", "sv");
        b.add_parameter("lang", "de");
        assert_eq!(b.url(), "http://addb.absolutdrinks.com/drinks/?lang=de&pageSize=25");
        assert_eq!(b.parameters().len(), 2);
    }

    #[test]
    fn absent_value_adds_nothing() {
        let mut b = builder("drinks");
        b.add_parameter("start", None::<u32>);
        assert!(b.parameters().is_empty());
        b.add_parameter("start", 5u32);
        b.add_parameter("start", None::<u32>);
        assert_eq!(b.parameter("start"), Some(&ParamValue::Int(5)));
    }

    #[test]
    fn null_value_is_kept_as_literal() {
        let mut b = builder("illhaveones");
        b.add_parameter("friendsonly", ParamValue::Null);
        assert!(b.url().ends_with("?friendsonly=null"));
    }

    #[test]
    fn segment_separator_is_normalized_for_every_combination() {
        let cases = [
            ("drinks", "with", "/drinks/with"),
            ("drinks/", "with", "/drinks/with"),
            ("drinks", "/with", "/drinks/with"),
            ("drinks/", "/with", "/drinks/with"),
            ("drinks/", "//with", "/drinks/with"),
            ("drinks", "//with", "/drinks/with"),
        ];
        for (initial, segment, expected) in cases {
            let mut b = builder(initial);
            b.append_segment(segment);
            assert!(
                b.path().ends_with(expected),
                "{initial:?} + {segment:?} gave {}",
                b.path()
            );
            assert!(!b.path()["http://".len()..].contains("//"));
        }
    }

    #[test]
    fn empty_segment_is_ignored() {
        let mut b = builder("drinks");
        b.append_segment("");
        b.append_segment("//");
        assert_eq!(b.path(), "http://addb.absolutdrinks.com/drinks");
    }

    #[test]
    fn key_value_filters_accumulate_without_dedup() {
        let mut b = builder("drinks");
        b.append_key_value_filter("with", "1");
        b.append_key_value_filter("with", "1");
        assert_eq!(b.url(), "http://addb.absolutdrinks.com/drinks/with/1/with/1/");
    }

    #[test]
    fn reset_clears_parameters_and_segments() {
        let mut b = builder("drinks");
        b.append_key_value_filter("for", "party");
        b.add_parameter("lang", "en");
        let mut config = Configuration::default();
        config.secure_origin = true;
        b.reset("drinks", &config);
        assert_eq!(b.url(), "https://addb.absolutdrinks.com/drinks/");
    }

    #[test]
    fn raw_append_extends_last_segment() {
        let mut b = builder("drinks");
        b.append_key_value_filter("with", "vodka");
        b.append(" or gin");
        assert_eq!(b.path(), "http://addb.absolutdrinks.com/drinks/with/vodka or gin");
    }
}
