//! Helpers for catalog text: entity references and recipe lines.
//!
//! Descriptions embed references as `[name|type|id]`.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^|]+)\|([^|]+)\|([^|]+)\]").expect("reference pattern is valid")
});

/// Replace every reference with `transformer(name, type, id)`.
pub fn transform<F>(text: &str, transformer: F) -> String
where
    F: Fn(&str, &str, &str) -> String,
{
    REFERENCE
        .replace_all(text, |caps: &Captures| transformer(&caps[1], &caps[2], &caps[3]))
        .into_owned()
}

/// Keep only the referenced names.
pub fn clean(text: &str) -> String {
    transform(text, |name, _, _| name.to_string())
}

/// One line of a drink's ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lines worth showing: `ice` and `decoration` are dropped unless
/// `show_hidden`, and the markup characters `[`, `*`, `]` are stripped.
pub fn visible_lines(lines: Vec<RecipeLine>, show_hidden: bool) -> Vec<RecipeLine> {
    lines
        .into_iter()
        .filter(|line| show_hidden || !matches!(line.kind.as_str(), "ice" | "decoration"))
        .map(|mut line| {
            line.text.retain(|c| !matches!(c, '[' | '*' | ']'));
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_keeps_names() {
        let text = "Shake [Absolut Vodka|ingredient|absolut-vodka] with [ice|ingredient|ice].";
        assert_eq!(clean(text), "Shake Absolut Vodka with ice.");
    }

    #[test]
    fn transform_passes_all_parts() {
        let text = "Add [Lime|ingredient|fruit-lime]";
        let linked = transform(text, |name, kind, id| format!("<a href=\"/{kind}/{id}\">{name}</a>"));
        assert_eq!(linked, "Add <a href=\"/ingredient/fruit-lime\">Lime</a>");
    }

    #[test]
    fn text_without_references_is_unchanged() {
        assert_eq!(clean("plain [text]"), "plain [text]");
    }

    fn line(kind: &str, text: &str) -> RecipeLine {
        RecipeLine {
            kind: kind.to_string(),
            text: text.to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn hidden_lines_are_dropped_and_markup_stripped() {
        let lines = vec![
            line("ingredient", "4 Parts [Absolut Vodka]*"),
            line("ice", "Ice Cubes"),
            line("decoration", "Lime"),
        ];
        let visible = visible_lines(lines.clone(), false);
        assert_eq!(visible, vec![line("ingredient", "4 Parts Absolut Vodka")]);
        assert_eq!(visible_lines(lines, true).len(), 3);
    }

    #[test]
    fn recipe_line_keeps_unknown_fields() {
        let parsed: RecipeLine =
            serde_json::from_str(r#"{"type":"ingredient","text":"x","id":"vodka"}"#).unwrap();
        assert_eq!(parsed.extra.get("id"), Some(&Value::String("vodka".to_string())));
    }
}
