//! Rendering refined documents into the edition template.
//!
//! Templates are plain TEI files with `{{ path }}` placeholders resolved
//! against the JSON form of a [`RenderContext`]:
//!
//! ```text
//! <title>{{ doc_metadata.title | e }}</title>
//! <text>{{ body }}</text>
//! ```
//!
//! Strings are inserted verbatim (the body and facsimile are markup already),
//! numbers and booleans as their JSON text, and missing values as nothing.
//! The only filter is `e`, which escapes the value for XML.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use quick_xml::escape::escape;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;

use crate::error::{RefineError, Result};
use crate::metadata::{DocumentMetadata, ProjectMetadata};

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*(?:\|\s*([A-Za-z_]+)\s*)?\}\}",
    )
    .expect("valid regex")
});

/// Everything a document template can refer to.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub project_md: ProjectMetadata,
    pub doc_metadata: DocumentMetadata,
    /// Segmented body markup.
    pub body: String,
    /// Facsimile markup.
    pub faksimile: String,
}

/// Turns a [`RenderContext`] into a complete document.
pub trait TemplateRenderer {
    fn render(&self, context: &RenderContext) -> Result<String>;
}

/// A template with `{{ dotted.path }}` placeholders.
#[derive(Debug, Clone)]
pub struct PlaceholderTemplate {
    path: PathBuf,
    source: String,
}

impl PlaceholderTemplate {
    /// Load a template file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| RefineError::Template {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::new(path, source))
    }

    /// Use `source` as template text; `path` only names it in errors.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Substitute every placeholder with its value from `values`.
    pub fn render_value(&self, values: &Value) -> Result<String> {
        let mut failure = None;
        let rendered = PLACEHOLDER.replace_all(&self.source, |caps: &Captures<'_>| {
            let key = &caps[1];
            let text = lookup(values, key).map_or_else(
                || {
                    tracing::debug!(key, "Template value missing, rendering empty");
                    String::new()
                },
                value_text,
            );
            match caps.get(2).map(|m| m.as_str()) {
                None => text,
                Some("e") => escape(text.as_str()).into_owned(),
                Some(other) => {
                    if failure.is_none() {
                        failure = Some(format!("unknown filter '{other}' on '{key}'"));
                    }
                    String::new()
                }
            }
        });

        match failure {
            Some(message) => Err(RefineError::Template {
                path: self.path.clone(),
                message,
            }),
            None => Ok(rendered.into_owned()),
        }
    }
}

impl TemplateRenderer for PlaceholderTemplate {
    fn render(&self, context: &RenderContext) -> Result<String> {
        self.render_value(&serde_json::to_value(context)?)
    }
}

/// Follow a dotted path through nested objects.
fn lookup<'a>(values: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(values, |current, part| current.get(part))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => {
            tracing::debug!("Rendering structured template value as JSON");
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(source: &str, values: Value) -> Result<String> {
        PlaceholderTemplate::new("test.xml", source).render_value(&values)
    }

    #[test]
    fn test_render_dotted_path() {
        let out = render(
            "<title>{{ doc_metadata.title }}</title><idno>{{doc_metadata.bv_id}}</idno>",
            json!({"doc_metadata": {"title": "Entwurf", "bv_id": "bv_1"}}),
        )
        .unwrap();
        assert_eq!(out, "<title>Entwurf</title><idno>bv_1</idno>");
    }

    #[test]
    fn test_render_markup_verbatim() {
        let out = render("<text>{{ body }}</text>", json!({"body": "<body><p>x</p></body>"})).unwrap();
        assert_eq!(out, "<text><body><p>x</p></body></text>");
    }

    #[test]
    fn test_render_escape_filter() {
        let out = render("<t>{{ title | e }}</t>", json!({"title": "A & <B>"})).unwrap();
        assert_eq!(out, "<t>A &amp; &lt;B&gt;</t>");
    }

    #[test]
    fn test_render_missing_and_scalars() {
        let out = render(
            "[{{ missing.key }}][{{ n }}][{{ flag }}][{{ none }}]",
            json!({"n": 3, "flag": true, "none": null}),
        )
        .unwrap();
        assert_eq!(out, "[][3][true][]");
    }

    #[test]
    fn test_render_unknown_filter() {
        let err = render("{{ title | upper }}", json!({"title": "x"})).unwrap_err();
        assert!(matches!(err, RefineError::Template { .. }));
    }

    #[test]
    fn test_render_context() {
        let context = RenderContext {
            project_md: ProjectMetadata(json!({"title": "Bundesverfassung"})),
            doc_metadata: DocumentMetadata {
                bv_id: "bv_1".to_string(),
                transkribus_col_id: "187".to_string(),
                transkribus_doc_id: "42".to_string(),
                extra: serde_json::Map::new(),
            },
            body: "<body/>".to_string(),
            faksimile: "<facsimile/>".to_string(),
        };
        let template = PlaceholderTemplate::new(
            "t.xml",
            "{{ project_md.title }}|{{ doc_metadata.transkribus_doc_id }}|{{ body }}|{{ faksimile }}",
        );
        assert_eq!(
            template.render(&context).unwrap(),
            "Bundesverfassung|42|<body/>|<facsimile/>"
        );
    }

    #[test]
    fn test_load_missing_template() {
        let err = PlaceholderTemplate::load(Path::new("/nonexistent/template.xml")).unwrap_err();
        assert!(matches!(err, RefineError::Template { .. }));
    }
}
