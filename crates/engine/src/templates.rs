//! Template parsing and resolution for step inputs.
//!
//! Step inputs embed `{{ path.to.value }}` placeholders. Each placeholder is a dot-separated path
//! resolved against a [`TemplateContext`], a small tree of text leaves and ordered mappings.
//! Resolution is all-or-nothing: the first path that cannot be resolved fails the whole template.

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

/// Failure to resolve a template placeholder.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A path segment was absent from its parent mapping.
    #[error("Unable to resolve template variable '{expression}'")]
    Unresolved {
        /// Raw expression without delimiters or surrounding whitespace.
        expression: String,
    },
}

/// A node in the template lookup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    Text(String),
    Map(IndexMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Builds a mapping node from `(key, value)` pairs, keeping their order.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<TemplateValue>,
    {
        Self::Map(entries.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }

    fn child(&self, segment: &str) -> Option<&TemplateValue> {
        match self {
            Self::Map(entries) => entries.get(segment),
            Self::Text(_) => None,
        }
    }

    /// String form substituted into a template. Mappings render as compact JSON.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Map(_) => self.to_json().to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Map(entries) => Value::Object(entries.iter().map(|(key, value)| (key.clone(), value.to_json())).collect()),
        }
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<IndexMap<String, TemplateValue>> for TemplateValue {
    fn from(value: IndexMap<String, TemplateValue>) -> Self {
        Self::Map(value)
    }
}

/// Root mapping that template paths are resolved against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    root: IndexMap<String, TemplateValue>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a top-level entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TemplateValue>) {
        self.root.insert(key.into(), value.into());
    }

    /// Walks a dot-separated path from the root, one segment at a time.
    pub fn lookup(&self, expression: &str) -> Option<&TemplateValue> {
        let mut segments = expression.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }
}

/// Byte span and trimmed expression of one `{{ ... }}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder<'a> {
    start: usize,
    end: usize,
    expression: &'a str,
}

/// Finds the next placeholder at or after `cursor`.
///
/// A placeholder is `{{`, at least one character that is not `}`, then `}}`. Anything else,
/// such as an unterminated `{{` or an empty `{{}}`, stays literal text.
fn next_placeholder(text: &str, mut cursor: usize) -> Option<Placeholder<'_>> {
    while let Some(offset) = text[cursor..].find("{{") {
        let start = cursor + offset;
        let body_start = start + 2;
        let close = text[body_start..].find('}')?;
        let body_end = body_start + close;
        if close > 0 && text[body_end..].starts_with("}}") {
            return Some(Placeholder {
                start,
                end: body_end + 2,
                expression: text[body_start..body_end].trim(),
            });
        }
        cursor = start + 1;
    }
    None
}

/// Extracts the expressions of every placeholder in a template, in order.
///
/// Returned expressions do not include the `{{` or `}}` delimiters.
pub fn extract_template_expressions(template: &str) -> Vec<String> {
    let mut expressions = Vec::new();
    let mut cursor = 0;
    while let Some(placeholder) = next_placeholder(template, cursor) {
        expressions.push(placeholder.expression.to_string());
        cursor = placeholder.end;
    }
    expressions
}

/// Resolves a single expression to its string form.
pub fn resolve_template_expression(expression: &str, context: &TemplateContext) -> Result<String, TemplateError> {
    context
        .lookup(expression)
        .map(TemplateValue::render)
        .ok_or_else(|| TemplateError::Unresolved {
            expression: expression.to_string(),
        })
}

/// Replaces every placeholder in `template` with its resolved value.
///
/// Text outside placeholders is copied unchanged. If any placeholder fails to resolve the
/// error names that expression and no partially rendered string is produced.
///
/// ```rust
/// use conductor_engine::templates::{TemplateContext, TemplateValue, render_template};
///
/// let mut context = TemplateContext::new();
/// context.insert("inputs", TemplateValue::map([("topic", "demo")]));
///
/// let rendered = render_template("Plan for {{ inputs.topic }}", &context)?;
/// assert_eq!(rendered, "Plan for demo");
/// assert!(render_template("{{ inputs.missing }}", &context).is_err());
/// # Ok::<(), conductor_engine::templates::TemplateError>(())
/// ```
pub fn render_template(template: &str, context: &TemplateContext) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut cursor = 0;

    while let Some(placeholder) = next_placeholder(template, cursor) {
        rendered.push_str(&template[cursor..placeholder.start]);
        rendered.push_str(&resolve_template_expression(placeholder.expression, context)?);
        cursor = placeholder.end;
    }
    rendered.push_str(&template[cursor..]);

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> TemplateContext {
        let mut context = TemplateContext::new();
        context.insert("inputs", TemplateValue::map([("topic", "demo"), ("empty", "")]));
        context.insert(
            "steps",
            TemplateValue::map([("plan", TemplateValue::map([("output", "Planner shaped a path: demo")]))]),
        );
        context
    }

    #[test]
    fn resolves_nested_paths_and_ignores_whitespace() {
        let rendered = render_template("{{inputs.topic}} / {{   steps.plan.output  }}", &context()).expect("rendered");
        assert_eq!(rendered, "demo / Planner shaped a path: demo");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let template = "no placeholders here { } }} {{";
        assert_eq!(render_template(template, &context()).expect("rendered"), template);
        assert_eq!(render_template("", &context()).expect("rendered"), "");
    }

    #[test]
    fn missing_segment_fails_the_whole_template() {
        let error = render_template("{{ inputs.topic }} then {{ steps.build.output }}", &context()).expect_err("unresolved");
        assert_eq!(
            error,
            TemplateError::Unresolved {
                expression: "steps.build.output".into()
            }
        );
        assert_eq!(error.to_string(), "Unable to resolve template variable 'steps.build.output'");
    }

    #[test]
    fn descending_past_a_text_leaf_fails() {
        let error = render_template("{{ inputs.topic.length }}", &context()).expect_err("text has no children");
        assert!(matches!(error, TemplateError::Unresolved { ref expression } if expression == "inputs.topic.length"));
    }

    #[test]
    fn blank_placeholder_is_unresolved_but_empty_braces_are_literal() {
        assert!(render_template("{{   }}", &context()).is_err());
        assert_eq!(render_template("{{}}", &context()).expect("literal"), "{{}}");
    }

    #[test]
    fn empty_values_substitute_as_empty_text() {
        assert_eq!(render_template("[{{ inputs.empty }}]", &context()).expect("rendered"), "[]");
    }

    #[test]
    fn mapping_values_render_as_json() {
        let rendered = render_template("{{ steps.plan }}", &context()).expect("rendered");
        assert_eq!(rendered, r#"{"output":"Planner shaped a path: demo"}"#);
    }

    #[test]
    fn rendering_is_deterministic() {
        let template = "{{ inputs.topic }}-{{ steps.plan.output }}";
        let first = render_template(template, &context()).expect("rendered");
        let second = render_template(template, &context()).expect("rendered");
        assert_eq!(first, second);
    }

    #[test]
    fn extracts_expressions_in_order() {
        let expressions = extract_template_expressions("{{ a.b }} and {{c}} but not {{ d");
        assert_eq!(expressions, vec!["a.b".to_string(), "c".to_string()]);
    }
}
