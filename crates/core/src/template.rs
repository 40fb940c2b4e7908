//! Template Rendering
//!
//! Substitutes `{path.to.value}` placeholders in prompt templates with values
//! looked up in a JSON context tree. Unresolved placeholders are left intact
//! so authors can spot them in the rendered prompt.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreResult;

/// Placeholder pattern (compiled once).
fn placeholder_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\}").ok()
    })
    .as_ref()
}

/// Resolve a dotted path (`a.b.c`) against a JSON context.
///
/// Returns `None` when any segment is missing or an intermediate value is not
/// an object.
pub fn resolve_path<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |current, key| match current {
        Value::Object(map) => map.get(key),
        _ => None,
    })
}

/// Text form of a resolved value, or `None` if it cannot be substituted.
fn value_to_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => Some(Cow::Owned(value.to_string())),
    }
}

/// Render `template` against `context`.
///
/// An empty template renders to an empty string. No escaping is performed.
pub fn render_template(template: &str, context: &Value) -> String {
    let Some(re) = placeholder_regex() else {
        return template.to_string();
    };

    re.replace_all(template, |caps: &Captures<'_>| {
        let whole = &caps[0];
        resolve_path(context, &caps[1])
            .and_then(value_to_text)
            .map(|text| text.into_owned())
            .unwrap_or_else(|| whole.to_string())
    })
    .into_owned()
}

/// Render `template` against any serializable context.
pub fn render_serializable<T: Serialize>(template: &str, context: &T) -> CoreResult<String> {
    let value = serde_json::to_value(context)?;
    Ok(render_template(template, &value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_nested_path() {
        let ctx = json!({"a": {"b": "world"}});
        assert_eq!(render_template("Hello {a.b}!", &ctx), "Hello world!");
    }

    #[test]
    fn test_unresolved_placeholder_is_preserved() {
        let ctx = json!({"a": {"b": "world"}});
        assert_eq!(render_template("Hello {a.c}!", &ctx), "Hello {a.c}!");
    }

    #[test]
    fn test_non_object_intermediate_is_preserved() {
        let ctx = json!({"a": "flat"});
        assert_eq!(render_template("{a.b}", &ctx), "{a.b}");
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(render_template("", &json!({"a": 1})), "");
    }

    #[test]
    fn test_numbers_and_bools() {
        let ctx = json!({"n": 42, "flag": true});
        assert_eq!(render_template("{n} {flag}", &ctx), "42 true");
    }

    #[test]
    fn test_null_is_left_unresolved() {
        let ctx = json!({"gone": null});
        assert_eq!(render_template("x{gone}y", &ctx), "x{gone}y");
    }

    #[test]
    fn test_non_identifier_braces_untouched() {
        let ctx = json!({"a": "b"});
        let template = r#"Reply as {"reactionDelay": 100} and { a } and {a}"#;
        assert_eq!(
            render_template(template, &ctx),
            r#"Reply as {"reactionDelay": 100} and { a } and b"#
        );
    }

    #[test]
    fn test_repeated_placeholders() {
        let ctx = json!({"character": {"name": "Mina"}});
        assert_eq!(
            render_template("{character.name}, {character.name}!", &ctx),
            "Mina, Mina!"
        );
    }

    #[test]
    fn test_render_serializable() {
        #[derive(Serialize)]
        struct Ctx {
            user: User,
        }
        #[derive(Serialize)]
        struct User {
            name: String,
        }

        let ctx = Ctx {
            user: User {
                name: "Jun".to_string(),
            },
        };
        let rendered = render_serializable("hi {user.name}", &ctx).unwrap();
        assert_eq!(rendered, "hi Jun");
    }

    #[test]
    fn test_resolve_path() {
        let ctx = json!({"a": {"b": {"c": 1}}});
        assert_eq!(resolve_path(&ctx, "a.b.c"), Some(&json!(1)));
        assert_eq!(resolve_path(&ctx, "a.x"), None);
    }
}
