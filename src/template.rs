//! Environment interpolation for YAML configs
//!
//! Replaces `${VAR_NAME}` with the value of the environment variable.
//! Unknown variables are left verbatim so callers can tell that a value
//! was never resolved.

use regex::{Captures, Regex};
use serde_yaml::Value;
use std::sync::LazyLock;

/// Regex for matching placeholders: ${VAR_NAME}
static ENV_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Substitute placeholders in a single string
pub fn interpolate_env(input: &str) -> String {
    interpolate_with(input, |name| std::env::var(name).ok())
}

/// Substitute placeholders using a custom lookup
pub fn interpolate_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_REGEX
        .replace_all(input, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Whether a string still contains an unresolved placeholder
pub fn has_placeholder(input: &str) -> bool {
    ENV_REGEX.is_match(input)
}

/// Recursively substitute placeholders in every string of a YAML document
pub fn interpolate_yaml(value: &mut Value) {
    match value {
        Value::String(s) => {
            if has_placeholder(s) {
                *s = interpolate_env(s);
            }
        }
        Value::Sequence(items) => items.iter_mut().for_each(interpolate_yaml),
        Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                interpolate_yaml(v);
            }
        }
        Value::Tagged(tagged) => interpolate_yaml(&mut tagged.value),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
