//! Template resolution — `{{expr}}` placeholders against invocation input
//! and prior step results.
//!
//! Two lookup forms:
//! - `{{name}}` — top-level variable from the invocation input
//! - `{{stepId.field.path}}` — dotted path into a prior step's result
//!
//! A template that is exactly one placeholder resolves to the looked-up
//! value with its native type preserved (number, object, sequence). Any
//! other template stringifies every match inline. Unresolvable expressions
//! are left verbatim so a partially-available context still produces a
//! usable result for diagnostics.

use indexmap::IndexMap;
use serde_json::Value;

/// Resolve a single template string.
pub fn resolve(
    template: &str,
    input: &IndexMap<String, Value>,
    step_results: &IndexMap<String, Value>,
) -> Value {
    let whole = regex::Regex::new(r"^\{\{\s*([^{}]+?)\s*\}\}$").unwrap();
    if let Some(caps) = whole.captures(template) {
        return match lookup(&caps[1], input, step_results) {
            Some(value) => value,
            None => Value::String(template.to_string()),
        };
    }

    let re = regex::Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").unwrap();
    let resolved = re.replace_all(template, |caps: &regex::Captures| {
        match lookup(&caps[1], input, step_results) {
            Some(value) => stringify(&value),
            None => caps[0].to_string(),
        }
    });
    Value::String(resolved.into_owned())
}

/// Resolve a whole step `inputs` mapping: every string value goes through
/// [`resolve`] independently, keys preserved; non-string values pass
/// through unchanged.
pub fn resolve_inputs(
    inputs: &IndexMap<String, Value>,
    input: &IndexMap<String, Value>,
    step_results: &IndexMap<String, Value>,
) -> IndexMap<String, Value> {
    inputs
        .iter()
        .map(|(key, value)| {
            let resolved = match value {
                Value::String(template) => resolve(template, input, step_results),
                other => other.clone(),
            };
            (key.clone(), resolved)
        })
        .collect()
}

/// Look up one expression. A dot splits it into a step id and a field path
/// into that step's result; otherwise it names an invocation input.
fn lookup(
    expr: &str,
    input: &IndexMap<String, Value>,
    step_results: &IndexMap<String, Value>,
) -> Option<Value> {
    match expr.split_once('.') {
        Some((step_id, path)) => {
            let result = step_results.get(step_id)?;
            lookup_path(result, path).cloned()
        }
        None => input.get(expr).cloned(),
    }
}

/// Follow a dotted field path into a JSON value.
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Inline stringification: strings as-is, everything else compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
