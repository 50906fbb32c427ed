//! Placeholder merge engine for HTML templates.
//!
//! Resolves `{{variable}}`, `{{#if}}`/`{{else}}` and `{{#each}}` constructs
//! against a data record. The merge never fails: missing keys render as
//! empty strings and any token left over after all passes is stripped, so
//! the output contains no `{{..}}` sequences.

use lazy_static::lazy_static;
use regex::{Captures, NoExpand, Regex};
use serde_json::Value;

lazy_static! {
    static ref EACH_RE: Regex =
        Regex::new(r"\{\{#each\s+([A-Za-z_][\w.]*)\s*\}\}((?s).*?)\{\{/each\}\}").unwrap();
    static ref IF_RE: Regex =
        Regex::new(r"\{\{#if\s+([A-Za-z_][\w.]*)\s*\}\}((?s).*?)\{\{/if\}\}").unwrap();
    static ref THIS_PROP_RE: Regex = Regex::new(r"\{\{\s*this\.([\w.]+)\s*\}\}").unwrap();
    static ref THIS_RE: Regex = Regex::new(r"\{\{\s*this\s*\}\}").unwrap();
    static ref INDEX_RE: Regex = Regex::new(r"\{\{\s*@index\s*\}\}").unwrap();
    static ref VAR_RE: Regex = Regex::new(r"\{\{\s*([A-Za-z_][\w.]*)\s*\}\}").unwrap();
    static ref STRIP_RE: Regex = Regex::new(r"\{\{[^{}]*\}\}").unwrap();
}

/// Merge a template string against a data record.
///
/// Processing order is loops, then conditionals, then plain variables, each
/// in a single pass. A nested `{{#each}}` inside a loop body is therefore
/// not re-expanded; this mirrors the behavior the template builder was
/// written against and is documented rather than fixed.
pub fn merge(template: &str, data: &Value) -> String {
    let out = expand_loops(template, data);
    let out = expand_conditionals(&out, data);
    let out = substitute_variables(&out, data);
    STRIP_RE.replace_all(&out, "").into_owned()
}

fn expand_loops(template: &str, data: &Value) -> String {
    EACH_RE
        .replace_all(template, |caps: &Captures| {
            let items = match resolve_path(data, &caps[1]) {
                Some(Value::Array(items)) => items,
                // Anything that is not an array yields empty output.
                _ => return String::new(),
            };
            let body = &caps[2];
            let mut out = String::new();
            for (index, item) in items.iter().enumerate() {
                let mut pass = THIS_PROP_RE
                    .replace_all(body, |prop: &Captures| {
                        resolve_path(item, &prop[1]).map(stringify).unwrap_or_default()
                    })
                    .into_owned();
                pass = THIS_RE
                    .replace_all(&pass, NoExpand(stringify(item).as_str()))
                    .into_owned();
                pass = INDEX_RE
                    .replace_all(&pass, NoExpand(index.to_string().as_str()))
                    .into_owned();
                out.push_str(&pass);
            }
            out
        })
        .into_owned()
}

fn expand_conditionals(template: &str, data: &Value) -> String {
    IF_RE
        .replace_all(template, |caps: &Captures| {
            let truthy = resolve_path(data, &caps[1]).map(is_truthy).unwrap_or(false);
            let body = &caps[2];
            let (then_block, else_block) = match body.split_once("{{else}}") {
                Some((t, e)) => (t, e),
                None => (body as &str, ""),
            };
            if truthy { then_block } else { else_block }.to_string()
        })
        .into_owned()
}

fn substitute_variables(template: &str, data: &Value) -> String {
    VAR_RE
        .replace_all(template, |caps: &Captures| {
            resolve_path(data, &caps[1]).map(stringify).unwrap_or_default()
        })
        .into_owned()
}

/// Walk a dot-separated path through nested objects.
pub(crate) fn resolve_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// JavaScript-style truthiness: null, false, 0 and "" are falsy, everything
/// else (including empty arrays and objects) is truthy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value as template text. Strings come through verbatim,
/// null as empty, arrays comma-joined; objects have no sensible inline
/// form and render empty.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => String::new(),
    }
}
