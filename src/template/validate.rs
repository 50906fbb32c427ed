//! Security validation and variable extraction for HTML templates.
//!
//! Validation happens when a template is saved, not at render time; the
//! generation path assumes templates passed through here.

use std::collections::{BTreeSet, HashMap};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OPEN_TAG_RE: Regex = Regex::new(r"<([A-Za-z][A-Za-z0-9]*)").unwrap();
    static ref CLOSE_TAG_RE: Regex = Regex::new(r"</([A-Za-z][A-Za-z0-9]*)").unwrap();
    static ref TOKEN_RE: Regex = Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").unwrap();
}

/// Tags that never take a closing counterpart, excluded from the
/// balance heuristic.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Outcome of template validation. Errors are fatal; warnings are advisory.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Reject templates carrying `<script>` or `<iframe>` tags and warn on
/// unbalanced tag counts.
///
/// The balance check is a coarse counter, not an HTML parser: it flags
/// `<div>` openers without a matching `</div>` count and vice versa, which
/// is enough to catch truncated templates pasted into the builder.
pub fn validate_template_html(html: &str) -> ValidationReport {
    let mut report = ValidationReport {
        is_valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let lowered = html.to_lowercase();
    if lowered.contains("<script") {
        report
            .errors
            .push("template contains a <script> tag, which is not allowed".to_string());
    }
    if lowered.contains("<iframe") {
        report
            .errors
            .push("template contains an <iframe> tag, which is not allowed".to_string());
    }

    let mut balance: HashMap<String, i64> = HashMap::new();
    for caps in OPEN_TAG_RE.captures_iter(html) {
        let tag = caps[1].to_lowercase();
        if !VOID_TAGS.contains(&tag.as_str()) {
            *balance.entry(tag).or_default() += 1;
        }
    }
    for caps in CLOSE_TAG_RE.captures_iter(html) {
        let tag = caps[1].to_lowercase();
        if !VOID_TAGS.contains(&tag.as_str()) {
            *balance.entry(tag).or_default() -= 1;
        }
    }
    let mut unbalanced: Vec<&str> = balance
        .iter()
        .filter(|(_, count)| **count != 0)
        .map(|(tag, _)| tag.as_str())
        .collect();
    if !unbalanced.is_empty() {
        unbalanced.sort_unstable();
        report.warnings.push(format!(
            "open/close tag count mismatch for: {}",
            unbalanced.join(", ")
        ));
    }

    report.is_valid = report.errors.is_empty();
    report
}

/// Collect the unique variable names referenced by a template.
///
/// Control tokens (`#if`, `#each`, `/if`, `/each`, `else`) are skipped.
/// Note that the *condition* variable of an `#if` lives inside the control
/// token and is therefore not extracted either; only variables appearing as
/// plain `{{name}}` slots are reported.
pub fn extract_template_variables(template: &str) -> BTreeSet<String> {
    let mut variables = BTreeSet::new();
    for caps in TOKEN_RE.captures_iter(template) {
        let token = caps[1].trim();
        if token.starts_with('#') || token.starts_with('/') || token == "else" {
            continue;
        }
        variables.insert(token.to_string());
    }
    variables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_tag_rejected() {
        let report = validate_template_html("<script>alert(1)</script>");
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("<script>")));
    }

    #[test]
    fn test_iframe_rejected_case_insensitive() {
        let report = validate_template_html("<IFRAME src='x'></IFRAME>");
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("<iframe>")));
    }

    #[test]
    fn test_clean_template_valid() {
        let report = validate_template_html("<div><p>Hello {{name}}</p></div>");
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unbalanced_tags_warn_but_pass() {
        let report = validate_template_html("<div><p>text</div>");
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("p"));
    }

    #[test]
    fn test_void_tags_do_not_warn() {
        let report = validate_template_html("<div><br><img src='x'><hr></div>");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_extract_variables() {
        let vars = extract_template_variables("Hello {{name}}, {{#if x}}{{y}}{{/if}}");
        assert!(vars.contains("name"));
        assert!(vars.contains("y"));
        assert!(!vars.contains("x"));
        assert!(!vars.iter().any(|v| v.starts_with('#') || v.starts_with('/')));
        assert!(!vars.contains("else"));
    }

    #[test]
    fn test_extract_variables_unique_and_dotted() {
        let vars = extract_template_variables("{{a.b}} {{a.b}} {{ c }}");
        assert_eq!(vars.len(), 2);
        assert!(vars.contains("a.b"));
        assert!(vars.contains("c"));
    }
}
