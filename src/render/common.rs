//! Shared helpers for document rendering: value resolution, conditional
//! visibility, and filename sanitization.

use serde_json::Value;

use crate::template::expr;
use crate::template::merge::{is_truthy, resolve_path, stringify};
use crate::template::Field;

/// Resolve the text a field paints.
///
/// A field carrying a computed expression paints its result. Otherwise
/// three explicit tiers apply: the data value when the key is present and
/// non-null (so a legitimate `0` or `false` still renders), then the
/// field's default value, then the empty string. A computed expression
/// that fails falls through the same tiers, logged.
pub fn resolve_field_value(field: &Field, data: &Value) -> String {
    if let Some(expression) = &field.computed {
        match expr::evaluate_to_string(expression, data) {
            Ok(text) => return text,
            Err(e) => log::warn!(
                "field '{}': computed expression failed ({e}), using direct lookup",
                field.name
            ),
        }
    }
    match resolve_path(data, &field.name) {
        Some(value) if !value.is_null() => stringify(value),
        _ => field.default_value.clone().unwrap_or_default(),
    }
}

/// Whether a conditional field should be painted for this record.
pub fn field_visible(field: &Field, data: &Value) -> bool {
    let Some(conditional) = &field.conditional else {
        return true;
    };
    if let Some(show) = &conditional.show {
        if !resolve_path(data, show).map(is_truthy).unwrap_or(false) {
            return false;
        }
    }
    if let Some(hide) = &conditional.hide {
        if resolve_path(data, hide).map(is_truthy).unwrap_or(false) {
            return false;
        }
    }
    true
}

/// Reduce a certificate identifier to a filesystem-safe `[a-z0-9-]` name.
///
/// Runs of whitespace, separators, and anything non-alphanumeric collapse
/// to a single dash; an identifier with nothing salvageable falls back to
/// the given default.
pub fn sanitize_certificate_id(id: &str, fallback: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in id.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash && !result.is_empty() {
            result.push('-');
            last_dash = true;
        }
    }

    let trimmed = result.trim_matches('-');
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Conditional, Field};
    use serde_json::json;

    #[test]
    fn test_sanitize_certificate_id() {
        assert_eq!(sanitize_certificate_id("CERT-2026/0042", "cert"), "cert-2026-0042");
        assert_eq!(sanitize_certificate_id("  UNI 01  ", "cert"), "uni-01");
        assert_eq!(sanitize_certificate_id("___", "cert"), "cert");
        assert_eq!(sanitize_certificate_id("", "cert"), "cert");
        assert_eq!(sanitize_certificate_id("a//b", "cert"), "a-b");
    }

    #[test]
    fn test_resolution_prefers_data() {
        let mut field = Field::text("score", 0.0, 0.0, 100.0, 20.0);
        field.default_value = Some("N/A".to_string());
        assert_eq!(resolve_field_value(&field, &json!({"score": 88})), "88");
    }

    #[test]
    fn test_resolution_keeps_zero_and_false() {
        let mut field = Field::text("score", 0.0, 0.0, 100.0, 20.0);
        field.default_value = Some("N/A".to_string());
        assert_eq!(resolve_field_value(&field, &json!({"score": 0})), "0");
        assert_eq!(resolve_field_value(&field, &json!({"score": false})), "false");
    }

    #[test]
    fn test_resolution_falls_back_to_default_then_empty() {
        let mut field = Field::text("score", 0.0, 0.0, 100.0, 20.0);
        field.default_value = Some("N/A".to_string());
        assert_eq!(resolve_field_value(&field, &json!({})), "N/A");
        assert_eq!(resolve_field_value(&field, &json!({"score": null})), "N/A");

        field.default_value = None;
        assert_eq!(resolve_field_value(&field, &json!({})), "");
    }

    #[test]
    fn test_resolution_walks_dot_paths() {
        let field = Field::text("marks.total", 0.0, 0.0, 100.0, 20.0);
        assert_eq!(
            resolve_field_value(&field, &json!({"marks": {"total": 95}})),
            "95"
        );
    }

    #[test]
    fn test_computed_expression_wins() {
        let mut field = Field::text("percentage", 0.0, 0.0, 100.0, 20.0);
        field.computed = Some("marks.obtained / marks.total * 100".to_string());
        let data = json!({"marks": {"obtained": 450, "total": 500}, "percentage": 1});
        assert_eq!(resolve_field_value(&field, &data), "90");
    }

    #[test]
    fn test_broken_computed_expression_falls_back() {
        let mut field = Field::text("percentage", 0.0, 0.0, 100.0, 20.0);
        field.computed = Some("missing / 0".to_string());
        field.default_value = Some("N/A".to_string());
        assert_eq!(resolve_field_value(&field, &json!({"percentage": 88})), "88");
        assert_eq!(resolve_field_value(&field, &json!({})), "N/A");
    }

    #[test]
    fn test_field_visibility() {
        let mut field = Field::text("note", 0.0, 0.0, 100.0, 20.0);
        assert!(field_visible(&field, &json!({})));

        field.conditional = Some(Conditional {
            show: Some("hasDistinction".to_string()),
            hide: None,
        });
        assert!(field_visible(&field, &json!({"hasDistinction": true})));
        assert!(!field_visible(&field, &json!({"hasDistinction": false})));
        assert!(!field_visible(&field, &json!({})));

        field.conditional = Some(Conditional {
            show: None,
            hide: Some("provisional".to_string()),
        });
        assert!(field_visible(&field, &json!({})));
        assert!(!field_visible(&field, &json!({"provisional": 1})));
    }
}
