use certmint::template::{extract_template_variables, merge, validate_template_html};
use serde_json::json;

#[test]
fn test_substitution_contract() {
    assert_eq!(merge("{{a}}", &json!({"a": "X"})), "X");
    assert_eq!(merge("{{a}}", &json!({})), "");
}

#[test]
fn test_conditional_contract() {
    assert_eq!(merge("{{#if flag}}Y{{/if}}", &json!({"flag": true})), "Y");
    assert_eq!(merge("{{#if flag}}Y{{/if}}", &json!({"flag": false})), "");
}

#[test]
fn test_loop_contract() {
    assert_eq!(
        merge("{{#each items}}{{this}},{{/each}}", &json!({"items": [1, 2, 3]})),
        "1,2,3,"
    );
}

#[test]
fn test_no_tokens_remain_for_any_template() {
    let templates = [
        "plain text",
        "{{known}} and {{unknown}}",
        "{{#if a}}x{{/if}}{{#if b}}y{{else}}z{{/if}}",
        "{{#each rows}}{{this.col}}{{/each}}",
        "{{  spaced  }} {{a.b.c.d}}",
        "broken {{#if never_closed}} tail",
        "stray {{/each}} closer",
    ];
    let data = json!({"known": "v", "a": 1, "rows": [{"col": 1}]});
    for template in templates {
        let out = merge(template, &data);
        assert!(
            !out.contains("{{") && !out.contains("}}"),
            "template {template:?} left tokens in {out:?}"
        );
    }
}

#[test]
fn test_certificate_shaped_template() {
    let template = "\
<div class=\"certificate\">
  <h1>{{university.name}}</h1>
  <p>This certifies that <b>{{student.name}}</b> ({{student.rollNumber}})</p>
  {{#if hasDistinction}}<p>passed with Distinction</p>{{else}}<p>passed</p>{{/if}}
  <table>{{#each subjects}}<tr><td>{{this.name}}</td><td>{{this.score}}</td></tr>{{/each}}</table>
  <p>Issued on {{issueDate}}</p>
</div>";
    let data = json!({
        "university": {"name": "Meridian University"},
        "student": {"name": "Ravi Kumar", "rollNumber": "MU-1042"},
        "hasDistinction": true,
        "subjects": [
            {"name": "Algorithms", "score": 91},
            {"name": "Databases", "score": 88}
        ],
        "issueDate": "30 June 2026"
    });

    let out = merge(template, &data);
    assert!(out.contains("Meridian University"));
    assert!(out.contains("Ravi Kumar"));
    assert!(out.contains("MU-1042"));
    assert!(out.contains("with Distinction"));
    assert!(out.contains("<td>Algorithms</td><td>91</td>"));
    assert!(out.contains("<td>Databases</td><td>88</td>"));
    assert!(out.contains("Issued on 30 June 2026"));
    assert!(!out.contains("{{"));
}

#[test]
fn test_validation_and_extraction_together() {
    let template = "Hello {{name}}, {{#if x}}{{y}}{{/if}}";
    let report = validate_template_html(template);
    assert!(report.is_valid);

    let vars = extract_template_variables(template);
    assert!(vars.contains("name"));
    assert!(vars.contains("y"));
    assert!(!vars.contains("x"));

    let hostile = format!("{template}<script src=\"evil.js\"></script>");
    let report = validate_template_html(&hostile);
    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 1);
}
