use super::builder::{build, schema_field, FieldType, FREE_TEXT_FIELDS, TARGET_SCHEMA};
use super::parser::tokenize;
use super::types::{FilterCondition, ParsedTerm};
use super::{build_sql, plan, SearchPlan, SqlValue};

fn term(field: &str, value: &str) -> ParsedTerm {
    ParsedTerm::new(field, value)
}

// ============ Tokenizer ============

#[test]
fn test_tokenize_empty() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("   \t ").is_empty());
}

#[test]
fn test_tokenize_without_equals_sign() {
    for raw in ["network team", "example.com", "\"quoted words\"", "a:b c>d"] {
        assert!(tokenize(raw).is_empty(), "expected no terms for {:?}", raw);
    }
}

#[test]
fn test_tokenize_simple_and_quoted() {
    let result = tokenize(r#"hostname=example.com region="US East""#);
    assert_eq!(
        result,
        vec![term("hostname", "example.com"), term("region", "US East")]
    );
}

#[test]
fn test_tokenize_preserves_order() {
    let result = tokenize("zone=b hostname=a enabled=true");
    let fields: Vec<&str> = result.iter().map(|t| t.field.as_str()).collect();
    assert_eq!(fields, vec!["zone", "hostname", "enabled"]);
}

#[test]
fn test_tokenize_skips_stray_fragments() {
    let result = tokenize("some words hostname=web01 =orphan trailing");
    assert_eq!(result, vec![term("hostname", "web01")]);
}

#[test]
fn test_tokenize_empty_value() {
    assert_eq!(tokenize("hostname="), vec![term("hostname", "")]);
    assert_eq!(
        tokenize(r#"region="" zone=a"#),
        vec![term("region", ""), term("zone", "a")]
    );
}

#[test]
fn test_tokenize_unterminated_quote_runs_to_end() {
    let result = tokenize(r#"hostname=a region="US East zone=b"#);
    assert_eq!(
        result,
        vec![term("hostname", "a"), term("region", "US East zone=b")]
    );
}

#[test]
fn test_tokenize_keeps_duplicate_fields() {
    let result = tokenize("region=A region=B");
    assert_eq!(result, vec![term("region", "A"), term("region", "B")]);
}

#[test]
fn test_tokenize_value_may_contain_equals() {
    assert_eq!(
        tokenize("path=/health?check=1"),
        vec![term("path", "/health?check=1")]
    );
}

#[test]
fn test_tokenize_wildcards_kept_verbatim() {
    assert_eq!(
        tokenize("hostname=web*.example.com"),
        vec![term("hostname", "web*.example.com")]
    );
}

// ============ Condition builder ============

#[test]
fn test_build_enabled_is_boolean_case_insensitive() {
    assert_eq!(
        build(&[term("enabled", "True")]),
        vec![FilterCondition::BooleanEquals {
            field: "enabled",
            value: true
        }]
    );
    assert_eq!(
        build(&[term("enabled", "FALSE")]),
        vec![FilterCondition::BooleanEquals {
            field: "enabled",
            value: false
        }]
    );
}

#[test]
fn test_build_enabled_non_boolean_falls_back_to_equals() {
    assert_eq!(
        build(&[term("enabled", "yes")]),
        vec![FilterCondition::Equals {
            field: "enabled",
            value: "yes".to_string()
        }]
    );
}

#[test]
fn test_build_unknown_field_dropped() {
    assert!(build(&[term("nickname", "x")]).is_empty());
    assert!(build(&[term("id", "1"), term("last_updated_ns", "0")]).is_empty());
}

#[test]
fn test_build_wildcard_translated() {
    assert_eq!(
        build(&[term("hostname", "web*.example.com")]),
        vec![FilterCondition::Pattern {
            field: "hostname",
            pattern: "web%.example.com".to_string()
        }]
    );
    assert_eq!(
        build(&[term("region", "*east*")]),
        vec![FilterCondition::Pattern {
            field: "region",
            pattern: "%east%".to_string()
        }]
    );
}

#[test]
fn test_build_keeps_order_and_drops_unknown() {
    let result = build(&[
        term("zone", "z1"),
        term("bogus", "x"),
        term("port", "443"),
        term("enabled", "false"),
    ]);
    assert_eq!(
        result,
        vec![
            FilterCondition::Equals {
                field: "zone",
                value: "z1".to_string()
            },
            FilterCondition::Equals {
                field: "port",
                value: "443".to_string()
            },
            FilterCondition::BooleanEquals {
                field: "enabled",
                value: false
            },
        ]
    );
}

#[test]
fn test_build_is_deterministic() {
    let terms = tokenize(r#"hostname=web* region="US East" enabled=true nope=1"#);
    assert_eq!(build(&terms), build(&terms));
}

#[test]
fn test_schema_is_fixed() {
    let names: Vec<&str> = TARGET_SCHEMA.iter().map(|c| c.name).collect();
    assert_eq!(names.len(), 14);
    assert!(schema_field("probes").is_none());
    assert!(schema_field("last_check_ns").is_none());
    assert_eq!(schema_field("port").unwrap().field_type, FieldType::Int);
    assert_eq!(schema_field("enabled").unwrap().field_type, FieldType::Bool);
}

// ============ Plan ============

#[test]
fn test_plan_empty_is_all() {
    assert_eq!(plan(""), SearchPlan::All);
    assert_eq!(plan("  "), SearchPlan::All);
}

#[test]
fn test_plan_field_qualified() {
    assert_eq!(
        plan("hostname=foo.com enabled=false"),
        SearchPlan::Filtered(vec![
            FilterCondition::Equals {
                field: "hostname",
                value: "foo.com".to_string()
            },
            FilterCondition::BooleanEquals {
                field: "enabled",
                value: false
            },
        ])
    );
}

#[test]
fn test_plan_free_text_when_no_terms() {
    assert_eq!(
        plan("network  team"),
        SearchPlan::FreeText(vec!["network".to_string(), "team".to_string()])
    );
}

#[test]
fn test_plan_free_text_when_all_fields_unknown() {
    assert_eq!(
        plan("nickname=x"),
        SearchPlan::FreeText(vec!["nickname=x".to_string()])
    );
}

#[test]
fn test_plan_duplicate_fields_are_conjuncted() {
    match plan("region=A region=B") {
        SearchPlan::Filtered(conditions) => assert_eq!(conditions.len(), 2),
        other => panic!("unexpected plan: {:?}", other),
    }
}

// ============ SQL rendering ============

#[test]
fn test_build_sql_all_is_empty() {
    let (sql, values) = build_sql(&SearchPlan::All);
    assert!(sql.is_empty());
    assert!(values.is_empty());
}

#[test]
fn test_build_sql_filtered() {
    let (sql, values) = build_sql(&plan("hostname=web* port=443 enabled=true zone=a"));
    assert_eq!(
        sql,
        "hostname LIKE ? AND port = ? AND enabled = ? AND zone = ?"
    );
    assert_eq!(
        values,
        vec![
            SqlValue::String("web%".to_string()),
            SqlValue::Integer(443),
            SqlValue::Bool(true),
            SqlValue::String("a".to_string()),
        ]
    );
}

#[test]
fn test_build_sql_non_numeric_int_value_stays_string() {
    let (sql, values) = build_sql(&plan("timeout=ten"));
    assert_eq!(sql, "timeout = ?");
    assert_eq!(values, vec![SqlValue::String("ten".to_string())]);
}

#[test]
fn test_build_sql_free_text() {
    let (sql, values) = build_sql(&plan("network team"));
    let clause = "(hostname LIKE ? OR region LIKE ? OR zone LIKE ? OR probe_type LIKE ? OR assignees LIKE ? OR last_status LIKE ?)";
    assert_eq!(sql, format!("{} AND {}", clause, clause));
    assert_eq!(values.len(), 12);
    assert_eq!(values[0], SqlValue::String("%network%".to_string()));
    assert_eq!(values[6], SqlValue::String("%team%".to_string()));
    assert_eq!(FREE_TEXT_FIELDS.len(), 6);
}
