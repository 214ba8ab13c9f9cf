use super::types::{FilterCondition, ParsedTerm, SearchPlan};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Integer(i64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Int,
    Bool,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldConfig {
    pub name: &'static str,
    pub field_type: FieldType,
}

impl FieldConfig {
    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }
}

/// Target columns that may appear on the left of `field=value`.
/// Field names and column names are identical.
pub const TARGET_SCHEMA: &[FieldConfig] = &[
    FieldConfig::new("hostname", FieldType::Text),
    FieldConfig::new("address", FieldType::Text),
    FieldConfig::new("region", FieldType::Text),
    FieldConfig::new("zone", FieldType::Text),
    FieldConfig::new("probe_type", FieldType::Text),
    FieldConfig::new("assignees", FieldType::Text),
    FieldConfig::new("enabled", FieldType::Bool),
    FieldConfig::new("port", FieldType::Int),
    FieldConfig::new("protocol", FieldType::Text),
    FieldConfig::new("path", FieldType::Text),
    FieldConfig::new("expect_status_code", FieldType::Text),
    FieldConfig::new("timeout", FieldType::Int),
    FieldConfig::new("last_status", FieldType::Text),
    FieldConfig::new("last_status_code", FieldType::Text),
];

/// Columns searched by free-text words
pub const FREE_TEXT_FIELDS: &[&str] = &[
    "hostname",
    "region",
    "zone",
    "probe_type",
    "assignees",
    "last_status",
];

const ENABLED_FIELD: &str = "enabled";

pub fn schema_field(name: &str) -> Option<&'static FieldConfig> {
    TARGET_SCHEMA.iter().find(|config| config.name == name)
}

/// Maps parsed terms to conditions. Terms naming unknown fields are dropped.
pub fn build(terms: &[ParsedTerm]) -> Vec<FilterCondition> {
    terms.iter().filter_map(build_condition).collect()
}

fn build_condition(term: &ParsedTerm) -> Option<FilterCondition> {
    if term.field == ENABLED_FIELD {
        if term.value.eq_ignore_ascii_case("true") {
            return Some(FilterCondition::BooleanEquals {
                field: ENABLED_FIELD,
                value: true,
            });
        }
        if term.value.eq_ignore_ascii_case("false") {
            return Some(FilterCondition::BooleanEquals {
                field: ENABLED_FIELD,
                value: false,
            });
        }
    }

    let config = schema_field(&term.field)?;
    if term.value.contains('*') {
        Some(FilterCondition::Pattern {
            field: config.name,
            pattern: term.value.replace('*', "%"),
        })
    } else {
        Some(FilterCondition::Equals {
            field: config.name,
            value: term.value.clone(),
        })
    }
}

/// Whitespace-separated words for the free-text path
pub fn free_text_terms(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Renders a plan as a SQLite WHERE fragment (without the `WHERE` keyword)
/// using `?` placeholders, plus the values to bind in order.
/// `SearchPlan::All` renders an empty fragment.
pub fn build_sql(plan: &SearchPlan) -> (String, Vec<SqlValue>) {
    let mut sql_parts = Vec::new();
    let mut bind_values = Vec::new();

    match plan {
        SearchPlan::All => {}
        SearchPlan::Filtered(conditions) => {
            for condition in conditions {
                let (sql, value) = build_condition_sql(condition);
                sql_parts.push(sql);
                bind_values.push(value);
            }
        }
        SearchPlan::FreeText(terms) => {
            for term in terms.iter().filter(|t| !t.is_empty()) {
                sql_parts.push(build_free_text_clause(FREE_TEXT_FIELDS));
                bind_values.extend(
                    FREE_TEXT_FIELDS
                        .iter()
                        .map(|_| SqlValue::String(format!("%{}%", term))),
                );
            }
        }
    }

    (sql_parts.join(" AND "), bind_values)
}

fn build_condition_sql(condition: &FilterCondition) -> (String, SqlValue) {
    match condition {
        FilterCondition::Equals { field, value } => {
            (format!("{} = ?", field), convert_value(field, value))
        }
        FilterCondition::Pattern { field, pattern } => (
            format!("{} LIKE ?", field),
            SqlValue::String(pattern.clone()),
        ),
        FilterCondition::BooleanEquals { field, value } => {
            (format!("{} = ?", field), SqlValue::Bool(*value))
        }
    }
}

fn build_free_text_clause(columns: &[&str]) -> String {
    let alternatives: Vec<String> = columns
        .iter()
        .map(|column| format!("{} LIKE ?", column))
        .collect();
    format!("({})", alternatives.join(" OR "))
}

// Integer columns compare against integers when the value parses as one.
// Anything else is bound as text and left to SQLite's column affinity, so
// `443.0` still matches 443 while `ten` matches nothing.
fn convert_value(field: &str, value: &str) -> SqlValue {
    match schema_field(field).map(|config| config.field_type) {
        Some(FieldType::Int) => value
            .parse::<i64>()
            .map(SqlValue::Integer)
            .unwrap_or_else(|_| SqlValue::String(value.to_string())),
        _ => SqlValue::String(value.to_string()),
    }
}
