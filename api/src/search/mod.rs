mod builder;
mod parser;
mod types;

pub use builder::{build_sql, SqlValue};
pub use types::SearchPlan;

use builder::{build, free_text_terms};
use parser::tokenize;

use std::collections::HashSet;

/// Interprets a raw `q` string: empty means everything, field-qualified terms
/// become conditions, and anything else falls back to free-text words.
pub fn plan(raw: &str) -> SearchPlan {
    if raw.trim().is_empty() {
        return SearchPlan::All;
    }

    let conditions = build(&tokenize(raw));
    if conditions.is_empty() {
        return SearchPlan::FreeText(free_text_terms(raw));
    }

    let mut seen = HashSet::new();
    for condition in &conditions {
        if !seen.insert(condition.field()) {
            tracing::warn!(
                field = condition.field(),
                "search repeats a field; all of its conditions must hold"
            );
        }
    }

    SearchPlan::Filtered(conditions)
}

#[cfg(test)]
mod tests;
