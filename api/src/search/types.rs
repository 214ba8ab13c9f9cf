//! Types shared by the search tokenizer, condition builder and SQL renderer

/// A `field=value` pair pulled out of a raw search string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTerm {
    pub field: String,
    pub value: String,
}

impl ParsedTerm {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Predicate over a single target column. Callers conjunct a sequence of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCondition {
    Equals { field: &'static str, value: String },
    /// `pattern` is already in SQL `LIKE` syntax (`%` wildcards)
    Pattern {
        field: &'static str,
        pattern: String,
    },
    BooleanEquals { field: &'static str, value: bool },
}

impl FilterCondition {
    pub fn field(&self) -> &'static str {
        match self {
            FilterCondition::Equals { field, .. }
            | FilterCondition::Pattern { field, .. }
            | FilterCondition::BooleanEquals { field, .. } => field,
        }
    }
}

/// Outcome of interpreting a raw search string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    /// Empty query: every target
    All,
    /// Field-qualified conditions, all of which must hold
    Filtered(Vec<FilterCondition>),
    /// Free-text words; each must appear in at least one text column
    FreeText(Vec<String>),
}
