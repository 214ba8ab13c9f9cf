use super::types::ParsedTerm;
use regex::Regex;
use std::sync::OnceLock;

static TERM_REGEX: OnceLock<Regex> = OnceLock::new();

// field=value | field="quoted value" | field="unterminated to end of input
fn term_regex() -> &'static Regex {
    TERM_REGEX.get_or_init(|| Regex::new(r#"(\w+)=(?:"([^"]*)"?|([^ "]*))"#).unwrap())
}

/// Extracts `field=value` pairs from a search string, in source order.
///
/// Fragments that don't look like `field=value` are skipped. The same field may
/// appear more than once; every occurrence is returned.
pub fn tokenize(raw: &str) -> Vec<ParsedTerm> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    term_regex()
        .captures_iter(raw)
        .map(|captures| {
            let value = captures
                .get(2)
                .or_else(|| captures.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            ParsedTerm::new(&captures[1], value)
        })
        .collect()
}
