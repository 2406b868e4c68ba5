use confstack_rs_core::ConfigRecord;
use regex::Regex;

/// Keep only the top-level keys matched by `regex`.
pub fn filter_by_regex(data: ConfigRecord, regex: &Regex) -> ConfigRecord {
    data.into_iter()
        .filter(|(key, _)| regex.is_match(key))
        .collect()
}

/// Apply an optional filter.
pub(crate) fn filtered(data: ConfigRecord, regex: Option<&Regex>) -> ConfigRecord {
    match regex {
        Some(regex) => filter_by_regex(data, regex),
        None => data,
    }
}
