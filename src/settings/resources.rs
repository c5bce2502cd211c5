//! Static-resource tier: localized strings bundled into the binary.
//!
//! Read-only, consulted only after every other tier misses. Carries the
//! download-page hints surfaced when an external tool cannot be found.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::warn;

fn parse_table(raw: &'static str, name: &str) -> HashMap<String, String> {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        warn!(name, %err, "Embedded resource table failed to parse");
        HashMap::new()
    })
}

fn english() -> &'static HashMap<String, String> {
    static TABLE: OnceLock<HashMap<String, String>> = OnceLock::new();
    TABLE.get_or_init(|| parse_table(include_str!("resources/en.json"), "en"))
}

fn chinese_traditional() -> &'static HashMap<String, String> {
    static TABLE: OnceLock<HashMap<String, String>> = OnceLock::new();
    TABLE.get_or_init(|| parse_table(include_str!("resources/zh-TW.json"), "zh-TW"))
}

fn find(table: &'static HashMap<String, String>, key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

/// Look up a bundled string, preferring the `LANG` locale and falling back
/// to English.
pub(crate) fn lookup(key: &str) -> Option<String> {
    let lang = std::env::var("LANG").unwrap_or_default();
    let localized = lang.starts_with("zh").then(chinese_traditional);
    localized
        .and_then(|table| find(table, key))
        .or_else(|| find(english(), key))
        .map(str::to_string)
}
