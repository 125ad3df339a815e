use crate::domain::model::FlatRecord;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\r\n]+").expect("valid regex"));
static NON_PRINTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\x20-\x7E\r\n]").expect("valid regex"));
static LINE_EDGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s,]+|[\s,]+$").expect("valid regex"));
static OUTER_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\n+|\n+$").expect("valid regex"));
static TRAILING_COMMAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",+$").expect("valid regex"));

/// Normalises scraped text: single spaces, printable ASCII only, no
/// whitespace or commas at line edges, no blank lines at either end.
pub fn clean_text(text: &str) -> String {
    let text = HORIZONTAL_SPACE.replace_all(text, " ");
    let text = NON_PRINTABLE.replace_all(&text, "");
    let text = text
        .split('\n')
        .map(|line| LINE_EDGES.replace_all(line, ""))
        .collect::<Vec<_>>()
        .join("\n");
    let text = OUTER_NEWLINES.replace_all(&text, "");
    TRAILING_COMMAS.replace_all(&text, "").into_owned()
}

/// Cleans every string column of a flattened record in place.
pub fn clean_record(record: &mut FlatRecord) {
    for value in record.columns.values_mut() {
        if let Value::String(s) = value {
            *s = clean_text(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collapses_horizontal_whitespace() {
        assert_eq!(clean_text("a \t  b"), "a b");
    }

    #[test]
    fn test_drops_non_ascii() {
        assert_eq!(clean_text("café 🚀 ok"), "caf  ok");
    }

    #[test]
    fn test_trims_lines_and_commas() {
        assert_eq!(clean_text("\n\n , first,\n  second ,,\n\n"), "first\nsecond");
    }

    #[test]
    fn test_keeps_inner_commas() {
        assert_eq!(clean_text("one, two, three"), "one, two, three");
    }

    #[test]
    fn test_clean_record_only_touches_strings() {
        let mut record = FlatRecord::default();
        record.insert("text", json!("  hello   world  "));
        record.insert("count", json!(3));
        record.insert("tags", json!([" a "]));

        clean_record(&mut record);

        assert_eq!(record.get("text"), Some(&json!("hello world")));
        assert_eq!(record.get("count"), Some(&json!(3)));
        assert_eq!(record.get("tags"), Some(&json!([" a "])));
    }
}
