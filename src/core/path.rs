//! Dotted-path lookups into JSON values.
//!
//! `a.b.0.c` walks object keys and, for numeric segments, array indices. A
//! missing level anywhere yields `None`, never an error. An explicit `null`
//! is a present value.

use serde_json::{Map, Value};

/// Resolves `path` against `value`. The empty path is `value` itself.
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Resolves `path` against a record's top level. A key that literally
/// contains dots wins over walking the path.
pub fn resolve_in<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(path) {
        return Some(value);
    }

    let (head, rest) = path.split_once('.')?;
    map.get(head).and_then(|value| resolve(value, rest))
}

/// Joins a column prefix and key into a dotted column name.
pub fn join(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, key),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested_objects_and_indices() {
        let value = json!({"author": {"name": "Ada", "links": [{"url": "a"}, {"url": "b"}]}});

        assert_eq!(resolve(&value, "author.name"), Some(&json!("Ada")));
        assert_eq!(resolve(&value, "author.links.1.url"), Some(&json!("b")));
        assert_eq!(resolve(&value, "author.links.7.url"), None);
        assert_eq!(resolve(&value, "author.missing.deeper"), None);
        assert_eq!(resolve(&value, "author.name.first"), None);
    }

    #[test]
    fn test_resolve_empty_path_is_identity() {
        let value = json!("x");
        assert_eq!(resolve(&value, ""), Some(&value));
    }

    #[test]
    fn test_resolve_keeps_explicit_null() {
        let value = json!({"a": null});
        assert_eq!(resolve(&value, "a"), Some(&Value::Null));
    }

    #[test]
    fn test_resolve_in_prefers_literal_dotted_key() {
        let map = json!({"b.c": 1, "b": {"c": 2}, "d": {"e": 3}});
        let map = map.as_object().unwrap();

        assert_eq!(resolve_in(map, "b.c"), Some(&json!(1)));
        assert_eq!(resolve_in(map, "d.e"), Some(&json!(3)));
        assert_eq!(resolve_in(map, "d"), Some(&json!({"e": 3})));
        assert_eq!(resolve_in(map, "x.y"), None);
    }

    #[test]
    fn test_join() {
        assert_eq!(join(None, "a"), "a");
        assert_eq!(join(Some("a.b"), "c"), "a.b.c");
    }
}
