use crate::domain::column_types::ColumnTypes;
use crate::domain::model::{ColumnPlan, CsvBlob, FlatRecord};
use crate::utils::error::Result;
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::collections::HashSet;

/// Writes flattened records as CSV: one header row, one row per record,
/// `,` between fields and `\n` between rows.
pub fn serialize(
    records: &[FlatRecord],
    plan: &ColumnPlan,
    column_types: Option<&ColumnTypes>,
) -> Result<CsvBlob> {
    let headers = resolve_headers(records, plan);

    let header_row = headers
        .iter()
        .map(|header| match column_types {
            Some(types) => quote_field(&types.annotate(header)).into_owned(),
            None => quote_field(header).into_owned(),
        })
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(header_row);
    for record in records {
        lines.push(format_row(record, &headers)?);
    }

    let rendered_headers: Vec<String> = match column_types {
        Some(types) => headers.iter().map(|h| types.annotate(h)).collect(),
        None => headers,
    };

    tracing::info!(
        "📝 Serialized {} rows x {} columns",
        records.len(),
        rendered_headers.len()
    );
    Ok(CsvBlob::new(rendered_headers, records.len(), lines.join("\n")))
}

/// Every column seen across the records, in first-appearance order, then
/// reordered and filtered by the plan.
pub fn resolve_headers(records: &[FlatRecord], plan: &ColumnPlan) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut discovered: Vec<&str> = Vec::new();
    for record in records {
        for column in record.columns.keys() {
            if seen.insert(column.as_str()) {
                discovered.push(column.as_str());
            }
        }
    }

    let removed: HashSet<&str> = plan.remove_columns.iter().map(String::as_str).collect();

    match &plan.custom_column_order {
        Some(order) => {
            let ordered: HashSet<&str> = order.iter().map(String::as_str).collect();
            order
                .iter()
                .cloned()
                .chain(
                    discovered
                        .into_iter()
                        .filter(|c| !ordered.contains(c) && !removed.contains(c))
                        .map(str::to_string),
                )
                .collect()
        }
        None => discovered
            .into_iter()
            .filter(|c| !removed.contains(c))
            .map(str::to_string)
            .collect(),
    }
}

fn format_row(record: &FlatRecord, headers: &[String]) -> Result<String> {
    let fields = headers
        .iter()
        .map(|header| -> Result<String> {
            let text = match record.get(header) {
                Some(value) => format_value(value)?,
                None => String::new(),
            };
            Ok(quote_field(&text).into_owned())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(fields.join(","))
}

/// Text form of a cell: arrays and objects as compact JSON, null as empty.
/// Whole-valued floats print without a fraction, `4` rather than `4.0`.
pub fn format_value(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => integral(n).to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(&normalize_numbers(value))?,
    })
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn integral(n: &Number) -> Number {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            Number::from(f as i64)
        }
        _ => n.clone(),
    }
}

fn normalize_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(integral(n)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_numbers(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Quotes a field iff it contains a comma, a newline or a double quote.
pub fn quote_field(text: &str) -> Cow<'_, str> {
    if text.contains(&[',', '\n', '"'][..]) {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column_types::{BaseType, ColumnType};
    use serde_json::json;

    fn flat(value: Value) -> FlatRecord {
        FlatRecord {
            columns: value.as_object().cloned().unwrap(),
        }
    }

    fn plan(order: Option<&[&str]>, remove: &[&str]) -> ColumnPlan {
        ColumnPlan {
            custom_column_order: order.map(|o| o.iter().map(|c| c.to_string()).collect()),
            remove_columns: remove.iter().map(|c| c.to_string()).collect(),
            dedup_key: None,
        }
    }

    #[test]
    fn test_simple_csv() {
        let blob = serialize(&[flat(json!({"a": 1, "b.c": 2}))], &ColumnPlan::default(), None)
            .unwrap();
        assert_eq!(blob.as_str(), "a,b.c\n1,2");
        assert_eq!(blob.headers, vec!["a", "b.c"]);
        assert_eq!(blob.row_count, 1);
        assert_eq!(blob.content_type(), "text/csv;charset=utf-8");
    }

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("He said, \"hi\""), "\"He said, \"\"hi\"\"\"");
        assert_eq!(quote_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(quote_field("plain text"), "plain text");
        assert_eq!(quote_field(""), "");
        assert_eq!(quote_field("tab\there"), "tab\there");
    }

    #[test]
    fn test_format_values() {
        assert_eq!(format_value(&json!(null)).unwrap(), "");
        assert_eq!(format_value(&json!(true)).unwrap(), "true");
        assert_eq!(format_value(&json!(12)).unwrap(), "12");
        assert_eq!(format_value(&json!(2.5)).unwrap(), "2.5");
        assert_eq!(format_value(&json!("x")).unwrap(), "x");
        assert_eq!(format_value(&json!(["x", 1])).unwrap(), "[\"x\",1]");
        assert_eq!(
            format_value(&json!([{"url": "a"}])).unwrap(),
            "[{\"url\":\"a\"}]"
        );
    }

    #[test]
    fn test_whole_floats_print_without_fraction() {
        assert_eq!(format_value(&json!(4.0)).unwrap(), "4");
        assert_eq!(format_value(&json!(-0.0)).unwrap(), "0");
        assert_eq!(format_value(&json!(1.5)).unwrap(), "1.5");
        assert_eq!(
            format_value(&json!({"score": 2.0, "xs": [1.0, 2.5]})).unwrap(),
            "{\"score\":2,\"xs\":[1,2.5]}"
        );

        let blob = serialize(
            &[flat(json!({"rating": 4.0, "arr": [1.0, 2.5]}))],
            &ColumnPlan::default(),
            None,
        )
        .unwrap();
        assert_eq!(blob.as_str(), "rating,arr\n4,\"[1,2.5]\"");
    }

    #[test]
    fn test_sparse_records_fill_missing_with_empty() {
        let records = [flat(json!({"a": 1})), flat(json!({"b": 2})), flat(json!({"a": 3, "c": 4}))];
        let blob = serialize(&records, &ColumnPlan::default(), None).unwrap();
        assert_eq!(blob.as_str(), "a,b,c\n1,,\n,2,\n3,,4");
    }

    #[test]
    fn test_array_cells_are_quoted_json() {
        let blob = serialize(
            &[flat(json!({"tags": ["x", "y"]}))],
            &ColumnPlan::default(),
            None,
        )
        .unwrap();
        assert_eq!(blob.as_str(), "tags\n\"[\"\"x\"\",\"\"y\"\"]\"");
    }

    #[test]
    fn test_custom_order_then_remaining_without_removed() {
        let records = [flat(json!({"a": 1, "b": 2, "c": 3, "d": 4}))];
        let headers = resolve_headers(&records, &plan(Some(&["c", "a"]), &["d"]));
        assert_eq!(headers, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_custom_order_keeps_unknown_and_removed_names() {
        let records = [flat(json!({"a": 1, "b": 2}))];
        let headers = resolve_headers(&records, &plan(Some(&["zzz", "b"]), &["b", "a"]));
        assert_eq!(headers, vec!["zzz", "b"]);

        let blob = serialize(&records, &plan(Some(&["zzz", "b"]), &["b", "a"]), None).unwrap();
        assert_eq!(blob.as_str(), "zzz,b\n,2");
    }

    #[test]
    fn test_remove_columns_without_custom_order() {
        let records = [flat(json!({"a": 1, "b": 2, "c": 3}))];
        let headers = resolve_headers(&records, &plan(None, &["b"]));
        assert_eq!(headers, vec!["a", "c"]);
    }

    #[test]
    fn test_no_records_gives_empty_header() {
        let blob = serialize(&[], &ColumnPlan::default(), None).unwrap();
        assert_eq!(blob.as_str(), "");
        assert_eq!(blob.row_count, 0);
    }

    #[test]
    fn test_column_types_annotate_headers() {
        let types: ColumnTypes = [("createdAt", ColumnType::Scalar(BaseType::Date))]
            .into_iter()
            .collect();
        let records = [flat(json!({"createdAt": "2024-01-01", "text": "hi"}))];

        let blob = serialize(&records, &ColumnPlan::default(), Some(&types)).unwrap();

        assert_eq!(blob.as_str(), "createdAt<gx:date>,text\n2024-01-01,hi");
        assert_eq!(blob.headers, vec!["createdAt<gx:date>", "text"]);
    }

    #[test]
    fn test_header_with_comma_is_quoted() {
        let blob = serialize(&[flat(json!({"a,b": 1}))], &ColumnPlan::default(), None).unwrap();
        assert_eq!(blob.as_str(), "\"a,b\"\n1");
    }
}
