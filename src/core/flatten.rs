use crate::core::path;
use crate::domain::model::{FlatRecord, Record, UnwindField, UnwindTarget};
use serde_json::{Map, Value};

/// Flattens nested objects into dotted columns and unwinds the configured
/// array columns.
///
/// Arrays that are not unwind targets are kept as they are and end up as a
/// JSON string in the CSV.
pub fn flatten(record: &Record, targets: &[UnwindTarget]) -> FlatRecord {
    let mut flat = FlatRecord::default();
    flatten_into(&record.data, targets, None, &mut flat);
    flat
}

pub fn flatten_all(records: &[Record], targets: &[UnwindTarget]) -> Vec<FlatRecord> {
    let flattened: Vec<FlatRecord> = records.iter().map(|r| flatten(r, targets)).collect();
    tracing::info!(
        "🧩 Flattened {} records ({} unwind targets)",
        flattened.len(),
        targets.len()
    );
    flattened
}

fn flatten_into(
    map: &Map<String, Value>,
    targets: &[UnwindTarget],
    prefix: Option<&str>,
    out: &mut FlatRecord,
) {
    for (key, value) in map {
        let column = path::join(prefix, key);

        match value {
            Value::Array(elements) if is_target(targets, key) => {
                out.insert(column.clone(), value.clone());
                for target in targets.iter().filter(|t| t.target_column == *key) {
                    unwind(&column, elements, target, out);
                }
            }
            Value::Object(nested) => flatten_into(nested, targets, Some(&column), out),
            other => out.insert(column, other.clone()),
        }
    }
}

/// Targets name a record key at any depth, not a dotted column path.
fn is_target(targets: &[UnwindTarget], key: &str) -> bool {
    targets.iter().any(|t| t.target_column == key)
}

fn unwind(column: &str, elements: &[Value], target: &UnwindTarget, out: &mut FlatRecord) {
    let taken = match target.take.limit() {
        Some(limit) => &elements[..limit.min(elements.len())],
        None => elements,
    };

    for field in &target.fields {
        let extracted: Vec<Value> = taken
            .iter()
            .filter_map(|element| path::resolve(element, &field.field))
            .cloned()
            .collect();

        let value = if target.take.is_single() {
            extracted.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::Array(extracted)
        };
        out.insert(unwind_column(column, field), value);
    }
}

fn unwind_column(column: &str, field: &UnwindField) -> String {
    match &field.alias {
        Some(alias) => alias.clone(),
        None => format!("{}.{}", column, field.field),
    }
}
