use crate::domain::model::{Dataset, Record};
use serde_json::Value;
use std::collections::HashMap;

/// Collapses records sharing the same top-level `key` value.
///
/// The last record seen for a key wins, but it takes the position where that
/// key first appeared. Records without the key all share the `undefined`
/// group.
pub fn deduplicate(dataset: Dataset, key: Option<&str>) -> Dataset {
    let Some(key) = key.filter(|k| !k.is_empty()) else {
        return dataset;
    };

    let input_count = dataset.len();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut survivors: Vec<Record> = Vec::new();

    for record in dataset {
        let group = group_key(record.get(key));
        match positions.get(&group) {
            Some(&index) => survivors[index] = record,
            None => {
                positions.insert(group, survivors.len());
                survivors.push(record);
            }
        }
    }

    tracing::info!(
        "🔄 Deduplicated on '{}': {} -> {} records",
        key,
        input_count,
        survivors.len()
    );
    survivors
}

/// String identity of a dedup value: strings as-is, everything else as JSON
/// text, a missing key as `undefined`.
fn group_key(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
