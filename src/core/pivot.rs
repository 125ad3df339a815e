use crate::core::path;
use crate::domain::model::{Dataset, PivotSpec, Record};
use serde_json::Value;

/// Expands each record into one copy per element of the array at
/// `spec.column`, copying `spec.fields` from the element onto the copy.
///
/// Records whose pivot column is missing or not an array are dropped.
pub fn pivot(dataset: Dataset, spec: Option<&PivotSpec>) -> Dataset {
    let Some(spec) = spec else {
        return dataset;
    };

    let input_count = dataset.len();
    let mut dropped = 0usize;
    let mut output = Vec::with_capacity(input_count);

    for record in &dataset {
        match path::resolve_in(&record.data, &spec.column) {
            Some(Value::Array(elements)) => {
                output.extend(elements.iter().map(|element| pivot_element(record, element, spec)));
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(
            "Pivot on '{}' dropped {} records without an array value",
            spec.column,
            dropped
        );
    }
    tracing::info!(
        "🔀 Pivoted {} records into {} on '{}'",
        input_count,
        output.len(),
        spec.column
    );

    output
}

fn pivot_element(record: &Record, element: &Value, spec: &PivotSpec) -> Record {
    let mut child = record.clone();
    for field in &spec.fields {
        if let Some(value) = path::resolve(element, field) {
            child.data.insert(field.clone(), value.clone());
        }
    }
    child
}
