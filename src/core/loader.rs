use crate::domain::model::{Dataset, Record};
use crate::domain::ports::DatasetSource;
use crate::utils::error::{Result, Stage, TabularizeError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderOptions {
    /// Keys the upstream scraper sets to `true` on its "no results" placeholder.
    #[serde(default = "default_sentinel_keys")]
    pub sentinel_keys: Vec<String>,
}

fn default_sentinel_keys() -> Vec<String> {
    vec!["noResults".to_string()]
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            sentinel_keys: default_sentinel_keys(),
        }
    }
}

pub struct Loader<S: DatasetSource> {
    source: S,
    options: LoaderOptions,
}

impl<S: DatasetSource> Loader<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, LoaderOptions::default())
    }

    pub fn with_options(source: S, options: LoaderOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub async fn load(&self, url: &str) -> Result<Dataset> {
        tracing::debug!("Fetching dataset");
        let body = self.source.fetch_json(url).await?;
        let dataset = validate_dataset(body, &self.options)?;
        tracing::info!("📥 Loaded {} records", dataset.len());
        Ok(dataset)
    }
}

/// Checks the fetched body is a non-empty array of records that are not all
/// "no results" placeholders, and hands the records back unmodified.
pub fn validate_dataset(body: Value, options: &LoaderOptions) -> Result<Dataset> {
    let items = match body {
        Value::Array(items) if !items.is_empty() => items,
        Value::Array(_) => {
            return Err(TabularizeError::EmptyDatasetError {
                reason: "the dataset contains no items".to_string(),
            })
        }
        other => {
            return Err(TabularizeError::EmptyDatasetError {
                reason: format!("expected a JSON array of items, got {}", kind_of(&other)),
            })
        }
    };

    let dataset = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(Record::new(map)),
            other => Err(TabularizeError::InvalidRecordError {
                index,
                found: kind_of(&other).to_string(),
            }
            .into_serialization(Stage::Load)),
        })
        .collect::<Result<Dataset>>()?;

    if dataset
        .iter()
        .all(|record| is_sentinel(&record.data, &options.sentinel_keys))
    {
        return Err(TabularizeError::EmptyDatasetError {
            reason: "the search returned no results".to_string(),
        });
    }

    Ok(dataset)
}

/// A placeholder record: a sentinel key set to `true`, every other key null.
pub fn is_sentinel(record: &Map<String, Value>, sentinel_keys: &[String]) -> bool {
    let mut flagged = false;
    for (key, value) in record {
        if sentinel_keys.iter().any(|k| k == key) {
            flagged |= value == &Value::Bool(true);
        } else if !value.is_null() {
            return false;
        }
    }
    flagged
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
