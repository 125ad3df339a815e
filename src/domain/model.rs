use crate::domain::column_types::ColumnTypes;
use crate::utils::error::{Result, TabularizeError};
use crate::utils::validation::{redact_url, validate_url, Validate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::num::NonZeroUsize;

/// One scraped item as fetched from the source, keys in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

pub type Dataset = Vec<Record>;

/// A record after flattening: column name to scalar or array value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatRecord {
    pub columns: Map<String, Value>,
}

impl FlatRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }
}

/// How many array elements an unwind consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TakeRepr", into = "TakeRepr")]
pub enum Take {
    First(NonZeroUsize),
    Max,
}

impl Take {
    pub fn limit(&self) -> Option<usize> {
        match self {
            Take::First(n) => Some(n.get()),
            Take::Max => None,
        }
    }

    pub fn is_single(&self) -> bool {
        self.limit() == Some(1)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TakeRepr {
    Count(u64),
    Keyword(String),
}

impl TryFrom<TakeRepr> for Take {
    type Error = String;

    fn try_from(repr: TakeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            TakeRepr::Count(n) => usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(Take::First)
                .ok_or_else(|| format!("take must be a positive integer or \"max\", got {}", n)),
            TakeRepr::Keyword(word) if word == "max" => Ok(Take::Max),
            TakeRepr::Keyword(word) => Err(format!(
                "take must be a positive integer or \"max\", got \"{}\"",
                word
            )),
        }
    }
}

impl From<Take> for TakeRepr {
    fn from(take: Take) -> Self {
        match take {
            Take::First(n) => TakeRepr::Count(n.get() as u64),
            Take::Max => TakeRepr::Keyword("max".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnwindField {
    /// Dotted path inside each array element; empty means the element itself.
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnwindTarget {
    #[serde(alias = "target_column")]
    pub target_column: String,
    pub fields: Vec<UnwindField>,
    pub take: Take,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotSpec {
    pub column: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPlan {
    #[serde(default, alias = "custom_column_order", skip_serializing_if = "Option::is_none")]
    pub custom_column_order: Option<Vec<String>>,
    #[serde(default, alias = "remove_columns", skip_serializing_if = "Vec::is_empty")]
    pub remove_columns: Vec<String>,
    #[serde(default, alias = "dedup_key", skip_serializing_if = "Option::is_none")]
    pub dedup_key: Option<String>,
}

impl ColumnPlan {
    /// Dedup key, treating an empty string as unset.
    pub fn dedup_key(&self) -> Option<&str> {
        self.dedup_key.as_deref().filter(|key| !key.is_empty())
    }
}

/// Everything about an export except where the data comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    #[serde(flatten)]
    pub plan: ColumnPlan,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unwind: Vec<UnwindTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<PivotSpec>,
    #[serde(default, alias = "clean_text")]
    pub clean_text: bool,
    #[serde(default, alias = "column_types", skip_serializing_if = "Option::is_none")]
    pub column_types: Option<ColumnTypes>,
}

/// The export configuration handed over by the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub url: String,
    #[serde(flatten)]
    pub options: ExportOptions,
}

impl ExportRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: ExportOptions::default(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }
}

/// Finished CSV output, ready to be downloaded or uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvBlob {
    pub headers: Vec<String>,
    pub row_count: usize,
    content: String,
}

impl CsvBlob {
    pub const CONTENT_TYPE: &'static str = "text/csv;charset=utf-8";

    pub fn new(headers: Vec<String>, row_count: usize, content: String) -> Self {
        Self {
            headers,
            row_count,
            content,
        }
    }

    pub fn content_type(&self) -> &'static str {
        Self::CONTENT_TYPE
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl Validate for ExportRequest {
    /// A URL that could never be fetched fails the same way a failed fetch does.
    fn validate(&self) -> Result<()> {
        validate_url("url", &self.url).map_err(|e| TabularizeError::FetchError {
            url: redact_url(&self.url),
            message: match e {
                TabularizeError::InvalidConfigValueError { reason, .. } => reason,
                other => other.to_string(),
            },
        })
    }
}
