use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Serialize => "serialize",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum TabularizeError {
    #[error("Failed to fetch dataset from {url}: {message}")]
    FetchError { url: String, message: String },

    #[error("Dataset is empty: {reason}")]
    EmptyDatasetError { reason: String },

    #[error("CSV export failed during {stage}: {source}")]
    SerializationError {
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Record {index} is not an object (found {found})")]
    InvalidRecordError { index: usize, found: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, TabularizeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TabularizeError {
    /// Wraps a transform failure so it surfaces through the single
    /// serialization boundary. Fetch, empty-dataset and already wrapped
    /// errors pass through untouched.
    pub fn into_serialization(self, stage: Stage) -> Self {
        match self {
            e @ (TabularizeError::FetchError { .. }
            | TabularizeError::EmptyDatasetError { .. }
            | TabularizeError::SerializationError { .. }) => e,
            other => TabularizeError::SerializationError {
                stage,
                source: Box::new(other),
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TabularizeError::FetchError { .. } => ErrorCategory::Network,
            TabularizeError::EmptyDatasetError { .. }
            | TabularizeError::SerializationError { .. }
            | TabularizeError::InvalidRecordError { .. }
            | TabularizeError::JsonError(_) => ErrorCategory::Data,
            TabularizeError::ConfigError { .. }
            | TabularizeError::InvalidConfigValueError { .. }
            | TabularizeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            TabularizeError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TabularizeError::EmptyDatasetError { .. } => ErrorSeverity::Low,
            TabularizeError::FetchError { .. } => ErrorSeverity::Medium,
            TabularizeError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TabularizeError::FetchError { url, .. } => {
                format!("Could not download the dataset from {}", url)
            }
            TabularizeError::EmptyDatasetError { .. } => {
                "The scraping run returned no results to export".to_string()
            }
            TabularizeError::SerializationError { stage, .. } => {
                format!("Could not convert the dataset to CSV ({} step failed)", stage)
            }
            TabularizeError::InvalidRecordError { index, .. } => {
                format!("Dataset item {} is not a record", index)
            }
            TabularizeError::ConfigError { message } => message.clone(),
            TabularizeError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            TabularizeError::MissingConfigError { field } => {
                format!("Setting '{}' is required", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TabularizeError::FetchError { .. } => {
                "Check that the scraping run has finished and that the dataset link and API token are valid, then retry the export."
            }
            TabularizeError::EmptyDatasetError { .. } => {
                "Try broadening your query: use fewer or more general search terms, widen the date range, or raise the item limit."
            }
            TabularizeError::SerializationError { .. }
            | TabularizeError::InvalidRecordError { .. }
            | TabularizeError::JsonError(_) => {
                "Check the unwind, pivot and column settings against the shape of the dataset."
            }
            TabularizeError::ConfigError { .. }
            | TabularizeError::InvalidConfigValueError { .. }
            | TabularizeError::MissingConfigError { .. } => {
                "Fix the export configuration and run the export again."
            }
            TabularizeError::IoError(_) => {
                "Check that the output directory exists and is writable."
            }
        }
    }
}
