use crate::utils::error::{Result, TabularizeError};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.apify.com/v2";

/// Download link for the dataset of a finished actor run.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetLink {
    pub base_url: String,
    pub run_id: String,
    pub token: String,
}

impl DatasetLink {
    pub fn new(run_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            run_id: run_id.into(),
            token: token.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn to_url(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(TabularizeError::MissingConfigError {
                field: "source.token".to_string(),
            });
        }
        if self.run_id.trim().is_empty() {
            return Err(TabularizeError::MissingConfigError {
                field: "source.run_id".to_string(),
            });
        }

        let invalid_base = |reason: String| TabularizeError::InvalidConfigValueError {
            field: "source.api_base".to_string(),
            value: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid_base(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid_base("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["actor-runs", self.run_id.as_str(), "dataset", "items"]);
        url.query_pairs_mut()
            .append_pair("token", &self.token)
            .append_pair("format", "json")
            .append_pair("attachment", "true")
            .append_pair("clean", "true");

        Ok(url.to_string())
    }
}
