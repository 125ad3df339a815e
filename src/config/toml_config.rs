use crate::adapters::dataset_link::DatasetLink;
use crate::core::loader::LoaderOptions;
use crate::domain::column_types::ColumnTypes;
use crate::domain::model::{ExportOptions, ExportRequest};
use crate::utils::error::{Result, TabularizeError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_required_field,
    validate_url, Validate,
};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub export: ExportOptions,
    #[serde(default)]
    pub loader: LoaderOptions,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub column_types: Option<ColumnTypes>,
}

/// Where the dataset comes from: a direct `url`, or a `run_id` plus `token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub run_id: Option<String>,
    pub token: Option<String>,
    pub api_base: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    /// File name; `{timestamp}` is replaced with the export time.
    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_filename_pattern() -> String {
    "dataset_{timestamp}.csv".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename_pattern: default_filename_pattern(),
        }
    }
}

impl OutputConfig {
    pub fn filename_at(&self, at: chrono::DateTime<chrono::Local>) -> String {
        self.filename_pattern
            .replace("{timestamp}", &at.format("%Y%m%d_%H%M%S").to_string())
    }

    pub fn filename(&self) -> String {
        self.filename_at(chrono::Local::now())
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TabularizeError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TabularizeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${APIFY_TOKEN})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// The dataset URL, built from `run_id`/`token` when no `url` is set.
    pub fn dataset_url(&self) -> Result<String> {
        if let Some(url) = self.source.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.to_string());
        }

        let run_id = validate_required_field("source.url", &self.source.run_id)?;
        let token = validate_required_field("source.token", &self.source.token)?;

        let mut link = DatasetLink::new(run_id.as_str(), token.as_str());
        if let Some(base) = &self.source.api_base {
            link = link.with_base_url(base.as_str());
        }
        link.to_url()
    }

    /// Column types from `[column_types]`, overridden by `export.column_types`.
    pub fn merged_column_types(&self) -> Option<ColumnTypes> {
        match (&self.column_types, &self.export.column_types) {
            (None, None) => None,
            (Some(types), None) | (None, Some(types)) => Some(types.clone()),
            (Some(base), Some(overrides)) => {
                let mut merged = base.clone();
                merged.merge(overrides);
                Some(merged)
            }
        }
    }

    pub fn to_request(&self) -> Result<ExportRequest> {
        let mut options = self.export.clone();
        options.column_types = self.merged_column_types();
        Ok(ExportRequest::new(self.dataset_url()?).with_options(options))
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.source
            .timeout_seconds
            .map(std::time::Duration::from_secs)
    }

    pub fn validate_config(&self) -> Result<()> {
        let url = self.dataset_url()?;
        validate_url("source.url", &url)?;

        if let Some(timeout) = self.source.timeout_seconds {
            validate_positive_number("source.timeout_seconds", timeout, 1)?;
        }

        validate_path("output.path", &self.output.path)?;
        validate_non_empty_string("output.filename_pattern", &self.output.filename_pattern)?;

        for (i, key) in self.loader.sentinel_keys.iter().enumerate() {
            validate_non_empty_string(&format!("loader.sentinel_keys[{}]", i), key)?;
        }

        for (i, target) in self.export.unwind.iter().enumerate() {
            validate_non_empty_string(
                &format!("export.unwind[{}].targetColumn", i),
                &target.target_column,
            )?;
        }
        if let Some(pivot) = &self.export.pivot {
            validate_non_empty_string("export.pivot.column", &pivot.column)?;
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::column_types::{BaseType, ColumnType};
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[source]
url = "https://api.example.com/items"
timeout_seconds = 30
headers = { "x-api-key" = "k" }

[export]
dedupKey = "id"
removeColumns = ["raw"]
cleanText = true

[[export.unwind]]
targetColumn = "media"
take = 1
fields = [{ field = "url", alias = "media_url" }]

[loader]
sentinel_keys = ["noResults", "empty"]

[output]
path = "./exports"
filename_pattern = "tweets_{timestamp}.csv"

[column_types]
likeCount = "number"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.export.plan.dedup_key(), Some("id"));
        assert_eq!(config.export.plan.remove_columns, vec!["raw".to_string()]);
        assert!(config.export.clean_text);
        assert_eq!(config.export.unwind[0].target_column, "media");
        assert!(config.export.unwind[0].take.is_single());
        assert_eq!(config.loader.sentinel_keys.len(), 2);
        assert_eq!(config.timeout(), Some(std::time::Duration::from_secs(30)));
        assert_eq!(config.output.path, "./exports");

        let request = config.to_request().unwrap();
        assert_eq!(request.url, "https://api.example.com/items");
        assert_eq!(
            request.options.column_types.unwrap().get_mapping("likeCount"),
            Some(ColumnType::Scalar(BaseType::Number))
        );
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config = TomlConfig::from_toml_str("[source]\nurl = \"https://a.example.com\"\n")
            .unwrap();

        assert_eq!(config.output.path, "./output");
        assert_eq!(config.output.filename_pattern, "dataset_{timestamp}.csv");
        assert_eq!(config.loader.sentinel_keys, vec!["noResults".to_string()]);
        assert!(config.export.unwind.is_empty());
        assert!(config.merged_column_types().is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TABULARIZER_TEST_TOKEN", "secret-token");

        let toml_content = r#"
[source]
run_id = "run42"
token = "${TABULARIZER_TEST_TOKEN}"
api_base = "http://localhost:9000/v2"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.token.as_deref(), Some("secret-token"));
        assert_eq!(
            config.dataset_url().unwrap(),
            "http://localhost:9000/v2/actor-runs/run42/dataset/items?token=secret-token&format=json&attachment=true&clean=true"
        );

        std::env::remove_var("TABULARIZER_TEST_TOKEN");
    }

    #[test]
    fn test_unset_env_var_is_left_as_is() {
        let config = TomlConfig::from_toml_str(
            "[source]\nurl = \"${TABULARIZER_TEST_SURELY_UNSET}\"\n",
        )
        .unwrap();
        assert_eq!(
            config.source.url.as_deref(),
            Some("${TABULARIZER_TEST_SURELY_UNSET}")
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let invalid_url = TomlConfig::from_toml_str("[source]\nurl = \"invalid-url\"\n").unwrap();
        assert!(invalid_url.validate().is_err());

        let no_source = TomlConfig::from_toml_str("").unwrap();
        assert!(matches!(
            no_source.validate(),
            Err(TabularizeError::MissingConfigError { .. })
        ));

        let no_token = TomlConfig::from_toml_str("[source]\nrun_id = \"run-1\"\n").unwrap();
        match no_token.dataset_url() {
            Err(TabularizeError::MissingConfigError { field }) => assert_eq!(field, "source.token"),
            other => panic!("unexpected result: {:?}", other),
        }

        let zero_timeout = TomlConfig::from_toml_str(
            "[source]\nurl = \"https://a.example.com\"\ntimeout_seconds = 0\n",
        )
        .unwrap();
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[source\nurl = 1").unwrap_err();
        assert!(matches!(err, TabularizeError::ConfigError { .. }));
    }

    #[test]
    fn test_export_column_types_override_table() {
        let toml_content = r#"
[source]
url = "https://a.example.com"

[export.columnTypes]
views = "category"

[column_types]
views = "number"
lang = "category"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let types = config.merged_column_types().unwrap();

        assert_eq!(types.len(), 2);
        assert_eq!(types.annotate("views"), "views<gx:category>");
    }

    #[test]
    fn test_output_filename_pattern() {
        let output = OutputConfig::default();
        let at = chrono::Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(output.filename_at(at), "dataset_20240305_140709.csv");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[source]\nurl = \"https://api.example.com\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.source.url.as_deref(), Some("https://api.example.com"));
    }
}
