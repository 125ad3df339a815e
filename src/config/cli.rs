use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "tabularize")]
#[command(about = "Export a scraped JSON dataset as a flat CSV file")]
pub struct CliConfig {
    #[arg(long, short, help = "TOML export configuration")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Dataset URL, overrides [source] in the config file")]
    pub url: Option<String>,

    #[arg(long, help = "Output directory, overrides [output].path")]
    pub output: Option<String>,

    #[arg(long, help = "Deduplicate records on this field")]
    pub dedup_key: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Columns to leave out of the CSV")]
    pub remove_columns: Vec<String>,

    #[arg(long, value_delimiter = ',', help = "Columns to put first, in this order")]
    pub column_order: Vec<String>,

    #[arg(long, help = "Clean whitespace and non-printable characters from text")]
    pub clean_text: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage after each stage")]
    pub monitor: bool,
}

impl CliConfig {
    /// The file configuration (or defaults) with command line overrides applied.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(url) = &self.url {
            config.source.url = Some(url.clone());
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(key) = &self.dedup_key {
            config.export.plan.dedup_key = Some(key.clone());
        }
        if !self.remove_columns.is_empty() {
            config.export.plan.remove_columns = self.remove_columns.clone();
        }
        if !self.column_order.is_empty() {
            config.export.plan.custom_column_order = Some(self.column_order.clone());
        }
        if self.clean_text {
            config.export.clean_text = true;
        }

        config.validate()?;
        Ok(config)
    }
}
