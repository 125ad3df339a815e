pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::{DatasetLink, HttpSource, LocalStorage};
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::TomlConfig;
pub use crate::core::loader::LoaderOptions;
pub use crate::core::tabularizer::Tabularizer;
pub use crate::domain::column_types::{ColumnType, ColumnTypes};
pub use crate::domain::model::{CsvBlob, ExportOptions, ExportRequest};
pub use crate::utils::error::{Result, TabularizeError};
