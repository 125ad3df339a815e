pub mod dedup;
pub mod flatten;
pub mod loader;
pub mod path;
pub mod pivot;
pub mod serialize;
pub mod tabularizer;
pub mod text;

pub use crate::domain::model::{CsvBlob, Dataset, ExportOptions, ExportRequest, FlatRecord, Record};
pub use crate::domain::ports::{DatasetSource, Storage};
pub use crate::utils::error::Result;
