use crate::core::dedup::deduplicate;
use crate::core::flatten::flatten_all;
use crate::core::loader::{Loader, LoaderOptions};
use crate::core::pivot::pivot;
use crate::core::serialize::serialize;
use crate::core::text::clean_record;
use crate::domain::model::{CsvBlob, Dataset, ExportOptions, ExportRequest};
use crate::domain::ports::DatasetSource;
use crate::utils::error::{Result, Stage};
use crate::utils::monitor::StageMonitor;
use crate::utils::validation::Validate;

/// Runs an export end to end: load, pivot, dedup, flatten, clean, serialize.
pub struct Tabularizer<S: DatasetSource> {
    loader: Loader<S>,
    monitor: StageMonitor,
}

impl<S: DatasetSource> Tabularizer<S> {
    pub fn new(source: S) -> Self {
        Self::with_loader_options(source, LoaderOptions::default())
    }

    pub fn with_loader_options(source: S, options: LoaderOptions) -> Self {
        Self {
            loader: Loader::with_options(source, options),
            monitor: StageMonitor::new(false),
        }
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = StageMonitor::new(enabled);
        self
    }

    pub async fn export(&self, request: &ExportRequest) -> Result<CsvBlob> {
        request.validate()?;
        tracing::info!("🚀 Starting CSV export");

        let dataset = self.loader.load(&request.url).await?;
        self.monitor.log_stage("load", dataset.len());

        let blob = self.transform(dataset, &request.options)?;
        tracing::info!(
            "✅ Export complete: {} rows, {} columns, {} bytes",
            blob.row_count,
            blob.headers.len(),
            blob.len()
        );
        Ok(blob)
    }

    /// The synchronous part of an export, for a dataset already in memory.
    /// Failures come back as a serialization error.
    pub fn transform(&self, dataset: Dataset, options: &ExportOptions) -> Result<CsvBlob> {
        let dataset = pivot(dataset, options.pivot.as_ref());
        self.monitor.log_stage("pivot", dataset.len());

        let dataset = deduplicate(dataset, options.plan.dedup_key());
        self.monitor.log_stage("dedup", dataset.len());

        let mut flattened = flatten_all(&dataset, &options.unwind);
        self.monitor.log_stage("flatten", flattened.len());

        if options.clean_text {
            flattened.iter_mut().for_each(clean_record);
            tracing::debug!("Cleaned text in {} records", flattened.len());
        }

        if let Some(types) = &options.column_types {
            tracing::debug!("Annotating headers with {} column types", types.len());
        }
        let blob = serialize(&flattened, &options.plan, options.column_types.as_ref())
            .map_err(|e| e.into_serialization(Stage::Serialize))?;
        self.monitor.log_stage("serialize", blob.row_count);
        Ok(blob)
    }
}
