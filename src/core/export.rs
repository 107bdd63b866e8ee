use crate::core::tabular;
use crate::domain::model::SubmissionResult;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::Path;

pub const DEFAULT_REPORT_FILENAME: &str = "table_data.csv";

/// Writes the final result table as a CSV file under a fixed name.
pub struct ReportExporter<S: Storage> {
    storage: S,
    output_path: String,
    filename: String,
}

impl<S: Storage> ReportExporter<S> {
    pub fn new(storage: S, output_path: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            storage,
            output_path: output_path.into(),
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Serializes the results without touching storage. Values are written as-is.
    pub fn render(&self, results: &[SubmissionResult]) -> Result<String> {
        tabular::encode(results)
    }

    /// Writes the report and returns where it landed.
    pub async fn export(&self, results: &[SubmissionResult]) -> Result<String> {
        let csv_content = self.render(results)?;

        tracing::debug!(
            "Writing report ({} rows, {} bytes) to {}",
            results.len(),
            csv_content.len(),
            self.filename
        );
        self.storage
            .write_file(&self.filename, csv_content.as_bytes())
            .await?;

        let output_path = Path::new(&self.output_path)
            .join(&self.filename)
            .display()
            .to_string();
        tracing::info!("💾 Report saved: {}", output_path);
        Ok(output_path)
    }
}
