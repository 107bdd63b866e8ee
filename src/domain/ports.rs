use crate::domain::model::{Credential, RawMetrics, Record};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The remote bulk scan service. Each call is exactly one network request.
#[async_trait]
pub trait ScanClient: Send + Sync {
    /// Submits a record for scanning and returns the job identifier.
    async fn submit(&self, credential: &Credential, record: &Record) -> Result<String>;

    /// Fetches the quality metrics of a previously submitted job.
    async fn fetch_metrics(&self, credential: &Credential, job_id: &str) -> Result<RawMetrics>;
}
