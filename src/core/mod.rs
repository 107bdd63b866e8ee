pub mod engine;
pub mod enrichment;
pub mod export;
pub mod progress;
pub mod run_state;
pub mod submission;
pub mod tabular;

pub use crate::domain::model::{Record, ScanReport, SubmissionResult};
pub use crate::domain::ports::{ScanClient, Storage};
pub use crate::utils::error::Result;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::model::{Credential, RawMetrics, Record};
    use crate::domain::ports::ScanClient;
    use crate::utils::error::{Result, ScanError};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Debug, Clone)]
    pub(crate) enum FakeCall {
        Submit { name: String, at: Instant },
        Fetch { job_id: String, at: Instant },
    }

    /// In-memory scan service. Unknown names fail to submit, unknown jobs fail to fetch.
    #[derive(Default)]
    pub(crate) struct FakeScanClient {
        jobs: HashMap<String, String>,
        metrics: HashMap<String, RawMetrics>,
        latency: Duration,
        calls: Mutex<Vec<FakeCall>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeScanClient {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn accept(mut self, name: &str, job_id: &str) -> Self {
            self.jobs.insert(name.to_string(), job_id.to_string());
            self
        }

        pub(crate) fn metrics(
            mut self,
            job_id: &str,
            reviews_percentile: Option<f64>,
            listings_inaccuracy: Option<f64>,
        ) -> Self {
            self.metrics.insert(
                job_id.to_string(),
                RawMetrics {
                    reviews_percentile,
                    listings_inaccuracy,
                },
            );
            self
        }

        pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        pub(crate) fn calls(&self) -> Vec<FakeCall> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn submitted_names(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    FakeCall::Submit { name, .. } => Some(name),
                    FakeCall::Fetch { .. } => None,
                })
                .collect()
        }

        pub(crate) fn fetched_jobs(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    FakeCall::Fetch { job_id, .. } => Some(job_id),
                    FakeCall::Submit { .. } => None,
                })
                .collect()
        }

        pub(crate) fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        async fn simulate_call(&self, call: FakeCall) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(call);

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl ScanClient for FakeScanClient {
        async fn submit(&self, _credential: &Credential, record: &Record) -> Result<String> {
            let name = record.name().unwrap_or_default().to_string();
            self.simulate_call(FakeCall::Submit {
                name: name.clone(),
                at: Instant::now(),
            })
            .await;

            self.jobs
                .get(&name)
                .cloned()
                .ok_or(ScanError::RemoteStatus {
                    operation: "submit".to_string(),
                    status: 500,
                })
        }

        async fn fetch_metrics(&self, _credential: &Credential, job_id: &str) -> Result<RawMetrics> {
            self.simulate_call(FakeCall::Fetch {
                job_id: job_id.to_string(),
                at: Instant::now(),
            })
            .await;

            self.metrics
                .get(job_id)
                .copied()
                .ok_or(ScanError::RemoteStatus {
                    operation: "metrics".to_string(),
                    status: 404,
                })
        }
    }
}
