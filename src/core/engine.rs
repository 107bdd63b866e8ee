use crate::core::enrichment::enrich_results;
use crate::core::export::ReportExporter;
use crate::core::progress::{ProgressEvent, ProgressHandler, ProgressTracker};
use crate::core::run_state::{RunState, RunStateCell};
use crate::core::submission::submit_records;
use crate::core::tabular;
use crate::domain::model::{InputFile, ScanReport, ScanRequest};
use crate::domain::ports::{ScanClient, Storage};
use crate::utils::error::{Result, ScanError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wait between the last submission and the first metrics fetch.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(12);

/// Drives a run: decode → submit → cooldown → enrich, then optionally export.
pub struct ScanEngine<C: ScanClient> {
    client: C,
    cooldown: Duration,
    progress: ProgressTracker,
    state: RunStateCell,
}

impl<C: ScanClient> ScanEngine<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            cooldown: DEFAULT_COOLDOWN,
            progress: ProgressTracker::default(),
            state: RunStateCell::default(),
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = ProgressTracker::new(handler);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> f64 {
        self.progress.current()
    }

    pub fn state(&self) -> RunState {
        self.state.current()
    }

    /// Called when the user picks a new file; progress goes back to 0.
    ///
    /// An in-flight run is not affected beyond the progress value.
    pub fn select_input(&self, input: &InputFile) {
        tracing::info!("📁 Input selected: {}", input.name);
        self.progress.reset();
    }

    /// Runs both phases and returns the enriched results.
    ///
    /// A missing credential or input is reported before any remote call, and
    /// so is an attempt to start while another run is active. Nothing after
    /// that point aborts the run: per-record failures stay in the report.
    pub async fn execute(&self, request: ScanRequest) -> Result<ScanReport> {
        let (credential, input) = request.into_parts()?;
        let guard = self.state.begin()?;
        let started_at = Utc::now();

        self.progress.reset();
        let records = tabular::decode(&input.contents);
        self.progress.emit(ProgressEvent::RunStarted {
            input: input.name.clone(),
            total: records.len(),
        });

        let mut results =
            submit_records(&self.client, &credential, &records, &self.progress).await;

        guard.advance(RunState::Cooling);
        self.progress.emit(ProgressEvent::CooldownStarted {
            duration: self.cooldown,
        });
        tokio::time::sleep(self.cooldown).await;

        guard.advance(RunState::Enriching);
        enrich_results(&self.client, &credential, &mut results, &self.progress).await;

        let report = ScanReport {
            input_name: input.name,
            results,
            progress: self.progress.current(),
            started_at,
            finished_at: Utc::now(),
        };

        self.progress.emit(ProgressEvent::Completed {
            succeeded: report.succeeded(),
            failed: report.failed(),
            enriched: report.enriched(),
        });
        guard.finish();

        Ok(report)
    }

    /// [`execute`](Self::execute) followed by writing the report.
    ///
    /// A failed write returns [`ScanError::ExportError`] carrying the finished
    /// report, since every remote call has already been made.
    pub async fn run<S: Storage>(
        &self,
        request: ScanRequest,
        exporter: &ReportExporter<S>,
    ) -> Result<(ScanReport, String)> {
        let report = self.execute(request).await?;
        match exporter.export(&report.results).await {
            Ok(output_path) => Ok((report, output_path)),
            Err(e) => Err(ScanError::ExportError {
                report: Box::new(report),
                source: Box::new(e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{FakeCall, FakeScanClient};
    use crate::domain::model::SubmissionResult;

    const INPUT: &str = "Name,Address,Phone,City,State,Zip Code\n\
        A,1 Main St,555-0100,Springfield,IL,62701\n\
        B,2 Side Ave,555-0101,Shelbyville,IL,62565\n";

    fn request() -> ScanRequest {
        ScanRequest::new("key", InputFile::new("locations.csv", INPUT))
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_two_phase_scenario() {
        let client = FakeScanClient::new()
            .accept("A", "j1")
            .metrics("j1", Some(0.9), None);
        let engine = ScanEngine::new(client);

        let report = engine.execute(request()).await.unwrap();

        let mut expected_a = SubmissionResult::submitted("A", "j1");
        expected_a.reviews_percentile = Some("90.00%".to_string());
        expected_a.listings_inaccuracy = Some("-".to_string());
        assert_eq!(report.results, vec![expected_a, SubmissionResult::failed("B")]);
        assert_eq!(report.progress, 100.0);
        assert_eq!(engine.progress(), 100.0);
        assert_eq!(engine.state(), RunState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrichment_waits_for_cooldown() {
        let client = FakeScanClient::new()
            .accept("A", "j1")
            .accept("B", "j2")
            .metrics("j1", Some(0.1), Some(0.2))
            .metrics("j2", Some(0.3), Some(0.4));
        let engine = ScanEngine::new(client);

        engine.execute(request()).await.unwrap();

        let calls = engine.client.calls();
        let last_submit = calls
            .iter()
            .filter_map(|call| match call {
                FakeCall::Submit { at, .. } => Some(*at),
                _ => None,
            })
            .max()
            .unwrap();
        let first_fetch = calls
            .iter()
            .filter_map(|call| match call {
                FakeCall::Fetch { at, .. } => Some(*at),
                _ => None,
            })
            .min()
            .unwrap();
        assert!(first_fetch - last_submit >= DEFAULT_COOLDOWN);
    }

    #[tokio::test]
    async fn test_missing_credential_issues_no_calls() {
        let engine = ScanEngine::new(FakeScanClient::new().accept("A", "j1"))
            .with_cooldown(Duration::ZERO);
        let request = ScanRequest {
            credential: None,
            input: Some(InputFile::new("locations.csv", INPUT)),
        };

        let err = engine.execute(request).await.unwrap_err();

        assert!(matches!(err, ScanError::MissingConfigError { ref field } if field == "credential"));
        assert!(engine.client.calls().is_empty());
        assert_eq!(engine.state(), RunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_run_rejected_while_cooling() {
        let engine = Arc::new(ScanEngine::new(
            FakeScanClient::new().accept("A", "j1").metrics("j1", None, None),
        ));

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.execute(request()).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(engine.state(), RunState::Cooling);

        let err = engine.execute(request()).await.unwrap_err();
        assert!(matches!(err, ScanError::RunInProgress { .. }));
        assert_eq!(engine.progress(), 50.0);

        let report = first.await.unwrap().unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(engine.client.submitted_names(), vec!["A", "B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic_within_run() {
        let engine = ScanEngine::new(FakeScanClient::new().accept("B", "j2"));
        let mut rx = engine.subscribe();

        let watcher = tokio::spawn(async move {
            let mut seen = vec![*rx.borrow_and_update()];
            while rx.changed().await.is_ok() {
                let value = *rx.borrow_and_update();
                seen.push(value);
                if value >= 100.0 {
                    break;
                }
            }
            seen
        });

        engine.execute(request()).await.unwrap();
        let seen = watcher.await.unwrap();

        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(seen.last().copied(), Some(100.0));
    }

    #[test]
    fn test_select_input_resets_progress() {
        let engine = ScanEngine::new(FakeScanClient::new());
        engine.progress.update(crate::core::progress::Phase::Enrichment, 1, 1);
        assert_eq!(engine.progress(), 100.0);

        engine.select_input(&InputFile::new("next.csv", INPUT));
        assert_eq!(engine.progress(), 0.0);
    }

    struct ReadOnlyStorage;

    impl Storage for ReadOnlyStorage {
        async fn write_file(&self, _path: &str, _data: &[u8]) -> Result<()> {
            Err(ScanError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only file system",
            )))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_export_keeps_finished_report() {
        let engine = ScanEngine::new(
            FakeScanClient::new()
                .accept("A", "j1")
                .metrics("j1", Some(0.5), Some(0.25)),
        );
        let exporter = ReportExporter::new(ReadOnlyStorage, "out", "table_data.csv");

        let err = engine.run(request(), &exporter).await.unwrap_err();

        match err {
            ScanError::ExportError { report, source } => {
                assert_eq!(report.results.len(), 2);
                assert_eq!(report.results[0].reviews_percentile.as_deref(), Some("50.00%"));
                assert!(matches!(*source, ScanError::IoError(_)));
            }
            other => panic!("expected export error, got {other:?}"),
        }
        assert_eq!(engine.state(), RunState::Done);
        assert_eq!(engine.client.submitted_names(), vec!["A", "B"]);
    }
}
