use crate::core::progress::{Phase, ProgressEvent, ProgressTracker};
use crate::domain::model::{Credential, Record, SubmissionResult};
use crate::domain::ports::ScanClient;
use crate::utils::error::ScanError;

/// Submits every record, one call at a time, in input order.
///
/// A failed call never stops the loop: the record is kept with an empty job
/// id and `success = false`. The returned list always has one entry per
/// record, and progress ends at exactly 50.
pub async fn submit_records<C>(
    client: &C,
    credential: &Credential,
    records: &[Record],
    progress: &ProgressTracker,
) -> Vec<SubmissionResult>
where
    C: ScanClient + ?Sized,
{
    let total = records.len();
    let mut results = Vec::with_capacity(total);

    tracing::info!("📤 Submitting {} records", total);

    for (index, record) in records.iter().enumerate() {
        let name = record.name().unwrap_or_default().to_string();

        let result = match client.submit(credential, record).await {
            Ok(job_id) => {
                tracing::debug!("Record {} ({}) accepted as job {}", index + 1, name, job_id);
                SubmissionResult::submitted(name.clone(), job_id)
            }
            Err(e) => {
                let err = ScanError::RecordSubmissionError {
                    record: name.clone(),
                    message: e.to_string(),
                };
                tracing::warn!("⚠️ {}", err);
                SubmissionResult::failed(name.clone())
            }
        };

        progress.emit(ProgressEvent::RecordSubmitted {
            index,
            name,
            success: result.success,
        });
        results.push(result);

        // 無論成功與否都要推進進度
        progress.update(Phase::Submission, index + 1, total);
    }

    if total == 0 {
        progress.update(Phase::Submission, 0, 0);
    }

    progress.emit(ProgressEvent::SubmissionComplete {
        results: results.clone(),
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FakeScanClient;
    use crate::domain::model::LocationField;

    fn records(names: &[&str]) -> Vec<Record> {
        names
            .iter()
            .map(|name| Record::new().with(LocationField::Name, *name))
            .collect()
    }

    #[tokio::test]
    async fn test_submit_keeps_order_and_isolates_failures() {
        let client = FakeScanClient::new()
            .accept("A", "j1")
            .accept("C", "j3");
        let credential = Credential::new("key").unwrap();
        let progress = ProgressTracker::default();

        let results =
            submit_records(&client, &credential, &records(&["A", "B", "C"]), &progress).await;

        assert_eq!(
            results,
            vec![
                SubmissionResult::submitted("A", "j1"),
                SubmissionResult::failed("B"),
                SubmissionResult::submitted("C", "j3"),
            ]
        );
        assert_eq!(progress.current(), 50.0);
        assert_eq!(client.submitted_names(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_submit_all_failures_still_reaches_half() {
        let client = FakeScanClient::new();
        let credential = Credential::new("key").unwrap();
        let progress = ProgressTracker::default();

        let results = submit_records(&client, &credential, &records(&["A", "B"]), &progress).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success && r.job_id.is_empty()));
        assert_eq!(progress.current(), 50.0);
    }

    #[tokio::test]
    async fn test_submit_missing_name_yields_empty_name() {
        let client = FakeScanClient::new().accept("", "j0");
        let credential = Credential::new("key").unwrap();
        let progress = ProgressTracker::default();
        let record = Record::new().with(LocationField::City, "Springfield");

        let results = submit_records(&client, &credential, &[record], &progress).await;

        assert_eq!(results, vec![SubmissionResult::submitted("", "j0")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_never_overlaps_calls() {
        let client = FakeScanClient::new()
            .accept("A", "j1")
            .accept("B", "j2")
            .with_latency(std::time::Duration::from_millis(250));
        let credential = Credential::new("key").unwrap();
        let progress = ProgressTracker::default();

        submit_records(&client, &credential, &records(&["A", "B", "A"]), &progress).await;

        assert_eq!(client.max_in_flight(), 1);
    }
}
