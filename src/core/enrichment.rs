use crate::core::progress::{EnrichmentOutcome, Phase, ProgressEvent, ProgressTracker};
use crate::domain::model::{Credential, SubmissionResult};
use crate::domain::ports::ScanClient;
use crate::utils::error::ScanError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Renders a metric decimal as a percentage with two decimals, `-` when absent.
///
/// Ties round away from zero, so `0.00125` renders as `0.13%`.
pub fn format_metric(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };

    let scaled = value * 100.0;
    match Decimal::from_f64_retain(scaled) {
        Some(exact) => {
            let rounded = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            // 避免輸出 -0.00%
            let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
            format!("{:.2}%", rounded)
        }
        None => format!("{:.2}%", scaled),
    }
}

/// Fetches metrics for every successfully submitted result, in order.
///
/// Failed submissions are skipped without a call. A failed fetch leaves both
/// metric fields absent. Every result, skipped or not, advances progress so
/// the phase ends at exactly 100.
pub async fn enrich_results<C>(
    client: &C,
    credential: &Credential,
    results: &mut [SubmissionResult],
    progress: &ProgressTracker,
) where
    C: ScanClient + ?Sized,
{
    let total = results.len();

    tracing::info!(
        "📥 Fetching metrics for {} of {} records",
        results.iter().filter(|r| r.success).count(),
        total
    );

    for (index, result) in results.iter_mut().enumerate() {
        let outcome = if !result.success {
            EnrichmentOutcome::Skipped
        } else {
            match client.fetch_metrics(credential, &result.job_id).await {
                Ok(raw) => {
                    result.reviews_percentile = Some(format_metric(raw.reviews_percentile));
                    result.listings_inaccuracy = Some(format_metric(raw.listings_inaccuracy));
                    EnrichmentOutcome::Enriched
                }
                Err(e) => {
                    let err = ScanError::RecordEnrichmentError {
                        job_id: result.job_id.clone(),
                        message: e.to_string(),
                    };
                    tracing::warn!("⚠️ {}", err);
                    EnrichmentOutcome::Failed
                }
            }
        };

        progress.emit(ProgressEvent::RecordEnriched {
            index,
            job_id: result.job_id.clone(),
            outcome,
        });
        progress.update(Phase::Enrichment, index + 1, total);
    }

    if total == 0 {
        progress.update(Phase::Enrichment, 0, 0);
    }
}
