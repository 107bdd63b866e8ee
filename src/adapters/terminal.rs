use crate::core::progress::{EnrichmentOutcome, ProgressEvent, ProgressHandler};
use crate::domain::model::SubmissionResult;
use indicatif::{ProgressBar, ProgressStyle};

/// Draws run progress as a terminal progress bar.
pub struct ProgressBarHandler {
    bar: ProgressBar,
}

impl ProgressBarHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for ProgressBarHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for ProgressBarHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { input, total } => {
                self.bar
                    .set_message(format!("submitting {} records from {}", total, input));
            }
            ProgressEvent::RecordSubmitted { name, success, .. } => {
                if !success {
                    self.bar.println(format!("⚠️  submission failed: {}", name));
                }
            }
            ProgressEvent::SubmissionComplete { results } => {
                self.bar.println(render_table(results));
            }
            ProgressEvent::CooldownStarted { duration } => {
                self.bar
                    .set_message(format!("waiting {}s for scans", duration.as_secs()));
            }
            ProgressEvent::RecordEnriched {
                job_id, outcome, ..
            } => match outcome {
                EnrichmentOutcome::Failed => {
                    self.bar.println(format!("⚠️  metrics unavailable: {}", job_id));
                }
                _ => self.bar.set_message("fetching metrics"),
            },
            ProgressEvent::Progress { percent, .. } => {
                self.bar.set_position(percent.round() as u64);
            }
            ProgressEvent::Completed { .. } => {
                self.bar.finish_with_message("done");
            }
            ProgressEvent::Reset => {
                self.bar.reset();
            }
        }
    }
}

/// Plain-text table of results, one row per record.
pub fn render_table(results: &[SubmissionResult]) -> String {
    let headers = ["Name", "Job ID", "Reviews Percentile", "Listings Inaccuracy"];
    let rows: Vec<[&str; 4]> = results
        .iter()
        .map(|r| {
            [
                r.name.as_str(),
                r.job_id.as_str(),
                r.reviews_percentile.as_deref().unwrap_or(""),
                r.listings_inaccuracy.as_deref().unwrap_or(""),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[&str; 4]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(&headers)];
    lines.extend(rows.iter().map(format_row));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_aligns_columns() {
        let mut enriched = SubmissionResult::submitted("Acme", "j1");
        enriched.reviews_percentile = Some("90.00%".to_string());
        enriched.listings_inaccuracy = Some("-".to_string());
        let table = render_table(&[enriched, SubmissionResult::failed("B")]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Name | Job ID | Reviews Percentile | Listings Inaccuracy"
        );
        assert_eq!(lines[1], "Acme | j1     | 90.00%             | -");
        assert_eq!(lines[2], "B    |        |                    |");
    }
}
