use super::types::{Detection, FileAnalysis, ReportSummary, Severity};

pub const MAX_SCORE: u32 = 100;

/// Severity-weighted sum of detections, capped at 100.
pub fn score(detections: &[Detection]) -> u32 {
    score_severities(detections.iter().map(|d| d.severity))
}

pub fn score_severities(severities: impl IntoIterator<Item = Severity>) -> u32 {
    let total: u32 = severities
        .into_iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.weight()));
    total.min(MAX_SCORE)
}

pub fn summarize(analyses: &[FileAnalysis]) -> ReportSummary {
    let mut summary = ReportSummary {
        total_files: analyses.len(),
        ..Default::default()
    };

    for analysis in analyses {
        if analysis.has_mocks() {
            summary.files_with_mocks += 1;
        }
        summary.total_tests += analysis.total_tests;
        summary.mock_free_tests += analysis.mock_free_sections;
        for detection in &analysis.detections {
            match detection.severity {
                Severity::Critical => summary.critical_count += 1,
                Severity::High => summary.high_count += 1,
                Severity::Medium => summary.medium_count += 1,
                Severity::Low => summary.low_count += 1,
                Severity::Info => summary.info_count += 1,
            }
        }
    }

    summary.overall_fraud_score =
        score_severities(analyses.iter().flat_map(|a| a.detections.iter().map(|d| d.severity)));
    summary.mock_free_test_percentage =
        mock_free_percentage(summary.mock_free_tests, summary.total_tests);
    summary
}

pub fn mock_free_percentage(mock_free: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * mock_free as f64 / total as f64
    }
}
