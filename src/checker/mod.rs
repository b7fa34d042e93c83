//! Fraud Checker facade: runs every enabled tier detector over a project,
//! merges the per-file analyses and gates the result on thresholds.

pub mod files;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::Utc;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::analysis::analyzer::{AnalyzerOptions, FileAnalyzer};
use crate::analysis::patterns::PatternCatalog;
use crate::analysis::scoring::summarize;
use crate::analysis::severity::SeverityPolicy;
use crate::analysis::types::{CheckResult, FailedTier, FileAnalysis, FraudReport, ReportSummary, SkippedFile};
use crate::config::{CheckerConfig, SeverityThresholds};
use crate::detectors::{Detector, DetectorKind, TierDetector};
use crate::error::{FraudCheckError, Result};

pub use files::{build_globset, FileLister, FileReader, FsFileReader, GlobFileLister};

pub struct FraudChecker<L = GlobFileLister, R = FsFileReader> {
    config: CheckerConfig,
    analyzer: FileAnalyzer,
    detectors: Vec<Detector>,
    lister: L,
    reader: R,
}

#[derive(Default)]
struct TierRun {
    analyses: Vec<FileAnalysis>,
    skipped: Vec<SkippedFile>,
}

impl FraudChecker {
    pub fn new(config: CheckerConfig) -> Result<Self> {
        let reader = FsFileReader::new(config.max_file_size_bytes);
        Self::with_collaborators(config, GlobFileLister::default(), reader)
    }
}

impl<L: FileLister, R: FileReader> FraudChecker<L, R> {
    /// Validates the configuration up front; nothing is read until [`FraudChecker::analyze`].
    pub fn with_collaborators(config: CheckerConfig, lister: L, reader: R) -> Result<Self> {
        validate_project(&config.project_path)?;
        config.thresholds.validate()?;
        build_globset(&config.exclude_patterns)?;

        let mut kinds = config.detectors.clone();
        kinds.sort();
        kinds.dedup();
        for kind in &kinds {
            build_globset(&config.globs_for(*kind))?;
        }
        let detectors = kinds
            .into_iter()
            .map(Detector::new)
            .collect::<Result<Vec<_>>>()?;

        let options = AnalyzerOptions {
            snippet_context_lines: config.snippet_context_lines,
            test_integrity: config.test_integrity,
            ..AnalyzerOptions::default()
        };
        let analyzer = FileAnalyzer::new(Arc::new(PatternCatalog::standard()?), SeverityPolicy::new(), options)?;

        Ok(Self {
            config,
            analyzer,
            detectors,
            lister,
            reader,
        })
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn analyze(&self) -> Result<FraudReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallelism)
            .build()?;
        let outcomes: Vec<(DetectorKind, anyhow::Result<TierRun>)> = pool.install(|| {
            self.detectors
                .par_iter()
                .map(|detector| (detector.kind(), self.run_tier_guarded(detector)))
                .collect()
        });

        let mut analyses = Vec::new();
        let mut skipped_files = Vec::new();
        let mut failed_tiers = Vec::new();
        for (kind, outcome) in outcomes {
            match outcome {
                Ok(run) => {
                    analyses.extend(run.analyses);
                    skipped_files.extend(run.skipped);
                }
                Err(e) => {
                    warn!(detector = %kind, error = %format!("{e:#}"), "tier detector failed");
                    failed_tiers.push(FailedTier {
                        detector: kind.to_string(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        let summary = summarize(&analyses);
        let detections = analyses.iter().flat_map(|a| a.detections.iter().cloned()).collect();
        let recommendations = project_recommendations(&summary, &failed_tiers, &skipped_files);
        let timestamp = Utc::now();
        let project_path = self.config.project_path.to_string_lossy().to_string();

        info!(
            project = %project_path,
            files = summary.total_files,
            critical = summary.critical_count,
            high = summary.high_count,
            score = summary.overall_fraud_score,
            failed_tiers = failed_tiers.len(),
            "fraud check finished"
        );

        Ok(FraudReport {
            id: report_id(&project_path, &timestamp.to_rfc3339()),
            project_path,
            timestamp,
            mock_free_test_percentage: summary.mock_free_test_percentage,
            summary,
            file_analyses: analyses,
            detections,
            recommendations,
            skipped_files,
            failed_tiers,
        })
    }

    pub fn check(&self, thresholds: &SeverityThresholds) -> Result<CheckResult> {
        thresholds.validate()?;
        let report = self.analyze()?;
        Ok(evaluate(report, thresholds))
    }

    fn run_tier_guarded(&self, detector: &Detector) -> anyhow::Result<TierRun> {
        let kind = detector.kind();
        panic::catch_unwind(AssertUnwindSafe(|| self.run_tier(detector)))
            .unwrap_or_else(|payload| Err(anyhow!("panicked: {}", panic_message(payload.as_ref()))))
            .with_context(|| format!("{kind} detector failed"))
    }

    fn run_tier(&self, detector: &Detector) -> anyhow::Result<TierRun> {
        let kind = detector.kind();
        let globs = self.config.globs_for(kind);
        let files = self
            .lister
            .list(&self.config.project_path, &globs, &self.config.exclude_patterns)
            .with_context(|| format!("listing files for the {kind} tier"))?;
        info!(detector = %kind, files = files.len(), "running tier detector");

        let results: Vec<std::result::Result<FileAnalysis, SkippedFile>> = files
            .par_iter()
            .map(|path| match self.reader.read(path) {
                Ok(content) => Ok(self
                    .analyzer
                    .analyze_with(&content, &path.to_string_lossy(), detector)),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping file");
                    Err(SkippedFile {
                        path: path.to_string_lossy().to_string(),
                        reason: e.to_string(),
                    })
                }
            })
            .collect();

        let mut run = TierRun::default();
        for result in results {
            match result {
                Ok(analysis) => run.analyses.push(analysis),
                Err(skip) => run.skipped.push(skip),
            }
        }
        Ok(run)
    }
}

/// Run every enabled detector over the configured project.
pub fn analyze(config: CheckerConfig) -> Result<FraudReport> {
    FraudChecker::new(config)?.analyze()
}

pub fn check(config: CheckerConfig, thresholds: &SeverityThresholds) -> Result<CheckResult> {
    FraudChecker::new(config)?.check(thresholds)
}

/// Gate an existing report on `thresholds`.
pub fn evaluate(report: FraudReport, thresholds: &SeverityThresholds) -> CheckResult {
    let passed = thresholds.passes(&report.summary);
    if !passed {
        info!(
            critical = report.summary.critical_count,
            high = report.summary.high_count,
            score = report.summary.overall_fraud_score,
            "thresholds exceeded"
        );
    }
    CheckResult { passed, report }
}

fn validate_project(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(FraudCheckError::ProjectNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(FraudCheckError::ProjectNotDirectory(path.to_path_buf()));
    }
    Ok(())
}

fn project_recommendations(
    summary: &ReportSummary,
    failed_tiers: &[FailedTier],
    skipped_files: &[SkippedFile],
) -> Vec<String> {
    let mut recommendations = Vec::new();
    if summary.critical_count > 0 {
        recommendations.push(format!(
            "{} critical violation(s): remove all mocks from system/environment tests immediately",
            summary.critical_count
        ));
    }
    if summary.high_count > 0 {
        recommendations.push(format!(
            "{} high severity violation(s): replace mocked external services with sandbox calls",
            summary.high_count
        ));
    }
    recommendations.push(format!(
        "Files using only real implementations: {}",
        summary.total_files - summary.files_with_mocks
    ));
    if !failed_tiers.is_empty() {
        let names: Vec<&str> = failed_tiers.iter().map(|t| t.detector.as_str()).collect();
        recommendations.push(format!(
            "Results are incomplete: the {} detector(s) failed and were skipped",
            names.join(", ")
        ));
    }
    if !skipped_files.is_empty() {
        recommendations.push(format!(
            "{} file(s) could not be read and were left out of the report",
            skipped_files.len()
        ));
    }
    recommendations
}

fn report_id(project_path: &str, timestamp: &str) -> String {
    let digest = Sha256::digest(format!("{project_path}\0{timestamp}").as_bytes());
    format!("{:x}", digest)[..16].to_string()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
