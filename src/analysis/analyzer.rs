//! Per-file analysis: catalog matching, tier hooks, test-block counting and
//! per-file scoring. Never touches the file system.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};

use super::integrity::IntegrityChecker;
use super::patterns::PatternCatalog;
use super::scoring;
use super::severity::SeverityPolicy;
use super::source::SourceText;
use super::types::{Detection, FileAnalysis, Location, MockKind, Severity, TestTier};
use crate::detectors::{compile, Detector, DetectorKind, TierDetector};
use crate::error::Result;

const TEST_CALL: &str = r"\b(?:it|test|describe|scenario|feature)\s*\(";
const TEST_BLOCK_START: &str = r"(?m)^\s*(?:it|test|describe|scenario|feature)\s*\(";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Lines of context either side of a match in a snippet.
    pub snippet_context_lines: usize,
    /// A test block is mock-free when no detection falls within
    /// `[start - window_before, start + window_after]`.
    pub window_before: usize,
    pub window_after: usize,
    /// Also run the cross-tier test-integrity checks.
    pub test_integrity: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            snippet_context_lines: 2,
            window_before: 5,
            window_after: 15,
            test_integrity: false,
        }
    }
}

/// A located result of a tier-specific heuristic, before it becomes a [`Detection`].
///
/// Its severity is fixed by the heuristic and bypasses [`SeverityPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub offset: usize,
    pub mock_kind: MockKind,
    pub severity: Severity,
    pub pattern: String,
    pub description: String,
    pub recommendation: String,
}

/// What a tier hook sees of the file under analysis.
pub struct ValidationContext<'a> {
    pub source: &'a SourceText<'a>,
    pub file_path: &'a str,
    /// Detections already produced by the catalog for this file.
    pub catalog_detections: &'a [Detection],
}

impl ValidationContext<'_> {
    pub fn content(&self) -> &str {
        self.source.content()
    }
}

pub struct FileAnalyzer {
    catalog: Arc<PatternCatalog>,
    policy: SeverityPolicy,
    options: AnalyzerOptions,
    test_call: Regex,
    test_block_start: Regex,
    integrity: IntegrityChecker,
    tier_defaults: Vec<Detector>,
}

impl FileAnalyzer {
    pub fn new(
        catalog: Arc<PatternCatalog>,
        policy: SeverityPolicy,
        options: AnalyzerOptions,
    ) -> Result<Self> {
        let tier_defaults = TestTier::ALL
            .iter()
            .map(|tier| Detector::new(DetectorKind::for_tier(*tier)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            catalog,
            policy,
            options,
            test_call: compile("test-call", TEST_CALL)?,
            test_block_start: compile("test-block-start", TEST_BLOCK_START)?,
            integrity: IntegrityChecker::new()?,
            tier_defaults,
        })
    }

    pub fn standard() -> Result<Self> {
        Self::new(
            Arc::new(PatternCatalog::standard()?),
            SeverityPolicy::new(),
            AnalyzerOptions::default(),
        )
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn options(&self) -> AnalyzerOptions {
        self.options
    }

    /// Analyze with the default detector of `tier`.
    pub fn analyze(&self, content: &str, file_path: &str, tier: TestTier) -> FileAnalysis {
        let detector = self
            .tier_defaults
            .iter()
            .find(|d| d.tier() == tier)
            .unwrap_or(&self.tier_defaults[0]);
        self.analyze_with(content, file_path, detector)
    }

    pub fn analyze_with<D: TierDetector + ?Sized>(
        &self,
        content: &str,
        file_path: &str,
        detector: &D,
    ) -> FileAnalysis {
        let tier = detector.tier();
        let source = SourceText::new(content);
        let created_at = Utc::now();
        let mut detections = Vec::new();

        for pattern in self.catalog.patterns() {
            for range in pattern.find_all(content) {
                let matched = content.get(range.clone()).unwrap_or_default();
                let finding = Finding {
                    offset: range.start,
                    mock_kind: pattern.mock_kind,
                    severity: self.policy.severity_for(tier, pattern.mock_kind),
                    pattern: pattern.name.clone(),
                    description: format!("{}: `{}`", pattern.description, matched),
                    recommendation: tier_recommendation(tier, pattern.mock_kind),
                };
                let detection =
                    self.build_detection(&source, file_path, tier, detections.len(), finding, created_at);
                detections.push(detection);
            }
        }

        let mut findings = detector.custom_validation(&ValidationContext {
            source: &source,
            file_path,
            catalog_detections: &detections,
        });
        if self.options.test_integrity {
            // the system detector reports focused tests as critical itself
            findings.extend(self.integrity.check(&source, detector.kind() != DetectorKind::System));
        }
        for finding in findings {
            let detection =
                self.build_detection(&source, file_path, tier, detections.len(), finding, created_at);
            detections.push(detection);
        }

        let total_tests = self.test_call.find_iter(content).count();
        let mock_free_sections = self.count_mock_free(&source, &detections);
        let fraud_score = scoring::score(&detections);
        let recommendations = file_recommendations(tier, &detections, detector);

        tracing::debug!(
            file = file_path,
            %tier,
            detections = detections.len(),
            total_tests,
            mock_free_sections,
            fraud_score,
            "analyzed file"
        );

        FileAnalysis {
            file_path: file_path.to_string(),
            test_tier: tier,
            total_tests,
            detections,
            mock_free_sections,
            fraud_score,
            recommendations,
        }
    }

    fn count_mock_free(&self, source: &SourceText<'_>, detections: &[Detection]) -> usize {
        self.test_block_start
            .find_iter(source.content())
            .map(|m| source.line_of(m.start() + leading_whitespace(m.as_str())))
            .filter(|&test_line| {
                let low = test_line.saturating_sub(self.options.window_before);
                let high = test_line + self.options.window_after;
                !detections
                    .iter()
                    .any(|d| (low..=high).contains(&d.location.line))
            })
            .count()
    }

    fn build_detection(
        &self,
        source: &SourceText<'_>,
        file_path: &str,
        tier: TestTier,
        ordinal: usize,
        finding: Finding,
        created_at: DateTime<Utc>,
    ) -> Detection {
        let (line, column) = source.locate(finding.offset);
        Detection {
            id: detection_id(file_path, ordinal, line, column, &finding.pattern),
            file_path: file_path.to_string(),
            test_tier: tier,
            mock_kind: finding.mock_kind,
            severity: finding.severity,
            location: Location {
                line,
                column,
                snippet: source.snippet(line, self.options.snippet_context_lines),
            },
            description: finding.description,
            pattern: finding.pattern,
            recommendation: finding.recommendation,
            created_at,
        }
    }
}

// `(?m)^\s*` can start on a blank line above the declaration
fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn detection_id(file_path: &str, ordinal: usize, line: usize, column: usize, pattern: &str) -> String {
    let digest = Sha256::digest(format!("{file_path}\0{ordinal}\0{line}\0{column}\0{pattern}").as_bytes());
    let hex = format!("{:x}", digest);
    hex[..16].to_string()
}

pub fn tier_recommendation(tier: TestTier, kind: MockKind) -> String {
    match tier {
        TestTier::System | TestTier::Environment => format!(
            "Remove the {kind} test double and run against real infrastructure \
             (Docker Compose or TestContainers) instead"
        ),
        TestTier::External if kind == MockKind::Timer => {
            "Timer fakes are tolerated in external tests; prefer real time where practical".to_string()
        }
        TestTier::External => format!(
            "Call the real external service with sandbox credentials instead of a {kind} double"
        ),
        TestTier::Integration => format!(
            "Limit mocking to external boundaries; integrate real internal components instead of a {kind} double"
        ),
        TestTier::Unit => "Test doubles are acceptable in unit tests".to_string(),
    }
}

fn file_recommendations<D: TierDetector + ?Sized>(
    tier: TestTier,
    detections: &[Detection],
    detector: &D,
) -> Vec<String> {
    if detections.is_empty() {
        return vec!["No test doubles detected; this file exercises real implementations".to_string()];
    }

    let mut recommendations = Vec::new();
    let critical = detections.iter().filter(|d| d.severity == Severity::Critical).count();
    let high = detections.iter().filter(|d| d.severity == Severity::High).count();
    if critical > 0 {
        recommendations.push(format!(
            "{critical} critical violation(s): remove every test double from this {tier} test"
        ));
    }
    if high > 0 {
        recommendations.push(format!("{high} high severity violation(s) must be reviewed"));
    }
    detector.add_type_specific_recommendations(&mut recommendations, detections);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> FileAnalyzer {
        FileAnalyzer::standard().expect("analyzer")
    }

    #[test]
    fn locates_catalog_matches() {
        let content = "describe('svc', () => {\n  const cb = jest.fn();\n});\n";
        let analysis = analyzer().analyze(content, "svc.utest.ts", TestTier::Unit);
        assert_eq!(analysis.detections.len(), 1);
        let d = &analysis.detections[0];
        assert_eq!((d.location.line, d.location.column), (2, 14));
        assert_eq!(d.pattern, "framework-function-mock");
        assert_eq!(d.severity, Severity::Low);
        assert!(d.location.snippet.contains(">    2 |"));
    }

    #[test]
    fn counts_each_test_keyword() {
        let content = "describe('a', () => { it('b', () => {}); });\ntest('c', () => {});\n";
        let analysis = analyzer().analyze(content, "a.utest.ts", TestTier::Unit);
        assert_eq!(analysis.total_tests, 3);
        // only lines that start with a declaration are blocks
        assert_eq!(analysis.mock_free_sections, 2);
    }

    #[test]
    fn clean_file_gets_positive_recommendation() {
        let analysis = analyzer().analyze("it('works', () => {});", "x.itest.ts", TestTier::Integration);
        assert_eq!(analysis.fraud_score, 0);
        assert_eq!(analysis.recommendations.len(), 1);
        assert!(analysis.recommendations[0].contains("No test doubles"));
    }

    #[test]
    fn detection_ids_are_distinct() {
        let content = "jest.fn();\njest.fn();\n";
        let analysis = analyzer().analyze(content, "a.utest.ts", TestTier::Unit);
        assert_eq!(analysis.detections.len(), 2);
        assert_ne!(analysis.detections[0].id, analysis.detections[1].id);
    }
}
