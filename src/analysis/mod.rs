//! Text analysis: pattern catalog, severity policy, per-file analyzer and scoring

pub mod analyzer;
pub mod integrity;
pub mod patterns;
pub mod scoring;
pub mod severity;
pub mod source;
pub mod types;

pub use analyzer::{AnalyzerOptions, FileAnalyzer, Finding, ValidationContext};
pub use integrity::IntegrityChecker;
pub use patterns::{MockPattern, PatternCatalog, PatternSpec, STANDARD_PATTERNS};
pub use scoring::{mock_free_percentage, score, summarize, MAX_SCORE};
pub use severity::{severity_for, SeverityPolicy};
pub use source::SourceText;
pub use types::{
    CheckResult, Detection, FailedTier, FileAnalysis, FraudReport, Location, MockKind, ReportSummary,
    Severity, SkippedFile, TestTier,
};
