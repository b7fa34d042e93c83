use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Testing level a file belongs to. Higher tiers tolerate fewer test doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestTier {
    System,
    External,
    Environment,
    Integration,
    Unit,
}

impl TestTier {
    pub const ALL: [TestTier; 5] = [
        TestTier::System,
        TestTier::External,
        TestTier::Environment,
        TestTier::Integration,
        TestTier::Unit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestTier::System => "system",
            TestTier::External => "external",
            TestTier::Environment => "environment",
            TestTier::Integration => "integration",
            TestTier::Unit => "unit",
        }
    }
}

impl fmt::Display for TestTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockKind {
    Function,
    Module,
    Api,
    Database,
    Filesystem,
    Network,
    Timer,
    Stub,
    Spy,
    Fake,
}

impl MockKind {
    pub const ALL: [MockKind; 10] = [
        MockKind::Function,
        MockKind::Module,
        MockKind::Api,
        MockKind::Database,
        MockKind::Filesystem,
        MockKind::Network,
        MockKind::Timer,
        MockKind::Stub,
        MockKind::Spy,
        MockKind::Fake,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MockKind::Function => "function",
            MockKind::Module => "module",
            MockKind::Api => "api",
            MockKind::Database => "database",
            MockKind::Filesystem => "filesystem",
            MockKind::Network => "network",
            MockKind::Timer => "timer",
            MockKind::Stub => "stub",
            MockKind::Spy => "spy",
            MockKind::Fake => "fake",
        }
    }
}

impl fmt::Display for MockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered so that `Critical` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Contribution of one detection of this severity to a fraud score.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 25,
            Severity::High => 15,
            Severity::Medium => 8,
            Severity::Low => 3,
            Severity::Info => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1-based position of a detection plus the surrounding lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub id: String,
    pub file_path: String,
    pub test_tier: TestTier,
    pub mock_kind: MockKind,
    pub severity: Severity,
    pub location: Location,
    pub description: String,
    pub pattern: String,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAnalysis {
    pub file_path: String,
    pub test_tier: TestTier,
    pub total_tests: usize,
    pub detections: Vec<Detection>,
    pub mock_free_sections: usize,
    pub fraud_score: u32,
    pub recommendations: Vec<String>,
}

impl FileAnalysis {
    pub fn has_mocks(&self) -> bool {
        !self.detections.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_files: usize,
    pub files_with_mocks: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub info_count: usize,
    pub overall_fraud_score: u32,
    pub total_tests: usize,
    pub mock_free_tests: usize,
    pub mock_free_test_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTier {
    pub detector: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudReport {
    pub id: String,
    pub project_path: String,
    pub timestamp: DateTime<Utc>,
    pub summary: ReportSummary,
    pub file_analyses: Vec<FileAnalysis>,
    pub detections: Vec<Detection>,
    pub recommendations: Vec<String>,
    pub mock_free_test_percentage: f64,
    pub skipped_files: Vec<SkippedFile>,
    pub failed_tiers: Vec<FailedTier>,
}

impl FraudReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub passed: bool,
    pub report: FraudReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_critical_highest() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
    }

    #[test]
    fn enums_serialize_as_string_tags() {
        assert_eq!(serde_json::to_string(&TestTier::Environment).unwrap(), "\"environment\"");
        assert_eq!(serde_json::to_string(&MockKind::Filesystem).unwrap(), "\"filesystem\"");
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
    }
}
