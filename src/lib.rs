//! Static detection of test doubles ("mock fraud") in test suites.
//!
//! Test files are classified by tier (system, external, environment,
//! integration, unit). Each tier tolerates a different amount of mocking, so
//! the same `jest.mock(...)` is critical in a system test and harmless in a
//! unit test. Detections are weighted into a bounded 0..=100 fraud score that
//! gates a run against configurable thresholds.

pub mod analysis;
pub mod checker;
pub mod config;
pub mod detectors;
pub mod error;
pub mod logging;

pub use analysis::{
    AnalyzerOptions, CheckResult, Detection, FileAnalysis, FileAnalyzer, FraudReport, Location, MockKind,
    MockPattern, PatternCatalog, ReportSummary, Severity, SeverityPolicy, TestTier,
};
pub use checker::{analyze, check, evaluate, FileLister, FileReader, FraudChecker, FsFileReader, GlobFileLister};
pub use config::{load_config, load_config_with, CheckerConfig, SeverityThresholds};
pub use detectors::{Detector, DetectorKind, TierDetector};
pub use error::{FraudCheckError, Result};
