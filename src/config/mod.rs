use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::types::ReportSummary;
use crate::detectors::DetectorKind;
use crate::error::{FraudCheckError, Result};

pub const CONFIG_FILE_ENV: &str = "FRAUD_CHECK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = ".fraud-check.json";
pub const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;
pub const DEFAULT_EXCLUDES: [&str; 5] = [
    "**/node_modules/**",
    "**/dist/**",
    "**/coverage/**",
    "**/.git/**",
    "**/target/**",
];

/// Maximum violations a run may contain and still pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityThresholds {
    pub critical: usize,
    pub high: usize,
    pub fraud_score: u32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical: 0,
            high: 5,
            fraud_score: 50,
        }
    }
}

impl SeverityThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.fraud_score > crate::analysis::scoring::MAX_SCORE {
            return Err(FraudCheckError::InvalidThreshold {
                name: "fraudScore",
                reason: format!("{} exceeds the maximum score of 100", self.fraud_score),
            });
        }
        Ok(())
    }

    pub fn passes(&self, summary: &ReportSummary) -> bool {
        summary.critical_count <= self.critical
            && summary.high_count <= self.high
            && summary.overall_fraud_score <= self.fraud_score
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    pub project_path: PathBuf,
    pub detectors: Vec<DetectorKind>,
    /// Per-detector glob overrides; detectors without an entry use their defaults.
    pub tier_globs: BTreeMap<DetectorKind, Vec<String>>,
    pub exclude_patterns: Vec<String>,
    pub snippet_context_lines: usize,
    pub max_file_size_bytes: u64,
    /// Worker threads for the run; 0 lets rayon decide.
    pub parallelism: usize,
    pub thresholds: SeverityThresholds,
    /// Run the test-integrity checks (skipped, focused and empty tests,
    /// always-true assertions, files without assertions) on every tier.
    pub test_integrity: bool,
}

impl CheckerConfig {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            detectors: DetectorKind::ALL.to_vec(),
            tier_globs: BTreeMap::new(),
            exclude_patterns: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            snippet_context_lines: 2,
            max_file_size_bytes: DEFAULT_MAX_FILE_BYTES,
            parallelism: 0,
            thresholds: SeverityThresholds::default(),
            test_integrity: false,
        }
    }

    pub fn globs_for(&self, kind: DetectorKind) -> Vec<String> {
        match self.tier_globs.get(&kind) {
            Some(globs) => globs.clone(),
            None => kind.default_globs().iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    detectors: Option<Vec<DetectorKind>>,
    tier_globs: Option<BTreeMap<DetectorKind, Vec<String>>>,
    exclude_patterns: Option<Vec<String>>,
    snippet_context_lines: Option<usize>,
    max_file_size_bytes: Option<u64>,
    parallelism: Option<usize>,
    thresholds: Option<ThresholdOverrides>,
    test_integrity: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThresholdOverrides {
    critical: Option<usize>,
    high: Option<usize>,
    fraud_score: Option<u32>,
}

/// Defaults, then the JSON config file, then `FRAUD_CHECK_*` environment variables.
pub fn load_config(project_path: impl AsRef<Path>) -> Result<CheckerConfig> {
    load_config_with(project_path, |key| std::env::var(key).ok())
}

pub fn load_config_with<F>(project_path: impl AsRef<Path>, lookup: F) -> Result<CheckerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let project_path = project_path.as_ref();
    let mut cfg = CheckerConfig::new(project_path);

    // An explicitly named file must exist; the project-local one is optional
    let file = match lookup(CONFIG_FILE_ENV) {
        Some(path) => Some(PathBuf::from(path)),
        None => Some(project_path.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    };
    if let Some(path) = file {
        apply_file(&mut cfg, &path)?;
    }

    if let Some(val) = lookup("FRAUD_CHECK_DETECTORS") {
        cfg.detectors = split_list(&val)
            .iter()
            .map(|s| s.parse::<DetectorKind>())
            .collect::<Result<Vec<_>>>()?;
    }
    if let Some(val) = lookup("FRAUD_CHECK_EXCLUDE") {
        cfg.exclude_patterns = split_list(&val);
    }
    if let Some(val) = lookup("FRAUD_CHECK_CONTEXT_LINES") {
        cfg.snippet_context_lines = parse_var("FRAUD_CHECK_CONTEXT_LINES", &val)?;
    }
    if let Some(val) = lookup("FRAUD_CHECK_MAX_FILE_BYTES") {
        cfg.max_file_size_bytes = parse_var("FRAUD_CHECK_MAX_FILE_BYTES", &val)?;
    }
    if let Some(val) = lookup("FRAUD_CHECK_PARALLELISM") {
        cfg.parallelism = parse_var("FRAUD_CHECK_PARALLELISM", &val)?;
    }
    if let Some(val) = lookup("FRAUD_CHECK_TEST_INTEGRITY") {
        cfg.test_integrity = parse_var("FRAUD_CHECK_TEST_INTEGRITY", &val)?;
    }
    if let Some(val) = lookup("FRAUD_CHECK_MAX_CRITICAL") {
        cfg.thresholds.critical = parse_var("FRAUD_CHECK_MAX_CRITICAL", &val)?;
    }
    if let Some(val) = lookup("FRAUD_CHECK_MAX_HIGH") {
        cfg.thresholds.high = parse_var("FRAUD_CHECK_MAX_HIGH", &val)?;
    }
    if let Some(val) = lookup("FRAUD_CHECK_MAX_SCORE") {
        cfg.thresholds.fraud_score = parse_var("FRAUD_CHECK_MAX_SCORE", &val)?;
    }

    cfg.thresholds.validate()?;
    tracing::debug!(
        project = %cfg.project_path.display(),
        detectors = cfg.detectors.len(),
        "configuration loaded"
    );
    Ok(cfg)
}

fn apply_file(cfg: &mut CheckerConfig, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|source| FraudCheckError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file: FileConfig = serde_json::from_str(&text).map_err(|source| FraudCheckError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(detectors) = file.detectors {
        cfg.detectors = detectors;
    }
    if let Some(globs) = file.tier_globs {
        cfg.tier_globs.extend(globs);
    }
    if let Some(excludes) = file.exclude_patterns {
        cfg.exclude_patterns = excludes;
    }
    if let Some(lines) = file.snippet_context_lines {
        cfg.snippet_context_lines = lines;
    }
    if let Some(bytes) = file.max_file_size_bytes {
        cfg.max_file_size_bytes = bytes;
    }
    if let Some(threads) = file.parallelism {
        cfg.parallelism = threads;
    }
    if let Some(enabled) = file.test_integrity {
        cfg.test_integrity = enabled;
    }
    if let Some(t) = file.thresholds {
        cfg.thresholds.critical = t.critical.unwrap_or(cfg.thresholds.critical);
        cfg.thresholds.high = t.high.unwrap_or(cfg.thresholds.high);
        cfg.thresholds.fraud_score = t.fraud_score.unwrap_or(cfg.thresholds.fraud_score);
    }
    Ok(())
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_var<T: FromStr>(key: &str, val: &str) -> Result<T> {
    val.trim().parse::<T>().map_err(|_| FraudCheckError::InvalidConfigValue {
        key: key.to_string(),
        value: val.to_string(),
    })
}
