//! Tier detectors: one per testing tier plus the web-UI specialization of
//! the system tier. Each adds its own heuristics on top of the catalog and
//! contributes tier-specific remediation advice.

pub mod environment;
pub mod external;
pub mod generic;
pub mod system;
pub mod web_ui;

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Finding, ValidationContext};
use crate::analysis::patterns::match_ranges;
use crate::analysis::source::SourceText;
use crate::analysis::types::{Detection, MockKind, Severity, TestTier};
use crate::error::{FraudCheckError, Result};

pub use environment::EnvironmentDetector;
pub use external::ExternalDetector;
pub use generic::GenericDetector;
pub use system::SystemDetector;
pub use web_ui::WebUiDetector;

pub trait TierDetector {
    fn kind(&self) -> DetectorKind;

    fn tier(&self) -> TestTier {
        self.kind().tier()
    }

    /// Heuristics beyond the catalog. Severities are fixed per heuristic.
    fn custom_validation(&self, ctx: &ValidationContext<'_>) -> Vec<Finding>;

    fn add_type_specific_recommendations(
        &self,
        recommendations: &mut Vec<String>,
        detections: &[Detection],
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorKind {
    System,
    External,
    Environment,
    Integration,
    Unit,
    WebUi,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 6] = [
        DetectorKind::System,
        DetectorKind::External,
        DetectorKind::Environment,
        DetectorKind::Integration,
        DetectorKind::Unit,
        DetectorKind::WebUi,
    ];

    pub fn tier(self) -> TestTier {
        match self {
            DetectorKind::System | DetectorKind::WebUi => TestTier::System,
            DetectorKind::External => TestTier::External,
            DetectorKind::Environment => TestTier::Environment,
            DetectorKind::Integration => TestTier::Integration,
            DetectorKind::Unit => TestTier::Unit,
        }
    }

    pub fn for_tier(tier: TestTier) -> Self {
        match tier {
            TestTier::System => DetectorKind::System,
            TestTier::External => DetectorKind::External,
            TestTier::Environment => DetectorKind::Environment,
            TestTier::Integration => DetectorKind::Integration,
            TestTier::Unit => DetectorKind::Unit,
        }
    }

    pub fn default_globs(self) -> &'static [&'static str] {
        match self {
            DetectorKind::System => &[
                "**/*.stest.{ts,js}",
                "**/*.systest.{ts,js}",
                "**/tests/system/**/*.{ts,js}",
            ],
            DetectorKind::External => &["**/*.etest.{ts,js}", "**/tests/external/**/*.{ts,js}"],
            DetectorKind::Environment => {
                &["**/*.envtest.{ts,js}", "**/tests/environment/**/*.{ts,js}"]
            }
            DetectorKind::Integration => {
                &["**/*.itest.{ts,js}", "**/tests/integration/**/*.{ts,js}"]
            }
            DetectorKind::Unit => &["**/*.utest.{ts,js}", "**/tests/unit/**/*.{ts,js}"],
            DetectorKind::WebUi => &["**/tests/e2e/**/*.{ts,js}", "**/*.e2e.{ts,js}"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetectorKind::System => "system",
            DetectorKind::External => "external",
            DetectorKind::Environment => "environment",
            DetectorKind::Integration => "integration",
            DetectorKind::Unit => "unit",
            DetectorKind::WebUi => "web-ui",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = FraudCheckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "system" => Ok(DetectorKind::System),
            "external" => Ok(DetectorKind::External),
            "environment" | "env" => Ok(DetectorKind::Environment),
            "integration" => Ok(DetectorKind::Integration),
            "unit" => Ok(DetectorKind::Unit),
            "web-ui" | "webui" | "e2e" => Ok(DetectorKind::WebUi),
            _ => Err(FraudCheckError::InvalidConfigValue {
                key: "detector".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Closed set of detectors, dispatched by `match`.
#[derive(Debug, Clone)]
pub enum Detector {
    System(SystemDetector),
    External(ExternalDetector),
    Environment(EnvironmentDetector),
    Integration(GenericDetector),
    Unit(GenericDetector),
    WebUi(WebUiDetector),
}

impl Detector {
    pub fn new(kind: DetectorKind) -> Result<Self> {
        Ok(match kind {
            DetectorKind::System => Detector::System(SystemDetector::new()?),
            DetectorKind::External => Detector::External(ExternalDetector::new()?),
            DetectorKind::Environment => Detector::Environment(EnvironmentDetector::new()?),
            DetectorKind::Integration => Detector::Integration(GenericDetector::new(TestTier::Integration)),
            DetectorKind::Unit => Detector::Unit(GenericDetector::new(TestTier::Unit)),
            DetectorKind::WebUi => Detector::WebUi(WebUiDetector::new()?),
        })
    }
}

impl TierDetector for Detector {
    fn kind(&self) -> DetectorKind {
        match self {
            Detector::System(_) => DetectorKind::System,
            Detector::External(_) => DetectorKind::External,
            Detector::Environment(_) => DetectorKind::Environment,
            Detector::Integration(_) => DetectorKind::Integration,
            Detector::Unit(_) => DetectorKind::Unit,
            Detector::WebUi(_) => DetectorKind::WebUi,
        }
    }

    fn custom_validation(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        match self {
            Detector::System(d) => d.custom_validation(ctx),
            Detector::External(d) => d.custom_validation(ctx),
            Detector::Environment(d) => d.custom_validation(ctx),
            Detector::Integration(d) | Detector::Unit(d) => d.custom_validation(ctx),
            Detector::WebUi(d) => d.custom_validation(ctx),
        }
    }

    fn add_type_specific_recommendations(
        &self,
        recommendations: &mut Vec<String>,
        detections: &[Detection],
    ) {
        match self {
            Detector::System(d) => d.add_type_specific_recommendations(recommendations, detections),
            Detector::External(d) => d.add_type_specific_recommendations(recommendations, detections),
            Detector::Environment(d) => {
                d.add_type_specific_recommendations(recommendations, detections)
            }
            Detector::Integration(d) | Detector::Unit(d) => {
                d.add_type_specific_recommendations(recommendations, detections)
            }
            Detector::WebUi(d) => d.add_type_specific_recommendations(recommendations, detections),
        }
    }
}

/// A single regex heuristic with a fixed severity.
#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub name: &'static str,
    pub regex: Regex,
    pub mock_kind: MockKind,
    pub severity: Severity,
    pub description: &'static str,
    pub recommendation: &'static str,
}

impl Rule {
    pub fn new(
        name: &'static str,
        pattern: &str,
        mock_kind: MockKind,
        severity: Severity,
        description: &'static str,
        recommendation: &'static str,
    ) -> Result<Self> {
        Ok(Self {
            name,
            regex: compile(name, pattern)?,
            mock_kind,
            severity,
            description,
            recommendation,
        })
    }

    pub fn apply(&self, content: &str) -> Vec<Finding> {
        match_ranges(&self.regex, content)
            .into_iter()
            .map(|range| self.finding_at(range.start, content.get(range).unwrap_or_default()))
            .collect()
    }

    /// Same as [`Rule::apply`], ignoring matches inside comments.
    pub fn apply_outside_comments(&self, source: &SourceText<'_>) -> Vec<Finding> {
        let content = source.content();
        match_ranges(&self.regex, content)
            .into_iter()
            .filter(|range| !source.in_comment(range.start))
            .map(|range| self.finding_at(range.start, content.get(range).unwrap_or_default()))
            .collect()
    }

    pub fn finding_at(&self, offset: usize, matched: &str) -> Finding {
        Finding {
            offset,
            mock_kind: self.mock_kind,
            severity: self.severity,
            pattern: self.name.to_string(),
            description: format!("{}: `{}`", self.description, matched.trim()),
            recommendation: self.recommendation.to_string(),
        }
    }
}

pub(crate) fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| FraudCheckError::InvalidPattern {
        name: name.to_string(),
        matcher: pattern.to_string(),
        source: e,
    })
}

pub(crate) const LIFECYCLE_HOOK: &str =
    r"\b(?:beforeEach|beforeAll|afterEach|afterAll|before|after|setUp|setup_method|setup)\s*\(";
pub(crate) const DOUBLE_SETUP: &str = r"(?i)mock|stub|fake|\bspy|\b(?:jest|vi)\.fn\b";

/// Offsets of lifecycle hooks whose body sets up a test double.
///
/// The body runs from the hook call to the brace that closes its first
/// block. A braceless call ends with its line; a Python `setUp(self):`
/// header covers the next 10 lines.
pub(crate) fn lifecycle_double_setups(source: &SourceText<'_>, hook: &Regex, double: &Regex) -> Vec<usize> {
    let content = source.content();
    hook.find_iter(content)
        .filter(|m| !source.in_comment(m.start()))
        .filter(|m| double.is_match(hook_body(source, m.end())))
        .map(|m| m.start())
        .collect()
}

fn hook_body<'a>(source: &SourceText<'a>, from: usize) -> &'a str {
    let content = source.content();
    let rest = &content[from..];
    let mut depth = 0usize;
    let mut opened = false;
    for (i, ch) in rest.char_indices() {
        match ch {
            '{' => {
                depth += 1;
                opened = true;
            }
            '}' if opened => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &rest[..i];
                }
            }
            '\n' if !opened => {
                let head = rest[..i].trim_end();
                // Python method header: body is the indented block below
                if head.ends_with(':') {
                    break;
                }
                if head.ends_with(')') || head.ends_with(");") {
                    return head;
                }
            }
            _ => {}
        }
    }
    if opened {
        return rest;
    }
    let line = source.line_of(from);
    let end_line = (line + 10).min(source.line_count());
    let end = content
        .match_indices('\n')
        .nth(end_line - 1)
        .map(|(i, _)| i)
        .unwrap_or(content.len());
    &content[from..end.max(from)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_detector_constructs() {
        for kind in DetectorKind::ALL {
            let detector = Detector::new(kind).expect("detector rules compile");
            assert_eq!(detector.kind(), kind);
            assert_eq!(detector.tier(), kind.tier());
        }
    }

    #[test]
    fn detector_kind_parses_aliases() {
        assert_eq!("web_ui".parse::<DetectorKind>().unwrap(), DetectorKind::WebUi);
        assert_eq!(" Environment ".parse::<DetectorKind>().unwrap(), DetectorKind::Environment);
        assert!("smoke".parse::<DetectorKind>().is_err());
    }

    #[test]
    fn lifecycle_hook_body_is_brace_scoped() {
        let content = "beforeEach(() => {\n  db = connect();\n});\n\nit('x', () => { const s = sinon.stub(a, 'b'); });\n";
        let source = SourceText::new(content);
        let hook = compile("hook", LIFECYCLE_HOOK).unwrap();
        let double = compile("double", DOUBLE_SETUP).unwrap();
        assert!(lifecycle_double_setups(&source, &hook, &double).is_empty());

        let mocked = "beforeAll(async () => {\n  jest.mock('../db');\n});\n";
        let source = SourceText::new(mocked);
        assert_eq!(lifecycle_double_setups(&source, &hook, &double), vec![0]);
    }

    #[test]
    fn braceless_and_python_hooks() {
        let hook = compile("hook", LIFECYCLE_HOOK).unwrap();
        let double = compile("double", DOUBLE_SETUP).unwrap();

        let braceless = "beforeEach(resetDb);\n\nit('x', () => { sinon.stub(a, 'b'); });\n";
        let source = SourceText::new(braceless);
        assert!(lifecycle_double_setups(&source, &hook, &double).is_empty());

        let python = "class T(TestCase):\n    def setUp(self):\n        self.client = MagicMock()\n";
        let source = SourceText::new(python);
        assert_eq!(lifecycle_double_setups(&source, &hook, &double).len(), 1);
    }
}
