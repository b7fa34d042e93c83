use regex::Regex;

use super::{compile, lifecycle_double_setups, Rule, TierDetector, DetectorKind, DOUBLE_SETUP, LIFECYCLE_HOOK};
use crate::analysis::analyzer::{Finding, ValidationContext};
use crate::analysis::types::{Detection, MockKind, Severity};

const REAL_STACK: &str = "System tests must run the real application stack and all of its services";

/// System-tier heuristics. Everything found here is critical, whatever the
/// mock kind would map to under the severity policy.
#[derive(Debug, Clone)]
pub struct SystemDetector {
    rules: Vec<Rule>,
    lifecycle_hook: Regex,
    double_setup: Regex,
}

impl SystemDetector {
    pub fn new() -> crate::Result<Self> {
        let rules = vec![
            Rule::new(
                "system-node-env-test",
                r#"NODE_ENV['"\]]?\s*(?:={1,3}|:)\s*['"]?test\b"#,
                MockKind::Stub,
                Severity::Critical,
                "NODE_ENV forced to `test`, which may switch the application to mocks",
                "Run system tests with the production configuration of the application",
            )?,
            Rule::new(
                "system-focused-test",
                r"\b(?:it|test|describe|context|suite)\.only\s*\(",
                MockKind::Stub,
                Severity::Critical,
                "Focused test hides the rest of the system suite",
                "Remove .only() so the whole system suite runs",
            )?,
            Rule::new(
                "system-todo-remove-mock",
                r"(?i)(?://|#|/\*)\s*(?:TODO|FIXME)\b[^\n]*\bremove\b[^\n]*mock",
                MockKind::Fake,
                Severity::Critical,
                "Leftover mock flagged for removal",
                "Remove the mock now instead of leaving a TODO",
            )?,
            Rule::new(
                "system-mock-import",
                r#"(?i)(?:\bfrom\s+|\bimport\s+|\brequire\s*\(\s*)['"]([^'"\n]*mock[^'"\n]*)['"]"#,
                MockKind::Module,
                Severity::Critical,
                "Import of a mock module",
                "Import the real module; system tests must not load mock implementations",
            )?,
            // Python: `from unittest.mock import patch`, `import mock as m`
            Rule::new(
                "system-python-mock-import",
                r"(?im)^[ \t]*(?:from[ \t]+([\w.]*mock[\w.]*)[ \t]+import\b|import[ \t]+([\w.]*mock[\w.]*)(?:[ \t]+as[ \t]+\w+)?[ \t]*\r?$)",
                MockKind::Module,
                Severity::Critical,
                "Import of a mock module",
                "Import the real module; system tests must not load mock implementations",
            )?,
        ];
        Ok(Self {
            rules,
            lifecycle_hook: compile("lifecycle-hook", LIFECYCLE_HOOK)?,
            double_setup: compile("double-setup", DOUBLE_SETUP)?,
        })
    }
}

impl TierDetector for SystemDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::System
    }

    fn custom_validation(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let mut findings: Vec<Finding> = lifecycle_double_setups(ctx.source, &self.lifecycle_hook, &self.double_setup)
            .into_iter()
            .map(|offset| Finding {
                offset,
                mock_kind: MockKind::Function,
                severity: Severity::Critical,
                pattern: "system-lifecycle-mock".to_string(),
                description: "Test double set up inside a lifecycle hook".to_string(),
                recommendation: "Provision real services in setup hooks instead of mocks".to_string(),
            })
            .collect();
        for rule in &self.rules {
            findings.extend(rule.apply(ctx.content()));
        }
        findings
    }

    fn add_type_specific_recommendations(&self, recommendations: &mut Vec<String>, detections: &[Detection]) {
        recommendations.push(format!(
            "{REAL_STACK}: start a full real-service test environment (database, queues, external sandboxes)"
        ));
        if detections.iter().any(|d| d.pattern == "system-lifecycle-mock") {
            recommendations.push("Replace mock setup in beforeEach/beforeAll hooks with real service provisioning".to_string());
        }
        if detections.iter().any(|d| d.pattern == "system-focused-test") {
            recommendations.push("Remove focused tests (.only) before merging".to_string());
        }
    }
}
