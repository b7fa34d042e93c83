use super::{DetectorKind, Rule, TierDetector};
use crate::analysis::analyzer::{Finding, ValidationContext};
use crate::analysis::types::{Detection, MockKind, Severity};

/// External-tier heuristics: tests that are meant to hit real third-party
/// services but route around them.
#[derive(Debug, Clone)]
pub struct ExternalDetector {
    rules: Vec<Rule>,
}

impl ExternalDetector {
    pub fn new() -> crate::Result<Self> {
        let rules = vec![
            Rule::new(
                "external-service-mock",
                r"(?i)\b(?:mock|stub|fake)\w*(?:api|http|service|client|server|endpoint|gateway)\w*",
                MockKind::Api,
                Severity::High,
                "External API or service replaced by a double",
                "Exercise the real external service through its sandbox environment",
            )?,
            Rule::new(
                "external-mock-bypass-env",
                r"\b(?:USE_MOCK_SERVICES?|MOCK_ENABLED|MOCK_EXTERNAL\w*|BYPASS_EXTERNAL\w*|USE_FAKE_\w+)\b",
                MockKind::Stub,
                Severity::High,
                "Environment variable that switches external calls to mocks",
                "Remove mock switches; external tests always call the real service",
            )?,
            Rule::new(
                "external-offline-mode",
                r"(?i)\boffline[_\s-]?mode\b",
                MockKind::Network,
                Severity::High,
                "Offline mode configured for an external test",
                "Run external tests online against the sandbox service",
            )?,
            Rule::new(
                "external-mock-url-override",
                r#"(?i)\b\w*(?:base_?url|api_?url|endpoint|host|server_?url)\w*['"]?\s*[:=]\s*['"`][^'"`\n]*(?:mock|stub|fake)[^'"`\n]*['"`]"#,
                MockKind::Api,
                Severity::Medium,
                "Service URL overridden to point at a mock host",
                "Point the client at the provider's sandbox URL",
            )?,
        ];
        Ok(Self { rules })
    }
}

impl TierDetector for ExternalDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::External
    }

    fn custom_validation(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        self.rules.iter().flat_map(|rule| rule.apply(ctx.content())).collect()
    }

    fn add_type_specific_recommendations(&self, recommendations: &mut Vec<String>, detections: &[Detection]) {
        recommendations.push(
            "Use sandbox credentials (e.g. from CI secrets) to test against real external services".to_string(),
        );
        if detections.iter().any(|d| d.mock_kind == MockKind::Timer) {
            recommendations.push("Timer fakes are tolerated here but keep them away from network calls".to_string());
        }
        if detections.iter().any(|d| d.pattern == "external-mock-url-override") {
            recommendations.push("Configure sandbox endpoints through environment config, not test overrides".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::source::SourceText;

    fn findings(content: &str) -> Vec<Finding> {
        let detector = ExternalDetector::new().unwrap();
        let source = SourceText::new(content);
        detector.custom_validation(&ValidationContext {
            source: &source,
            file_path: "stripe.etest.ts",
            catalog_detections: &[],
        })
    }

    #[test]
    fn bypass_switches_are_high() {
        let found = findings("if (process.env.USE_MOCK_SERVICE) { return; }\nconst cfg = { offlineMode: true };\n");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|f| f.severity == Severity::High));
    }

    #[test]
    fn url_override_is_medium() {
        let found = findings("const client = new Client({ baseUrl: 'http://mock-stripe.local' });");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, "external-mock-url-override");
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn mocked_service_client_is_flagged() {
        let found = findings("const paymentClient = fakePaymentService();");
        assert_eq!(found[0].pattern, "external-service-mock");
        assert_eq!(found[0].mock_kind, MockKind::Api);
    }

    #[test]
    fn sandbox_usage_is_clean() {
        assert!(findings("const client = new Client({ baseUrl: process.env.SANDBOX_URL });").is_empty());
    }
}
