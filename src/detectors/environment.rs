use regex::Regex;

use super::{compile, lifecycle_double_setups, DetectorKind, Rule, TierDetector, DOUBLE_SETUP, LIFECYCLE_HOOK};
use crate::analysis::analyzer::{Finding, ValidationContext};
use crate::analysis::types::{Detection, MockKind, Severity};

const CONTAINER_EVIDENCE: &str =
    r"(?i)\btestcontainers\b|\bdocker[-_ ]compose\b|\bGenericContainer\b|\bDockerComposeEnvironment\b";

/// Environment-tier heuristics. Environment tests prove the code against the
/// real backing services, so every finding is critical.
#[derive(Debug, Clone)]
pub struct EnvironmentDetector {
    rules: Vec<Rule>,
    lifecycle_hook: Regex,
    double_setup: Regex,
    container_evidence: Regex,
}

impl EnvironmentDetector {
    pub fn new() -> crate::Result<Self> {
        let rules = vec![
            Rule::new(
                "environment-service-mock",
                r"(?i)\b(?:mock|stub|fake)\w*(?:db|database|cache|redis|queue|storage|bucket|connection|pool)\w*",
                MockKind::Database,
                Severity::Critical,
                "Backing service replaced by a double",
                "Run the real database, cache or queue in a container",
            )?,
            Rule::new(
                "environment-in-memory",
                r"(?i)\bin[-_ ]?memory|:memory:|\bMongoMemoryServer\b|\bpg-mem\b|\b(?:io)?redis-mock\b",
                MockKind::Database,
                Severity::Critical,
                "In-memory stand-in for a real backend",
                "Replace in-memory backends with the production engine running in TestContainers",
            )?,
            Rule::new(
                "environment-connection-override",
                r#"(?i)\b\w*(?:database_?url|db_?url|connection_?string|redis_?url|amqp_?url|mongo_?uri|dsn)\w*['"]?\s*[:=]\s*['"`][^'"`\n]*(?:mock|memory|fake|stub)[^'"`\n]*['"`]"#,
                MockKind::Database,
                Severity::Critical,
                "Connection string pointed at a mock or in-memory backend",
                "Point connection strings at the containerized service",
            )?,
        ];
        Ok(Self {
            rules,
            lifecycle_hook: compile("lifecycle-hook", LIFECYCLE_HOOK)?,
            double_setup: compile("double-setup", DOUBLE_SETUP)?,
            container_evidence: compile("container-evidence", CONTAINER_EVIDENCE)?,
        })
    }
}

impl TierDetector for EnvironmentDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Environment
    }

    fn custom_validation(&self, ctx: &ValidationContext<'_>) -> Vec<Finding> {
        let content = ctx.content();
        let mut findings: Vec<Finding> = self.rules.iter().flat_map(|rule| rule.apply(content)).collect();
        findings.extend(
            lifecycle_double_setups(ctx.source, &self.lifecycle_hook, &self.double_setup)
                .into_iter()
                .map(|offset| Finding {
                    offset,
                    mock_kind: MockKind::Function,
                    severity: Severity::Critical,
                    pattern: "environment-lifecycle-mock".to_string(),
                    description: "Test double set up inside a lifecycle hook".to_string(),
                    recommendation: "Start real services in setup hooks instead of mocking them".to_string(),
                }),
        );

        if findings.is_empty() && ctx.catalog_detections.is_empty() {
            if let Some(m) = self.container_evidence.find(content) {
                findings.push(Finding {
                    offset: m.start(),
                    mock_kind: MockKind::Database,
                    severity: Severity::Info,
                    pattern: "container-based-testing".to_string(),
                    description: format!("Container-based environment testing: `{}`", m.as_str()),
                    recommendation: "Keep running against containerized services".to_string(),
                });
            }
        }
        findings
    }

    fn add_type_specific_recommendations(&self, recommendations: &mut Vec<String>, detections: &[Detection]) {
        if detections.iter().any(|d| d.severity > Severity::Info) {
            recommendations.push(
                "Use TestContainers or Docker Compose to run real databases, caches and queues".to_string(),
            );
        } else if detections.iter().any(|d| d.pattern == "container-based-testing") {
            recommendations.push("Container-based setup detected; keep testing against real services".to_string());
        }
        if detections.iter().any(|d| d.pattern == "environment-connection-override") {
            recommendations.push("Derive connection strings from the container's mapped ports".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::source::SourceText;

    fn findings(content: &str) -> Vec<Finding> {
        let detector = EnvironmentDetector::new().unwrap();
        let source = SourceText::new(content);
        detector.custom_validation(&ValidationContext {
            source: &source,
            file_path: "db.envtest.ts",
            catalog_detections: &[],
        })
    }

    #[test]
    fn in_memory_backends_are_critical() {
        let found = findings("const db = new Database(':memory:');\nconst mongo = await MongoMemoryServer.create();\n");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|f| f.severity == Severity::Critical));
        assert!(found.iter().all(|f| f.pattern == "environment-in-memory"));
    }

    #[test]
    fn connection_override_is_flagged() {
        let found = findings("process.env.DATABASE_URL = 'postgres://mock-host/app';");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pattern, "environment-connection-override");
    }

    #[test]
    fn container_evidence_yields_single_info() {
        let found = findings("import { GenericContainer } from 'testcontainers';\nit('x', async () => {});\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Info);
        assert_eq!(found[0].pattern, "container-based-testing");
    }

    #[test]
    fn container_evidence_is_ignored_when_mocks_exist() {
        let found = findings("import { GenericContainer } from 'testcontainers';\nconst cache = mockRedisClient();\n");
        assert!(found.iter().all(|f| f.severity == Severity::Critical));
        assert!(!found.is_empty());
    }
}
