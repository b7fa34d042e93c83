//! Tier-sensitive severity for catalog detections.
//!
//! System and environment tests get zero tolerance, external tests only
//! tolerate timer fakes, integration tests tolerate API and database doubles,
//! and unit tests are unrestricted.

use super::types::{MockKind, Severity, TestTier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityPolicy;

impl SeverityPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn severity_for(&self, tier: TestTier, kind: MockKind) -> Severity {
        severity_for(tier, kind)
    }
}

pub fn severity_for(tier: TestTier, kind: MockKind) -> Severity {
    match tier {
        TestTier::System | TestTier::Environment => Severity::Critical,
        TestTier::External => match kind {
            MockKind::Timer => Severity::Medium,
            _ => Severity::High,
        },
        TestTier::Integration => match kind {
            MockKind::Api | MockKind::Database => Severity::Low,
            _ => Severity::Medium,
        },
        TestTier::Unit => Severity::Low,
    }
}
