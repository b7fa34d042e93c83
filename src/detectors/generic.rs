use super::{DetectorKind, TierDetector};
use crate::analysis::analyzer::{Finding, ValidationContext};
use crate::analysis::types::{Detection, MockKind, Severity, TestTier};

/// Integration and unit tiers: the catalog and severity policy say all
/// there is to say, so no extra heuristics run here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericDetector {
    tier: TestTier,
}

impl GenericDetector {
    pub fn new(tier: TestTier) -> Self {
        Self { tier }
    }
}

impl TierDetector for GenericDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::for_tier(self.tier)
    }

    fn tier(&self) -> TestTier {
        self.tier
    }

    fn custom_validation(&self, _ctx: &ValidationContext<'_>) -> Vec<Finding> {
        Vec::new()
    }

    fn add_type_specific_recommendations(&self, recommendations: &mut Vec<String>, detections: &[Detection]) {
        match self.tier {
            TestTier::Integration => {
                let internal = detections
                    .iter()
                    .filter(|d| !matches!(d.mock_kind, MockKind::Api | MockKind::Database))
                    .count();
                if internal > 0 {
                    recommendations.push(format!(
                        "{internal} double(s) replace internal components; integration tests should only mock external boundaries"
                    ));
                }
            }
            TestTier::Unit => {
                if detections.iter().any(|d| d.severity > Severity::Low) {
                    recommendations.push("Review non-standard doubles in this unit test".to_string());
                }
            }
            _ => {}
        }
    }
}
