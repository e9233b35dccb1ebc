use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DomainError, ScoreBreakdown};
use crate::ports::{ScoreProducer, ScoreRequest};

/// Local scoring producer returning a canned breakdown.
///
/// Stands in for the real scoring service during development and demos.
/// An optional artificial latency makes timeout behavior reproducible.
pub struct CannedScoreProducer {
    delay: Duration,
}

impl CannedScoreProducer {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// Respond after the given artificial latency.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for CannedScoreProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoreProducer for CannedScoreProducer {
    async fn score(&self, _request: ScoreRequest) -> Result<ScoreBreakdown, DomainError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(ScoreBreakdown {
            overall: 85,
            fluency: 80,
            clarity: 90,
            confidence: 85,
            relevance: 90,
            feedback: "Great job! Your responses were clear and well-structured. You \
                       demonstrated strong technical knowledge and professional experience. \
                       To improve further, try to provide more specific examples with \
                       measurable outcomes. Also, consider practicing your responses to be \
                       more concise while still being comprehensive."
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, JobRole};

    #[tokio::test]
    async fn test_canned_score_is_not_degraded() {
        let producer = CannedScoreProducer::new();
        let breakdown = producer
            .score(ScoreRequest {
                job_role: JobRole::SoftwareEngineer,
                difficulty: Difficulty::Intermediate,
                responses: vec![],
            })
            .await
            .unwrap();
        assert_eq!(breakdown.overall, 85);
        assert!(!breakdown.is_degraded());
    }
}
