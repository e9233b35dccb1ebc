use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, DomainError, JobRole, Response, ScoreBreakdown};

/// Input to the scoring producer: the finished session's settings and
/// every collected response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub job_role: JobRole,
    pub difficulty: Difficulty,
    pub responses: Vec<Response>,
}

/// Port for the scoring/feedback producer.
///
/// The producer is an opaque asynchronous collaborator. It must resolve or
/// reject; the session controller bounds the call with a configured
/// timeout and converts any failure into a degraded score, so a slow or
/// broken producer can never hang the feedback stage.
#[async_trait]
pub trait ScoreProducer: Send + Sync {
    /// Score a completed set of responses.
    async fn score(&self, request: ScoreRequest) -> Result<ScoreBreakdown, DomainError>;
}
