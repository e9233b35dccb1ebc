use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::domain::{DomainError, ScoreBreakdown};
use crate::ports::{ScoreProducer, ScoreRequest};

/// Error payload the scoring endpoint returns on failure.
#[derive(Debug, Deserialize)]
struct ScoreErrorReply {
    #[serde(alias = "message")]
    error: String,
}

/// HTTP scoring client.
///
/// POSTs the score request as JSON with a bearer token and expects a
/// `ScoreBreakdown` body, or `{error}` on failure. The caller bounds the
/// call with its own timeout; this client only maps transport and payload
/// errors into `DomainError::Scoring`.
pub struct HttpScoreProducer {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpScoreProducer {
    pub fn new(endpoint: &str, api_token: Option<String>) -> Result<Self, DomainError> {
        let parsed = Url::parse(endpoint)
            .map_err(|e| DomainError::Config(format!("Invalid scoring endpoint: {}", e)))?;
        if parsed.host_str().is_none() {
            return Err(DomainError::Config(
                "Scoring endpoint has no host".to_string(),
            ));
        }

        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("Interprep/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::HttpRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_token,
        })
    }
}

#[async_trait]
impl ScoreProducer for HttpScoreProducer {
    async fn score(&self, request: ScoreRequest) -> Result<ScoreBreakdown, DomainError> {
        let mut http_request = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.api_token {
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| DomainError::Scoring(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = match response.json::<ScoreErrorReply>().await {
                Ok(reply) => reply.error,
                Err(_) => format!("HTTP {} from scoring endpoint", status),
            };
            warn!(status = %status, reason = %reason, "Scoring endpoint rejected request");
            return Err(DomainError::Scoring(reason));
        }

        let breakdown: ScoreBreakdown = response
            .json()
            .await
            .map_err(|e| DomainError::Scoring(format!("Malformed score payload: {}", e)))?;

        info!(overall = breakdown.overall, "Score received");
        Ok(breakdown)
    }
}
