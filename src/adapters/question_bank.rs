use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::domain::{Difficulty, DomainError, JobRole, Question};
use crate::ports::QuestionSource;

/// Expected answer length for questions that do not carry one.
const DEFAULT_EXPECTED_DURATION_SECS: u32 = 120;

fn question(
    id: &str,
    job_role: JobRole,
    difficulty: Difficulty,
    text: &str,
    category: &str,
    expected_duration_secs: u32,
) -> Question {
    Question {
        id: id.to_string(),
        job_role,
        difficulty,
        text: text.to_string(),
        category: category.to_string(),
        expected_duration_secs,
    }
}

/// Built-in sample bank covering every role.
static SAMPLE_BANK: Lazy<Vec<Question>> = Lazy::new(|| {
    vec![
        question(
            "1",
            JobRole::SoftwareEngineer,
            Difficulty::Intermediate,
            "Can you explain the difference between asynchronous and synchronous programming?",
            "Technical",
            120,
        ),
        question(
            "2",
            JobRole::SoftwareEngineer,
            Difficulty::Intermediate,
            "Describe a challenging project you worked on and how you overcame obstacles.",
            "Behavioral",
            180,
        ),
        question(
            "3",
            JobRole::SoftwareEngineer,
            Difficulty::Advanced,
            "How would you design a scalable system for handling millions of concurrent users?",
            "System Design",
            240,
        ),
        question(
            "4",
            JobRole::DataAnalyst,
            Difficulty::Intermediate,
            "Explain how you would approach cleaning and preprocessing a dataset with missing values.",
            "Technical",
            150,
        ),
        question(
            "5",
            JobRole::DataAnalyst,
            Difficulty::Intermediate,
            "Describe a time when you had to present complex data insights to non-technical stakeholders.",
            "Behavioral",
            180,
        ),
        question(
            "6",
            JobRole::ProductManager,
            Difficulty::Intermediate,
            "How do you prioritize features in a product backlog?",
            "Product Strategy",
            180,
        ),
        question(
            "7",
            JobRole::ProductManager,
            Difficulty::Advanced,
            "Describe how you would validate a new product idea before investing resources in development.",
            "Product Strategy",
            210,
        ),
        question(
            "8",
            JobRole::UxDesigner,
            Difficulty::Intermediate,
            "Walk me through your design process from requirement gathering to final deliverables.",
            "Process",
            180,
        ),
        question(
            "9",
            JobRole::UxDesigner,
            Difficulty::Intermediate,
            "How do you incorporate user feedback into your designs?",
            "User Research",
            150,
        ),
        question(
            "10",
            JobRole::MarketingSpecialist,
            Difficulty::Intermediate,
            "Describe a successful marketing campaign you planned and executed. What metrics did you use to measure success?",
            "Strategy",
            180,
        ),
    ]
});

/// In-memory question bank.
pub struct StaticQuestionBank {
    questions: Vec<Question>,
}

impl StaticQuestionBank {
    /// The built-in sample bank.
    pub fn sample() -> Self {
        Self {
            questions: SAMPLE_BANK.clone(),
        }
    }

    /// Wrap an externally fetched question list.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

impl QuestionSource for StaticQuestionBank {
    fn all(&self) -> &[Question] {
        &self.questions
    }
}

/// One generated question row as the remote endpoint returns it.
#[derive(Debug, Deserialize)]
struct GeneratedRow {
    #[serde(default)]
    id: Option<RowId>,
    job_role: JobRole,
    difficulty: Difficulty,
    question: String,
    category: String,
}

/// Row ids arrive as strings or database integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RowId {
    Text(String),
    Number(u64),
}

impl RowId {
    fn into_string(self) -> String {
        match self {
            RowId::Text(s) => s,
            RowId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateQuestionsReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    questions: Vec<GeneratedRow>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the remote question-generation endpoint.
///
/// Wire contract: POST `{jobRole, difficulty}` with a bearer token, reply
/// `{success, questions}` on success or `{error}` on failure.
pub struct RemoteQuestionBank {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl RemoteQuestionBank {
    pub fn new(endpoint: &str, api_token: Option<String>) -> Result<Self, DomainError> {
        Url::parse(endpoint)
            .map_err(|e| DomainError::Config(format!("Invalid question endpoint: {}", e)))?;

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

    /// Fetch freshly generated questions for a role and difficulty.
    pub async fn fetch(
        &self,
        job_role: JobRole,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, DomainError> {
        let body = serde_json::json!({
            "jobRole": job_role,
            "difficulty": difficulty,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::HttpRequest(e.to_string()))?;

        let status = response.status();
        let reply: GenerateQuestionsReply = response
            .json()
            .await
            .map_err(|e| DomainError::HttpRequest(e.to_string()))?;

        if let Some(error) = reply.error {
            return Err(DomainError::HttpRequest(error));
        }
        if !status.is_success() || !reply.success {
            return Err(DomainError::HttpRequest(format!(
                "HTTP {} from question endpoint",
                status
            )));
        }

        let questions = rows_to_questions(reply.questions);
        info!(
            count = questions.len(),
            role = job_role.as_str(),
            "Fetched generated questions"
        );
        Ok(questions)
    }
}

fn rows_to_questions(rows: Vec<GeneratedRow>) -> Vec<Question> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let id = row
                .id
                .map(RowId::into_string)
                .unwrap_or_else(|| format!("generated-{}", index + 1));
            debug!(id = %id, "Mapped generated question row");
            Question {
                id,
                job_role: row.job_role,
                difficulty: row.difficulty,
                text: row.question,
                category: row.category,
                expected_duration_secs: DEFAULT_EXPECTED_DURATION_SECS,
            }
        })
        .collect()
}
