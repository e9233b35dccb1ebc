use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Job role an interview is tailored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobRole {
    SoftwareEngineer,
    DataAnalyst,
    ProductManager,
    UxDesigner,
    MarketingSpecialist,
}

impl JobRole {
    /// All supported roles, in display order.
    pub const ALL: [JobRole; 5] = [
        JobRole::SoftwareEngineer,
        JobRole::DataAnalyst,
        JobRole::ProductManager,
        JobRole::UxDesigner,
        JobRole::MarketingSpecialist,
    ];

    /// Wire identifier, e.g. `software-engineer`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            JobRole::SoftwareEngineer => "software-engineer",
            JobRole::DataAnalyst => "data-analyst",
            JobRole::ProductManager => "product-manager",
            JobRole::UxDesigner => "ux-designer",
            JobRole::MarketingSpecialist => "marketing-specialist",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            JobRole::SoftwareEngineer => "Software Engineer",
            JobRole::DataAnalyst => "Data Analyst",
            JobRole::ProductManager => "Product Manager",
            JobRole::UxDesigner => "UX Designer",
            JobRole::MarketingSpecialist => "Marketing Specialist",
        }
    }
}

/// Interview difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// All supported difficulties, easiest first.
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    /// Wire identifier, e.g. `beginner`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

/// How the candidate answers questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Video,
    Audio,
    Text,
}

impl Mode {
    /// Whether this mode records from a capture device.
    #[must_use]
    pub fn uses_capture_device(&self) -> bool {
        matches!(self, Mode::Video | Mode::Audio)
    }
}

/// A single interview question. Immutable; owned by the question source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub job_role: JobRole,
    pub difficulty: Difficulty,
    pub text: String,
    pub category: String,
    /// Suggested answer length in seconds.
    pub expected_duration_secs: u32,
}

/// A finalized answer to one question. Created exactly once per answered
/// question and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub question_id: String,
    /// Transcript or typed answer. None when the recording produced no text.
    pub text: Option<String>,
    pub duration_secs: u32,
}

/// Normalized score for a completed session. Each axis is 0-100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub overall: u8,
    pub fluency: u8,
    pub clarity: u8,
    pub confidence: u8,
    pub relevance: u8,
    pub feedback: String,
}

impl ScoreBreakdown {
    /// Placeholder shown when the scoring producer fails or times out.
    #[must_use]
    pub fn degraded() -> Self {
        Self {
            overall: 0,
            fluency: 0,
            clarity: 0,
            confidence: 0,
            relevance: 0,
            feedback: "Scoring is temporarily unavailable. Your responses were \
                       saved for this session; try again later for detailed feedback."
                .to_string(),
        }
    }

    /// Whether this breakdown is the degraded placeholder.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.overall == 0
            && self.fluency == 0
            && self.clarity == 0
            && self.confidence == 0
            && self.relevance == 0
    }
}

/// Interview session stage machine.
///
/// Stage transitions:
/// - Setup -> InProgress (start, requires a non-empty question selection)
/// - InProgress -> Feedback (last question answered, score attached)
/// - InProgress -> Setup (exit, after capture cleanup)
/// - Feedback -> Setup (practice again, fresh question selection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Setup,
    InProgress,
    Feedback,
}

impl Stage {
    /// Check if an interview can be started from this stage.
    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self, Stage::Setup)
    }

    /// Check if a question can be answered in this stage.
    #[must_use]
    pub fn can_answer(&self) -> bool {
        matches!(self, Stage::InProgress)
    }

    /// Check if the session can be reset for another practice run.
    #[must_use]
    pub fn can_restart(&self) -> bool {
        matches!(self, Stage::Feedback)
    }
}

/// Validated interview settings. Immutable once a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub job_role: JobRole,
    pub difficulty: Difficulty,
    pub mode: Mode,
}

/// In-progress setup choices, mirroring the setup form. All three fields
/// must be populated before a session can start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupForm {
    pub job_role: Option<JobRole>,
    pub difficulty: Option<Difficulty>,
    pub mode: Option<Mode>,
}

impl SetupForm {
    /// Validate the form into settings, naming the first missing field.
    pub fn settings(&self) -> Result<SessionSettings, DomainError> {
        let job_role = self
            .job_role
            .ok_or(DomainError::SetupIncomplete { missing: "job role" })?;
        let difficulty = self.difficulty.ok_or(DomainError::SetupIncomplete {
            missing: "difficulty",
        })?;
        let mode = self
            .mode
            .ok_or(DomainError::SetupIncomplete { missing: "mode" })?;
        Ok(SessionSettings {
            job_role,
            difficulty,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_role_wire_format() {
        let json = serde_json::to_string(&JobRole::SoftwareEngineer).unwrap();
        assert_eq!(json, "\"software-engineer\"");

        let parsed: JobRole = serde_json::from_str("\"ux-designer\"").unwrap();
        assert_eq!(parsed, JobRole::UxDesigner);
    }

    #[test]
    fn test_job_role_as_str_matches_serde() {
        for role in JobRole::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_mode_uses_capture_device() {
        assert!(Mode::Video.uses_capture_device());
        assert!(Mode::Audio.uses_capture_device());
        assert!(!Mode::Text.uses_capture_device());
    }

    #[test]
    fn test_stage_guards() {
        assert!(Stage::Setup.can_start());
        assert!(!Stage::InProgress.can_start());
        assert!(!Stage::Feedback.can_start());

        assert!(Stage::InProgress.can_answer());
        assert!(!Stage::Setup.can_answer());

        assert!(Stage::Feedback.can_restart());
        assert!(!Stage::InProgress.can_restart());
    }

    #[test]
    fn test_setup_form_requires_all_fields() {
        let mut form = SetupForm::default();
        assert!(form.settings().is_err());

        form.job_role = Some(JobRole::DataAnalyst);
        form.difficulty = Some(Difficulty::Beginner);
        assert!(form.settings().is_err());

        form.mode = Some(Mode::Text);
        let settings = form.settings().unwrap();
        assert_eq!(settings.job_role, JobRole::DataAnalyst);
        assert_eq!(settings.difficulty, Difficulty::Beginner);
        assert_eq!(settings.mode, Mode::Text);
    }

    #[test]
    fn test_degraded_score() {
        let score = ScoreBreakdown::degraded();
        assert!(score.is_degraded());
        assert!(!score.feedback.is_empty());

        let real = ScoreBreakdown {
            overall: 85,
            fluency: 80,
            clarity: 90,
            confidence: 85,
            relevance: 90,
            feedback: "Solid".to_string(),
        };
        assert!(!real.is_degraded());
    }
}
