use crate::domain::capture::CapturePhase;
use crate::domain::interview::Stage;
use thiserror::Error;

/// Domain-level errors for interprep.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Interview setup is incomplete: missing {missing}")]
    SetupIncomplete { missing: &'static str },

    #[error("No questions available for role '{role}' at difficulty '{difficulty}'")]
    NoQuestions { role: String, difficulty: String },

    #[error("Session is in stage {stage:?}, operation requires {required:?}")]
    WrongStage { stage: Stage, required: Stage },

    #[error("Invalid capture transition from {from:?} to {to:?}")]
    CaptureTransition { from: CapturePhase, to: CapturePhase },

    #[error("Not currently recording")]
    NotRecording,

    #[error("Already recording")]
    AlreadyRecording,

    #[error("A text response must not be empty")]
    EmptyResponse,

    #[error("Access to the capture device was denied")]
    PermissionDenied,

    #[error("Capture device unavailable: {message}")]
    DeviceUnavailable { message: String },

    #[error("Live transcription is not supported by this capture backend")]
    TranscriptionUnsupported,

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("Profile error: {0}")]
    Profile(String),
}

impl DomainError {
    /// Whether the error is a soft capture failure: recording may continue
    /// without a live transcript.
    #[must_use]
    pub fn is_soft_capture_failure(&self) -> bool {
        matches!(self, DomainError::TranscriptionUnsupported)
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_capture_failure() {
        assert!(DomainError::TranscriptionUnsupported.is_soft_capture_failure());
        assert!(!DomainError::PermissionDenied.is_soft_capture_failure());
        assert!(!DomainError::DeviceUnavailable {
            message: "gone".to_string()
        }
        .is_soft_capture_failure());
    }

    #[test]
    fn test_no_questions_display() {
        let err = DomainError::NoQuestions {
            role: "software-engineer".to_string(),
            difficulty: "beginner".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("software-engineer"));
        assert!(text.contains("beginner"));
    }
}
