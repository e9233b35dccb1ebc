pub mod capture;
pub mod config;
pub mod error;
pub mod interview;
pub mod user;

pub use capture::{
    AtomicCapturePhase, CapturePhase, CaptureSnapshot, DeviceHandle, RecordedMedia,
    RecordingSummary,
};
pub use config::AppConfig;
pub use error::DomainError;
pub use interview::{
    Difficulty, JobRole, Mode, Question, Response, ScoreBreakdown, SessionSettings, SetupForm,
    Stage,
};
pub use user::{UserProfile, UserRole};
