pub mod config;
pub mod media;
pub mod profile;
pub mod questions;
pub mod scoring;

pub use config::ConfigStore;
pub use media::{MediaCapture, TranscriptSink};
pub use profile::ProfileStore;
pub use questions::QuestionSource;
pub use scoring::{ScoreProducer, ScoreRequest};
