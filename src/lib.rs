#![forbid(unsafe_code)]

//! Mock-interview practice engine.
//!
//! The crate is organized hexagonally:
//! - [`domain`] holds the pure types: roles, questions, responses, scores,
//!   the session stage and the per-question capture phase machine.
//! - [`ports`] holds the capability traits: media capture, question
//!   source, score producer, config and profile stores.
//! - [`adapters`] holds the implementations, including an in-memory fake
//!   capture backend for tests and a cpal microphone binding behind the
//!   `device-capture` feature.
//! - [`app`] holds the controllers: [`app::InterviewSession`] drives
//!   setup, question-by-question capture and feedback;
//!   [`app::ResponseCapture`] drives a single question's recording
//!   lifecycle.
//! - [`infrastructure`] holds logging initialization.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use app::{AppController, InterviewSession, ResponseCapture, SessionProgress, SessionRuntime};
pub use domain::{
    CapturePhase, CaptureSnapshot, Difficulty, DomainError, JobRole, Mode, Question, Response,
    ScoreBreakdown, SessionSettings, SetupForm, Stage,
};
