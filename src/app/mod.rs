pub mod capture;
pub mod controller;
pub mod selection;
pub mod session;

pub use capture::ResponseCapture;
pub use controller::AppController;
pub use selection::select_questions;
pub use session::{InterviewSession, SessionProgress, SessionRuntime};
