pub mod config_store;
pub mod media_fake;
#[cfg(feature = "device-capture")]
pub mod media_mic;
pub mod profile_store;
pub mod question_bank;
pub mod scoring_canned;
pub mod scoring_http;

pub use config_store::TomlConfigStore;
pub use media_fake::{FakeMediaCapture, InjectedFailure};
#[cfg(feature = "device-capture")]
pub use media_mic::MicMediaCapture;
pub use profile_store::JsonProfileStore;
pub use question_bank::{RemoteQuestionBank, StaticQuestionBank};
pub use scoring_canned::CannedScoreProducer;
pub use scoring_http::HttpScoreProducer;
