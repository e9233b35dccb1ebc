use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{
    CannedScoreProducer, HttpScoreProducer, JsonProfileStore, StaticQuestionBank, TomlConfigStore,
};
use crate::app::session::{InterviewSession, SessionRuntime};
use crate::domain::{AppConfig, DomainError, UserProfile};
use crate::infrastructure::init_logging;
use crate::ports::{ConfigStore, MediaCapture, ProfileStore, QuestionSource, ScoreProducer};

/// Application controller that orchestrates initialization and manages
/// global state. Library consumers that wire their own ports can skip it
/// and construct `InterviewSession` directly.
pub struct AppController {
    config: RwLock<AppConfig>,
    config_store: Arc<TomlConfigStore>,
    profile_store: JsonProfileStore,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Initialize the application controller.
    /// This sets up configuration, logging, and the profile store.
    pub fn new() -> Result<Self, DomainError> {
        // Step 1: Initialize config store
        let config_store = Arc::new(TomlConfigStore::new()?);

        // Step 2: Load configuration
        let config = config_store.load()?;

        // Step 3: Initialize logging
        let log_guard = init_logging(
            &config_store.logs_dir(),
            &config.logging.level,
            config.logging.file_logging,
        )?;

        info!("Interprep starting up");

        // Step 4: Profile persistence under the data directory
        let profile_store = JsonProfileStore::new(config_store.data_dir());

        Ok(Self {
            config: RwLock::new(config),
            config_store,
            profile_store,
            _log_guard: log_guard,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Update the configuration.
    pub fn update_config(&self, config: AppConfig) -> Result<(), DomainError> {
        // Save to disk
        self.config_store.save(&config)?;

        // Update in-memory config
        *self.config.write() = config;

        info!("Configuration updated");
        Ok(())
    }

    /// The signed-in profile, if any.
    pub fn profile(&self) -> Result<Option<UserProfile>, DomainError> {
        self.profile_store.load()
    }

    /// Persist a profile as the signed-in identity.
    pub fn sign_in(&self, profile: &UserProfile) -> Result<(), DomainError> {
        self.profile_store.save(profile)
    }

    /// Remove the signed-in identity.
    pub fn sign_out(&self) -> Result<(), DomainError> {
        self.profile_store.clear()
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> String {
        self.config_store.data_dir().to_string_lossy().to_string()
    }

    /// Get the logs directory path.
    pub fn logs_dir(&self) -> String {
        self.config_store.logs_dir().to_string_lossy().to_string()
    }

    /// Get the config file path.
    pub fn config_path(&self) -> String {
        self.config_store.config_path().to_string_lossy().to_string()
    }

    /// Build a session from the current configuration and the given media
    /// capture backend.
    pub fn new_session(&self, media: Arc<dyn MediaCapture>) -> InterviewSession {
        let config = self.config.read();

        let scorer: Arc<dyn ScoreProducer> = if config.scoring.endpoint.is_empty() {
            Arc::new(CannedScoreProducer::new())
        } else {
            match HttpScoreProducer::new(
                &config.scoring.endpoint,
                config.scoring.api_token.clone(),
            ) {
                Ok(producer) => Arc::new(producer),
                Err(err) => {
                    warn!(error = %err, "Falling back to canned scoring");
                    Arc::new(CannedScoreProducer::new())
                }
            }
        };

        let questions: Arc<dyn QuestionSource> = Arc::new(StaticQuestionBank::sample());

        InterviewSession::new(
            questions,
            media,
            scorer,
            SessionRuntime {
                timing: config.timing.clone(),
                capture: config.capture.clone(),
                scoring: config.scoring.clone(),
                session: config.session.clone(),
            },
        )
    }
}
