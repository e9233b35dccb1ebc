use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Phase timing configuration.
///
/// The thinking and transcribe delays are tunables, not correctness
/// constraints; they simulate preparation and finalization pauses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause before a question is shown, in milliseconds.
    pub thinking_delay_ms: u64,
    /// Finalization pause after recording stops, in milliseconds.
    pub transcribe_delay_ms: u64,
    /// Elapsed-time ticker period, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            thinking_delay_ms: 1_500,
            transcribe_delay_ms: 1_000,
            tick_interval_ms: 1_000,
        }
    }
}

impl TimingConfig {
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }

    pub fn transcribe_delay(&self) -> Duration {
        Duration::from_millis(self.transcribe_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Capture device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Bound on device acquisition, in seconds.
    pub acquire_timeout_secs: u64,
    /// Target sample rate for buffered media, in Hz.
    pub sample_rate: u32,
    /// Maximum buffered recording length in seconds (ring buffer size).
    pub buffer_duration_secs: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_secs: 10,
            sample_rate: 16_000,
            buffer_duration_secs: 600,
        }
    }
}

impl CaptureConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Ring buffer capacity in samples.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_duration_secs as usize * self.sample_rate as usize
    }
}

/// Scoring endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Scoring service URL. Empty means no remote scorer is configured.
    pub endpoint: String,
    /// Bearer token sent with scoring requests.
    pub api_token: Option<String>,
    /// Bound on the scoring call, in seconds. Exceeding it yields a
    /// degraded score, never a hung feedback stage.
    pub timeout_secs: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_token: None,
            timeout_secs: 15,
        }
    }
}

impl ScoringConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Questions requested per interview. The selection may return fewer
    /// when the bank has fewer matching entries.
    pub question_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { question_count: 5 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub timing: TimingConfig,
    pub capture: CaptureConfig,
    pub scoring: ScoringConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
