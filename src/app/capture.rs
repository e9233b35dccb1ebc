use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::domain::config::{CaptureConfig, TimingConfig};
use crate::domain::{
    AtomicCapturePhase, CapturePhase, CaptureSnapshot, DeviceHandle, DomainError, Mode, Question,
    Response,
};
use crate::ports::{MediaCapture, TranscriptSink};

/// State shared with timer tasks and transcription callbacks.
struct CaptureShared {
    phase: AtomicCapturePhase,
    elapsed_secs: AtomicU32,
    transcript: Mutex<String>,
    /// Bumped whenever the controller leaves `Recording`; transcription
    /// callbacks from an older generation are discarded.
    generation: AtomicU64,
    last_error: Mutex<Option<String>>,
    idle_since: Mutex<Option<Instant>>,
}

/// Per-question response capture controller.
///
/// Drives one question through its capture phases and emits exactly one
/// `Response` when the candidate finishes. The controller exclusively owns
/// any acquired device handle and guarantees release on every exit path:
/// normal stop, capture error, and cancellation.
///
/// Must be created within a Tokio runtime; the thinking delay and the
/// elapsed-time ticker run as cancellable spawned tasks tied to this
/// controller's lifetime.
pub struct ResponseCapture {
    question: Question,
    mode: Mode,
    media: Arc<dyn MediaCapture>,
    timing: TimingConfig,
    capture: CaptureConfig,
    shared: Arc<CaptureShared>,
    device: Mutex<Option<DeviceHandle>>,
    thinking_task: Mutex<Option<JoinHandle<()>>>,
    ticker_task: Mutex<Option<JoinHandle<()>>>,
}

impl ResponseCapture {
    /// Activate capture for a question. Enters `Thinking` and schedules
    /// the transition to `Idle`.
    pub fn new(
        question: Question,
        mode: Mode,
        media: Arc<dyn MediaCapture>,
        timing: TimingConfig,
        capture: CaptureConfig,
    ) -> Self {
        let shared = Arc::new(CaptureShared {
            phase: AtomicCapturePhase::default(),
            elapsed_secs: AtomicU32::new(0),
            transcript: Mutex::new(String::new()),
            generation: AtomicU64::new(0),
            last_error: Mutex::new(None),
            idle_since: Mutex::new(None),
        });

        let controller = Self {
            question,
            mode,
            media,
            timing,
            capture,
            shared: Arc::clone(&shared),
            device: Mutex::new(None),
            thinking_task: Mutex::new(None),
            ticker_task: Mutex::new(None),
        };

        let delay = controller.timing.thinking_delay();
        let task_shared = shared;
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            if task_shared
                .phase
                .compare_exchange(CapturePhase::Thinking, CapturePhase::Idle)
            {
                *task_shared.idle_since.lock() = Some(Instant::now());
            }
        });
        *controller.thinking_task.lock() = Some(handle);

        debug!(question = %controller.question.id, mode = ?controller.mode, "Capture activated");
        controller
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> CapturePhase {
        self.shared.phase.load()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.shared.elapsed_secs.load(Ordering::Acquire)
    }

    /// Read-only view of the in-flight capture.
    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            phase: self.shared.phase.load(),
            elapsed_secs: self.shared.elapsed_secs.load(Ordering::Acquire),
            live_transcript: self.shared.transcript.lock().clone(),
            last_error: self.shared.last_error.lock().clone(),
        }
    }

    /// Start recording a spoken answer. Acquires the capture device,
    /// begins buffering and subscribes to live transcription.
    ///
    /// Recoverable failures (permission denied, device unavailable,
    /// acquisition timeout) leave the controller in `Idle` with
    /// `last_error` set so the candidate can retry. A backend without
    /// transcription support records with an empty transcript.
    pub async fn start_recording(&self) -> Result<(), DomainError> {
        let phase = self.shared.phase.load();
        if !self.mode.uses_capture_device() || !phase.can_start_recording() {
            return Err(match phase {
                CapturePhase::Recording => DomainError::AlreadyRecording,
                _ => DomainError::CaptureTransition {
                    from: phase,
                    to: CapturePhase::Recording,
                },
            });
        }
        *self.shared.last_error.lock() = None;

        let handle = match timeout(self.capture.acquire_timeout(), self.media.acquire(self.mode))
            .await
        {
            Ok(Ok(handle)) => handle,
            Ok(Err(err)) => {
                self.record_error(&err);
                return Err(err);
            }
            Err(_) => {
                let err = DomainError::DeviceUnavailable {
                    message: "Device acquisition timed out".to_string(),
                };
                self.record_error(&err);
                return Err(err);
            }
        };

        if let Err(err) = self.media.start_recording(&handle) {
            let _ = self.media.stop(&handle).await;
            self.record_error(&err);
            return Err(err);
        }

        match self.media.attach_transcription(&handle, self.transcript_sink()) {
            Ok(()) => {}
            Err(err) if err.is_soft_capture_failure() => {
                warn!(question = %self.question.id, "Recording without live transcription");
            }
            Err(err) => {
                let _ = self.media.stop(&handle).await;
                self.record_error(&err);
                return Err(err);
            }
        }

        // Publish the handle before the phase flips so a concurrent
        // cancel always finds the device to release.
        *self.device.lock() = Some(handle);
        if !self
            .shared
            .phase
            .compare_exchange(CapturePhase::Idle, CapturePhase::Recording)
        {
            if let Some(handle) = self.device.lock().take() {
                let _ = self.media.stop(&handle).await;
            }
            return Err(DomainError::CaptureTransition {
                from: self.shared.phase.load(),
                to: CapturePhase::Recording,
            });
        }

        self.spawn_ticker();
        info!(question = %self.question.id, mode = ?self.mode, "Recording started");
        Ok(())
    }

    /// Stop recording and finalize the response.
    ///
    /// Releases the device, waits out the finalization delay in
    /// `Transcribing` and emits the response from the transcript collected
    /// while recording. Partials delivered after this call starts are
    /// discarded.
    pub async fn stop_recording(&self) -> Result<Response, DomainError> {
        if !self.shared.phase.load().can_stop_recording() {
            return Err(DomainError::NotRecording);
        }
        let device = self.device.lock().take().ok_or(DomainError::NotRecording)?;

        // Leaving Recording: anything the engine still delivers is stale.
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.phase.store(CapturePhase::Transcribing);
        self.abort_ticker();

        if let Err(err) = self.media.stop(&device).await {
            // The device is released by contract even when stop fails.
            self.record_error(&err);
            self.shared.phase.store(CapturePhase::Idle);
            return Err(err);
        }

        sleep(self.timing.transcribe_delay()).await;
        self.finalize()
    }

    /// Submit a typed answer (text mode). Empty text is rejected without a
    /// transition.
    pub fn submit_text(&self, text: &str) -> Result<Response, DomainError> {
        let phase = self.shared.phase.load();
        if self.mode != Mode::Text || !phase.can_submit_text() {
            return Err(DomainError::CaptureTransition {
                from: phase,
                to: CapturePhase::Done,
            });
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyResponse);
        }

        if !self
            .shared
            .phase
            .compare_exchange(CapturePhase::Idle, CapturePhase::Done)
        {
            return Err(DomainError::CaptureTransition {
                from: self.shared.phase.load(),
                to: CapturePhase::Done,
            });
        }

        let duration_secs = self
            .shared
            .idle_since
            .lock()
            .map(|since| since.elapsed().as_secs() as u32)
            .unwrap_or(0);

        info!(question = %self.question.id, duration_secs, "Text response submitted");
        Ok(Response {
            question_id: self.question.id.clone(),
            text: Some(trimmed.to_string()),
            duration_secs,
        })
    }

    /// Abandon the question: abort pending timers, release any held
    /// device and move to the terminal phase without emitting a response.
    pub async fn cancel(&self) {
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.abort_thinking();
        self.abort_ticker();
        self.shared.phase.store(CapturePhase::Done);

        if let Some(device) = self.device.lock().take() {
            if let Err(err) = self.media.stop(&device).await {
                warn!(question = %self.question.id, error = %err, "Device release during cancel failed");
            }
        }
        debug!(question = %self.question.id, "Capture cancelled");
    }

    fn finalize(&self) -> Result<Response, DomainError> {
        if !self
            .shared
            .phase
            .compare_exchange(CapturePhase::Transcribing, CapturePhase::Done)
        {
            return Err(DomainError::CaptureTransition {
                from: self.shared.phase.load(),
                to: CapturePhase::Done,
            });
        }

        let transcript = self.shared.transcript.lock().clone();
        let duration_secs = self.shared.elapsed_secs.load(Ordering::Acquire);
        let text = if transcript.trim().is_empty() {
            None
        } else {
            Some(transcript)
        };

        info!(question = %self.question.id, duration_secs, "Response finalized");
        Ok(Response {
            question_id: self.question.id.clone(),
            text,
            duration_secs,
        })
    }

    /// Sink applying cumulative partials while the phase still accepts
    /// them. Stale deliveries (after stop or cancel) are no-ops.
    fn transcript_sink(&self) -> TranscriptSink {
        let shared = Arc::clone(&self.shared);
        let generation = shared.generation.load(Ordering::Acquire);
        Box::new(move |text: String| {
            if shared.generation.load(Ordering::Acquire) != generation {
                return;
            }
            if !shared.phase.load().accepts_partials() {
                return;
            }
            *shared.transcript.lock() = text;
        })
    }

    fn spawn_ticker(&self) {
        let shared = Arc::clone(&self.shared);
        let tick = self.timing.tick_interval();
        let handle = tokio::spawn(async move {
            loop {
                sleep(tick).await;
                if shared.phase.load() != CapturePhase::Recording {
                    break;
                }
                shared.elapsed_secs.fetch_add(1, Ordering::AcqRel);
            }
        });
        if let Some(previous) = self.ticker_task.lock().replace(handle) {
            previous.abort();
        }
    }

    fn abort_thinking(&self) {
        if let Some(task) = self.thinking_task.lock().take() {
            task.abort();
        }
    }

    fn abort_ticker(&self) {
        if let Some(task) = self.ticker_task.lock().take() {
            task.abort();
        }
    }

    fn record_error(&self, err: &DomainError) {
        warn!(question = %self.question.id, error = %err, "Capture error");
        *self.shared.last_error.lock() = Some(err.to_string());
    }
}

impl Drop for ResponseCapture {
    fn drop(&mut self) {
        // Timers must never fire into a stale state. Device release is
        // async and handled by cancel(); the session controller always
        // cancels before dropping an unfinished capture.
        self.abort_thinking();
        self.abort_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::media_fake::{FakeMediaCapture, InjectedFailure};
    use std::time::Duration;

    fn sample_question() -> Question {
        Question {
            id: "1".to_string(),
            job_role: crate::domain::JobRole::SoftwareEngineer,
            difficulty: crate::domain::Difficulty::Intermediate,
            text: "Can you explain the difference between asynchronous and synchronous programming?"
                .to_string(),
            category: "Technical".to_string(),
            expected_duration_secs: 120,
        }
    }

    fn capture_with(mode: Mode, media: Arc<FakeMediaCapture>) -> ResponseCapture {
        ResponseCapture::new(
            sample_question(),
            mode,
            media,
            TimingConfig::default(),
            CaptureConfig::default(),
        )
    }

    async fn wait_for_idle() {
        // Paused-clock tests auto-advance past the thinking delay.
        sleep(Duration::from_millis(1_600)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_thinking_transitions_to_idle() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, media);

        assert_eq!(capture.phase(), CapturePhase::Thinking);
        wait_for_idle().await;
        assert_eq!(capture.phase(), CapturePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_before_idle_is_rejected() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, media);

        let err = capture.start_recording().await.unwrap_err();
        assert!(matches!(err, DomainError::CaptureTransition { .. }));
        assert_eq!(capture.phase(), CapturePhase::Thinking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_audio_flow() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, Arc::clone(&media));

        wait_for_idle().await;
        capture.start_recording().await.unwrap();
        assert_eq!(capture.phase(), CapturePhase::Recording);
        assert_eq!(media.acquired_count(), 1);

        media.emit_partial("I would");
        sleep(Duration::from_secs(3)).await;
        media.emit_partial("I would start by profiling");

        let response = capture.stop_recording().await.unwrap();
        assert_eq!(capture.phase(), CapturePhase::Done);
        assert_eq!(media.acquired_count(), 0);
        assert_eq!(response.question_id, "1");
        assert_eq!(response.text.as_deref(), Some("I would start by profiling"));
        assert_eq!(response.duration_secs, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_with_recording() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, Arc::clone(&media));

        wait_for_idle().await;
        capture.start_recording().await.unwrap();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(capture.elapsed_secs(), 5);

        let response = capture.stop_recording().await.unwrap();
        assert_eq!(response.duration_secs, 5);

        // Time passing after Done never changes the emitted duration.
        sleep(Duration::from_secs(10)).await;
        assert_eq!(capture.elapsed_secs(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_partial_after_stop_is_discarded() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, Arc::clone(&media));

        wait_for_idle().await;
        capture.start_recording().await.unwrap();
        media.emit_partial("final answer");

        let response = capture.stop_recording().await.unwrap();
        assert_eq!(response.text.as_deref(), Some("final answer"));

        // A straggling engine callback after stop must not alter anything.
        media.emit_partial("final answer plus corruption");
        assert_eq!(capture.snapshot().live_transcript, "final answer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_failure_returns_to_idle_for_retry() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Video, Arc::clone(&media));

        wait_for_idle().await;
        media.fail_next_acquire(InjectedFailure::PermissionDenied);
        let err = capture.start_recording().await.unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied));
        assert_eq!(capture.phase(), CapturePhase::Idle);
        assert!(capture.snapshot().last_error.is_some());
        assert_eq!(media.acquired_count(), 0);

        // Retry succeeds once permission is granted.
        capture.start_recording().await.unwrap();
        assert_eq!(capture.phase(), CapturePhase::Recording);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_failure_releases_device_and_returns_to_idle() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, Arc::clone(&media));

        wait_for_idle().await;
        capture.start_recording().await.unwrap();
        media.fail_next_stop();

        assert!(capture.stop_recording().await.is_err());
        assert_eq!(capture.phase(), CapturePhase::Idle);
        assert_eq!(media.acquired_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcription_unsupported_degrades_to_empty_text() {
        let media = Arc::new(FakeMediaCapture::without_transcription());
        let capture = capture_with(Mode::Audio, Arc::clone(&media));

        wait_for_idle().await;
        capture.start_recording().await.unwrap();
        sleep(Duration::from_secs(2)).await;

        let response = capture.stop_recording().await.unwrap();
        assert_eq!(response.text, None);
        assert_eq!(response.duration_secs, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_submission() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Text, Arc::clone(&media));

        wait_for_idle().await;
        assert!(matches!(
            capture.submit_text("   "),
            Err(DomainError::EmptyResponse)
        ));
        assert_eq!(capture.phase(), CapturePhase::Idle);

        sleep(Duration::from_secs(12)).await;
        let response = capture.submit_text("A typed answer.").unwrap();
        assert_eq!(response.text.as_deref(), Some("A typed answer."));
        assert_eq!(response.duration_secs, 12);
        assert_eq!(capture.phase(), CapturePhase::Done);

        // Text mode never touches the capture device.
        assert_eq!(media.acquired_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_mode_cannot_start_recording() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Text, Arc::clone(&media));

        wait_for_idle().await;
        assert!(capture.start_recording().await.is_err());
        assert_eq!(media.acquired_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_recording_releases_device() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, Arc::clone(&media));

        wait_for_idle().await;
        capture.start_recording().await.unwrap();
        assert_eq!(media.acquired_count(), 1);

        capture.cancel().await;
        assert_eq!(media.acquired_count(), 0);
        assert_eq!(capture.phase(), CapturePhase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_thinking_suppresses_timer() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, media);

        capture.cancel().await;
        assert_eq!(capture.phase(), CapturePhase::Done);

        // The aborted thinking timer never fires into the stale state.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(capture.phase(), CapturePhase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_stop_is_rejected() {
        let media = Arc::new(FakeMediaCapture::new());
        let capture = capture_with(Mode::Audio, Arc::clone(&media));

        wait_for_idle().await;
        capture.start_recording().await.unwrap();
        capture.stop_recording().await.unwrap();

        assert!(matches!(
            capture.stop_recording().await,
            Err(DomainError::NotRecording)
        ));
    }
}
