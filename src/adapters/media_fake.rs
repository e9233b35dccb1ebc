use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::domain::{DeviceHandle, DomainError, Mode, RecordedMedia, RecordingSummary};
use crate::ports::{MediaCapture, TranscriptSink};

/// Failure the fake injects on the next acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    PermissionDenied,
    DeviceUnavailable,
}

#[derive(Default)]
struct FakeState {
    handle: Option<DeviceHandle>,
    recording: bool,
    buffer: Option<RecordedMedia>,
    sink: Option<TranscriptSink>,
    fail_acquire: Option<InjectedFailure>,
    fail_stop: bool,
}

/// In-memory media capture for tests and headless runs.
///
/// Fully scriptable: failures can be injected, partial transcripts are
/// emitted manually, and the number of held device handles is observable.
pub struct FakeMediaCapture {
    state: Mutex<FakeState>,
    acquired: AtomicUsize,
    next_id: AtomicU64,
    transcription_supported: bool,
    sample_rate: u32,
}

impl FakeMediaCapture {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            acquired: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            transcription_supported: true,
            sample_rate: 16_000,
        }
    }

    /// A fake whose backend cannot transcribe; `attach_transcription`
    /// reports the soft failure.
    pub fn without_transcription() -> Self {
        Self {
            transcription_supported: false,
            ..Self::new()
        }
    }

    /// Fail the next acquire with the given error.
    pub fn fail_next_acquire(&self, failure: InjectedFailure) {
        self.state.lock().fail_acquire = Some(failure);
    }

    /// Fail the next stop. The device is still released.
    pub fn fail_next_stop(&self) {
        self.state.lock().fail_stop = true;
    }

    /// Deliver a cumulative partial transcript to the attached sink.
    /// No-op when no sink is attached.
    pub fn emit_partial(&self, transcript: &str) {
        let state = self.state.lock();
        if let Some(sink) = &state.sink {
            sink(transcript.to_string());
        }
    }

    /// Append synthetic samples to the recording buffer.
    pub fn feed_samples(&self, samples: &[i16]) {
        let mut state = self.state.lock();
        if let Some(buffer) = state.buffer.as_mut() {
            buffer.push_samples(samples);
        }
    }
}

impl Default for FakeMediaCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaCapture for FakeMediaCapture {
    async fn acquire(&self, mode: Mode) -> Result<DeviceHandle, DomainError> {
        let mut state = self.state.lock();

        if let Some(failure) = state.fail_acquire.take() {
            return Err(match failure {
                InjectedFailure::PermissionDenied => DomainError::PermissionDenied,
                InjectedFailure::DeviceUnavailable => DomainError::DeviceUnavailable {
                    message: "injected device failure".to_string(),
                },
            });
        }

        if let Some(handle) = &state.handle {
            debug!(id = handle.id(), "Acquire while held, returning existing handle");
            return Ok(handle.clone());
        }

        let handle = DeviceHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed), mode);
        state.handle = Some(handle.clone());
        self.acquired.fetch_add(1, Ordering::Release);
        Ok(handle)
    }

    fn start_recording(&self, handle: &DeviceHandle) -> Result<(), DomainError> {
        let mut state = self.state.lock();
        if state.handle.as_ref() != Some(handle) {
            return Err(DomainError::DeviceUnavailable {
                message: "unknown device handle".to_string(),
            });
        }
        if state.recording {
            return Err(DomainError::AlreadyRecording);
        }
        state.recording = true;
        state.buffer = Some(RecordedMedia::new(self.sample_rate));
        Ok(())
    }

    fn attach_transcription(
        &self,
        handle: &DeviceHandle,
        sink: TranscriptSink,
    ) -> Result<(), DomainError> {
        if !self.transcription_supported {
            return Err(DomainError::TranscriptionUnsupported);
        }
        let mut state = self.state.lock();
        if state.handle.as_ref() != Some(handle) {
            return Err(DomainError::DeviceUnavailable {
                message: "unknown device handle".to_string(),
            });
        }
        state.sink = Some(sink);
        Ok(())
    }

    async fn stop(&self, handle: &DeviceHandle) -> Result<RecordingSummary, DomainError> {
        let mut state = self.state.lock();
        if state.handle.as_ref() != Some(handle) {
            return Err(DomainError::NotRecording);
        }

        // Release the device before reporting any failure. The sink is
        // kept so tests can simulate engine callbacks that straggle in
        // after stop.
        state.handle = None;
        state.recording = false;
        let buffer = state.buffer.take();
        self.acquired.fetch_sub(1, Ordering::Release);

        if state.fail_stop {
            state.fail_stop = false;
            return Err(DomainError::DeviceUnavailable {
                message: "injected stop failure".to_string(),
            });
        }

        Ok(buffer
            .map(RecordedMedia::into_summary)
            .unwrap_or_else(RecordingSummary::empty))
    }

    fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::Acquire)
    }
}
