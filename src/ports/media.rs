use async_trait::async_trait;

use crate::domain::{DeviceHandle, DomainError, Mode, RecordingSummary};

/// Cumulative partial-transcript callback. Each invocation carries the full
/// transcript so far, not a delta; transcript length is monotonically
/// non-decreasing within one recording.
pub type TranscriptSink = Box<dyn Fn(String) + Send + Sync>;

/// Port for capture device access.
///
/// Implementations are stateless façades over platform resources; they
/// never own application state. A device is acquired and released once per
/// question.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Request the devices the mode needs: camera and microphone for
    /// video, microphone only for audio.
    ///
    /// Idempotent: acquiring while already acquired returns the existing
    /// handle instead of requesting a duplicate.
    async fn acquire(&self, mode: Mode) -> Result<DeviceHandle, DomainError>;

    /// Begin buffering the media stream for the handle.
    fn start_recording(&self, handle: &DeviceHandle) -> Result<(), DomainError>;

    /// Subscribe to a continuous speech-to-text stream. The sink fires at
    /// an engine-determined cadence with the cumulative transcript.
    ///
    /// Returns `TranscriptionUnsupported` when the backend cannot
    /// transcribe; recording is unaffected by that failure.
    fn attach_transcription(
        &self,
        handle: &DeviceHandle,
        sink: TranscriptSink,
    ) -> Result<(), DomainError>;

    /// Stop recording and transcription, and release all underlying device
    /// tracks. Release happens on every exit path, including errors
    /// mid-recording.
    async fn stop(&self, handle: &DeviceHandle) -> Result<RecordingSummary, DomainError>;

    /// Number of device handles currently held.
    fn acquired_count(&self) -> usize;
}
