use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::interview::Mode;

/// Per-question response capture state machine.
///
/// Phase transitions (video/audio modes):
/// - Thinking -> Idle (thinking delay elapsed)
/// - Idle -> Recording (user starts, device acquired)
/// - Recording -> Idle (capture error, device released)
/// - Recording -> Transcribing (user stops, device released)
/// - Transcribing -> Done (finalization delay elapsed, response emitted)
///
/// Text mode skips the device entirely:
/// - Thinking -> Idle (thinking delay elapsed)
/// - Idle -> Done (non-empty text submitted)
///
/// Cancellation moves any phase to Done without emitting a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CapturePhase {
    /// Short pause before the question is shown.
    Thinking = 0,
    /// Question visible, waiting for the candidate to act.
    Idle = 1,
    /// Actively recording a spoken answer.
    Recording = 2,
    /// Recording stopped, finalizing the transcript.
    Transcribing = 3,
    /// Response emitted (or capture cancelled); no further mutation.
    Done = 4,
}

impl CapturePhase {
    /// Check if recording can be started from this phase.
    #[must_use]
    pub fn can_start_recording(&self) -> bool {
        matches!(self, CapturePhase::Idle)
    }

    /// Check if recording can be stopped from this phase.
    #[must_use]
    pub fn can_stop_recording(&self) -> bool {
        matches!(self, CapturePhase::Recording)
    }

    /// Check if a typed answer can be submitted from this phase.
    #[must_use]
    pub fn can_submit_text(&self) -> bool {
        matches!(self, CapturePhase::Idle)
    }

    /// Check if live transcript partials may still be applied.
    #[must_use]
    pub fn accepts_partials(&self) -> bool {
        matches!(self, CapturePhase::Recording)
    }

    /// Check if the phase is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, CapturePhase::Done)
    }
}

impl From<u8> for CapturePhase {
    fn from(value: u8) -> Self {
        match value {
            0 => CapturePhase::Thinking,
            1 => CapturePhase::Idle,
            2 => CapturePhase::Recording,
            3 => CapturePhase::Transcribing,
            _ => CapturePhase::Done,
        }
    }
}

impl From<CapturePhase> for u8 {
    fn from(phase: CapturePhase) -> Self {
        phase as u8
    }
}

/// Atomic wrapper for CapturePhase for lock-free reads from timer tasks
/// and transcription callbacks.
#[derive(Debug)]
pub struct AtomicCapturePhase(AtomicU8);

impl AtomicCapturePhase {
    pub fn new(phase: CapturePhase) -> Self {
        Self(AtomicU8::new(phase.into()))
    }

    pub fn load(&self) -> CapturePhase {
        self.0.load(Ordering::Acquire).into()
    }

    pub fn store(&self, phase: CapturePhase) {
        self.0.store(phase.into(), Ordering::Release);
    }

    /// Compare and swap, returns true if successful.
    pub fn compare_exchange(&self, current: CapturePhase, new: CapturePhase) -> bool {
        self.0
            .compare_exchange(
                current.into(),
                new.into(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for AtomicCapturePhase {
    fn default() -> Self {
        Self::new(CapturePhase::Thinking)
    }
}

/// Token for an acquired capture device. Handed out by a media capture
/// backend and required for every subsequent operation on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    id: u64,
    mode: Mode,
}

impl DeviceHandle {
    pub fn new(id: u64, mode: Mode) -> Self {
        Self { id, mode }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Buffered media samples, securely zeroed on drop. Recorded answers never
/// touch disk and are cleared from memory once summarized.
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct RecordedMedia {
    /// PCM samples (16-bit mono).
    samples: Vec<i16>,
    /// Sample rate in Hz.
    sample_rate: u32,
}

impl RecordedMedia {
    /// Create an empty buffer.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    /// Create a buffer with pre-allocated capacity.
    pub fn with_capacity(sample_rate: u32, capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            sample_rate,
        }
    }

    /// Append samples to the buffer.
    pub fn push_samples(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the buffered media in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Summarize and discard the buffer (samples are zeroed on drop).
    pub fn into_summary(self) -> RecordingSummary {
        RecordingSummary {
            duration_secs: self.duration_secs(),
            sample_count: self.len(),
        }
    }
}

/// What remains of a recording after the device is released.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordingSummary {
    pub duration_secs: f32,
    pub sample_count: usize,
}

impl RecordingSummary {
    /// Summary of a recording that buffered nothing (e.g. text mode never
    /// touches a device, some backends discard media on error).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            duration_secs: 0.0,
            sample_count: 0,
        }
    }
}

/// Read-only view of an in-flight capture, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureSnapshot {
    pub phase: CapturePhase,
    pub elapsed_secs: u32,
    pub live_transcript: String,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_can_start_recording() {
        assert!(!CapturePhase::Thinking.can_start_recording());
        assert!(CapturePhase::Idle.can_start_recording());
        assert!(!CapturePhase::Recording.can_start_recording());
        assert!(!CapturePhase::Transcribing.can_start_recording());
        assert!(!CapturePhase::Done.can_start_recording());
    }

    #[test]
    fn test_phase_can_stop_recording() {
        assert!(!CapturePhase::Thinking.can_stop_recording());
        assert!(!CapturePhase::Idle.can_stop_recording());
        assert!(CapturePhase::Recording.can_stop_recording());
        assert!(!CapturePhase::Transcribing.can_stop_recording());
        assert!(!CapturePhase::Done.can_stop_recording());
    }

    #[test]
    fn test_phase_accepts_partials() {
        assert!(CapturePhase::Recording.accepts_partials());
        assert!(!CapturePhase::Transcribing.accepts_partials());
        assert!(!CapturePhase::Idle.accepts_partials());
        assert!(!CapturePhase::Done.accepts_partials());
    }

    #[test]
    fn test_phase_roundtrip() {
        for phase in [
            CapturePhase::Thinking,
            CapturePhase::Idle,
            CapturePhase::Recording,
            CapturePhase::Transcribing,
            CapturePhase::Done,
        ] {
            let value: u8 = phase.into();
            let recovered: CapturePhase = value.into();
            assert_eq!(phase, recovered);
        }
    }

    #[test]
    fn test_atomic_phase() {
        let atomic = AtomicCapturePhase::default();
        assert_eq!(atomic.load(), CapturePhase::Thinking);

        atomic.store(CapturePhase::Idle);
        assert_eq!(atomic.load(), CapturePhase::Idle);

        // Successful CAS
        assert!(atomic.compare_exchange(CapturePhase::Idle, CapturePhase::Recording));
        assert_eq!(atomic.load(), CapturePhase::Recording);

        // Failed CAS (wrong current value)
        assert!(!atomic.compare_exchange(CapturePhase::Idle, CapturePhase::Done));
        assert_eq!(atomic.load(), CapturePhase::Recording);
    }

    #[test]
    fn test_recorded_media_duration() {
        let mut media = RecordedMedia::new(16_000);
        assert!(media.is_empty());
        media.push_samples(&vec![0i16; 16_000]);
        assert!((media.duration_secs() - 1.0).abs() < 0.001);

        let summary = media.into_summary();
        assert_eq!(summary.sample_count, 16_000);
        assert!((summary.duration_secs - 1.0).abs() < 0.001);
    }
}
