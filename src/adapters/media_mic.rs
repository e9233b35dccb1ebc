use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::domain::config::CaptureConfig;
use crate::domain::{DeviceHandle, DomainError, Mode, RecordedMedia, RecordingSummary};
use crate::ports::{MediaCapture, TranscriptSink};

type RingProducer = ringbuf::HeapProd<i16>;
type RingConsumer = ringbuf::HeapCons<i16>;

/// Commands sent to the audio thread.
enum MicCommand {
    Open {
        reply: oneshot::Sender<Result<(), DomainError>>,
    },
    Close {
        reply: oneshot::Sender<Result<Vec<i16>, DomainError>>,
    },
    Shutdown,
}

mod stream_setup {
    use super::*;

    pub fn default_device() -> Result<Device, DomainError> {
        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| DomainError::DeviceUnavailable {
                message: "No default input device available".to_string(),
            })
    }

    pub fn build_stream_config(device: &Device) -> Result<(StreamConfig, SampleFormat), DomainError> {
        let supported =
            device
                .default_input_config()
                .map_err(|e| DomainError::DeviceUnavailable {
                    message: format!("Failed to get default config: {}", e),
                })?;

        debug!(
            sample_rate = ?supported.sample_rate(),
            channels = supported.channels(),
            format = ?supported.sample_format(),
            "Device default config"
        );

        Ok((
            StreamConfig {
                channels: supported.channels(),
                sample_rate: supported.sample_rate(),
                buffer_size: cpal::BufferSize::Default,
            },
            supported.sample_format(),
        ))
    }

    pub fn build_stream(
        device: &Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        target_sample_rate: u32,
        mut producer: RingProducer,
        gate: Arc<AtomicBool>,
    ) -> Result<Stream, DomainError> {
        let channels = config.channels as usize;
        let device_sample_rate = config.sample_rate.0;

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if !gate.load(Ordering::Acquire) {
                        return;
                    }
                    let normalized =
                        normalize(data, channels, device_sample_rate, target_sample_rate);
                    let _ = producer.push_slice(&normalized);
                },
                move |err| {
                    error!(?err, "Input stream error");
                },
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !gate.load(Ordering::Acquire) {
                        return;
                    }
                    let i16_data: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                        .collect();
                    let normalized =
                        normalize(&i16_data, channels, device_sample_rate, target_sample_rate);
                    let _ = producer.push_slice(&normalized);
                },
                move |err| {
                    error!(?err, "Input stream error");
                },
                None,
            ),
            _ => {
                return Err(DomainError::DeviceUnavailable {
                    message: format!("Unsupported sample format: {:?}", sample_format),
                });
            }
        }
        .map_err(|e| DomainError::DeviceUnavailable {
            message: format!("Failed to build stream: {}", e),
        })?;

        Ok(stream)
    }

    /// Downmix to mono and resample to the target rate.
    fn normalize(
        data: &[i16],
        channels: usize,
        device_sample_rate: u32,
        target_sample_rate: u32,
    ) -> Vec<i16> {
        let mono: Vec<i16> = if channels > 1 {
            data.chunks(channels)
                .map(|chunk| {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    (sum / channels as i32) as i16
                })
                .collect()
        } else {
            data.to_vec()
        };

        resample(&mono, device_sample_rate, target_sample_rate)
    }

    pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
        if from_rate == to_rate || samples.is_empty() {
            return samples.to_vec();
        }

        let ratio = from_rate as f64 / to_rate as f64;
        let output_len = (samples.len() as f64 / ratio).ceil() as usize;
        let mut output = Vec::with_capacity(output_len);

        for i in 0..output_len {
            let src_pos = i as f64 * ratio;
            let src_idx = src_pos.floor() as usize;
            let frac = src_pos.fract();

            let sample = if src_idx + 1 < samples.len() {
                let s0 = samples[src_idx] as f64;
                let s1 = samples[src_idx + 1] as f64;
                (s0 + (s1 - s0) * frac) as i16
            } else if src_idx < samples.len() {
                samples[src_idx]
            } else {
                0
            };
            output.push(sample);
        }
        output
    }
}

/// Audio thread runner - the cpal Stream is not Send and lives here.
fn mic_thread_main(
    config: CaptureConfig,
    gate: Arc<AtomicBool>,
    mut cmd_rx: mpsc::Receiver<MicCommand>,
) {
    let mut stream: Option<Stream> = None;
    let mut ring_consumer: Option<RingConsumer> = None;

    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            MicCommand::Open { reply } => {
                let result = (|| -> Result<(), DomainError> {
                    let device = stream_setup::default_device()?;
                    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                    let (stream_config, sample_format) =
                        stream_setup::build_stream_config(&device)?;

                    let ring = HeapRb::<i16>::new(config.buffer_capacity());
                    let (producer, consumer) = ring.split();

                    let new_stream = stream_setup::build_stream(
                        &device,
                        &stream_config,
                        sample_format,
                        config.sample_rate,
                        producer,
                        Arc::clone(&gate),
                    )?;

                    new_stream.play().map_err(|e| DomainError::DeviceUnavailable {
                        message: format!("Failed to start stream: {}", e),
                    })?;

                    stream = Some(new_stream);
                    ring_consumer = Some(consumer);

                    info!(device = %device_name, "Microphone opened");
                    Ok(())
                })();
                let _ = reply.send(result);
            }
            MicCommand::Close { reply } => {
                // Dropping the stream stops capture and releases the device.
                stream.take();
                gate.store(false, Ordering::Release);

                let result = match ring_consumer.take() {
                    Some(mut consumer) => {
                        let available = consumer.occupied_len();
                        let mut samples = vec![0i16; available];
                        let read = consumer.pop_slice(&mut samples);
                        samples.truncate(read);
                        Ok(samples)
                    }
                    None => Err(DomainError::NotRecording),
                };
                let _ = reply.send(result);
            }
            MicCommand::Shutdown => {
                break;
            }
        }
    }
    debug!("Microphone thread shutting down");
}

/// cpal-backed microphone capture.
///
/// Audio mode only: video acquisition reports `DeviceUnavailable` since no
/// camera backend ships with this crate, and `attach_transcription`
/// reports the soft `TranscriptionUnsupported` failure. The stream is
/// opened on acquire; `start_recording` opens the buffering gate.
pub struct MicMediaCapture {
    config: CaptureConfig,
    handle: Mutex<Option<DeviceHandle>>,
    gate: Arc<AtomicBool>,
    next_id: AtomicU64,
    cmd_tx: mpsc::Sender<MicCommand>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MicMediaCapture {
    pub fn new(config: CaptureConfig) -> Result<Self, DomainError> {
        let gate = Arc::new(AtomicBool::new(false));
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let thread_config = config.clone();
        let thread_gate = Arc::clone(&gate);
        let thread_handle = thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || mic_thread_main(thread_config, thread_gate, cmd_rx))
            .map_err(|e| DomainError::DeviceUnavailable {
                message: format!("Failed to spawn microphone thread: {}", e),
            })?;

        info!(
            sample_rate = config.sample_rate,
            buffer_duration = config.buffer_duration_secs,
            "MicMediaCapture initialized"
        );

        Ok(Self {
            config,
            handle: Mutex::new(None),
            gate,
            next_id: AtomicU64::new(1),
            cmd_tx,
            thread_handle: Mutex::new(Some(thread_handle)),
        })
    }
}

impl Drop for MicMediaCapture {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(MicCommand::Shutdown);
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

#[async_trait]
impl MediaCapture for MicMediaCapture {
    async fn acquire(&self, mode: Mode) -> Result<DeviceHandle, DomainError> {
        if mode == Mode::Video {
            return Err(DomainError::DeviceUnavailable {
                message: "No camera backend is available; use audio mode".to_string(),
            });
        }
        if mode == Mode::Text {
            return Err(DomainError::DeviceUnavailable {
                message: "Text mode does not use a capture device".to_string(),
            });
        }

        if let Some(handle) = self.handle.lock().clone() {
            debug!(id = handle.id(), "Acquire while held, returning existing handle");
            return Ok(handle);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(MicCommand::Open { reply: reply_tx })
            .await
            .map_err(|_| DomainError::DeviceUnavailable {
                message: "Microphone thread not running".to_string(),
            })?;
        reply_rx.await.map_err(|_| DomainError::DeviceUnavailable {
            message: "Microphone thread did not respond".to_string(),
        })??;

        let handle = DeviceHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed), mode);
        *self.handle.lock() = Some(handle.clone());
        Ok(handle)
    }

    fn start_recording(&self, handle: &DeviceHandle) -> Result<(), DomainError> {
        if self.handle.lock().as_ref() != Some(handle) {
            return Err(DomainError::DeviceUnavailable {
                message: "unknown device handle".to_string(),
            });
        }
        if self.gate.swap(true, Ordering::AcqRel) {
            return Err(DomainError::AlreadyRecording);
        }
        info!(id = handle.id(), "Recording started");
        Ok(())
    }

    fn attach_transcription(
        &self,
        _handle: &DeviceHandle,
        _sink: TranscriptSink,
    ) -> Result<(), DomainError> {
        warn!("Live transcription requested but not supported by the microphone backend");
        Err(DomainError::TranscriptionUnsupported)
    }

    async fn stop(&self, handle: &DeviceHandle) -> Result<RecordingSummary, DomainError> {
        // Release the handle first so the device is never left held.
        {
            let mut held = self.handle.lock();
            if held.as_ref() != Some(handle) {
                return Err(DomainError::NotRecording);
            }
            *held = None;
        }
        self.gate.store(false, Ordering::Release);

        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(MicCommand::Close { reply: reply_tx })
            .await
            .map_err(|_| DomainError::DeviceUnavailable {
                message: "Microphone thread not running".to_string(),
            })?;
        let samples = reply_rx.await.map_err(|_| DomainError::DeviceUnavailable {
            message: "Microphone thread did not respond".to_string(),
        })??;

        let mut media = RecordedMedia::with_capacity(self.config.sample_rate, samples.len());
        media.push_samples(&samples);
        let summary = media.into_summary();

        info!(
            duration_secs = summary.duration_secs,
            samples = summary.sample_count,
            "Recording stopped"
        );
        Ok(summary)
    }

    fn acquired_count(&self) -> usize {
        usize::from(self.handle.lock().is_some())
    }
}
