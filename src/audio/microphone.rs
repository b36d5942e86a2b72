//! Microphone capture backend built on cpal.
//!
//! The cpal stream is not Send, so it lives on a dedicated thread for the
//! whole capture. The callback appends samples to a shared buffer; the thread
//! drains that buffer into `AudioFrame`s on a fixed cadence and forwards them
//! over the channel returned by `start`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::backend::{AudioFrame, CaptureBackend, CaptureConstraints};
use crate::error::CaptureError;

/// Cadence at which buffered samples are flushed into frames.
const FLUSH_INTERVAL_MS: u64 = 100;

pub struct MicrophoneBackend {
    constraints: CaptureConstraints,
    is_capturing: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MicrophoneBackend {
    pub fn new(constraints: CaptureConstraints) -> Self {
        Self {
            constraints,
            is_capturing: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    fn open_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(CaptureError::NoInputDevice)
    }

    fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let default = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => CaptureError::NoInputDevice,
            cpal::DefaultStreamConfigError::StreamTypeNotSupported => {
                CaptureError::Unsupported("no supported input stream type".into())
            }
            other => CaptureError::AccessDenied(other.to_string()),
        })?;

        let sample_format = default.sample_format();
        Ok((default.into(), sample_format))
    }

    /// Mix interleaved multi-channel samples down to mono.
    fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels <= 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }

    fn capture_thread(
        is_capturing: Arc<AtomicBool>,
        tx: mpsc::Sender<AudioFrame>,
        ready: oneshot::Sender<Result<(), CaptureError>>,
    ) {
        let setup = (|| {
            let device = Self::open_device()?;
            let (config, sample_format) = Self::input_config(&device)?;
            Ok::<_, CaptureError>((device, config, sample_format))
        })();

        let (device, config, sample_format) = match setup {
            Ok(parts) => parts,
            Err(e) => {
                is_capturing.store(false, Ordering::SeqCst);
                let _ = ready.send(Err(e));
                return;
            }
        };

        let sample_rate = config.sample_rate.0;
        let channels = config.channels;
        let pending: Arc<StdMutex<Vec<i16>>> = Arc::new(StdMutex::new(Vec::new()));

        let stream_result = match sample_format {
            SampleFormat::I16 => {
                let pending = Arc::clone(&pending);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = pending.lock() {
                            buf.extend_from_slice(data);
                        }
                    },
                    |err| warn!("Audio stream error: {}", err),
                    None,
                )
            }
            SampleFormat::F32 => {
                let pending = Arc::clone(&pending);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<i16> =
                            data.iter().map(|&s| (s * 32767.0) as i16).collect();
                        if let Ok(mut buf) = pending.lock() {
                            buf.extend_from_slice(&converted);
                        }
                    },
                    |err| warn!("Audio stream error: {}", err),
                    None,
                )
            }
            other => {
                is_capturing.store(false, Ordering::SeqCst);
                let _ = ready.send(Err(CaptureError::Unsupported(format!(
                    "sample format {:?}",
                    other
                ))));
                return;
            }
        };

        let stream = match stream_result {
            Ok(s) => s,
            Err(cpal::BuildStreamError::DeviceNotAvailable) => {
                is_capturing.store(false, Ordering::SeqCst);
                let _ = ready.send(Err(CaptureError::NoInputDevice));
                return;
            }
            Err(e) => {
                is_capturing.store(false, Ordering::SeqCst);
                let _ = ready.send(Err(CaptureError::AccessDenied(e.to_string())));
                return;
            }
        };

        if let Err(e) = stream.play() {
            is_capturing.store(false, Ordering::SeqCst);
            let _ = ready.send(Err(CaptureError::Backend(e.to_string())));
            return;
        }

        let _ = ready.send(Ok(()));

        let started = Instant::now();
        while is_capturing.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(FLUSH_INTERVAL_MS));

            let samples = {
                let mut buf = match pending.lock() {
                    Ok(b) => b,
                    Err(_) => break,
                };
                std::mem::take(&mut *buf)
            };

            if samples.is_empty() {
                continue;
            }

            let frame = AudioFrame {
                samples: Self::mix_to_mono(&samples, channels),
                sample_rate,
                channels: 1,
                timestamp_ms: started.elapsed().as_millis() as u64,
            };

            // A dropped receiver means the session is done with us; stop and
            // release the device.
            if tx.blocking_send(frame).is_err() {
                break;
            }
        }

        is_capturing.store(false, Ordering::SeqCst);
        drop(stream);
    }
}

#[async_trait]
impl CaptureBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.is_capturing.load(Ordering::SeqCst) {
            return Err(CaptureError::Backend("capture already running".into()));
        }

        // cpal exposes no echo-cancellation / noise-suppression / auto-gain
        // knobs; the constraints are advisory and recorded for logging only.
        debug!(
            echo_cancellation = self.constraints.echo_cancellation,
            noise_suppression = self.constraints.noise_suppression,
            auto_gain = self.constraints.auto_gain,
            "Requesting microphone (constraints advisory)"
        );

        self.is_capturing.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let is_capturing = Arc::clone(&self.is_capturing);

        self.thread = Some(std::thread::spawn(move || {
            Self::capture_thread(is_capturing, tx, ready_tx);
        }));

        match ready_rx.await {
            Ok(Ok(())) => Ok(rx),
            Ok(Err(e)) => {
                self.is_capturing.store(false, Ordering::SeqCst);
                Err(e)
            }
            Err(_) => {
                self.is_capturing.store(false, Ordering::SeqCst);
                Err(CaptureError::Backend("capture thread exited early".into()))
            }
        }
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.is_capturing.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread.take() {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}
