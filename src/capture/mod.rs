//! Audio capture adapter.
//!
//! Captures a loopback input device into a bounded buffer for one answer
//! window. The window policy is: record at least `min`, then stop on
//! either `max` elapsed or the trailing audio staying below the silence
//! threshold for the hold period. Adapters that cannot detect silence
//! fall back to fixed-duration capture.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::CaptureConfig;
use crate::error::InterviewError;

/// Early-stop policy for ending an answer window before `max`.
#[derive(Debug, Clone, Copy)]
pub struct SilencePolicy {
    /// RMS level below which audio counts as silence.
    pub threshold: f32,
    /// How long the signal must stay silent before stopping.
    pub hold: Duration,
}

/// Bounds for one capture window.
#[derive(Debug, Clone, Copy)]
pub struct CaptureWindow {
    pub min: Duration,
    pub max: Duration,
    pub silence: Option<SilencePolicy>,
}

/// Raw captured audio for one turn.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl CapturedAudio {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Capture one answer window. Returns early with
    /// `InterviewError::Aborted` when `cancel` fires, releasing the device.
    async fn capture(
        &self,
        window: CaptureWindow,
        cancel: &CancellationToken,
    ) -> Result<CapturedAudio>;

    /// Whether this adapter honors `CaptureWindow::silence`.
    fn supports_silence_detection(&self) -> bool;
}

/// RMS over the tail of the buffer covering `hold` at `sample_rate`.
/// Returns None while the buffer is shorter than the hold window.
pub fn tail_rms(samples: &[f32], sample_rate: u32, hold: Duration) -> Option<f32> {
    let needed = (sample_rate as f64 * hold.as_secs_f64()) as usize;
    if needed == 0 || samples.len() < needed {
        return None;
    }
    let tail = &samples[samples.len() - needed..];
    let sum_sq: f64 = tail.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    Some((sum_sq / tail.len() as f64).sqrt() as f32)
}

/// Capture adapter over the system loopback device via cpal.
pub struct LoopbackCapture {
    device_name: Option<String>,
    sample_rate: u32,
}

impl LoopbackCapture {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            device_name: config.device.clone(),
            sample_rate: config.sample_rate,
        }
    }

    fn open_device(device_name: Option<&str>) -> Result<cpal::Device> {
        let host = cpal::default_host();
        match device_name {
            Some(name) => host
                .input_devices()
                .context("Failed to enumerate input devices")?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .with_context(|| format!("Input device '{}' not found", name)),
            None => host
                .default_input_device()
                .context("No input device available for answer capture"),
        }
    }
}

#[async_trait]
impl AudioCapture for LoopbackCapture {
    async fn capture(
        &self,
        window: CaptureWindow,
        cancel: &CancellationToken,
    ) -> Result<CapturedAudio> {
        let device_name = self.device_name.clone();
        let sample_rate = self.sample_rate;
        let cancel = cancel.clone();

        // cpal streams are not Send, so the whole device loop runs on a
        // blocking thread and polls the window policy at a coarse interval.
        tokio::task::spawn_blocking(move || {
            let device = Self::open_device(device_name.as_deref())?;
            info!(
                "Answer capture using device: {}",
                device.name().unwrap_or_else(|_| "unknown".to_string())
            );

            let stream_config = cpal::StreamConfig {
                channels: 1,
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let samples: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
            let samples_clone = samples.clone();
            let err_fn = |err| error!("Capture stream error: {}", err);

            let stream = device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut samples) = samples_clone.lock() {
                        samples.extend_from_slice(data);
                    }
                },
                err_fn,
                None,
            )?;

            stream.play().context("Failed to start capture stream")?;

            let started = Instant::now();
            let poll = Duration::from_millis(100);
            let stopped_early = loop {
                std::thread::sleep(poll);

                if cancel.is_cancelled() {
                    drop(stream);
                    debug!("Capture cancelled, device released");
                    return Err(InterviewError::Aborted.into());
                }

                let elapsed = started.elapsed();
                if elapsed >= window.max {
                    break false;
                }
                if elapsed >= window.min {
                    if let Some(policy) = window.silence {
                        let guard = samples.lock().unwrap();
                        if let Some(rms) = tail_rms(&guard, sample_rate, policy.hold) {
                            if rms < policy.threshold {
                                break true;
                            }
                        }
                    }
                }
            };

            drop(stream);

            let captured = {
                let mut guard = samples.lock().unwrap();
                std::mem::take(&mut *guard)
            };

            info!(
                "Answer capture finished: {} samples in {:?}{}",
                captured.len(),
                started.elapsed(),
                if stopped_early { " (silence)" } else { "" }
            );

            Ok(CapturedAudio {
                samples: captured,
                sample_rate,
            })
        })
        .await
        .context("Capture task panicked")?
    }

    fn supports_silence_detection(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_rms_short_buffer() {
        let samples = vec![0.5f32; 10];
        assert!(tail_rms(&samples, 16000, Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_tail_rms_detects_silence() {
        // 1s of speech followed by 1s of silence at 1kHz.
        let mut samples = vec![0.5f32; 1000];
        samples.extend(vec![0.0f32; 1000]);
        let rms = tail_rms(&samples, 1000, Duration::from_secs(1)).unwrap();
        assert!(rms < 0.001);
    }

    #[test]
    fn test_tail_rms_nonsilent_tail() {
        let samples = vec![0.5f32; 2000];
        let rms = tail_rms(&samples, 1000, Duration::from_secs(1)).unwrap();
        assert!((rms - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_captured_audio_duration() {
        let audio = CapturedAudio {
            samples: vec![0.0; 32000],
            sample_rate: 16000,
        };
        assert_eq!(audio.duration(), Duration::from_secs(2));
    }
}
