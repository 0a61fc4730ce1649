use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use indicatif::{ProgressBar, ProgressStyle};

use super::{wav, AudioCapture};
use crate::config::RecordingConfig;
use crate::paths;
use crate::util;

/// Extra wall-clock time allowed past the capture duration before giving up
/// on a device that delivers samples slowly.
const CAPTURE_GRACE: Duration = Duration::from_millis(500);

/// Microphone capture through cpal.
///
/// Each call opens a fresh input stream, collects mono samples for the
/// requested duration, and closes it again. Devices that run at a different
/// rate than the engine are resampled, and the result is padded or trimmed
/// to exactly the requested length.
pub struct MicCapture {
    device: cpal::Device,
    device_name: String,
    lead_in: Duration,
    show_progress: bool,
}

impl MicCapture {
    /// Open the configured input device ("default" means the host default).
    pub fn open(cfg: &RecordingConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = if cfg.device.is_empty() || cfg.device == "default" {
            host.default_input_device()
                .context("No default input device found")?
        } else {
            host.input_devices()
                .context("Failed to enumerate input devices")?
                .find(|d| d.name().is_ok_and(|n| n == cfg.device))
                .with_context(|| {
                    format!(
                        "Input device '{}' not found. Run `voxrange devices` to list inputs.",
                        cfg.device
                    )
                })?
        };

        let device_name = device.name().unwrap_or_else(|_| "<unknown>".into());
        log::debug!("capturing from '{device_name}'");

        Ok(Self {
            device,
            device_name,
            lead_in: Duration::from_millis(cfg.lead_in_ms),
            show_progress: true,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Capture at the device's native rate. Returns (mono samples, rate).
    fn record_native(&self, duration: Duration) -> Result<(Vec<f32>, u32)> {
        let config = self
            .device
            .default_input_config()
            .context("Failed to get default input config")?;

        let native_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let format = config.sample_format();
        let wanted = util::sample_count(duration.as_secs_f32(), native_rate);

        let (tx, rx) = mpsc::channel::<Vec<f32>>();

        // The callback runs on cpal's audio thread; it only downmixes and
        // forwards chunks.
        let stream = match format {
            SampleFormat::F32 => self.device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mono: Vec<f32> = data.iter().step_by(channels).copied().collect();
                    let _ = tx.send(mono);
                },
                |err| log::error!("input stream error: {err}"),
                None,
            )?,
            SampleFormat::I16 => self.device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mono: Vec<f32> = data
                        .iter()
                        .step_by(channels)
                        .map(|&s| s as f32 / i16::MAX as f32)
                        .collect();
                    let _ = tx.send(mono);
                },
                |err| log::error!("input stream error: {err}"),
                None,
            )?,
            other => anyhow::bail!("Unsupported sample format: {other:?}"),
        };

        stream.play().context("Failed to start audio stream")?;

        let pb = if self.show_progress {
            let pb = ProgressBar::new(duration.as_millis() as u64 / 100);
            pb.set_style(
                ProgressStyle::with_template("  Listening {bar:30.green/dim} {elapsed_precise}")
                    .context("Invalid progress bar template")?,
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let tick = Duration::from_millis(50);
        let start = Instant::now();
        let deadline = duration + CAPTURE_GRACE;
        let mut samples = Vec::with_capacity(wanted);

        while samples.len() < wanted && start.elapsed() < deadline {
            while let Ok(chunk) = rx.try_recv() {
                samples.extend(chunk);
            }
            std::thread::sleep(tick);
            pb.set_position((start.elapsed().as_millis() / 100) as u64);
        }

        drop(stream);
        while let Ok(chunk) = rx.try_recv() {
            samples.extend(chunk);
        }
        pb.finish_and_clear();

        if samples.len() < wanted {
            log::warn!(
                "device delivered {} of {wanted} samples; padding with silence",
                samples.len()
            );
        }

        Ok((samples, native_rate))
    }
}

impl AudioCapture for MicCapture {
    fn capture(&mut self, duration_secs: f32, sample_rate: u32) -> Result<Vec<f32>> {
        if !self.lead_in.is_zero() {
            std::thread::sleep(self.lead_in);
        }

        let duration = Duration::from_secs_f32(duration_secs.max(0.0));
        let (native, native_rate) = self
            .record_native(duration)
            .with_context(|| format!("Capture from '{}' failed", self.device_name))?;

        let resampled = util::resample_linear(&native, native_rate, sample_rate);
        Ok(util::fit_length(
            resampled,
            util::sample_count(duration_secs, sample_rate),
        ))
    }
}

/// Wraps another capture and writes every take to `dir` as it passes
/// through (`take_001.wav`, `take_002.wav`, ...).
pub struct TakeArchive<C> {
    inner: C,
    dir: PathBuf,
    saved: usize,
}

impl<C: AudioCapture> TakeArchive<C> {
    pub fn new(inner: C, dir: PathBuf) -> Self {
        Self {
            inner,
            dir,
            saved: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn saved(&self) -> usize {
        self.saved
    }
}

impl<C: AudioCapture> AudioCapture for TakeArchive<C> {
    fn capture(&mut self, duration_secs: f32, sample_rate: u32) -> Result<Vec<f32>> {
        let take = self.inner.capture(duration_secs, sample_rate)?;
        let path = paths::take_path(&self.dir, self.saved + 1);
        wav::save_samples(&path, &take, sample_rate)?;
        self.saved += 1;
        Ok(take)
    }
}

/// Block until the user presses Enter, using crossterm raw mode.
pub fn wait_for_enter() -> Result<()> {
    crossterm::terminal::enable_raw_mode()?;

    let result = loop {
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key))
                    if key.kind == KeyEventKind::Press && key.code == KeyCode::Enter =>
                {
                    break Ok(());
                }
                Ok(_) => {}
                Err(e) => break Err(e),
            },
            Ok(false) => {}
            Err(e) => break Err(e),
        }
    };

    crossterm::terminal::disable_raw_mode()?;
    result.context("Failed to read keyboard input")
}
