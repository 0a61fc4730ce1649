use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dsp::pitch::DetectorConfig;
use crate::dsp::synth::Waveform;
use crate::paths;

/// Application configuration, loaded from config.toml.
///
/// Every section is `#[serde(default)]`, so the file is optional and a
/// partial file only overrides the fields it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub recording: RecordingConfig,
    pub playback: PlaybackConfig,
    pub analysis: AnalysisConfig,
    pub test: TestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Rate the engine analyses at. Devices running at another rate are
    /// resampled.
    pub sample_rate: u32,
    /// Length of each sung take.
    pub capture_secs: f32,
    /// Input device name, or "default".
    pub device: String,
    /// Pause between the end of the reference tone and the start of capture,
    /// so the tone's tail does not leak into the take.
    pub lead_in_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub tone_secs: f32,
    pub waveform: Waveform,
    /// Output amplitude, 0.0-1.0.
    pub volume: f32,
}

/// Pitch detector tuning. Mirrors `DetectorConfig` minus the sample rate,
/// which comes from `[recording]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub silence_floor: f32,
    pub fundamental_min_hz: f32,
    pub fundamental_max_hz: f32,
    pub harmonic_ceiling_hz: f32,
    pub harmonic_tolerance_hz: f32,
    pub harmonic_presence: f32,
    pub peak_min_height: f32,
    pub peak_min_distance_hz: f32,
    pub peak_min_prominence: f32,
    pub candidate_min_strength: f32,
    pub fallback_min_strength: f32,
    pub harmonic_weight: f32,
    pub low_bias_weight: f32,
    pub low_bias_reference_hz: f32,
    pub harmonic_bonus: f32,
    pub refine_peak: bool,
}

/// Rules of the range test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Distance in Hz at which the match score reaches zero.
    pub margin_hz: f32,
    pub max_attempts_per_note: u32,
    /// Score (0-100) needed to confirm a note.
    pub success_threshold: f32,
    /// Mean absolute amplitude below which a take is too quiet to judge.
    pub low_volume_floor: f32,
    /// Write every take to the recordings directory as WAV.
    pub keep_audio: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            capture_secs: 2.0,
            device: "default".into(),
            lead_in_ms: 300,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tone_secs: 2.0,
            waveform: Waveform::Piano,
            volume: 0.5,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let d = DetectorConfig::default();
        Self {
            silence_floor: d.silence_floor,
            fundamental_min_hz: d.fundamental_min_hz,
            fundamental_max_hz: d.fundamental_max_hz,
            harmonic_ceiling_hz: d.harmonic_ceiling_hz,
            harmonic_tolerance_hz: d.harmonic_tolerance_hz,
            harmonic_presence: d.harmonic_presence,
            peak_min_height: d.peak_min_height,
            peak_min_distance_hz: d.peak_min_distance_hz,
            peak_min_prominence: d.peak_min_prominence,
            candidate_min_strength: d.candidate_min_strength,
            fallback_min_strength: d.fallback_min_strength,
            harmonic_weight: d.harmonic_weight,
            low_bias_weight: d.low_bias_weight,
            low_bias_reference_hz: d.low_bias_reference_hz,
            harmonic_bonus: d.harmonic_bonus,
            refine_peak: d.refine_peak,
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            margin_hz: 40.0,
            max_attempts_per_note: 2,
            success_threshold: 80.0,
            low_volume_floor: 0.01,
            keep_audio: false,
        }
    }
}

/// Bridge from the user-facing config format to the detector's parameters.
impl From<&AnalysisConfig> for DetectorConfig {
    fn from(cfg: &AnalysisConfig) -> Self {
        DetectorConfig {
            silence_floor: cfg.silence_floor,
            fundamental_min_hz: cfg.fundamental_min_hz,
            fundamental_max_hz: cfg.fundamental_max_hz,
            harmonic_ceiling_hz: cfg.harmonic_ceiling_hz,
            harmonic_tolerance_hz: cfg.harmonic_tolerance_hz,
            harmonic_presence: cfg.harmonic_presence,
            peak_min_height: cfg.peak_min_height,
            peak_min_distance_hz: cfg.peak_min_distance_hz,
            peak_min_prominence: cfg.peak_min_prominence,
            candidate_min_strength: cfg.candidate_min_strength,
            fallback_min_strength: cfg.fallback_min_strength,
            harmonic_weight: cfg.harmonic_weight,
            low_bias_weight: cfg.low_bias_weight,
            low_bias_reference_hz: cfg.low_bias_reference_hz,
            harmonic_bonus: cfg.harmonic_bonus,
            refine_peak: cfg.refine_peak,
            ..DetectorConfig::default()
        }
    }
}

impl AppConfig {
    /// Detector parameters at the configured recording rate.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            sample_rate: self.recording.sample_rate,
            ..DetectorConfig::from(&self.analysis)
        }
    }
}

/// Load the application config from $XDG_CONFIG_HOME/voxrange/config.toml.
/// If the file doesn't exist, returns defaults.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&paths::config_file())
}

fn load_config_from(path: &std::path::Path) -> Result<AppConfig> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
