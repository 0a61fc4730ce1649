pub mod capture;
pub mod devices;
pub mod playback;
pub mod wav;

use anyhow::Result;

use crate::dsp::synth::Waveform;

/// Blocking microphone capture.
///
/// Implementations return exactly `duration_secs * sample_rate` mono samples
/// in [-1.0, 1.0], padding or trimming whatever the device produced.
pub trait AudioCapture {
    fn capture(&mut self, duration_secs: f32, sample_rate: u32) -> Result<Vec<f32>>;
}

/// Blocking reference-tone playback: returns once the tone has finished.
pub trait TonePlayback {
    fn play(&mut self, frequency: f32, duration_secs: f32, waveform: Waveform) -> Result<()>;
}
