use anyhow::{Context, Result};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::TonePlayback;
use crate::config::PlaybackConfig;
use crate::dsp::synth::{self, Waveform};

/// Rate the reference tones are synthesized at. Independent of the capture
/// rate; rodio converts to whatever the output device wants.
const TONE_SAMPLE_RATE: u32 = 44100;

/// Reference-tone playback through rodio on the default output device.
pub struct TonePlayer {
    // RAII guard: dropping the stream closes the output device.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl TonePlayer {
    pub fn open(cfg: &PlaybackConfig) -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("Failed to open audio output device")?;

        Ok(Self {
            _stream: stream,
            handle,
            volume: cfg.volume.clamp(0.0, 1.0),
        })
    }
}

impl TonePlayback for TonePlayer {
    fn play(&mut self, frequency: f32, duration_secs: f32, waveform: Waveform) -> Result<()> {
        let samples = synth::tone(frequency, duration_secs, TONE_SAMPLE_RATE, waveform, self.volume);

        let sink = Sink::try_new(&self.handle).context("Failed to create audio sink")?;
        sink.append(SamplesBuffer::new(1, TONE_SAMPLE_RATE, samples));

        // Block until the tone has finished so the singer hears all of it
        // before capture starts.
        sink.sleep_until_end();
        Ok(())
    }
}
