use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Timbre of the reference tone. Purely a listening aid: analysis never
/// looks at which waveform was played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    /// Plain sine at the target frequency.
    Sine,
    /// Fundamental plus three decaying harmonics, closer to a piano.
    Piano,
    /// Fundamental plus the sub-octave, which some singers find easier to match.
    Vocal,
}

/// Fade length at each end of a tone, to avoid clicks at start/stop.
const FADE_SECS: f64 = 0.01;

/// Synthesize a reference tone with peak amplitude `amplitude`.
pub fn tone(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
    waveform: Waveform,
    amplitude: f32,
) -> Vec<f32> {
    // (harmonic multiplier, relative weight)
    let partials: &[(f64, f64)] = match waveform {
        Waveform::Sine => &[(1.0, 1.0)],
        Waveform::Piano => &[(1.0, 0.6), (2.0, 0.3), (3.0, 0.1), (4.0, 0.05)],
        Waveform::Vocal => &[(1.0, 0.5), (0.5, 0.5)],
    };
    let weight_sum: f64 = partials.iter().map(|&(_, w)| w).sum();

    let sr = sample_rate as f64;
    let num_samples = (duration_secs as f64 * sr).round() as usize;
    let fade = ((FADE_SECS * sr) as usize).min(num_samples / 2);
    let f = frequency as f64;

    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sr;
            let value: f64 = partials
                .iter()
                .map(|&(mult, weight)| weight * (2.0 * PI * f * mult * t).sin())
                .sum::<f64>()
                / weight_sum;

            let edge = i.min(num_samples - 1 - i);
            let gain = if fade > 0 && edge < fade {
                edge as f64 / fade as f64
            } else {
                1.0
            };

            (value * gain * amplitude as f64) as f32
        })
        .collect()
}

/// Unfaded full-scale sine. Ground truth for detector tests.
#[cfg(test)]
pub fn sine(frequency: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    mix(&[(frequency, 1.0)], duration_secs, sample_rate)
}

/// Sum of sinusoids given as (frequency, amplitude) pairs, unfaded.
#[cfg(test)]
pub fn mix(partials: &[(f32, f32)], duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let sr = sample_rate as f64;
    let num_samples = (duration_secs as f64 * sr).round() as usize;

    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sr;
            partials
                .iter()
                .map(|&(f, a)| a as f64 * (2.0 * PI * f as f64 * t).sin())
                .sum::<f64>() as f32
        })
        .collect()
}
