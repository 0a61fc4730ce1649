use super::peaks::{self, Peak, PeakCriteria};
use super::spectrum::{Spectrum, SpectrumView};
use super::windowing;
use crate::util;

/// Tuning constants for fundamental estimation.
///
/// The harmonic weights and band edges were tuned by ear against real singers
/// rather than derived, so they live here instead of being baked into the
/// algorithm.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub sample_rate: u32,

    /// Mean absolute amplitude below which the buffer is treated as silence.
    pub silence_floor: f32,

    /// Band searched for fundamental candidates. 80-400 Hz covers speaking
    /// and sung fundamentals for everything but extreme bass and soprano.
    pub fundamental_min_hz: f32,
    pub fundamental_max_hz: f32,

    /// Highest harmonic frequency considered when scoring a candidate.
    pub harmonic_ceiling_hz: f32,
    /// Search window around each expected harmonic.
    pub harmonic_tolerance_hz: f32,
    /// Normalized magnitude a harmonic needs to count as present.
    pub harmonic_presence: f32,

    /// Peak-picking criteria on the normalized candidate band.
    pub peak_min_height: f32,
    pub peak_min_distance_hz: f32,
    pub peak_min_prominence: f32,

    /// Peaks below this height are not scored as candidates.
    pub candidate_min_strength: f32,
    /// Height a peak needs to be the "lowest strong peak" fallback.
    pub fallback_min_strength: f32,

    pub harmonic_weight: f32,
    pub low_bias_weight: f32,
    /// Numerator of the low-frequency bias term; lower candidates get more.
    pub low_bias_reference_hz: f32,
    /// Multiplier for candidates with at least two harmonics present.
    pub harmonic_bonus: f32,

    /// Parabolic interpolation around the winning bin.
    pub refine_peak: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            silence_floor: 0.001,
            fundamental_min_hz: 80.0,
            fundamental_max_hz: 400.0,
            harmonic_ceiling_hz: 800.0,
            harmonic_tolerance_hz: 15.0,
            harmonic_presence: 0.1,
            peak_min_height: 0.05,
            peak_min_distance_hz: 5.0,
            peak_min_prominence: 0.03,
            candidate_min_strength: 0.1,
            fallback_min_strength: 0.05,
            harmonic_weight: 0.4,
            low_bias_weight: 0.3,
            low_bias_reference_hz: 80.0,
            harmonic_bonus: 1.5,
            refine_peak: true,
        }
    }
}

/// Estimates the sung fundamental of one fixed-length mono take.
///
/// Picking the loudest spectral peak is not enough for voice: the second or
/// third harmonic is frequently louder than the fundamental, which would
/// report the note an octave or a twelfth too high. Each candidate peak is
/// instead scored on its own height, on how much energy sits at its 2nd-4th
/// harmonics, and on a small bias toward lower frequencies. A real
/// fundamental collects reinforcement from its harmonics; a harmonic
/// masquerading as one usually does not.
pub struct PitchDetector {
    config: DetectorConfig,
}

impl PitchDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Estimated fundamental in Hz, or 0.0 when there is no usable pitch
    /// (silence, or nothing in the candidate band).
    pub fn estimate_fundamental(&self, samples: &[f32]) -> f32 {
        let cfg = &self.config;

        let power = util::mean_abs(samples);
        if power < cfg.silence_floor {
            log::debug!("signal power {power:.5} below floor, treating as silence");
            return 0.0;
        }

        let mut buf = samples.to_vec();
        windowing::peak_normalize(&mut buf);
        windowing::apply_hann(&mut buf);

        let spectrum = Spectrum::compute(&buf, cfg.sample_rate);
        let full = spectrum.view(0.0, cfg.harmonic_ceiling_hz + cfg.harmonic_tolerance_hz);
        let band = spectrum.view(cfg.fundamental_min_hz, cfg.fundamental_max_hz);

        if band.is_empty() {
            return 0.0;
        }

        let min_distance = (cfg.peak_min_distance_hz / band.bin_hz).round().max(1.0) as usize;
        let criteria = PeakCriteria {
            min_height: cfg.peak_min_height,
            min_distance,
            min_prominence: cfg.peak_min_prominence,
        };
        let found = peaks::find_peaks(&band.values, &criteria);

        let index = if found.is_empty() {
            match band.argmax() {
                Some(i) => i,
                None => return 0.0,
            }
        } else {
            self.choose_fundamental(&band, &full, &found)
        };

        let frequency = if cfg.refine_peak {
            band.refined_freq(index)
        } else {
            band.freq_at(index)
        };

        log::debug!(
            "fundamental {frequency:.2} Hz from {} candidate peaks (power {power:.4})",
            found.len()
        );
        frequency
    }

    /// Band index of the most plausible fundamental among the picked peaks.
    fn choose_fundamental(&self, band: &SpectrumView, full: &SpectrumView, found: &[Peak]) -> usize {
        let cfg = &self.config;

        let best = found
            .iter()
            .filter(|p| p.height >= cfg.candidate_min_strength)
            .map(|p| (p.index, self.plausibility(band.freq_at(p.index), p.height, full)))
            .fold(None, |best: Option<(usize, f32)>, (i, score)| match best {
                Some((_, s)) if s >= score => best,
                _ => Some((i, score)),
            });

        if let Some((index, _)) = best {
            return index;
        }

        // Peaks come back in ascending index order, so the first strong one
        // is the lowest.
        if let Some(p) = found.iter().find(|p| p.height >= cfg.fallback_min_strength) {
            return p.index;
        }

        found
            .iter()
            .fold(found[0], |best, p| if p.height > best.height { *p } else { best })
            .index
    }

    /// Fundamental plausibility score for a candidate at `freq` Hz.
    fn plausibility(&self, freq: f32, height: f32, full: &SpectrumView) -> f32 {
        let cfg = &self.config;

        let mut harmonic_strength = 0.0;
        let mut harmonics_present = 0;
        for multiple in 2..=4 {
            let harmonic = freq * multiple as f32;
            if harmonic > cfg.harmonic_ceiling_hz {
                break;
            }
            let strength = full.max_near(harmonic, cfg.harmonic_tolerance_hz);
            harmonic_strength += strength;
            if strength >= cfg.harmonic_presence {
                harmonics_present += 1;
            }
        }

        let low_bias = cfg.low_bias_reference_hz / freq.max(cfg.fundamental_min_hz);
        let mut score =
            height + cfg.harmonic_weight * harmonic_strength + cfg.low_bias_weight * low_bias;

        if harmonics_present >= 2 {
            score *= cfg.harmonic_bonus;
        }

        log::debug!(
            "candidate {freq:.1} Hz: height {height:.2}, harmonics {harmonic_strength:.2} \
             ({harmonics_present} present), score {score:.3}"
        );
        score
    }
}
