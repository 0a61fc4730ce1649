use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrum of one analysis buffer, non-negative frequencies only.
///
/// `magnitudes[k]` is the magnitude at `k * bin_hz`. With a 2-second take at
/// 44.1 kHz the FFT has 88200 points, so `bin_hz` is 0.5 Hz. That is fine
/// enough to separate neighbouring semitones even at C2 (65.41 vs 69.30 Hz).
pub struct Spectrum {
    pub bin_hz: f32,
    pub magnitudes: Vec<f32>,
}

impl Spectrum {
    /// Forward FFT of an already-windowed buffer.
    /// rustfft handles non power-of-two lengths, so no zero padding is needed.
    pub fn compute(samples: &[f32], sample_rate: u32) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self {
                bin_hz: 0.0,
                magnitudes: Vec::new(),
            };
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);

        let mut buf: Vec<Complex<f32>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
        fft.process(&mut buf);

        let magnitudes = buf[..=n / 2].iter().map(|c| c.norm()).collect();

        Self {
            bin_hz: sample_rate as f32 / n as f32,
            magnitudes,
        }
    }

    /// Extract the bins between `low_hz` and `high_hz` (inclusive, DC excluded)
    /// and normalize them to their own peak.
    pub fn view(&self, low_hz: f32, high_hz: f32) -> SpectrumView {
        let empty = SpectrumView {
            first_bin: 0,
            bin_hz: self.bin_hz,
            values: Vec::new(),
        };

        if self.bin_hz <= 0.0 || self.magnitudes.len() < 2 || high_hz < low_hz {
            return empty;
        }

        let first = ((low_hz / self.bin_hz).ceil() as usize).max(1);
        let last = ((high_hz / self.bin_hz).floor() as usize).min(self.magnitudes.len() - 1);
        if first > last {
            return empty;
        }

        let mut values = self.magnitudes[first..=last].to_vec();
        let peak = values.iter().copied().fold(0.0_f32, f32::max);
        if peak > 0.0 {
            for v in values.iter_mut() {
                *v /= peak;
            }
        }

        SpectrumView {
            first_bin: first,
            bin_hz: self.bin_hz,
            values,
        }
    }
}

/// A contiguous, peak-normalized slice of a spectrum.
pub struct SpectrumView {
    pub first_bin: usize,
    pub bin_hz: f32,
    pub values: Vec<f32>,
}

impl SpectrumView {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Frequency in Hz of the view's `i`-th value.
    pub fn freq_at(&self, i: usize) -> f32 {
        (self.first_bin + i) as f32 * self.bin_hz
    }

    /// Index of the strongest value, or None for an empty view.
    pub fn argmax(&self) -> Option<usize> {
        self.values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, _)| i)
    }

    /// Strongest value within `tolerance_hz` of `freq_hz`. 0.0 when the window
    /// falls entirely outside the view.
    pub fn max_near(&self, freq_hz: f32, tolerance_hz: f32) -> f32 {
        if self.is_empty() || self.bin_hz <= 0.0 {
            return 0.0;
        }

        let lo_bin = ((freq_hz - tolerance_hz) / self.bin_hz).ceil().max(0.0) as usize;
        let hi_bin = ((freq_hz + tolerance_hz) / self.bin_hz).floor().max(0.0) as usize;
        let view_last = self.first_bin + self.values.len() - 1;

        let lo = lo_bin.max(self.first_bin);
        let hi = hi_bin.min(view_last);
        if lo > hi {
            return 0.0;
        }

        self.values[lo - self.first_bin..=hi - self.first_bin]
            .iter()
            .copied()
            .fold(0.0, f32::max)
    }

    /// Sub-bin frequency of a local peak via parabolic interpolation over the
    /// peak and its two neighbours. Falls back to the bin centre at the view
    /// edges or on a flat top.
    pub fn refined_freq(&self, i: usize) -> f32 {
        if i == 0 || i + 1 >= self.values.len() {
            return self.freq_at(i);
        }

        let (a, b, c) = (self.values[i - 1], self.values[i], self.values[i + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() < 1e-12 {
            return self.freq_at(i);
        }

        let delta = (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
        (self.first_bin as f32 + i as f32 + delta) * self.bin_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::synth;

    #[test]
    fn empty_input_has_no_bins() {
        let spectrum = Spectrum::compute(&[], 44100);
        assert!(spectrum.magnitudes.is_empty());
        assert!(spectrum.view(80.0, 400.0).is_empty());
    }

    #[test]
    fn bin_resolution_matches_length() {
        let samples = vec![0.0; 88200];
        let spectrum = Spectrum::compute(&samples, 44100);
        assert!((spectrum.bin_hz - 0.5).abs() < 1e-6);
        assert_eq!(spectrum.magnitudes.len(), 44101);
    }

    #[test]
    fn view_is_normalized_and_bounded() {
        let samples = synth::sine(200.0, 1.0, 44100);
        let spectrum = Spectrum::compute(&samples, 44100);
        let view = spectrum.view(80.0, 400.0);

        assert!((view.freq_at(0) - 80.0).abs() < 1e-3);
        assert!((view.freq_at(view.values.len() - 1) - 400.0).abs() < 1e-3);

        let peak = view.argmax().unwrap();
        assert!((view.values[peak] - 1.0).abs() < 1e-6);
        assert!((view.freq_at(peak) - 200.0).abs() < 1.5);
    }

    #[test]
    fn max_near_finds_tone_and_ignores_far_bins() {
        let samples = synth::sine(300.0, 1.0, 44100);
        let spectrum = Spectrum::compute(&samples, 44100);
        let view = spectrum.view(1.0, 815.0);

        assert!(view.max_near(305.0, 15.0) > 0.9);
        assert!(view.max_near(600.0, 15.0) < 0.05);
        assert_eq!(view.max_near(2000.0, 15.0), 0.0);
    }

    #[test]
    fn refinement_lands_between_bins() {
        // 1-second take → 1 Hz bins; 220.4 Hz sits between two of them.
        let samples = synth::sine(220.4, 1.0, 44100);
        let spectrum = Spectrum::compute(&samples, 44100);
        let view = spectrum.view(80.0, 400.0);
        let peak = view.argmax().unwrap();

        let coarse = view.freq_at(peak);
        let fine = view.refined_freq(peak);
        assert!((fine - 220.4).abs() <= (coarse - 220.4).abs() + 1e-3);
        assert!((fine - 220.4).abs() < 0.5);
    }
}
