/// Frequency ratios treated as the same pitch class: unison, one and two
/// octaves either way.
const OCTAVE_RATIOS: [f32; 5] = [1.0, 2.0, 0.5, 4.0, 0.25];

/// Credit factor for a match found an octave (or two) away from the target.
const CROSS_OCTAVE_CREDIT: f32 = 0.8;

/// Turns a (target, detected) frequency pair into a 0-100 match score.
///
/// The score falls off linearly with the absolute distance in Hz and reaches
/// zero at `margin_hz`. Singers who land on the right note in a different
/// octave still get credit, capped at 80%, so an octave slip never ranks
/// level with a true unison.
#[derive(Debug, Clone, Copy)]
pub struct MatchScorer {
    pub margin_hz: f32,
}

impl MatchScorer {
    pub fn new(margin_hz: f32) -> Self {
        Self { margin_hz }
    }

    pub fn score(&self, target_hz: f32, detected_hz: f32) -> f32 {
        score(target_hz, detected_hz, self.margin_hz)
    }
}

/// Match score in [0, 100]. A detected frequency of 0 ("no pitch") scores 0.
pub fn score(target_hz: f32, detected_hz: f32, margin_hz: f32) -> f32 {
    if detected_hz <= 0.0 || target_hz <= 0.0 || margin_hz <= 0.0 {
        return 0.0;
    }

    let best = OCTAVE_RATIOS
        .iter()
        .filter_map(|&ratio| {
            let diff = (target_hz * ratio - detected_hz).abs();
            if diff > margin_hz {
                return None;
            }
            let partial = (margin_hz - diff) / margin_hz * 100.0;
            Some(if ratio == 1.0 {
                partial
            } else {
                partial * CROSS_OCTAVE_CREDIT
            })
        })
        .fold(0.0_f32, f32::max);

    best.clamp(0.0, 100.0)
}
