use std::cmp::Ordering;

/// Criteria a local maximum must meet to count as a spectral peak.
#[derive(Debug, Clone, Copy)]
pub struct PeakCriteria {
    /// Minimum absolute height.
    pub min_height: f32,
    /// Minimum index separation. When two peaks are closer than this, only
    /// the taller one survives.
    pub min_distance: usize,
    /// Minimum prominence: how far the peak rises above the higher of the two
    /// valleys separating it from taller terrain on either side.
    pub min_prominence: f32,
}

/// A detected local maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub height: f32,
    pub prominence: f32,
}

/// Find peaks in a 1-D signal, returned in ascending index order.
///
/// Filtering runs in three passes, cheapest first:
///   1. local maxima at or above `min_height` (flat tops resolve to their middle)
///   2. minimum distance, keeping taller peaks first
///   3. minimum prominence
///
/// Edge samples are never peaks: without a neighbour on both sides we cannot
/// tell a peak from a slope running off the end of the band.
pub fn find_peaks(signal: &[f32], criteria: &PeakCriteria) -> Vec<Peak> {
    let candidates: Vec<usize> = local_maxima(signal)
        .into_iter()
        .filter(|&i| signal[i] >= criteria.min_height)
        .collect();

    let spaced = enforce_distance(signal, candidates, criteria.min_distance);

    let peaks: Vec<Peak> = spaced
        .into_iter()
        .map(|index| Peak {
            index,
            height: signal[index],
            prominence: prominence(signal, index),
        })
        .filter(|p| p.prominence >= criteria.min_prominence)
        .collect();

    log::debug!(
        "find_peaks: {} peaks over {} bins (height>={:.2}, distance>={}, prominence>={:.2})",
        peaks.len(),
        signal.len(),
        criteria.min_height,
        criteria.min_distance,
        criteria.min_prominence
    );

    peaks
}

/// Indices of strict local maxima. A plateau counts once, at its middle,
/// provided it drops on both sides.
fn local_maxima(signal: &[f32]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if signal.len() < 3 {
        return maxima;
    }

    let last = signal.len() - 1;
    let mut i = 1;
    while i < last {
        if signal[i] > signal[i - 1] {
            // Walk across a possible plateau
            let mut j = i;
            while j < last && signal[j + 1] == signal[i] {
                j += 1;
            }
            if j < last && signal[j + 1] < signal[i] {
                maxima.push((i + j) / 2);
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }

    maxima
}

/// Drop peaks that sit within `min_distance` of a taller peak.
fn enforce_distance(signal: &[f32], indices: Vec<usize>, min_distance: usize) -> Vec<usize> {
    if min_distance <= 1 || indices.len() < 2 {
        return indices;
    }

    let mut by_height = indices;
    by_height.sort_by(|&a, &b| {
        signal[b]
            .partial_cmp(&signal[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut kept: Vec<usize> = Vec::with_capacity(by_height.len());
    for idx in by_height {
        if kept.iter().all(|&k| idx.abs_diff(k) >= min_distance) {
            kept.push(idx);
        }
    }

    kept.sort_unstable();
    kept
}

/// Topographic prominence of the sample at `peak`.
fn prominence(signal: &[f32], peak: usize) -> f32 {
    let height = signal[peak];

    let mut left_min = height;
    for &v in signal[..peak].iter().rev() {
        if v > height {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = height;
    for &v in &signal[peak + 1..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}
