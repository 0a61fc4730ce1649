use serde::{Deserialize, Serialize};

/// Per-user aggregate the leaderboard ranks on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub frequency_range_width_hz: f32,
    pub octave_range_width: f32,
    pub successful_note_count: u32,
}

const RANGE_WEIGHT: f32 = 0.6;
const OCTAVE_WEIGHT: f32 = 0.3;
const NOTES_WEIGHT: f32 = 0.1;

impl ScoreSummary {
    /// Weighted 0-100 score: range width counts most, then octave span, then
    /// the number of notes hit. Each component is capped at 100.
    pub fn composite_score(&self) -> f32 {
        let range = (self.frequency_range_width_hz / 5.0).min(100.0);
        let octaves = (self.octave_range_width * 25.0).min(100.0);
        let notes = (self.successful_note_count as f32 * 5.0).min(100.0);
        RANGE_WEIGHT * range + OCTAVE_WEIGHT * octaves + NOTES_WEIGHT * notes
    }
}

/// Span in octaves between two frequencies; 0 if either bound is not positive.
pub fn octave_width(min_hz: f32, max_hz: f32) -> f32 {
    if min_hz <= 0.0 || max_hz <= 0.0 {
        return 0.0;
    }
    (max_hz / min_hz).log2()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntry {
    /// Position of the summary in the input slice.
    pub index: usize,
    pub summary: ScoreSummary,
    pub composite_score: f32,
}

/// Rank summaries by composite score, highest first, and keep the top `top_n`.
///
/// The whole collection is sorted before truncation, so `rank(s, n)` is
/// always a prefix of `rank(s, s.len())`. Entries with equal scores keep
/// their input order.
pub fn rank(summaries: &[ScoreSummary], top_n: usize) -> Vec<RankedEntry> {
    let entries: Vec<RankedEntry> = summaries
        .iter()
        .enumerate()
        .map(|(index, summary)| RankedEntry {
            index,
            summary: *summary,
            composite_score: summary.composite_score(),
        })
        .collect();

    let mut ranked = merge_sort(entries);
    ranked.truncate(top_n);
    ranked
}

fn merge_sort(mut entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
    if entries.len() <= 1 {
        return entries;
    }

    let right = entries.split_off(entries.len() / 2);
    merge(merge_sort(entries), merge_sort(right))
}

/// Merge two descending runs. On a tie the left element goes first, which is
/// what keeps the sort stable.
fn merge(left: Vec<RankedEntry>, right: Vec<RankedEntry>) -> Vec<RankedEntry> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.composite_score >= r.composite_score,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        out.extend(next);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(width: f32, octaves: f32, notes: u32) -> ScoreSummary {
        ScoreSummary {
            frequency_range_width_hz: width,
            octave_range_width: octaves,
            successful_note_count: notes,
        }
    }

    #[test]
    fn composite_score_known_values() {
        // 0.6*80 + 0.3*75 + 0.1*50
        assert!((summary(400.0, 3.0, 10).composite_score() - 75.5).abs() < 1e-4);
        // 0.6*60 + 0.3*50 + 0.1*40
        assert!((summary(300.0, 2.0, 8).composite_score() - 55.0).abs() < 1e-4);
        assert_eq!(ScoreSummary::default().composite_score(), 0.0);
    }

    #[test]
    fn composite_score_components_are_capped() {
        let s = summary(10_000.0, 9.0, 99);
        assert!((s.composite_score() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn octave_width_values() {
        assert!((octave_width(110.0, 440.0) - 2.0).abs() < 1e-6);
        assert_eq!(octave_width(0.0, 440.0), 0.0);
        assert_eq!(octave_width(110.0, -1.0), 0.0);
    }

    #[test]
    fn tied_entries_stay_adjacent_in_input_order() {
        let summaries = [
            summary(400.0, 3.0, 10),
            summary(300.0, 2.0, 8),
            summary(400.0, 3.0, 10),
        ];
        let ranked = rank(&summaries, 3);
        let order: Vec<usize> = ranked.iter().map(|e| e.index).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn output_is_descending() {
        let summaries: Vec<ScoreSummary> = (0..25)
            .map(|i| summary((i * 37 % 11) as f32 * 40.0, (i % 4) as f32, (i % 7) as u32))
            .collect();
        let ranked = rank(&summaries, summaries.len());
        assert_eq!(ranked.len(), summaries.len());
        for pair in ranked.windows(2) {
            assert!(pair[0].composite_score >= pair[1].composite_score);
            if pair[0].composite_score == pair[1].composite_score {
                assert!(pair[0].index < pair[1].index);
            }
        }
    }

    #[test]
    fn top_n_is_prefix_of_full_ranking() {
        let summaries: Vec<ScoreSummary> = (0..12)
            .map(|i| summary((i % 5) as f32 * 100.0, (i % 3) as f32, i))
            .collect();
        let full = rank(&summaries, summaries.len());
        for n in 0..=summaries.len() {
            assert_eq!(rank(&summaries, n), full[..n].to_vec());
        }
    }

    #[test]
    fn top_n_larger_than_input() {
        let ranked = rank(&[summary(100.0, 1.0, 3)], 10);
        assert_eq!(ranked.len(), 1);
        assert!(rank(&[], 5).is_empty());
    }
}
