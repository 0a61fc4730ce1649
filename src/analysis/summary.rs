use serde::{Deserialize, Serialize};

use crate::analysis::ranking::{self, ScoreSummary};
use crate::analysis::walker::ConfirmedNote;

/// Measured range of one test, derived from its confirmed notes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeSummary {
    pub min_hz: f32,
    pub max_hz: f32,
    pub lowest_note: Option<String>,
    pub highest_note: Option<String>,
    pub note_count: u32,
}

impl RangeSummary {
    /// Summarise a confirmed-note list. Bounds come from the *detected*
    /// frequencies, which is what the singer actually produced.
    pub fn from_notes(notes: &[ConfirmedNote]) -> Self {
        let lowest = notes
            .iter()
            .filter(|n| n.detected_hz > 0.0)
            .min_by(|a, b| a.detected_hz.total_cmp(&b.detected_hz));
        let highest = notes
            .iter()
            .filter(|n| n.detected_hz > 0.0)
            .max_by(|a, b| a.detected_hz.total_cmp(&b.detected_hz));

        match (lowest, highest) {
            (Some(lo), Some(hi)) => Self {
                min_hz: lo.detected_hz,
                max_hz: hi.detected_hz,
                lowest_note: Some(lo.note_name.clone()),
                highest_note: Some(hi.note_name.clone()),
                note_count: notes.len() as u32,
            },
            _ => Self::default(),
        }
    }

    pub fn width_hz(&self) -> f32 {
        (self.max_hz - self.min_hz).max(0.0)
    }

    pub fn octaves(&self) -> f32 {
        ranking::octave_width(self.min_hz, self.max_hz)
    }

    pub fn is_empty(&self) -> bool {
        self.note_count == 0
    }

    pub fn score_summary(&self) -> ScoreSummary {
        ScoreSummary {
            frequency_range_width_hz: self.width_hz(),
            octave_range_width: self.octaves(),
            successful_note_count: self.note_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmed(name: &str, hz: f32) -> ConfirmedNote {
        ConfirmedNote {
            note_name: name.into(),
            target_hz: hz,
            detected_hz: hz,
            score: 95.0,
            voice_range: "Tenor".into(),
        }
    }

    #[test]
    fn two_octave_range() {
        let notes = vec![
            confirmed("A2", 110.0),
            confirmed("A3", 220.0),
            confirmed("A4", 440.0),
        ];
        let s = RangeSummary::from_notes(&notes);
        assert_eq!(s.lowest_note.as_deref(), Some("A2"));
        assert_eq!(s.highest_note.as_deref(), Some("A4"));
        assert!((s.width_hz() - 330.0).abs() < 1e-4);
        assert!((s.octaves() - 2.0).abs() < 1e-4);

        let score = s.score_summary();
        assert_eq!(score.successful_note_count, 3);
        assert!((score.frequency_range_width_hz - 330.0).abs() < 1e-4);
    }

    #[test]
    fn order_of_notes_does_not_matter() {
        let notes = vec![confirmed("E3", 164.81), confirmed("C3", 130.81)];
        let s = RangeSummary::from_notes(&notes);
        assert_eq!(s.lowest_note.as_deref(), Some("C3"));
        assert!((s.min_hz - 130.81).abs() < 1e-4);
    }

    #[test]
    fn empty_notes_give_zero_summary() {
        let s = RangeSummary::from_notes(&[]);
        assert!(s.is_empty());
        assert_eq!(s.octaves(), 0.0);
        assert_eq!(s.score_summary().composite_score(), 0.0);
    }

    #[test]
    fn single_note_has_zero_width() {
        let s = RangeSummary::from_notes(&[confirmed("C4", 261.63)]);
        assert_eq!(s.width_hz(), 0.0);
        assert_eq!(s.octaves(), 0.0);
        assert_eq!(s.note_count, 1);
    }
}
