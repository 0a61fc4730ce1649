use serde::{Deserialize, Serialize};

use crate::analysis::range_test::RangeTest;
use crate::analysis::ranking::ScoreSummary;
use crate::analysis::summary::RangeSummary;
use crate::analysis::voice_type::{self, Gender};
use crate::analysis::walker::{ConfirmedNote, StopReason};

/// Who took the test. Names are stored title-cased so "ada LOVELACE" and
/// "Ada Lovelace" are the same person.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
}

impl UserIdentity {
    pub fn new(first_name: &str, last_name: &str, gender: Gender) -> Self {
        Self {
            first_name: title_case(first_name),
            last_name: title_case(last_name),
            gender,
        }
    }
}

/// A user row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Everything stored about one range test except the per-attempt history,
/// which lives in its own table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub start_note: String,
    pub range: RangeSummary,
    pub voice_type: Option<String>,
    pub match_percent: f32,
    pub possible_groups: Vec<String>,
    /// Ascending, one entry per note name.
    pub confirmed: Vec<ConfirmedNote>,
    pub down_stop: StopReason,
    pub up_stop: StopReason,
}

impl RunRecord {
    pub fn from_test(test: &RangeTest, gender: Gender) -> Self {
        let confirmed = test.combined_notes();
        let range = RangeSummary::from_notes(&confirmed);
        let class = voice_type::classify(range.min_hz, range.max_hz, gender);

        Self {
            start_note: test.start_note.clone(),
            range,
            voice_type: class.best_match.map(str::to_string),
            match_percent: class.match_percent,
            possible_groups: class.possible_groups.iter().map(|g| g.to_string()).collect(),
            confirmed,
            down_stop: test.down.stop.clone(),
            up_stop: test.up.stop.clone(),
        }
    }

    pub fn score_summary(&self) -> ScoreSummary {
        self.range.score_summary()
    }
}

/// A saved run joined with its user.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRun {
    pub id: i64,
    pub user: UserRecord,
    /// SQLite `datetime('now')` text, UTC.
    pub tested_at: String,
    pub run: RunRecord,
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
