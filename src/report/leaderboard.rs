use console::style;

use crate::analysis::ranking::{self, RankedEntry};
use crate::storage::records::StoredRun;

/// One printed leaderboard line.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardLine {
    pub rank: usize,
    pub name: String,
    pub gender: &'static str,
    pub voice_type: String,
    pub width_hz: f32,
    pub octaves: f32,
    pub notes: u32,
    pub score: f32,
    pub groups: String,
}

/// Rank every user's latest run and join the winners back to their rows.
pub fn build(runs: &[StoredRun], top_n: usize) -> Vec<LeaderboardLine> {
    let summaries: Vec<_> = runs.iter().map(|r| r.run.score_summary()).collect();

    ranking::rank(&summaries, top_n)
        .into_iter()
        .enumerate()
        .map(|(pos, entry): (usize, RankedEntry)| {
            let stored = &runs[entry.index];
            LeaderboardLine {
                rank: pos + 1,
                name: stored.user.full_name(),
                gender: stored.user.gender.as_str(),
                voice_type: stored.run.voice_type.clone().unwrap_or_else(|| "Unknown".into()),
                width_hz: entry.summary.frequency_range_width_hz,
                octaves: entry.summary.octave_range_width,
                notes: entry.summary.successful_note_count,
                score: entry.composite_score,
                groups: stored.run.possible_groups.join(","),
            }
        })
        .collect()
}

pub fn print(lines: &[LeaderboardLine], top_n: usize) {
    println!("{}", style(format!("=== Leaderboard: Top {top_n} ===")).bold());
    println!();

    if lines.is_empty() {
        println!("  No test results yet. Run `voxrange test --name FIRST LAST` to get on the board.");
        return;
    }

    println!(
        "  {:>4}  {:<20} {:<7} {:<14} {:>9} {:>7} {:>5} {:>6}  {}",
        "Rank", "Name", "Gender", "Voice type", "Range", "Octaves", "Notes", "Score", "Groups"
    );
    for l in lines {
        let rank = match l.rank {
            1 => style(format!("{:>4}", l.rank)).yellow().bold(),
            2 | 3 => style(format!("{:>4}", l.rank)).bold(),
            _ => style(format!("{:>4}", l.rank)),
        };
        println!(
            "  {}  {:<20} {:<7} {:<14} {:>6.1} Hz {:>7.2} {:>5} {:>6.1}  {}",
            rank,
            truncate(&l.name, 20),
            l.gender,
            l.voice_type,
            l.width_hz,
            l.octaves,
            l.notes,
            l.score,
            l.groups
        );
    }
    println!();
    println!(
        "  {}",
        style("Score = 60% range width + 30% octaves + 10% notes matched").dim()
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
