use console::style;

use crate::songs::{Difficulty, Recommendation};
use crate::storage::records::StoredRun;

/// Personal statistics for a user's latest run.
pub fn print_stats(stored: &StoredRun, run_count: u32) {
    println!(
        "{}",
        style(format!("=== {} ===", stored.user.full_name())).bold()
    );
    println!();
    println!("  Gender:      {}", stored.user.gender.as_str());
    println!("  Tests taken: {run_count}");
    println!("  Last test:   {} (UTC)", stored.tested_at);
    println!("  Start note:  {}", stored.run.start_note);
    println!();
}

/// Song recommendations for a measured range.
pub fn print_songs(min_hz: f32, max_hz: f32, voice_type: Option<&str>, recs: &[Recommendation]) {
    println!("{}", style("=== Recommended Songs ===").bold());
    println!();
    println!(
        "  Your range:  {:.1} - {:.1} Hz ({:.1} Hz wide)",
        min_hz,
        max_hz,
        max_hz - min_hz
    );
    println!("  Voice type:  {}", voice_type.unwrap_or("Unknown"));
    println!();

    if recs.is_empty() {
        println!("  No songs fit your measured range yet.");
        println!(
            "  {} Songs need at least {:.0}% overlap with your range.",
            style("NOTE").yellow().bold(),
            crate::songs::MIN_COVERAGE_PERCENT
        );
        return;
    }

    for (i, rec) in recs.iter().enumerate() {
        println!(
            "  {:>2}. {} - {}",
            i + 1,
            style(rec.song.title).bold(),
            rec.song.artist
        );
        println!(
            "      {} - {} ({:.1} - {:.1} Hz), {}",
            rec.min_note, rec.max_note, rec.song.min_hz, rec.song.max_hz, rec.song.genre
        );
        println!(
            "      Match {:.1}%   Difficulty {}",
            rec.coverage_percent,
            styled_difficulty(rec.difficulty)
        );
    }
    println!();
}

fn styled_difficulty(d: Difficulty) -> String {
    let s = style(d.label());
    match d {
        Difficulty::VeryEasy | Difficulty::Easy => s.green(),
        Difficulty::Medium => s.yellow(),
        Difficulty::Hard | Difficulty::VeryHard => s.red(),
    }
    .to_string()
}
