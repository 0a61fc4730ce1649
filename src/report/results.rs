use console::style;

use crate::analysis::walker::{Attempt, ConfirmedNote, Direction, StopReason, WalkObserver, WalkOutcome};
use crate::analysis::voice_type::Gender;
use crate::notes::NoteReference;
use crate::storage::records::RunRecord;

use super::bars;

/// Prints each attempt as the walk happens.
pub struct ConsoleObserver;

impl WalkObserver for ConsoleObserver {
    fn note_started(&mut self, note: &NoteReference, attempt_number: u32, max_attempts: u32) {
        if attempt_number == 1 {
            println!(
                "  {} {} ({:.2} Hz)",
                style("♪").cyan(),
                style(note.name).bold(),
                note.frequency
            );
        } else {
            println!(
                "    {} attempt {attempt_number}/{max_attempts}",
                style("retry").yellow()
            );
        }
    }

    fn attempt_scored(&mut self, attempt: &Attempt, low_volume: bool) {
        if low_volume {
            eprintln!(
                "    {} Too quiet to judge (level {:.4}). Sing louder or move closer to the mic.",
                style("WARNING").red().bold(),
                attempt.signal_power
            );
        } else if attempt.is_success {
            println!(
                "    {} heard {:.1} Hz, score {:.0}",
                style("OK").green().bold(),
                attempt.detected_hz,
                attempt.score
            );
        } else {
            println!(
                "    {} heard {}, score {:.0}",
                style("MISS").yellow().bold(),
                describe_detected(attempt.detected_hz),
                attempt.score
            );
        }
    }

    fn walk_finished(&mut self, outcome: &WalkOutcome) {
        let marker = if outcome.stop.is_failure() {
            style("▸").dim()
        } else {
            style("▸").green()
        };
        println!(
            "  {marker} walk {}: {}",
            outcome.direction.as_str(),
            describe_stop(&outcome.stop)
        );
        println!();
    }
}

fn describe_detected(hz: f32) -> String {
    if hz > 0.0 {
        format!("{hz:.1} Hz")
    } else {
        "no pitch".into()
    }
}

/// One-line reason a walk ended.
pub fn describe_stop(stop: &StopReason) -> String {
    match stop {
        StopReason::CatalogueExhausted => "reached the end of the note range".into(),
        StopReason::LowVolume { note } => format!("stopped at {note} (too quiet)"),
        StopReason::BelowThreshold { note } => format!("stopped at {note} (pitch not matched)"),
    }
}

/// Confirmed notes, lowest first.
pub fn print_confirmed(notes: &[ConfirmedNote]) {
    println!("{}", style("  Confirmed Notes").bold());

    if notes.is_empty() {
        println!("    No notes were matched.");
        println!();
        return;
    }

    println!(
        "    {:<5} {:>9} {:>10} {:>6}  {}",
        style("Note").dim(),
        style("Target").dim(),
        style("Detected").dim(),
        style("Score").dim(),
        style("Range").dim()
    );
    for n in notes {
        println!(
            "    {:<5} {:>6.2} Hz {:>7.2} Hz {:>6.1}  {}",
            n.note_name, n.target_hz, n.detected_hz, n.score, n.voice_range
        );
    }
    println!();
}

/// Full report for a finished (or loaded) run.
pub fn print_run(run: &RunRecord, gender: Gender) {
    print_confirmed(&run.confirmed);

    if run.range.is_empty() {
        println!(
            "  {} No range measured. Check your microphone with `voxrange devices`.",
            style("NOTE").yellow().bold()
        );
        return;
    }

    let lowest = run.range.lowest_note.as_deref().unwrap_or("?");
    let highest = run.range.highest_note.as_deref().unwrap_or("?");

    println!("{}", style("  Summary").bold());
    println!(
        "    Range:       {} - {} ({:.1} - {:.1} Hz)",
        style(lowest).cyan(),
        style(highest).cyan(),
        run.range.min_hz,
        run.range.max_hz
    );
    println!("    Width:       {:.1} Hz", run.range.width_hz());
    println!("    Octaves:     {:.2}", run.range.octaves());
    println!("    Notes:       {}", run.range.note_count);
    println!(
        "    Voice type:  {}",
        match &run.voice_type {
            Some(t) => format!("{} ({:.1}% match)", style(t).green().bold(), run.match_percent),
            None => "Unknown".into(),
        }
    );
    if !run.possible_groups.is_empty() {
        println!("    Groups:      {}", run.possible_groups.join(", "));
    }
    println!(
        "    Score:       {:.1}",
        run.score_summary().composite_score()
    );
    println!(
        "    Stopped:     down {}; up {}",
        describe_stop(&run.down_stop),
        describe_stop(&run.up_stop)
    );
    println!();

    bars::print_range_bars(run.range.min_hz, run.range.max_hz, gender);
}

/// Attempt-by-attempt history table.
pub fn print_history(history: &[Attempt]) {
    println!("{}", style("  Attempt History").bold());

    if history.is_empty() {
        println!("    No attempts recorded.");
        return;
    }

    println!(
        "    {:<5} {:>9} {:>10} {:>4} {:>6} {:>4}  {}",
        style("Note").dim(),
        style("Target").dim(),
        style("Detected").dim(),
        style("Oct").dim(),
        style("Score").dim(),
        style("Try").dim(),
        style("Dir").dim()
    );

    for a in history {
        let mark = if a.is_success {
            style("✓").green()
        } else {
            style("✗").red()
        };
        let arrow = match a.direction {
            Direction::Down => "↓",
            Direction::Up => "↑",
        };
        println!(
            "    {:<5} {:>6.2} Hz {:>10} {:>4} {:>6.1} {:>4}  {} {}",
            a.note_name,
            a.target_hz,
            describe_detected(a.detected_hz),
            octave_of(a.detected_hz),
            a.score,
            a.attempt_number,
            arrow,
            mark
        );
    }
    println!();
}

/// Octave number of the nearest catalogue note, "-" for no pitch.
fn octave_of(hz: f32) -> String {
    if hz <= 0.0 {
        return "-".into();
    }
    crate::notes::NoteCatalogue::standard()
        .nearest(hz)
        .map(|n| n.octave().to_string())
        .unwrap_or_else(|| "-".into())
}
