use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use crate::analysis::range_test::RangeTest;
use crate::analysis::voice_type::{self, Gender};
use crate::analysis::walker::{VoiceRangeWalker, WalkerConfig};
use crate::audio::capture::{self, MicCapture, TakeArchive};
use crate::audio::playback::TonePlayer;
use crate::audio::{wav, AudioCapture, TonePlayback};
use crate::config::{self, AppConfig};
use crate::dsp::pitch::PitchDetector;
use crate::dsp::scoring::MatchScorer;
use crate::dsp::synth::Waveform;
use crate::notes::NoteCatalogue;
use crate::paths;
use crate::report::{leaderboard, results, user};
use crate::songs;
use crate::storage::records::{RunRecord, StoredRun, UserIdentity};
use crate::storage::store;
use crate::util;

/// `voxrange test`: walk down, then up, and optionally save the result.
pub fn run_test(
    voice: Gender,
    start: Option<&str>,
    waveform: Option<Waveform>,
    name: Option<&[String]>,
) -> Result<()> {
    let mut cfg = config::load_config()?;
    if let Some(w) = waveform {
        cfg.playback.waveform = w;
    }

    let identity = match name {
        Some([first, last]) => Some(UserIdentity::new(first, last, voice)),
        Some(_) => anyhow::bail!("--name takes a first and a last name"),
        None => None,
    };

    let catalogue = NoteCatalogue::standard();
    let start_note = start.unwrap_or(voice.default_start_note());
    // Fail on a bad note before touching any audio device.
    catalogue.require(start_note)?;

    let detector = PitchDetector::new(cfg.detector_config());
    let walker = VoiceRangeWalker::new(
        catalogue,
        &detector,
        MatchScorer::new(cfg.test.margin_hz),
        WalkerConfig::from_app(&cfg),
    );

    let mic = MicCapture::open(&cfg.recording)?;
    let mut player = TonePlayer::open(&cfg.playback)?;

    print_test_intro(&cfg, voice, start_note, mic.device_name());
    capture::wait_for_enter()?;
    println!();

    let test = if cfg.test.keep_audio {
        let started = chrono::Local::now().naive_local();
        let mut archive = TakeArchive::new(mic, paths::run_dir(&started));
        let test = run_walks(&walker, start_note, &mut archive, &mut player)?;
        println!(
            "  {} Kept {} takes in {}",
            style("NOTE").yellow().bold(),
            archive.saved(),
            archive.dir().display()
        );
        test
    } else {
        let mut mic = mic;
        run_walks(&walker, start_note, &mut mic, &mut player)?
    };

    let run = RunRecord::from_test(&test, voice);
    results::print_run(&run, voice);

    if let Some(identity) = identity {
        let run_id = store::save_run(&identity, &run, &test.history())
            .context("Failed to save the test result")?;
        log::debug!("saved run {run_id}");
        println!(
            "  {} Saved result for {} {}",
            style("OK").green().bold(),
            identity.first_name,
            identity.last_name
        );
    } else {
        println!(
            "  {} Not saved. Pass --name FIRST LAST to keep the result.",
            style("NOTE").yellow().bold()
        );
    }

    Ok(())
}

fn run_walks(
    walker: &VoiceRangeWalker<'_>,
    start_note: &str,
    capture: &mut dyn AudioCapture,
    playback: &mut dyn TonePlayback,
) -> Result<RangeTest> {
    RangeTest::run(
        walker,
        start_note,
        capture,
        playback,
        &mut results::ConsoleObserver,
    )
}

fn print_test_intro(cfg: &AppConfig, voice: Gender, start_note: &str, device: &str) {
    println!("{}", style("=== Vocal Range Test ===").bold());
    println!();
    println!("  Voice:      {}", voice.as_str());
    println!("  Start note: {start_note}");
    println!("  Microphone: {device}");
    println!(
        "  Each note plays for {:.1}s, then you have {:.1}s to sing it back.",
        cfg.playback.tone_secs, cfg.recording.capture_secs
    );
    println!(
        "  A note gets {} tries; the walk stops at the first note you can't match.",
        cfg.test.max_attempts_per_note
    );
    println!();
    println!("  Press {} to start.", style("Enter").bold());
}

/// `voxrange analyze`: estimate the pitch of a single WAV take.
pub fn analyze_file(path: &Path, target: Option<&str>) -> Result<()> {
    let cfg = config::load_config()?;
    let catalogue = NoteCatalogue::standard();

    // Resolve the target first so a typo fails before any decoding.
    let target_note = match target {
        Some(name) => {
            let index = catalogue.require(name)?;
            catalogue.get(index)
        }
        None => None,
    };

    let (samples, file_rate) = wav::load_mono(path)?;
    let rate = cfg.recording.sample_rate;
    let samples = util::resample_linear(&samples, file_rate, rate);
    let detector = PitchDetector::new(cfg.detector_config());
    let detected = detector.estimate_fundamental(&samples);

    println!(
        "{}",
        style(format!("=== {} ===", path.display())).bold()
    );
    println!();
    println!(
        "  Length:     {:.2}s ({file_rate} Hz)",
        samples.len() as f32 / rate as f32
    );
    println!("  Level:      {:.4} mean, {:.1} dBFS peak", util::mean_abs(&samples), util::peak_db(&samples));

    if detected <= 0.0 {
        println!("  Pitch:      {}", style("none detected").yellow());
        eprintln!(
            "  {} The take is silent or has no clear fundamental.",
            style("WARNING").red().bold()
        );
    } else {
        let nearest = catalogue
            .nearest(detected)
            .map(|n| format!("{} ({:.2} Hz)", n.name, n.frequency))
            .unwrap_or_else(|| "?".into());
        println!("  Pitch:      {}", style(format!("{detected:.1} Hz")).cyan());
        println!("  Nearest:    {nearest}");
        println!("  Range:      {}", voice_type::range_label(detected));
    }

    if let Some(note) = target_note {
        let score = MatchScorer::new(cfg.test.margin_hz).score(note.frequency, detected);
        let passed = score >= cfg.test.success_threshold;
        println!(
            "  Target:     {} ({:.2} Hz), score {:.1} {}",
            note.name,
            note.frequency,
            score,
            if passed {
                style("OK").green().bold()
            } else {
                style("MISS").yellow().bold()
            }
        );
    }
    println!();

    Ok(())
}

/// `voxrange leaderboard`
pub fn show_leaderboard(top: usize) -> Result<()> {
    let runs = store::load_summaries()?;
    let lines = leaderboard::build(&runs, top);
    leaderboard::print(&lines, top);
    Ok(())
}

/// `voxrange stats`
pub fn show_stats(first_name: &str, last_name: &str) -> Result<()> {
    let stored = latest_run(first_name, last_name)?;
    let run_count = store::count_runs(stored.user.id)?;
    user::print_stats(&stored, run_count);
    results::print_run(&stored.run, stored.user.gender);
    Ok(())
}

/// `voxrange history`
pub fn show_history(first_name: &str, last_name: &str) -> Result<()> {
    let stored = latest_run(first_name, last_name)?;
    let attempts = store::load_attempts(stored.id)?;

    println!(
        "{}",
        style(format!("=== {} ===", stored.user.full_name())).bold()
    );
    println!("  Tested {} (UTC), start note {}", stored.tested_at, stored.run.start_note);
    println!();
    results::print_history(&attempts);
    println!();
    Ok(())
}

/// `voxrange songs`
pub fn show_songs(first_name: &str, last_name: &str, limit: usize) -> Result<()> {
    let stored = latest_run(first_name, last_name)?;
    let range = &stored.run.range;

    if range.is_empty() {
        anyhow::bail!(
            "{} has no measured range yet. Take the test again with a working microphone.",
            stored.user.full_name()
        );
    }

    let recs = songs::recommend(range.min_hz, range.max_hz, limit);
    user::print_songs(
        range.min_hz,
        range.max_hz,
        stored.run.voice_type.as_deref(),
        &recs,
    );
    Ok(())
}

/// `voxrange reset`
pub fn reset(yes: bool) -> Result<()> {
    if !yes {
        eprintln!(
            "  {} This deletes every user and result in {}.",
            style("WARNING").red().bold(),
            paths::db_path().display()
        );
        anyhow::bail!("Refusing to reset without --yes");
    }

    store::reset()?;
    println!("  {} Database cleared.", style("OK").green().bold());
    Ok(())
}

/// `voxrange paths`
pub fn show_paths() {
    println!("  Config:     {}", paths::config_file().display());
    println!("  Database:   {}", paths::db_path().display());
    println!("  Recordings: {}", paths::recordings_dir().display());
}

fn latest_run(first_name: &str, last_name: &str) -> Result<StoredRun> {
    let user = store::require_user(first_name, last_name)?;
    store::load_latest_run(user.id)?
        .with_context(|| format!("No test results for {}", user.full_name()))
}
