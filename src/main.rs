mod analysis;
mod audio;
mod cli;
mod commands;
mod config;
mod dsp;
mod notes;
mod paths;
mod report;
mod songs;
mod storage;
mod util;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Devices => audio::devices::list_devices(),

        Command::Test {
            voice,
            start,
            waveform,
            name,
        } => commands::run_test(voice, start.as_deref(), waveform, name.as_deref()),

        Command::Analyze { file, target } => commands::analyze_file(&file, target.as_deref()),

        Command::Leaderboard { top } => commands::show_leaderboard(top),

        Command::Stats {
            first_name,
            last_name,
        } => commands::show_stats(&first_name, &last_name),

        Command::History {
            first_name,
            last_name,
        } => commands::show_history(&first_name, &last_name),

        Command::Songs {
            first_name,
            last_name,
            limit,
        } => commands::show_songs(&first_name, &last_name, limit),

        Command::Reset { yes } => commands::reset(yes),

        Command::Paths => {
            commands::show_paths();
            Ok(())
        }
    }
}
