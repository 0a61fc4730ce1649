use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::analysis::voice_type::Gender;
use crate::dsp::synth::Waveform;

#[derive(Parser)]
#[command(name = "voxrange")]
#[command(about = "Measure your singing range by matching reference tones")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List available audio input and output devices
    Devices,

    /// Run a vocal range test: walk down, then up, from a start note
    Test {
        /// Voice to test; picks the default start note (male C3, female C4)
        #[arg(long, value_enum)]
        voice: Gender,

        /// Start note instead of the voice default (e.g. A2, E4)
        #[arg(long)]
        start: Option<String>,

        /// Reference tone timbre (overrides config)
        #[arg(long, value_enum)]
        waveform: Option<Waveform>,

        /// First and last name; saves the result to the leaderboard
        #[arg(long, num_args = 2, value_names = ["FIRST", "LAST"])]
        name: Option<Vec<String>>,
    },

    /// Estimate the sung pitch in a WAV file
    Analyze {
        /// Path to a mono or stereo WAV file
        file: PathBuf,

        /// Score the take against this note (e.g. C3)
        #[arg(long)]
        target: Option<String>,
    },

    /// Show the top singers by composite range score
    Leaderboard {
        /// Number of entries to show
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Show a user's latest result
    Stats {
        first_name: String,
        last_name: String,
    },

    /// Show the attempt-by-attempt history of a user's latest test
    History {
        first_name: String,
        last_name: String,
    },

    /// Recommend songs that fit a user's measured range
    Songs {
        first_name: String,
        last_name: String,

        /// Maximum number of songs
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Delete all users and results
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show where data and config files are stored
    Paths,
}
