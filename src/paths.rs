use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// XDG-compliant directory layout for voxrange.
///
///   Config:  $XDG_CONFIG_HOME/voxrange  (~/.config/voxrange)
///   Data:    $XDG_DATA_HOME/voxrange    (~/.local/share/voxrange)
///
/// Resolved once and cached.

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Root data directory: $XDG_DATA_HOME/voxrange
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxrange")
    })
}

/// Root config directory: $XDG_CONFIG_HOME/voxrange
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxrange")
    })
}

/// Config file path: <config_dir>/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Database path: <data_dir>/voxrange.db
pub fn db_path() -> PathBuf {
    data_dir().join("voxrange.db")
}

/// Kept takes: <data_dir>/recordings
pub fn recordings_dir() -> PathBuf {
    data_dir().join("recordings")
}

/// Directory for one test's takes, named by its start time.
pub fn run_dir(started: &chrono::NaiveDateTime) -> PathBuf {
    run_dir_in(&recordings_dir(), started)
}

/// File for the `seq`-th take of a test (1-based, matching the order of the
/// attempt history): `take_001.wav`, `take_002.wav`, ...
pub fn take_path(run_dir: &Path, seq: usize) -> PathBuf {
    run_dir.join(format!("take_{seq:03}.wav"))
}

fn run_dir_in(base: &Path, started: &chrono::NaiveDateTime) -> PathBuf {
    base.join(started.format("%Y-%m-%d_%H%M%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn data_dir_ends_with_app_name() {
        assert!(data_dir().ends_with("voxrange"));
    }

    #[test]
    fn config_dir_ends_with_app_name() {
        assert!(config_dir().ends_with("voxrange"));
    }

    #[test]
    fn config_file_structure() {
        assert!(config_file().ends_with("voxrange/config.toml"));
    }

    #[test]
    fn db_lives_in_data_dir() {
        assert!(db_path().starts_with(data_dir()));
        assert!(db_path().ends_with("voxrange.db"));
    }

    #[test]
    fn run_dir_is_timestamped() {
        let started = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        let dir = run_dir_in(Path::new("/tmp/rec"), &started);
        assert_eq!(dir, PathBuf::from("/tmp/rec/2026-03-14_090507"));
    }

    #[test]
    fn take_path_structure() {
        let path = take_path(Path::new("/tmp/run"), 7);
        assert_eq!(path, PathBuf::from("/tmp/run/take_007.wav"));
    }
}
