use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::analysis::voice_type;
use crate::audio::{AudioCapture, TonePlayback};
use crate::config::AppConfig;
use crate::dsp::pitch::PitchDetector;
use crate::dsp::scoring::MatchScorer;
use crate::dsp::synth::Waveform;
use crate::notes::{NoteCatalogue, NoteReference};
use crate::util;

/// Which way a walk moves through the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    pub fn step(self) -> isize {
        match self {
            Direction::Down => -1,
            Direction::Up => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "down" => Some(Direction::Down),
            "up" => Some(Direction::Up),
            _ => None,
        }
    }
}

/// One play-listen-score cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub note_name: String,
    pub target_hz: f32,
    /// 1-based attempt count at this note.
    pub attempt_number: u32,
    /// 0.0 when no pitch was found.
    pub detected_hz: f32,
    /// Match score in [0, 100].
    pub score: f32,
    /// Mean absolute amplitude of the take.
    pub signal_power: f32,
    pub is_success: bool,
    pub direction: Direction,
}

impl Attempt {
    /// Build an attempt record, clamping measurements into their valid ranges.
    pub fn new(
        note: &NoteReference,
        attempt_number: u32,
        detected_hz: f32,
        score: f32,
        signal_power: f32,
        is_success: bool,
        direction: Direction,
    ) -> Self {
        Self {
            note_name: note.name.to_string(),
            target_hz: note.frequency,
            attempt_number: attempt_number.max(1),
            detected_hz: detected_hz.max(0.0),
            score: score.clamp(0.0, 100.0),
            signal_power: signal_power.max(0.0),
            is_success,
            direction,
        }
    }
}

/// A note the singer matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedNote {
    pub note_name: String,
    pub target_hz: f32,
    pub detected_hz: f32,
    pub score: f32,
    /// Broad range label of the detected frequency ("Tenor", "Alto", ...).
    pub voice_range: String,
}

/// Why a walk ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StopReason {
    /// Walked off the end of the catalogue: every note in this direction
    /// was matched.
    CatalogueExhausted,
    /// Every attempt at this note was too quiet to judge.
    LowVolume { note: String },
    /// Every attempt at this note missed the success threshold.
    BelowThreshold { note: String },
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        !matches!(self, StopReason::CatalogueExhausted)
    }
}

/// Everything a walk produced, on every exit path.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub direction: Direction,
    /// Matched notes in traversal order.
    pub confirmed: Vec<ConfirmedNote>,
    /// Every attempt, including failed and too-quiet ones.
    pub history: Vec<Attempt>,
    pub stop: StopReason,
}

/// Progress hooks for whoever is driving the walk (the CLI prints from
/// these). Every method defaults to doing nothing.
pub trait WalkObserver {
    fn note_started(&mut self, _note: &NoteReference, _attempt_number: u32, _max_attempts: u32) {}
    fn attempt_scored(&mut self, _attempt: &Attempt, _low_volume: bool) {}
    fn walk_finished(&mut self, _outcome: &WalkOutcome) {}
}

/// Observer that ignores everything.
#[cfg(test)]
pub struct NoObserver;

#[cfg(test)]
impl WalkObserver for NoObserver {}

/// Rules of the walk.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Length of each captured take.
    pub capture_secs: f32,
    /// Length of each reference tone.
    pub tone_secs: f32,
    pub waveform: Waveform,
    /// Attempts allowed per note before the walk ends.
    pub max_attempts_per_note: u32,
    /// Minimum match score (0-100) that confirms a note.
    pub success_threshold: f32,
    /// Mean absolute amplitude below which a take is too quiet to judge.
    pub low_volume_floor: f32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            capture_secs: 2.0,
            tone_secs: 2.0,
            waveform: Waveform::Piano,
            max_attempts_per_note: 2,
            success_threshold: 80.0,
            low_volume_floor: 0.01,
        }
    }
}

impl WalkerConfig {
    pub fn from_app(cfg: &AppConfig) -> Self {
        Self {
            capture_secs: cfg.recording.capture_secs,
            tone_secs: cfg.playback.tone_secs,
            waveform: cfg.playback.waveform,
            max_attempts_per_note: cfg.test.max_attempts_per_note,
            success_threshold: cfg.test.success_threshold,
            low_volume_floor: cfg.test.low_volume_floor,
        }
    }
}

/// Walks outward from a start note, one catalogue step at a time, until the
/// singer can no longer match the reference tone.
///
/// State per walk: the current catalogue index, the attempt count at the
/// current note, and the growing history/confirmed lists. All of it lives on
/// the stack of `walk`, so one walker can serve any number of sequential
/// walks and no state leaks between them.
///
/// A walk only ever moves in one direction. A full range test is two walks
/// from the same start note, down then up; see `range_test`.
pub struct VoiceRangeWalker<'a> {
    catalogue: NoteCatalogue<'a>,
    detector: &'a PitchDetector,
    scorer: MatchScorer,
    config: WalkerConfig,
}

impl<'a> VoiceRangeWalker<'a> {
    pub fn new(
        catalogue: NoteCatalogue<'a>,
        detector: &'a PitchDetector,
        scorer: MatchScorer,
        config: WalkerConfig,
    ) -> Self {
        Self {
            catalogue,
            detector,
            scorer,
            config,
        }
    }

    pub fn catalogue(&self) -> NoteCatalogue<'a> {
        self.catalogue
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Run one walk from catalogue index `start`.
    ///
    /// The only errors are collaborator failures (audio device gone, etc.).
    /// Running out of attempts is a normal outcome reported in
    /// `WalkOutcome::stop`, with everything gathered so far.
    pub fn walk(
        &self,
        start: usize,
        direction: Direction,
        capture: &mut dyn AudioCapture,
        playback: &mut dyn TonePlayback,
        observer: &mut dyn WalkObserver,
    ) -> Result<WalkOutcome> {
        let cfg = &self.config;
        let max_attempts = cfg.max_attempts_per_note.max(1);
        let sample_rate = self.detector.config().sample_rate;

        let mut index = start as isize;
        let mut attempts = 0u32;
        let mut confirmed = Vec::new();
        let mut history = Vec::new();

        log::debug!(
            "walk {} from index {start} ({} notes, {max_attempts} attempts per note)",
            direction.as_str(),
            self.catalogue.len()
        );

        let stop = loop {
            let Some(note) = usize::try_from(index)
                .ok()
                .and_then(|i| self.catalogue.get(i))
            else {
                break StopReason::CatalogueExhausted;
            };

            observer.note_started(note, attempts + 1, max_attempts);

            playback.play(note.frequency, cfg.tone_secs, cfg.waveform)?;
            let take = capture.capture(cfg.capture_secs, sample_rate)?;

            let signal_power = util::mean_abs(&take);
            let detected = self.detector.estimate_fundamental(&take);
            let score = self.scorer.score(note.frequency, detected);
            drop(take);

            let low_volume = signal_power < cfg.low_volume_floor;
            let success = !low_volume && score >= cfg.success_threshold;

            let attempt = Attempt::new(
                note,
                attempts + 1,
                detected,
                score,
                signal_power,
                success,
                direction,
            );
            observer.attempt_scored(&attempt, low_volume);
            history.push(attempt);

            if low_volume {
                log::debug!(
                    "{}: take too quiet (power {signal_power:.4} < {:.4})",
                    note.name,
                    cfg.low_volume_floor
                );
                attempts += 1;
                if attempts >= max_attempts {
                    break StopReason::LowVolume {
                        note: note.name.to_string(),
                    };
                }
                continue;
            }

            if success {
                confirmed.push(ConfirmedNote {
                    note_name: note.name.to_string(),
                    target_hz: note.frequency,
                    detected_hz: detected,
                    score,
                    voice_range: voice_type::range_label(detected).to_string(),
                });
                index += direction.step();
                attempts = 0;
                continue;
            }

            attempts += 1;
            if attempts >= max_attempts {
                break StopReason::BelowThreshold {
                    note: note.name.to_string(),
                };
            }
        };

        log::debug!(
            "walk {} finished: {} confirmed, {} attempts, {:?}",
            direction.as_str(),
            confirmed.len(),
            history.len(),
            stop
        );

        let outcome = WalkOutcome {
            direction,
            confirmed,
            history,
            stop,
        };
        observer.walk_finished(&outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;
    use crate::dsp::pitch::DetectorConfig;
    use crate::dsp::synth;
    use crate::notes::CATALOGUE;

    /// Hands out pre-recorded takes, then silence.
    pub struct ScriptedCapture {
        pub takes: VecDeque<Vec<f32>>,
        pub calls: usize,
    }

    impl ScriptedCapture {
        pub fn new(takes: Vec<Vec<f32>>) -> Self {
            Self {
                takes: takes.into(),
                calls: 0,
            }
        }
    }

    impl AudioCapture for ScriptedCapture {
        fn capture(&mut self, duration_secs: f32, sample_rate: u32) -> Result<Vec<f32>> {
            self.calls += 1;
            let len = util::sample_count(duration_secs, sample_rate);
            let take = self.takes.pop_front().unwrap_or_default();
            Ok(util::fit_length(take, len))
        }
    }

    /// Remembers what was played and shares the last frequency with an
    /// `EchoSinger`.
    #[derive(Default)]
    pub struct RecordingPlayback {
        pub played: Vec<f32>,
        pub last: Rc<Cell<f32>>,
    }

    impl TonePlayback for RecordingPlayback {
        fn play(&mut self, frequency: f32, _duration_secs: f32, _waveform: Waveform) -> Result<()> {
            self.played.push(frequency);
            self.last.set(frequency);
            Ok(())
        }
    }

    /// A singer who repeats the reference tone perfectly while it lies
    /// within their reach, and stays silent otherwise.
    pub struct EchoSinger {
        pub heard: Rc<Cell<f32>>,
        pub lowest_hz: f32,
        pub highest_hz: f32,
    }

    impl AudioCapture for EchoSinger {
        fn capture(&mut self, duration_secs: f32, sample_rate: u32) -> Result<Vec<f32>> {
            let f = self.heard.get();
            if (self.lowest_hz..=self.highest_hz).contains(&f) {
                Ok(synth::sine(f, duration_secs, sample_rate)
                    .into_iter()
                    .map(|s| s * 0.5)
                    .collect())
            } else {
                Ok(vec![0.0; util::sample_count(duration_secs, sample_rate)])
            }
        }
    }

    fn detector() -> PitchDetector {
        PitchDetector::new(DetectorConfig::default())
    }

    fn walker<'a>(notes: &'a [NoteReference], detector: &'a PitchDetector) -> VoiceRangeWalker<'a> {
        VoiceRangeWalker::new(
            NoteCatalogue::new(notes),
            detector,
            MatchScorer::new(40.0),
            WalkerConfig::default(),
        )
    }

    fn take(freq: f32) -> Vec<f32> {
        synth::sine(freq, 2.0, 44100)
            .into_iter()
            .map(|s| s * 0.5)
            .collect()
    }

    fn assert_monotonic(outcome: &WalkOutcome, catalogue: NoteCatalogue<'_>) {
        let indices: Vec<usize> = outcome
            .confirmed
            .iter()
            .map(|c| catalogue.position(&c.note_name).unwrap())
            .collect();
        for pair in indices.windows(2) {
            match outcome.direction {
                Direction::Down => assert!(pair[1] < pair[0], "not descending: {indices:?}"),
                Direction::Up => assert!(pair[1] > pair[0], "not ascending: {indices:?}"),
            }
        }
        assert!(outcome.history.len() >= outcome.confirmed.len());
    }

    #[test]
    fn perfect_takes_then_silence_stops_on_low_volume() {
        let d = detector();
        let w = walker(&CATALOGUE, &d);
        let start = w.catalogue().position("C3").unwrap();

        let mut capture = ScriptedCapture::new(vec![take(130.81), take(123.47)]);
        let mut playback = RecordingPlayback::default();
        let outcome = w
            .walk(start, Direction::Down, &mut capture, &mut playback, &mut NoObserver)
            .unwrap();

        assert_eq!(outcome.confirmed.len(), 2);
        assert_eq!(outcome.confirmed[0].note_name, "C3");
        assert!((outcome.confirmed[0].detected_hz - 130.81).abs() < 1.0);
        assert!(outcome.confirmed[0].score > 95.0);
        assert_eq!(outcome.confirmed[1].note_name, "B2");

        // Two silent attempts at A2 end the walk.
        assert_eq!(outcome.history.len(), 4);
        assert_eq!(
            outcome.stop,
            StopReason::LowVolume {
                note: "A2".into()
            }
        );
        assert!(outcome.history[2..].iter().all(|a| !a.is_success && a.note_name == "A2"));
        assert_eq!(outcome.history[3].attempt_number, 2);
        assert_eq!(playback.played, vec![130.81, 123.47, 110.0, 110.0]);
        assert_monotonic(&outcome, w.catalogue());
    }

    #[test]
    fn echo_singer_walks_down_to_their_floor() {
        let d = detector();
        let w = walker(&CATALOGUE, &d);
        let start = w.catalogue().position("C3").unwrap();

        let mut playback = RecordingPlayback::default();
        let mut singer = EchoSinger {
            heard: Rc::clone(&playback.last),
            lowest_hz: 100.0,
            highest_hz: 400.0,
        };
        let outcome = w
            .walk(start, Direction::Down, &mut singer, &mut playback, &mut NoObserver)
            .unwrap();

        let names: Vec<&str> = outcome.confirmed.iter().map(|c| c.note_name.as_str()).collect();
        assert_eq!(names, vec!["C3", "B2", "A2"]);
        for c in &outcome.confirmed {
            assert!((c.detected_hz - c.target_hz).abs() < 1.0);
            assert!(c.score > 95.0);
        }
        // 3 confirmed + 2 exhausted attempts at G2
        assert_eq!(outcome.history.len(), 5);
        assert_eq!(outcome.stop, StopReason::LowVolume { note: "G2".into() });
        assert_monotonic(&outcome, w.catalogue());
    }

    #[test]
    fn wrong_pitch_stops_below_threshold() {
        let d = detector();
        let w = walker(&CATALOGUE, &d);
        let start = w.catalogue().position("C4").unwrap();

        // 330 Hz against C4 (261.63): no octave ratio within 40 Hz.
        let mut capture = ScriptedCapture::new(vec![take(330.0), take(330.0)]);
        let mut playback = RecordingPlayback::default();
        let outcome = w
            .walk(start, Direction::Up, &mut capture, &mut playback, &mut NoObserver)
            .unwrap();

        assert!(outcome.confirmed.is_empty());
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(outcome.stop, StopReason::BelowThreshold { note: "C4".into() });
        assert!(outcome.history.iter().all(|a| a.score < 80.0 && a.signal_power > 0.01));
    }

    #[test]
    fn retry_succeeds_on_second_attempt() {
        let d = detector();
        let w = walker(&CATALOGUE, &d);
        let start = w.catalogue().position("G3").unwrap();

        let mut capture = ScriptedCapture::new(vec![vec![], take(196.0), take(330.0), take(330.0)]);
        let mut playback = RecordingPlayback::default();
        let outcome = w
            .walk(start, Direction::Up, &mut capture, &mut playback, &mut NoObserver)
            .unwrap();

        assert_eq!(outcome.confirmed.len(), 1);
        assert_eq!(outcome.confirmed[0].note_name, "G3");
        assert_eq!(outcome.history[0].attempt_number, 1);
        assert!(!outcome.history[0].is_success);
        assert_eq!(outcome.history[1].attempt_number, 2);
        assert!(outcome.history[1].is_success);
        // Attempt counter resets at the next note.
        assert_eq!(outcome.history[2].note_name, "A3");
        assert_eq!(outcome.history[2].attempt_number, 1);
        assert_eq!(outcome.stop, StopReason::BelowThreshold { note: "A3".into() });
    }

    #[test]
    fn octave_slip_still_confirms() {
        let d = detector();
        let mut w = walker(&CATALOGUE, &d);
        w.config.success_threshold = 75.0;
        let start = w.catalogue().position("A2").unwrap();

        // Singer answers A2 (110 Hz) with A3 and gets the 80% octave credit.
        let mut capture = ScriptedCapture::new(vec![take(220.0)]);
        let mut playback = RecordingPlayback::default();
        let outcome = w
            .walk(start, Direction::Down, &mut capture, &mut playback, &mut NoObserver)
            .unwrap();

        assert_eq!(outcome.confirmed.len(), 1);
        assert!(outcome.confirmed[0].score > 78.0 && outcome.confirmed[0].score <= 80.0);
        assert!((outcome.confirmed[0].detected_hz - 220.0).abs() < 1.0);
    }

    #[test]
    fn running_off_the_catalogue_is_success() {
        let notes = [CATALOGUE[9], CATALOGUE[10], CATALOGUE[11]]; // E3 F3 G3
        let d = detector();
        let w = walker(&notes, &d);

        let mut playback = RecordingPlayback::default();
        let mut singer = EchoSinger {
            heard: Rc::clone(&playback.last),
            lowest_hz: 80.0,
            highest_hz: 400.0,
        };
        let outcome = w
            .walk(0, Direction::Up, &mut singer, &mut playback, &mut NoObserver)
            .unwrap();

        assert_eq!(outcome.stop, StopReason::CatalogueExhausted);
        assert!(!outcome.stop.is_failure());
        assert_eq!(outcome.confirmed.len(), 3);
        assert_eq!(outcome.history.len(), 3);
        assert_eq!(outcome.confirmed[2].voice_range, "Tenor");
    }

    #[test]
    fn start_outside_catalogue_does_nothing() {
        let d = detector();
        let w = walker(&CATALOGUE, &d);
        let mut capture = ScriptedCapture::new(vec![]);
        let mut playback = RecordingPlayback::default();
        let outcome = w
            .walk(CATALOGUE.len(), Direction::Up, &mut capture, &mut playback, &mut NoObserver)
            .unwrap();

        assert_eq!(outcome.stop, StopReason::CatalogueExhausted);
        assert!(outcome.history.is_empty());
        assert_eq!(capture.calls, 0);
    }

    #[test]
    fn attempts_bounded_by_catalogue_times_budget() {
        // Worst case: every note needs its last attempt. A miss-then-match
        // script over the whole mini catalogue hits the bound exactly.
        // 300 Hz is more than 40 Hz from G3, A3 and B3 and their octaves.
        let notes = [CATALOGUE[11], CATALOGUE[12], CATALOGUE[13]]; // G3 A3 B3
        let d = detector();
        let w = walker(&notes, &d);

        let script = notes
            .iter()
            .flat_map(|n| [take(300.0), take(n.frequency)])
            .collect();
        let mut capture = ScriptedCapture::new(script);
        let mut playback = RecordingPlayback::default();
        let outcome = w
            .walk(0, Direction::Up, &mut capture, &mut playback, &mut NoObserver)
            .unwrap();

        let bound = w.config().max_attempts_per_note as usize * notes.len();
        assert_eq!(outcome.history.len(), bound);
        assert_eq!(outcome.confirmed.len(), 3);
        assert_eq!(outcome.stop, StopReason::CatalogueExhausted);
    }

    #[test]
    fn zero_attempt_budget_still_tries_once() {
        let d = detector();
        let mut w = walker(&CATALOGUE, &d);
        w.config.max_attempts_per_note = 0;

        let mut capture = ScriptedCapture::new(vec![]);
        let mut playback = RecordingPlayback::default();
        let outcome = w
            .walk(7, Direction::Down, &mut capture, &mut playback, &mut NoObserver)
            .unwrap();
        assert_eq!(outcome.history.len(), 1);
    }

    #[test]
    fn observer_sees_every_attempt() {
        #[derive(Default)]
        struct Counting {
            started: usize,
            scored: usize,
            low: usize,
            finished: bool,
        }
        impl WalkObserver for Counting {
            fn note_started(&mut self, _: &NoteReference, _: u32, _: u32) {
                self.started += 1;
            }
            fn attempt_scored(&mut self, _: &Attempt, low_volume: bool) {
                self.scored += 1;
                if low_volume {
                    self.low += 1;
                }
            }
            fn walk_finished(&mut self, _: &WalkOutcome) {
                self.finished = true;
            }
        }

        let d = detector();
        let w = walker(&CATALOGUE, &d);
        let mut capture = ScriptedCapture::new(vec![take(130.81)]);
        let mut playback = RecordingPlayback::default();
        let mut observer = Counting::default();
        let outcome = w
            .walk(7, Direction::Down, &mut capture, &mut playback, &mut observer)
            .unwrap();

        assert_eq!(observer.started, outcome.history.len());
        assert_eq!(observer.scored, outcome.history.len());
        assert_eq!(observer.low, 2);
        assert!(observer.finished);
    }

    #[test]
    fn attempt_constructor_clamps() {
        let a = Attempt::new(&CATALOGUE[0], 0, -3.0, 140.0, -1.0, false, Direction::Up);
        assert_eq!(a.attempt_number, 1);
        assert_eq!(a.detected_hz, 0.0);
        assert_eq!(a.score, 100.0);
        assert_eq!(a.signal_power, 0.0);
    }

    #[test]
    fn direction_roundtrip() {
        for d in [Direction::Down, Direction::Up] {
            assert_eq!(Direction::parse(d.as_str()), Some(d));
        }
        assert_eq!(Direction::Down.step(), -1);
    }
}
