use crate::notes::NoteCatalogue;

/// A song and the span of its melody line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Song {
    pub title: &'static str,
    pub artist: &'static str,
    pub min_hz: f32,
    pub max_hz: f32,
    pub genre: &'static str,
}

const fn song(
    title: &'static str,
    artist: &'static str,
    min_hz: f32,
    max_hz: f32,
    genre: &'static str,
) -> Song {
    Song {
        title,
        artist,
        min_hz,
        max_hz,
        genre,
    }
}

pub const SONGS: [Song; 15] = [
    song("Hallelujah", "Leonard Cohen", 98.0, 330.0, "Folk"),
    song("The Sound of Silence", "Simon & Garfunkel", 110.0, 350.0, "Folk"),
    song("Yesterday", "The Beatles", 123.47, 369.99, "Pop"),
    song("Mad World", "Gary Jules", 98.0, 293.66, "Alternative"),
    song("Imagine", "John Lennon", 130.81, 493.88, "Pop"),
    song("Let It Be", "The Beatles", 146.83, 523.25, "Pop"),
    song("Wonderwall", "Oasis", 164.81, 587.33, "Rock"),
    song("Someone Like You", "Adele", 196.0, 523.25, "Pop"),
    song("Hello", "Adele", 174.61, 587.33, "Pop"),
    song("Tears in Heaven", "Eric Clapton", 220.0, 440.0, "Ballad"),
    song("I Will Always Love You", "Whitney Houston", 261.63, 1046.50, "R&B"),
    song("My Heart Will Go On", "Celine Dion", 293.66, 880.0, "Pop"),
    song("Amazing Grace", "Traditional", 261.63, 698.46, "Spiritual"),
    song("Happy Birthday", "Traditional", 130.81, 523.25, "Traditional"),
    song("Auld Lang Syne", "Traditional", 146.83, 440.0, "Traditional"),
];

/// Songs need at least this much coverage to be recommended.
pub const MIN_COVERAGE_PERCENT: f32 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    /// Judge a song by how much of the user's range its melody spans.
    pub fn for_span(song_span_hz: f32, user_span_hz: f32) -> Self {
        let ratio = |r: f32| song_span_hz <= user_span_hz * r;
        if ratio(0.5) {
            Difficulty::VeryEasy
        } else if ratio(0.7) {
            Difficulty::Easy
        } else if ratio(0.9) {
            Difficulty::Medium
        } else if ratio(1.1) {
            Difficulty::Hard
        } else {
            Difficulty::VeryHard
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::VeryEasy => "Very Easy",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::VeryHard => "Very Hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub song: Song,
    /// Share of the user's range the song overlaps, 0-100.
    pub coverage_percent: f32,
    pub difficulty: Difficulty,
    pub min_note: &'static str,
    pub max_note: &'static str,
}

/// Overlap between song and user ranges as a share of the user's range.
pub fn coverage(song: &Song, user_min_hz: f32, user_max_hz: f32) -> f32 {
    let user_span = user_max_hz - user_min_hz;
    if user_span <= 0.0 {
        return 0.0;
    }
    let overlap = (song.max_hz.min(user_max_hz) - song.min_hz.max(user_min_hz)).max(0.0);
    overlap / user_span * 100.0
}

/// Songs that fit a measured range, best coverage first (ties keep table
/// order), at most `limit` of them.
pub fn recommend(user_min_hz: f32, user_max_hz: f32, limit: usize) -> Vec<Recommendation> {
    let catalogue = NoteCatalogue::standard();
    let user_span = user_max_hz - user_min_hz;
    let nearest = |hz: f32| catalogue.nearest(hz).map(|n| n.name).unwrap_or("?");

    let mut picks: Vec<Recommendation> = SONGS
        .iter()
        .filter_map(|song| {
            let coverage_percent = coverage(song, user_min_hz, user_max_hz);
            (coverage_percent >= MIN_COVERAGE_PERCENT).then(|| Recommendation {
                song: *song,
                coverage_percent,
                difficulty: Difficulty::for_span(song.max_hz - song.min_hz, user_span),
                min_note: nearest(song.min_hz),
                max_note: nearest(song.max_hz),
            })
        })
        .collect();

    picks.sort_by(|a, b| b.coverage_percent.total_cmp(&a.coverage_percent));
    picks.truncate(limit);
    picks
}
