use anyhow::Result;

/// A named reference pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteReference {
    pub name: &'static str,
    pub frequency: f32,
}

impl NoteReference {
    /// Octave number from scientific pitch notation ("C4" → 4).
    pub fn octave(&self) -> i32 {
        octave_of(self.name).unwrap_or(0)
    }
}

/// Natural notes from C2 to C6, ascending. The walker indexes into this and
/// never modifies it.
pub const CATALOGUE: [NoteReference; 29] = [
    note("C2", 65.41),
    note("D2", 73.42),
    note("E2", 82.41),
    note("F2", 87.31),
    note("G2", 98.00),
    note("A2", 110.00),
    note("B2", 123.47),
    note("C3", 130.81),
    note("D3", 146.83),
    note("E3", 164.81),
    note("F3", 174.61),
    note("G3", 196.00),
    note("A3", 220.00),
    note("B3", 246.94),
    note("C4", 261.63),
    note("D4", 293.66),
    note("E4", 329.63),
    note("F4", 349.23),
    note("G4", 392.00),
    note("A4", 440.00),
    note("B4", 493.88),
    note("C5", 523.25),
    note("D5", 587.33),
    note("E5", 659.25),
    note("F5", 698.46),
    note("G5", 783.99),
    note("A5", 880.00),
    note("B5", 987.77),
    note("C6", 1046.50),
];

const fn note(name: &'static str, frequency: f32) -> NoteReference {
    NoteReference { name, frequency }
}

/// An ordered, read-only view over a note list.
///
/// Walker tests run against short custom catalogues; production code uses
/// `NoteCatalogue::standard()`.
#[derive(Debug, Clone, Copy)]
pub struct NoteCatalogue<'a> {
    notes: &'a [NoteReference],
}

impl<'a> NoteCatalogue<'a> {
    pub fn new(notes: &'a [NoteReference]) -> Self {
        Self { notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn get(&self, index: usize) -> Option<&'a NoteReference> {
        self.notes.get(index)
    }

    /// Catalogue index of a note name, case-insensitive.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.notes
            .iter()
            .position(|n| n.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Like `position`, but an unknown name is a user error.
    pub fn require(&self, name: &str) -> Result<usize> {
        match self.position(name) {
            Some(i) => Ok(i),
            None => anyhow::bail!(
                "Unknown note '{name}'. Valid notes: {}",
                self.notes
                    .iter()
                    .map(|n| n.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// The catalogue note closest in Hz to `frequency`.
    pub fn nearest(&self, frequency: f32) -> Option<&'a NoteReference> {
        self.notes.iter().min_by(|a, b| {
            (a.frequency - frequency)
                .abs()
                .total_cmp(&(b.frequency - frequency).abs())
        })
    }
}

impl NoteCatalogue<'static> {
    pub fn standard() -> Self {
        Self::new(&CATALOGUE)
    }
}

/// Octave digits following the letter in a note name.
fn octave_of(name: &str) -> Option<i32> {
    name.trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '#')
        .parse()
        .ok()
}
