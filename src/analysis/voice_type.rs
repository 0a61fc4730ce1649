use serde::{Deserialize, Serialize};

/// Broad range labels attached to each confirmed note. The ranges overlap,
/// so the first match in this order wins.
const RANGE_LABELS: [(&str, f32, f32); 4] = [
    ("Soprano", 261.63, 1046.50),
    ("Alto", 220.00, 698.46),
    ("Tenor", 130.81, 523.25),
    ("Bass", 82.41, 329.63),
];

pub const UNKNOWN_RANGE: &str = "Unknown";

/// Range label for a single detected frequency.
pub fn range_label(frequency: f32) -> &'static str {
    RANGE_LABELS
        .iter()
        .find(|&&(_, low, high)| (low..=high).contains(&frequency))
        .map(|&(name, _, _)| name)
        .unwrap_or(UNKNOWN_RANGE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Note the range test starts from: the middle of the typical range.
    pub fn default_start_note(self) -> &'static str {
        match self {
            Gender::Male => "C3",
            Gender::Female => "C4",
        }
    }

    /// Classical voice types for this gender, lowest first.
    pub fn voice_types(self) -> &'static [VoiceType] {
        match self {
            Gender::Male => &MALE_TYPES,
            Gender::Female => &FEMALE_TYPES,
        }
    }
}

/// A classical voice type and its typical range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceType {
    pub name: &'static str,
    pub min_hz: f32,
    pub max_hz: f32,
}

const MALE_TYPES: [VoiceType; 3] = [
    VoiceType { name: "Bass", min_hz: 82.41, max_hz: 329.63 },
    VoiceType { name: "Baritone", min_hz: 98.00, max_hz: 392.00 },
    VoiceType { name: "Tenor", min_hz: 130.81, max_hz: 523.25 },
];

const FEMALE_TYPES: [VoiceType; 3] = [
    VoiceType { name: "Contralto", min_hz: 164.81, max_hz: 659.26 },
    VoiceType { name: "Mezzo-soprano", min_hz: 196.00, max_hz: 783.99 },
    VoiceType { name: "Soprano", min_hz: 261.63, max_hz: 1046.50 },
];

/// Overlap share a voice type needs to be listed as a possible group.
const POSSIBLE_GROUP_MIN_PERCENT: f32 = 20.0;

/// How a measured range lines up with the classical voice types.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceClassification {
    /// Type with the largest overlap, if any overlap at all.
    pub best_match: Option<&'static str>,
    /// Share of the user's range covered by the best match, 0-100.
    pub match_percent: f32,
    /// Every type covering more than 20% of the user's range.
    pub possible_groups: Vec<&'static str>,
}

/// Classify a measured range against the gender's voice types.
///
/// Overlap is measured as a share of the *user's* range, so a narrow range
/// sitting entirely inside one type scores 100% for it.
pub fn classify(min_hz: f32, max_hz: f32, gender: Gender) -> VoiceClassification {
    let user_range = max_hz - min_hz;
    let mut result = VoiceClassification {
        best_match: None,
        match_percent: 0.0,
        possible_groups: Vec::new(),
    };

    if user_range <= 0.0 {
        return result;
    }

    for vt in gender.voice_types() {
        let overlap = min_hz.max(vt.min_hz)..max_hz.min(vt.max_hz);
        if overlap.end <= overlap.start {
            continue;
        }

        let percent = (overlap.end - overlap.start) / user_range * 100.0;
        if percent > POSSIBLE_GROUP_MIN_PERCENT {
            result.possible_groups.push(vt.name);
        }
        if percent > result.match_percent {
            result.match_percent = percent;
            result.best_match = Some(vt.name);
        }
    }

    result
}

/// Per-type affinity for the range-bar report: how far the user's reach
/// extends into each type's range, 0-100.
pub fn affinities(min_hz: f32, max_hz: f32, gender: Gender) -> Vec<(&'static str, f32)> {
    let types = gender.voice_types();
    let (low, mid, high) = (&types[0], &types[1], &types[2]);
    let mut out = Vec::new();

    // The lowest type is about how deep the user goes, the others about
    // how high.
    if min_hz <= mid.min_hz {
        let depth = (low.max_hz - min_hz) / (low.max_hz - low.min_hz) * 100.0;
        out.push((low.name, depth.clamp(0.0, 100.0)));
    }
    if (mid.min_hz..=mid.max_hz).contains(&max_hz) {
        let reach = (max_hz - mid.min_hz) / (mid.max_hz - mid.min_hz) * 100.0;
        out.push((mid.name, reach.clamp(0.0, 100.0)));
    }
    if max_hz >= high.min_hz {
        let reach = (max_hz - high.min_hz) / (high.max_hz - high.min_hz) * 100.0;
        out.push((high.name, reach.clamp(0.0, 100.0)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_labels_first_match_wins() {
        assert_eq!(range_label(300.0), "Soprano");
        assert_eq!(range_label(230.0), "Alto");
        assert_eq!(range_label(150.0), "Tenor");
        assert_eq!(range_label(100.0), "Bass");
        assert_eq!(range_label(60.0), UNKNOWN_RANGE);
        assert_eq!(range_label(0.0), UNKNOWN_RANGE);
    }

    #[test]
    fn gender_parse_and_defaults() {
        assert_eq!(Gender::parse("Male"), Some(Gender::Male));
        assert_eq!(Gender::parse("f"), Some(Gender::Female));
        assert_eq!(Gender::parse("other"), None);
        assert_eq!(Gender::Male.default_start_note(), "C3");
        assert_eq!(Gender::Female.default_start_note(), "C4");
    }

    #[test]
    fn baritone_range_classifies() {
        // G2-G4 exactly: Baritone covers 100% of it.
        let c = classify(98.0, 392.0, Gender::Male);
        assert_eq!(c.best_match, Some("Baritone"));
        assert!((c.match_percent - 100.0).abs() < 1e-3);
        assert_eq!(c.possible_groups, vec!["Bass", "Baritone", "Tenor"]);
    }

    #[test]
    fn high_female_range() {
        let c = classify(300.0, 1000.0, Gender::Female);
        assert_eq!(c.best_match, Some("Soprano"));
        assert!(c.possible_groups.contains(&"Mezzo-soprano"));
    }

    #[test]
    fn empty_range_has_no_match() {
        let c = classify(200.0, 200.0, Gender::Male);
        assert!(c.best_match.is_none());
        assert!(c.possible_groups.is_empty());
    }

    #[test]
    fn no_overlap_has_no_match() {
        let c = classify(20.0, 60.0, Gender::Female);
        assert!(c.best_match.is_none());
        assert_eq!(c.match_percent, 0.0);
    }

    #[test]
    fn affinities_for_low_male_voice() {
        let a = affinities(82.41, 300.0, Gender::Male);
        let bass = a.iter().find(|(n, _)| *n == "Bass").unwrap().1;
        assert!((bass - 100.0).abs() < 1e-3);
        assert!(a.iter().any(|(n, _)| *n == "Baritone"));
        assert!(a.iter().any(|(n, _)| *n == "Tenor"));
    }
}
