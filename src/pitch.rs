//! Pitch table — maps note names to frequencies.
//!
//! Names are a lowercase letter, an octave digit and an optional accidental
//! suffix: `a4`, `c4s` (C♯4), `e3f` (E♭3). The rest name `r` maps to 0 Hz.
//! A table is built once per render and only ever read afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name that always resolves to silence.
pub const REST: &str = "r";

/// Lowest and highest octave in the generated table.
const OCTAVES: std::ops::RangeInclusive<i32> = 0..=8;

/// Natural note letters with their semitone offset from C.
const NATURALS: [(char, i32); 7] = [
    ('c', 0),
    ('d', 2),
    ('e', 4),
    ('f', 5),
    ('g', 7),
    ('a', 9),
    ('b', 11),
];

/// An immutable pitch-name → frequency map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchTable {
    entries: BTreeMap<String, f64>,
}

/// Convert a MIDI note number to frequency using the given tuning pitch.
///
/// `tuning_pitch` is the frequency of A4 (MIDI 69).
/// Formula: `tuning_pitch * 2^((midi - 69) / 12)`
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
}

impl PitchTable {
    /// Equal-tempered table for octaves 0 through 8, A4 = `tuning_pitch`.
    pub fn equal_tempered(tuning_pitch: f64) -> Self {
        let mut entries = BTreeMap::new();
        for octave in OCTAVES {
            for (letter, offset) in NATURALS {
                let midi = (octave + 1) * 12 + offset;
                entries.insert(
                    format!("{letter}{octave}"),
                    midi_to_frequency(midi, tuning_pitch),
                );
                entries.insert(
                    format!("{letter}{octave}s"),
                    midi_to_frequency(midi + 1, tuning_pitch),
                );
                entries.insert(
                    format!("{letter}{octave}f"),
                    midi_to_frequency(midi - 1, tuning_pitch),
                );
            }
        }
        entries.insert(REST.to_string(), 0.0);
        PitchTable { entries }
    }

    /// Table containing exactly the given entries (names are lowercased).
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        PitchTable {
            entries: entries
                .into_iter()
                .map(|(name, freq)| (name.as_ref().to_ascii_lowercase(), freq))
                .collect(),
        }
    }

    /// A copy of this table with `overrides` added or replacing existing names.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, f64>) -> Self {
        for (name, freq) in overrides {
            self.entries.insert(name.to_ascii_lowercase(), *freq);
        }
        self
    }

    /// Look up a pitch name, ignoring case.
    pub fn frequency(&self, name: &str) -> Option<f64> {
        if let Some(&freq) = self.entries.get(name) {
            return Some(freq);
        }
        self.entries.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PitchTable {
    fn default() -> Self {
        PitchTable::equal_tempered(440.0)
    }
}
