//! Score description types.
//!
//! These are plain value descriptions built by the caller (directly or from
//! JSON). Rendering reads them and never mutates them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SynthError;

// ── Wave shapes ─────────────────────────────────────────────

/// Oscillator wave shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum WaveShape {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    /// Square wave with a fixed 30% duty cycle.
    Pulse,
    /// Silence.
    Rest,
}

impl WaveShape {
    pub fn name(self) -> &'static str {
        match self {
            WaveShape::Sine => "sine",
            WaveShape::Square => "square",
            WaveShape::Sawtooth => "sawtooth",
            WaveShape::Triangle => "triangle",
            WaveShape::Pulse => "pulse",
            WaveShape::Rest => "rest",
        }
    }
}

impl FromStr for WaveShape {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sine" => Ok(WaveShape::Sine),
            "square" | "sq" => Ok(WaveShape::Square),
            "sawtooth" | "saw" => Ok(WaveShape::Sawtooth),
            "triangle" | "tri" => Ok(WaveShape::Triangle),
            "pulse" => Ok(WaveShape::Pulse),
            "rest" => Ok(WaveShape::Rest),
            other => Err(SynthError::InvalidWaveType(other.to_string())),
        }
    }
}

impl TryFrom<String> for WaveShape {
    type Error = SynthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for WaveShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Envelope ────────────────────────────────────────────────

/// Four-stage amplitude envelope.
///
/// `attack`, `decay` and `release` are fractions of the note length;
/// `sustain_level` is a gain. The sustain stage takes whatever length the
/// other three leave over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain_level: f64,
    pub release: f64,
}

impl Envelope {
    pub fn new(attack: f64, decay: f64, sustain_level: f64, release: f64) -> Self {
        Envelope {
            attack,
            decay,
            sustain_level,
            release,
        }
    }

    /// Fraction of the note spent at the sustain level.
    pub fn sustain_fraction(&self) -> f64 {
        1.0 - (self.attack + self.decay + self.release)
    }
}

// ── Effects ─────────────────────────────────────────────────

/// A post-envelope processing step. A note applies its effects in list order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Effect {
    /// Add overtones 1..=order of the note's own shape.
    Harmonic { order: u32 },
    /// Multiply by a second oscillator (amplitude modulation).
    Vibrato {
        frequency: f64,
        #[serde(default = "default_mod_shape")]
        shape: WaveShape,
    },
}

fn default_mod_shape() -> WaveShape {
    WaveShape::Sine
}

// ── Notes, chords, timeline ─────────────────────────────────

/// One pitched (or silent) event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Pitch name resolved through the pitch table (e.g. "a4", "f4s", "r").
    pub pitch: String,
    /// Length in seconds.
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    #[serde(default = "default_shape")]
    pub shape: WaveShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<Envelope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
}

fn default_duration() -> f64 {
    0.25
}

fn default_amplitude() -> f64 {
    1.0
}

fn default_shape() -> WaveShape {
    WaveShape::Square
}

impl Note {
    /// A plain note with default duration, amplitude and shape.
    pub fn new(pitch: impl Into<String>) -> Self {
        Note {
            pitch: pitch.into(),
            duration: default_duration(),
            amplitude: default_amplitude(),
            shape: default_shape(),
            envelope: None,
            effects: Vec::new(),
        }
    }

    /// A silent note of the given length.
    pub fn rest(duration: f64) -> Self {
        Note {
            shape: WaveShape::Rest,
            duration,
            ..Note::new(crate::pitch::REST)
        }
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn shape(mut self, shape: WaveShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Number of samples this note renders to: `round(duration * sample_rate)`.
    pub fn sample_count(&self, sample_rate: u32) -> Result<usize, SynthError> {
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(SynthError::InvalidDuration(format!(
                "note '{}' has duration {}",
                self.pitch, self.duration
            )));
        }
        Ok((self.duration * sample_rate as f64).round() as usize)
    }
}

/// Notes sounding together. Every member must render to the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub notes: Vec<Note>,
}

impl Chord {
    pub fn new(notes: Vec<Note>) -> Self {
        Chord { notes }
    }
}

/// One step of a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Unit {
    Note(Note),
    Chord(Chord),
}

impl From<Note> for Unit {
    fn from(note: Note) -> Self {
        Unit::Note(note)
    }
}

impl From<Chord> for Unit {
    fn from(chord: Chord) -> Self {
        Unit::Chord(chord)
    }
}

// ── Filter ──────────────────────────────────────────────────

/// Filter response with cutoffs in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterKind {
    Lowpass { cutoff: f64 },
    Highpass { cutoff: f64 },
    Bandpass { low: f64, high: f64 },
    Bandstop { low: f64, high: f64 },
}

/// Zero-phase Butterworth filter applied to the assembled timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(flatten)]
    pub kind: FilterKind,
    #[serde(default = "default_filter_order")]
    pub order: u32,
}

fn default_filter_order() -> u32 {
    2
}

impl FilterSpec {
    pub fn new(kind: FilterKind, order: u32) -> Self {
        FilterSpec { kind, order }
    }
}

// ── Score ───────────────────────────────────────────────────

/// A complete render request: the timeline plus an optional master filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub timeline: Vec<Unit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
}

impl Score {
    pub fn new(timeline: Vec<Unit>) -> Self {
        Score {
            timeline,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Parse a JSON score. An unrecognised wave label anywhere in the
    /// timeline fails with `InvalidWaveType`, located by unit and note.
    pub fn from_json(source: &str) -> Result<Self, SynthError> {
        serde_json::from_str(source).map_err(|err| {
            serde_json::from_str::<Value>(source)
                .ok()
                .and_then(|value| unknown_shape(&value))
                .unwrap_or(SynthError::Json(err))
        })
    }
}

/// First wave label in a raw score that does not name a shape.
fn unknown_shape(score: &Value) -> Option<SynthError> {
    let units = score.get("timeline")?.as_array()?;
    units.iter().enumerate().find_map(|(i, unit)| {
        match unit.get("notes").and_then(Value::as_array) {
            Some(notes) => notes
                .iter()
                .enumerate()
                .find_map(|(j, note)| note_shape_error(note).map(|e| e.in_unit(i, Some(j)))),
            None => note_shape_error(unit).map(|e| e.in_unit(i, None)),
        }
    })
}

fn note_shape_error(note: &Value) -> Option<SynthError> {
    let effects = note.get("effects").and_then(Value::as_array).into_iter().flatten();
    std::iter::once(note)
        .chain(effects)
        .filter_map(|v| v.get("shape")?.as_str())
        .find_map(|label| label.parse::<WaveShape>().err())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_shape_labels() {
        assert_eq!("sq".parse::<WaveShape>().unwrap(), WaveShape::Square);
        assert_eq!("saw".parse::<WaveShape>().unwrap(), WaveShape::Sawtooth);
        assert_eq!("tri".parse::<WaveShape>().unwrap(), WaveShape::Triangle);
        assert_eq!("pulse".parse::<WaveShape>().unwrap(), WaveShape::Pulse);
        for shape in [
            WaveShape::Sine,
            WaveShape::Square,
            WaveShape::Sawtooth,
            WaveShape::Triangle,
            WaveShape::Pulse,
            WaveShape::Rest,
        ] {
            assert_eq!(shape.name().parse::<WaveShape>().unwrap(), shape);
        }
    }

    #[test]
    fn unknown_wave_shape_fails() {
        let err = "noise".parse::<WaveShape>().unwrap_err();
        assert!(matches!(err, SynthError::InvalidWaveType(ref s) if s == "noise"));
    }

    #[test]
    fn unknown_wave_shape_in_json_fails() {
        let err = Score::from_json(
            r#"{"timeline": [{"kind": "note", "pitch": "a4", "shape": "organ"}]}"#,
        )
        .unwrap_err();
        assert!(
            matches!(err.root(), SynthError::InvalidWaveType(s) if s == "organ"),
            "got {err:?}"
        );
        assert_eq!(err.to_string(), "unit 0: unknown wave shape 'organ'");
    }

    #[test]
    fn unknown_shape_in_chord_or_effect_is_located() {
        let err = Score::from_json(
            r#"{"timeline": [
                {"kind": "note", "pitch": "a4"},
                {"kind": "chord", "notes": [
                    {"pitch": "a4"},
                    {"pitch": "c5", "effects": [
                        {"type": "vibrato", "frequency": 3, "shape": "wobble"}
                    ]}
                ]}
            ]}"#,
        )
        .unwrap_err();
        assert!(
            matches!(err.root(), SynthError::InvalidWaveType(s) if s == "wobble"),
            "got {err:?}"
        );
        assert!(matches!(err, SynthError::InUnit { unit: 1, note: Some(1), .. }));
    }

    #[test]
    fn malformed_json_stays_a_json_error() {
        let err = Score::from_json(r#"{"timeline": [{"kind": "note"}]}"#).unwrap_err();
        assert!(matches!(err, SynthError::Json(_)), "got {err:?}");
        let err = Score::from_json("{not json").unwrap_err();
        assert!(matches!(err, SynthError::Json(_)), "got {err:?}");
    }

    #[test]
    fn note_defaults() {
        let note: Note = serde_json::from_str(r#"{"pitch": "a4"}"#).unwrap();
        assert_eq!(note, Note::new("a4"));
        assert_eq!(note.duration, 0.25);
        assert_eq!(note.amplitude, 1.0);
        assert_eq!(note.shape, WaveShape::Square);
        assert!(note.envelope.is_none());
        assert!(note.effects.is_empty());
    }

    #[test]
    fn full_score_parses() {
        let score = Score::from_json(
            r#"{
                "timeline": [
                    {"kind": "note", "pitch": "f4s", "duration": 0.5, "shape": "sine",
                     "envelope": {"attack": 0.5, "decay": 0.2, "sustainLevel": 0.1, "release": 0.1},
                     "effects": [{"type": "harmonic", "order": 4},
                                 {"type": "vibrato", "frequency": 3, "shape": "sine"}]},
                    {"kind": "chord", "notes": [{"pitch": "a4"}, {"pitch": "c5"}, {"pitch": "e5"}]}
                ],
                "filter": {"type": "lowpass", "cutoff": 630, "order": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(score.timeline.len(), 2);
        match &score.timeline[0] {
            Unit::Note(note) => {
                assert_eq!(note.envelope, Some(Envelope::new(0.5, 0.2, 0.1, 0.1)));
                assert_eq!(
                    note.effects,
                    vec![
                        Effect::Harmonic { order: 4 },
                        Effect::Vibrato {
                            frequency: 3.0,
                            shape: WaveShape::Sine
                        }
                    ]
                );
            }
            other => panic!("expected note, got {other:?}"),
        }
        match &score.timeline[1] {
            Unit::Chord(chord) => assert_eq!(chord.notes.len(), 3),
            other => panic!("expected chord, got {other:?}"),
        }
        assert_eq!(
            score.filter,
            Some(FilterSpec::new(FilterKind::Lowpass { cutoff: 630.0 }, 2))
        );
    }

    #[test]
    fn band_filter_parses_with_default_order() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"type": "bandstop", "low": 300, "high": 900}"#).unwrap();
        assert_eq!(
            spec,
            FilterSpec::new(
                FilterKind::Bandstop {
                    low: 300.0,
                    high: 900.0
                },
                2
            )
        );
    }

    #[test]
    fn sample_count_rounds() {
        assert_eq!(Note::new("a4").duration(0.01).sample_count(100).unwrap(), 1);
        assert_eq!(Note::new("a4").duration(0.25).sample_count(44100).unwrap(), 11025);
        assert_eq!(Note::new("a4").duration(0.0).sample_count(44100).unwrap(), 0);
    }

    #[test]
    fn negative_duration_rejected() {
        let err = Note::new("a4").duration(-1.0).sample_count(44100).unwrap_err();
        assert!(matches!(err, SynthError::InvalidDuration(_)), "got {err:?}");
    }

    #[test]
    fn sustain_fraction() {
        let env = Envelope::new(0.25, 0.25, 0.5, 0.25);
        assert!((env.sustain_fraction() - 0.25).abs() < 1e-12);
    }
}
