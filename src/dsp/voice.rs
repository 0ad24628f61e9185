//! Voice — renders a single note description to its waveform.
//!
//! Stages run in a fixed order: oscillator, amplitude, envelope, then each
//! effect in the note's list. Effects see the output of the previous stage,
//! so harmonic-then-vibrato and vibrato-then-harmonic differ.

use log::trace;

use crate::config::RenderConfig;
use crate::error::SynthError;
use crate::pitch::PitchTable;
use crate::score::{Effect, Note, WaveShape};

use super::{envelope, harmonics, modulation, oscillator};

/// Renders notes against a fixed pitch table and output format.
#[derive(Debug, Clone, Copy)]
pub struct Voice<'a> {
    pitches: &'a PitchTable,
    sample_rate: u32,
    gain: f64,
}

impl<'a> Voice<'a> {
    pub fn new(pitches: &'a PitchTable, sample_rate: u32, gain: f64) -> Self {
        Voice {
            pitches,
            sample_rate,
            gain,
        }
    }

    pub fn with_config(pitches: &'a PitchTable, config: &RenderConfig) -> Self {
        Voice::new(pitches, config.sample_rate, config.gain)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frequency of a note. Rests skip the lookup and sound at 0 Hz.
    pub fn frequency(&self, note: &Note) -> Result<f64, SynthError> {
        if note.shape == WaveShape::Rest {
            return Ok(0.0);
        }
        self.pitches
            .frequency(&note.pitch)
            .ok_or_else(|| SynthError::InvalidNote(note.pitch.clone()))
    }

    /// Render `note` to a new buffer of `round(duration * sample_rate)` samples.
    pub fn synthesize(&self, note: &Note) -> Result<Vec<f64>, SynthError> {
        let frequency = self.frequency(note)?;
        if !(note.amplitude.is_finite() && note.amplitude >= 0.0) {
            return Err(SynthError::InvalidDuration(format!(
                "note '{}' has amplitude {}",
                note.pitch, note.amplitude
            )));
        }
        let count = note.sample_count(self.sample_rate)?;
        let times = oscillator::sample_times(count, self.sample_rate);
        trace!(
            "synthesizing {} ({frequency:.2} Hz, {}) for {count} samples",
            note.pitch, note.shape
        );

        let mut waveform = oscillator::generate(frequency, note.shape, &times);

        let scale = note.amplitude * self.gain;
        for sample in waveform.iter_mut() {
            *sample *= scale;
        }

        envelope::apply(&mut waveform, note.envelope.as_ref())?;

        for effect in &note.effects {
            match *effect {
                Effect::Harmonic { order } => {
                    harmonics::add_harmonics(&mut waveform, frequency, order, note.shape, &times)
                }
                Effect::Vibrato { frequency, shape } => {
                    modulation::vibrato(&mut waveform, frequency, shape, &times)
                }
            }
        }

        Ok(waveform)
    }
}
