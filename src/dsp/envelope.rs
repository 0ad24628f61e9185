//! ADSR envelope shaping over a fixed-length buffer.
//!
//! Stage lengths are fractions of the buffer, truncated to whole samples:
//!
//! ```text
//! gain
//!  1 ┤   /\
//!  s ┤  /  \________
//!  0 ┤ /             \
//!    └─A──D────S─────R─
//! ```

use crate::error::SynthError;
use crate::score::Envelope;

/// Sample counts of each envelope stage for one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub attack: usize,
    pub decay: usize,
    pub sustain: usize,
    pub release: usize,
}

impl Stages {
    /// Split `sample_count` samples into stages.
    pub fn plan(envelope: &Envelope, sample_count: usize) -> Result<Self, SynthError> {
        check_fraction("attack", envelope.attack)?;
        check_fraction("decay", envelope.decay)?;
        check_fraction("release", envelope.release)?;
        check_fraction("sustain level", envelope.sustain_level)?;

        let n = sample_count as f64;
        // A non-zero attack always gets at least its silent first sample.
        let attack = match (envelope.attack * n) as usize {
            0 if envelope.attack > 0.0 && sample_count > 0 => 1,
            count => count,
        };
        let decay = (envelope.decay * n) as usize;
        let release = (envelope.release * n) as usize;
        let used = attack + decay + release;
        if used > sample_count {
            return Err(SynthError::InvalidEnvelope(format!(
                "attack + decay + release = {} exceeds the note length",
                envelope.attack + envelope.decay + envelope.release
            )));
        }

        Ok(Stages {
            attack,
            decay,
            sustain: sample_count - used,
            release,
        })
    }
}

fn check_fraction(name: &str, value: f64) -> Result<(), SynthError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SynthError::InvalidEnvelope(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

/// `count` evenly spaced points from `start` to `end` inclusive.
/// A single point is `start`.
fn ramp(start: f64, end: f64, count: usize) -> impl Iterator<Item = f64> {
    let step = if count > 1 {
        (end - start) / (count - 1) as f64
    } else {
        0.0
    };
    (0..count).map(move |i| {
        if count > 1 && i == count - 1 {
            end
        } else {
            start + step * i as f64
        }
    })
}

/// Multiply `waveform` by the envelope's gain curve in place.
///
/// `None` leaves the waveform untouched.
pub fn apply(waveform: &mut [f64], envelope: Option<&Envelope>) -> Result<(), SynthError> {
    let Some(envelope) = envelope else {
        return Ok(());
    };
    let stages = Stages::plan(envelope, waveform.len())?;
    let level = envelope.sustain_level;

    let gains = ramp(0.0, 1.0, stages.attack)
        .chain(ramp(1.0, level, stages.decay))
        .chain(std::iter::repeat_n(level, stages.sustain))
        .chain(ramp(level, 0.0, stages.release));

    for (sample, gain) in waveform.iter_mut().zip(gains) {
        *sample *= gain;
    }
    Ok(())
}
