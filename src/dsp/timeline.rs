//! Timeline — renders units and lays them end to end.

use log::{debug, trace};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::SynthError;
use crate::score::Unit;

use super::mixer;
use super::voice::Voice;

/// Render one note or chord. Errors carry the unit index (and note index
/// within a chord).
pub fn render_unit(voice: &Voice<'_>, index: usize, unit: &Unit) -> Result<Vec<f64>, SynthError> {
    match unit {
        Unit::Note(note) => voice.synthesize(note).map_err(|e| e.in_unit(index, None)),
        Unit::Chord(chord) => {
            let members = chord
                .notes
                .iter()
                .enumerate()
                .map(|(i, note)| voice.synthesize(note).map_err(|e| e.in_unit(index, Some(i))))
                .collect::<Result<Vec<_>, _>>()?;
            trace!("unit {index}: mixing {} notes", members.len());
            mixer::mix(&members).map_err(|e| e.in_unit(index, None))
        }
    }
}

/// Render every unit, in order.
///
/// With the `parallel` feature units render on the rayon pool; results are
/// collected back into timeline order so output is unchanged.
pub fn render_units(voice: &Voice<'_>, units: &[Unit]) -> Result<Vec<Vec<f64>>, SynthError> {
    #[cfg(feature = "parallel")]
    let units = units.par_iter();
    #[cfg(not(feature = "parallel"))]
    let units = units.iter();

    units
        .enumerate()
        .map(|(i, unit)| render_unit(voice, i, unit))
        .collect()
}

/// Concatenate unit buffers into one preallocated buffer.
pub fn assemble<B: AsRef<[f64]>>(units: &[B]) -> Result<Vec<f64>, SynthError> {
    if units.is_empty() {
        return Err(SynthError::EmptyTimeline);
    }
    let total: usize = units.iter().map(|u| u.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);
    for unit in units {
        out.extend_from_slice(unit.as_ref());
    }
    debug!("assembled {} units into {total} samples", units.len());
    Ok(out)
}

/// Render and assemble a whole timeline.
pub fn render_timeline(voice: &Voice<'_>, units: &[Unit]) -> Result<Vec<f64>, SynthError> {
    if units.is_empty() {
        return Err(SynthError::EmptyTimeline);
    }
    let rendered = render_units(voice, units)?;
    assemble(&rendered)
}
