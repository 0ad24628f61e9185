//! Mixer — sums simultaneous note waveforms sample by sample.

use crate::error::SynthError;

/// Sum equal-length buffers into a new buffer.
///
/// Fails with `LengthMismatch` naming the first member whose length differs
/// from the first buffer's.
pub fn mix<B: AsRef<[f64]>>(waveforms: &[B]) -> Result<Vec<f64>, SynthError> {
    let Some(first) = waveforms.first() else {
        return Err(SynthError::EmptyChord);
    };
    let expected = first.as_ref().len();
    if let Some((index, found)) = waveforms
        .iter()
        .map(|w| w.as_ref().len())
        .enumerate()
        .find(|&(_, len)| len != expected)
    {
        return Err(SynthError::LengthMismatch {
            index,
            expected,
            found,
        });
    }

    let mut out = vec![0.0; expected];
    for waveform in waveforms {
        for (acc, &s) in out.iter_mut().zip(waveform.as_ref()) {
            *acc += s;
        }
    }
    Ok(out)
}
