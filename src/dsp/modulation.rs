//! Vibrato — amplitude modulation by a second oscillator.
//!
//! Despite the name this scales the signal's level, not its pitch: each
//! sample is multiplied by the modulator evaluated at the same time.

use crate::score::WaveShape;

use super::oscillator;

/// Multiply `waveform` in place by an oscillator of `frequency` and `shape`.
pub fn vibrato(waveform: &mut [f64], frequency: f64, shape: WaveShape, times: &[f64]) {
    for (sample, &t) in waveform.iter_mut().zip(times) {
        *sample *= oscillator::sample(frequency, shape, t);
    }
}
