//! Harmonic enrichment — stacks overtones of the note's own shape.
//!
//! Harmonic `i` (1-based) runs at `i * fundamental` with weight
//! `(order - i + 1) / order!`: a linearly falling series scaled down by the
//! factorial of the order.

use crate::score::WaveShape;

use super::oscillator;

/// Weight of each harmonic `1..=order`.
pub fn weights(order: u32) -> Vec<f64> {
    let factorial: f64 = (1..=order).map(f64::from).product();
    (1..=order)
        .map(|i| f64::from(order - i + 1) / factorial)
        .collect()
}

/// Add harmonics `1..=order` into `waveform` in place. `order == 0` does nothing.
pub fn add_harmonics(
    waveform: &mut [f64],
    fundamental: f64,
    order: u32,
    shape: WaveShape,
    times: &[f64],
) {
    for (i, weight) in (1..=order).zip(weights(order)) {
        let frequency = fundamental * f64::from(i);
        for (sample, &t) in waveform.iter_mut().zip(times) {
            *sample += weight * oscillator::sample(frequency, shape, t);
        }
    }
}
