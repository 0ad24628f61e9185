//! Oscillators — naive periodic waveforms sampled at explicit times.
//!
//! Every shape is a function of the phase `p = frac(frequency * t)`:
//! the sample is computed directly from `t`, so any subset of times can be
//! evaluated independently and the result never depends on evaluation order.

use std::f64::consts::PI;

use crate::score::WaveShape;

/// Fraction of each period the pulse shape spends high.
pub const PULSE_DUTY: f64 = 0.3;

/// Sample times `k / sample_rate` for `k` in `0..count`.
pub fn sample_times(count: usize, sample_rate: u32) -> Vec<f64> {
    let rate = sample_rate as f64;
    (0..count).map(|k| k as f64 / rate).collect()
}

/// Generate one sample per entry of `times`.
pub fn generate(frequency: f64, shape: WaveShape, times: &[f64]) -> Vec<f64> {
    times.iter().map(|&t| sample(frequency, shape, t)).collect()
}

/// Evaluate a single shape at time `t` (seconds).
pub fn sample(frequency: f64, shape: WaveShape, t: f64) -> f64 {
    let phase = (frequency * t).rem_euclid(1.0);
    match shape {
        WaveShape::Sine => (2.0 * PI * frequency * t).sin(),
        WaveShape::Square => duty_cycle(phase, 0.5),
        WaveShape::Pulse => duty_cycle(phase, PULSE_DUTY),
        WaveShape::Sawtooth => 2.0 * phase - 1.0,
        // -1→+1 over the first half period, +1→-1 over the second
        WaveShape::Triangle => {
            if phase < 0.5 {
                4.0 * phase - 1.0
            } else {
                3.0 - 4.0 * phase
            }
        }
        WaveShape::Rest => 0.0,
    }
}

fn duty_cycle(phase: f64, duty: f64) -> f64 {
    if phase < duty { 1.0 } else { -1.0 }
}
