//! Butterworth filters applied forward and backward for zero phase.
//!
//! Each response is a cascade of biquad sections whose coefficients come from
//! the Audio EQ Cookbook (Robert Bristow-Johnson), i.e. the bilinear transform
//! with the cutoff pre-warped. Choosing each section's Q from the Butterworth
//! pole angles makes the cascade an exact digital Butterworth response; odd
//! orders add one first-order section.

use std::f64::consts::PI;

use log::debug;

use crate::error::SynthError;
use crate::score::{FilterKind, FilterSpec};

/// Low or high half of a Butterworth design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Lowpass,
    Highpass,
}

/// One normalized section (`a0 == 1`). First-order sections have `b2 == a2 == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    /// Second-order section at `frequency` Hz with quality `q`.
    pub fn second_order(response: Response, frequency: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * frequency / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match response {
            Response::Lowpass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            Response::Highpass => {
                let b0 = (1.0 + cos_w0) / 2.0;
                (b0, -(1.0 + cos_w0), b0)
            }
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        // Normalize by a0
        Biquad {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// First-order section at `frequency` Hz.
    pub fn first_order(response: Response, frequency: f64, sample_rate: f64) -> Self {
        let k = (PI * frequency / sample_rate).tan();
        let norm = 1.0 / (1.0 + k);
        let (b0, b1) = match response {
            Response::Lowpass => (k * norm, k * norm),
            Response::Highpass => (norm, -norm),
        };
        Biquad {
            b0,
            b1,
            b2: 0.0,
            a1: (k - 1.0) * norm,
            a2: 0.0,
        }
    }

    /// Gain at 0 Hz.
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Filter `data` in place (Direct Form II Transposed), starting from the
    /// steady state for a constant input equal to `data[0]`.
    fn run(&self, data: &mut [f64]) {
        let Some(&first) = data.first() else {
            return;
        };
        let settled = self.dc_gain() * first;
        let mut z2 = self.b2 * first - self.a2 * settled;
        let mut z1 = self.b1 * first - self.a1 * settled + z2;

        for sample in data.iter_mut() {
            let input = *sample;
            let output = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * output + z2;
            z2 = self.b2 * input - self.a2 * output;
            *sample = output;
        }
    }
}

/// Butterworth cascade of the given order.
pub fn butterworth(
    response: Response,
    frequency: f64,
    order: u32,
    sample_rate: f64,
) -> Vec<Biquad> {
    let n = order as f64;
    let mut sections: Vec<Biquad> = (0..order / 2)
        .map(|k| {
            let q = 1.0 / (2.0 * (PI * (2 * k + 1) as f64 / (2.0 * n)).sin());
            Biquad::second_order(response, frequency, q, sample_rate)
        })
        .collect();
    if order % 2 == 1 {
        sections.push(Biquad::first_order(response, frequency, sample_rate));
    }
    sections
}

/// A designed filter: the sum of one or more section cascades.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroPhaseFilter {
    branches: Vec<Vec<Biquad>>,
}

impl ZeroPhaseFilter {
    /// Design the filter described by `spec` for `sample_rate`.
    ///
    /// Bandpass is a highpass at `low` followed by a lowpass at `high`.
    /// Bandstop is the sum of a lowpass at `low` and a highpass at `high`.
    pub fn design(spec: &FilterSpec, sample_rate: u32) -> Result<Self, SynthError> {
        if spec.order == 0 {
            return Err(SynthError::InvalidFilterOrder(spec.order));
        }
        let rate = sample_rate as f64;
        let nyquist = rate / 2.0;
        let order = spec.order;

        let branches = match spec.kind {
            FilterKind::Lowpass { cutoff } => {
                check_cutoff(cutoff, nyquist)?;
                vec![butterworth(Response::Lowpass, cutoff, order, rate)]
            }
            FilterKind::Highpass { cutoff } => {
                check_cutoff(cutoff, nyquist)?;
                vec![butterworth(Response::Highpass, cutoff, order, rate)]
            }
            FilterKind::Bandpass { low, high } => {
                check_band(low, high, nyquist)?;
                let mut sections = butterworth(Response::Highpass, low, order, rate);
                sections.extend(butterworth(Response::Lowpass, high, order, rate));
                vec![sections]
            }
            FilterKind::Bandstop { low, high } => {
                check_band(low, high, nyquist)?;
                vec![
                    butterworth(Response::Lowpass, low, order, rate),
                    butterworth(Response::Highpass, high, order, rate),
                ]
            }
        };

        debug!(
            "designed {:?} order {order}: {} sections",
            spec.kind,
            branches.iter().map(Vec::len).sum::<usize>()
        );
        Ok(ZeroPhaseFilter { branches })
    }

    /// Filter `input` forward and backward. The output has the same length.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; input.len()];
        for branch in &self.branches {
            for (acc, s) in out.iter_mut().zip(filtfilt(branch, input)) {
                *acc += s;
            }
        }
        out
    }
}

fn check_cutoff(cutoff: f64, nyquist: f64) -> Result<(), SynthError> {
    if cutoff > 0.0 && cutoff < nyquist {
        Ok(())
    } else {
        Err(SynthError::InvalidCutoff(format!(
            "{cutoff} Hz is outside (0, {nyquist}) Hz"
        )))
    }
}

fn check_band(low: f64, high: f64, nyquist: f64) -> Result<(), SynthError> {
    check_cutoff(low, nyquist)?;
    check_cutoff(high, nyquist)?;
    if low < high {
        Ok(())
    } else {
        Err(SynthError::InvalidCutoff(format!(
            "band low edge {low} Hz must be below high edge {high} Hz"
        )))
    }
}

/// Forward-backward filtering through `sections` with odd-reflection padding.
fn filtfilt(sections: &[Biquad], input: &[f64]) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    let pad = (3 * (2 * sections.len() + 1)).min(n - 1);
    let first = input[0];
    let last = input[n - 1];

    let mut ext = Vec::with_capacity(n + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * first - input[i]));
    ext.extend_from_slice(input);
    ext.extend((1..=pad).map(|i| 2.0 * last - input[n - 1 - i]));

    for section in sections {
        section.run(&mut ext);
    }
    ext.reverse();
    for section in sections {
        section.run(&mut ext);
    }
    ext.reverse();

    ext.drain(..pad);
    ext.truncate(n);
    ext
}

/// Design and apply `spec` to `buffer` in one step.
pub fn apply(buffer: &[f64], spec: &FilterSpec, sample_rate: u32) -> Result<Vec<f64>, SynthError> {
    Ok(ZeroPhaseFilter::design(spec, sample_rate)?.apply(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    fn sine(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / SR as f64).sin())
            .collect()
    }

    /// Peak magnitude away from the edges.
    fn settled_peak(buf: &[f64]) -> f64 {
        let margin = buf.len() / 4;
        buf[margin..buf.len() - margin]
            .iter()
            .fold(0.0_f64, |m, &s| m.max(s.abs()))
    }

    fn lowpass(cutoff: f64, order: u32) -> FilterSpec {
        FilterSpec::new(FilterKind::Lowpass { cutoff }, order)
    }

    #[test]
    fn butterworth_q_values() {
        let sections = butterworth(Response::Lowpass, 1000.0, 4, 44100.0);
        assert_eq!(sections.len(), 2);
        let odd = butterworth(Response::Lowpass, 1000.0, 3, 44100.0);
        assert_eq!(odd.len(), 2);
        assert_eq!(odd[1].b2, 0.0);
        assert_eq!(odd[1].a2, 0.0);
    }

    #[test]
    fn lowpass_passes_dc() {
        let out = apply(&vec![1.0; 1000], &lowpass(630.0, 2), SR).unwrap();
        for (i, &s) in out.iter().enumerate() {
            assert!((s - 1.0).abs() < 1e-9, "Lowpass should pass DC, sample {i} = {s}");
        }
    }

    #[test]
    fn highpass_blocks_dc() {
        let spec = FilterSpec::new(FilterKind::Highpass { cutoff: 1000.0 }, 3);
        let out = apply(&vec![1.0; 1000], &spec, SR).unwrap();
        for (i, &s) in out.iter().enumerate() {
            assert!(s.abs() < 1e-9, "Highpass should block DC, sample {i} = {s}");
        }
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let out = apply(&sine(10000.0, 8820), &lowpass(630.0, 2), SR).unwrap();
        let peak = settled_peak(&out);
        assert!(peak < 0.01, "Lowpass@630Hz should strongly attenuate 10kHz, got {peak}");
    }

    #[test]
    fn passband_has_no_phase_shift() {
        let input = sine(100.0, 4410);
        let out = apply(&input, &lowpass(2000.0, 4), SR).unwrap();
        let margin = 1000;
        for i in margin..input.len() - margin {
            assert!(
                (out[i] - input[i]).abs() < 1e-3,
                "sample {i}: {} vs {}",
                out[i],
                input[i]
            );
        }
    }

    #[test]
    fn bandpass_keeps_centre_only() {
        let spec = FilterSpec::new(FilterKind::Bandpass { low: 500.0, high: 2000.0 }, 2);
        let centre = settled_peak(&apply(&sine(1000.0, 8820), &spec, SR).unwrap());
        let below = settled_peak(&apply(&sine(50.0, 8820), &spec, SR).unwrap());
        let above = settled_peak(&apply(&sine(12000.0, 8820), &spec, SR).unwrap());
        assert!(centre > 0.5, "1kHz should pass, got {centre}");
        assert!(below < 0.01, "50Hz should be rejected, got {below}");
        assert!(above < 0.01, "12kHz should be rejected, got {above}");
    }

    #[test]
    fn bandstop_notches_centre() {
        let spec = FilterSpec::new(FilterKind::Bandstop { low: 1000.0, high: 4000.0 }, 4);
        let centre = settled_peak(&apply(&sine(2000.0, 8820), &spec, SR).unwrap());
        let low = settled_peak(&apply(&sine(100.0, 8820), &spec, SR).unwrap());
        assert!(centre < 0.05, "2kHz should be rejected, got {centre}");
        assert!(low > 0.95, "100Hz should pass, got {low}");
    }

    #[test]
    fn length_preserved_for_short_buffers() {
        let spec = lowpass(630.0, 5);
        for len in [0, 1, 2, 7, 40] {
            let input: Vec<f64> = (0..len).map(|i| i as f64).collect();
            let out = apply(&input, &spec, SR).unwrap();
            assert_eq!(out.len(), len);
            assert!(out.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn invalid_cutoffs_rejected() {
        let bad = [
            lowpass(0.0, 2),
            lowpass(-10.0, 2),
            lowpass(22050.0, 2),
            lowpass(30000.0, 2),
            lowpass(f64::NAN, 2),
            FilterSpec::new(FilterKind::Highpass { cutoff: 0.0 }, 2),
            FilterSpec::new(FilterKind::Bandpass { low: 900.0, high: 300.0 }, 2),
            FilterSpec::new(FilterKind::Bandstop { low: 500.0, high: 500.0 }, 2),
            FilterSpec::new(FilterKind::Bandpass { low: 100.0, high: 23000.0 }, 2),
        ];
        for spec in &bad {
            let err = ZeroPhaseFilter::design(spec, SR).unwrap_err();
            assert!(matches!(err, SynthError::InvalidCutoff(_)), "{spec:?} gave {err:?}");
        }
    }

    #[test]
    fn zero_order_rejected() {
        let err = ZeroPhaseFilter::design(&lowpass(630.0, 0), SR).unwrap_err();
        assert!(matches!(err, SynthError::InvalidFilterOrder(0)));
    }
}
