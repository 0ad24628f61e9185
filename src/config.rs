//! Render configuration.
//!
//! Every field has a default, so `{}` is a valid configuration document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SynthError;
use crate::pitch::PitchTable;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Unit amplitude in PCM steps. A note of amplitude 1.0 peaks at ±1000.
pub const DEFAULT_GAIN: f64 = 1000.0;

pub const DEFAULT_TUNING_PITCH: f64 = 440.0;

/// Settings shared by every stage of a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Global amplitude scale applied together with each note's amplitude.
    pub gain: f64,
    /// Frequency of A4 for the generated pitch table.
    pub tuning_pitch: f64,
    /// Extra or replacement pitch names.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pitches: BTreeMap<String, f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain: DEFAULT_GAIN,
            tuning_pitch: DEFAULT_TUNING_PITCH,
            pitches: BTreeMap::new(),
        }
    }
}

impl RenderConfig {
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        RenderConfig {
            sample_rate,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(source: &str) -> Result<Self, SynthError> {
        let config: RenderConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SynthError> {
        if self.sample_rate == 0 {
            return Err(SynthError::InvalidConfig(
                "sample rate must be positive".to_string(),
            ));
        }
        if !(self.gain.is_finite() && self.gain > 0.0) {
            return Err(SynthError::InvalidConfig(format!(
                "gain must be positive, got {}",
                self.gain
            )));
        }
        if !(self.tuning_pitch.is_finite() && self.tuning_pitch > 0.0) {
            return Err(SynthError::InvalidConfig(format!(
                "tuning pitch must be positive, got {}",
                self.tuning_pitch
            )));
        }
        if let Some((name, freq)) = self
            .pitches
            .iter()
            .find(|(_, f)| !(f.is_finite() && **f >= 0.0))
        {
            return Err(SynthError::InvalidConfig(format!(
                "pitch '{name}' has invalid frequency {freq}"
            )));
        }
        Ok(())
    }

    /// Half the sample rate.
    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Build the pitch table for this configuration.
    pub fn pitch_table(&self) -> PitchTable {
        PitchTable::equal_tempered(self.tuning_pitch).with_overrides(&self.pitches)
    }
}
