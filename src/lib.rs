pub mod config;
pub mod dsp;
pub mod error;
pub mod pitch;
pub mod score;

use crate::config::RenderConfig;
use crate::dsp::renderer::RenderedAudio;
use crate::error::SynthError;
use crate::score::Score;
use wasm_bindgen::prelude::*;

pub use crate::dsp::renderer::{encode_wav, quantize};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the tonewright-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Parse a JSON score description.
pub fn parse_score(input: &str) -> Result<Score, SynthError> {
    Score::from_json(input)
}

/// Render a score to 16-bit mono PCM.
pub fn render_score(score: &Score, config: &RenderConfig) -> Result<RenderedAudio, SynthError> {
    dsp::renderer::render(score, config)
}

/// WASM-exposed: render a JSON score to a mono WAV byte array.
#[wasm_bindgen]
pub fn render_score_wav(source: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    let score = parse_score(source).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let audio = render_score(&score, &RenderConfig::with_sample_rate(sample_rate))
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(audio.to_wav_bytes())
}

/// WASM-exposed: render a score object (already a JS value) to i16 samples.
#[wasm_bindgen]
pub fn render_score_samples(score: JsValue, sample_rate: u32) -> Result<Vec<i16>, JsValue> {
    let score: Score =
        serde_wasm_bindgen::from_value(score).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let audio = render_score(&score, &RenderConfig::with_sample_rate(sample_rate))
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(audio.samples)
}

/// WASM-exposed: frequency of a pitch name at the given A4 tuning, or NaN.
#[wasm_bindgen]
pub fn pitch_frequency(name: &str, tuning_pitch: f64) -> f64 {
    pitch::PitchTable::equal_tempered(tuning_pitch)
        .frequency(name)
        .unwrap_or(f64::NAN)
}
