//! Renderer — runs the whole pipeline and produces 16-bit PCM.
//!
//! notes → chords → timeline → master filter → quantizer.

use log::debug;
use serde::Serialize;

use crate::config::RenderConfig;
use crate::error::SynthError;
use crate::score::Score;

use super::filter::ZeroPhaseFilter;
use super::timeline;
use super::voice::Voice;

/// Finished mono PCM ready for an encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedAudio {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl RenderedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Encode as a mono 16-bit WAV file in memory.
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        encode_wav(&self.samples, self.sample_rate, 1)
    }
}

/// Convert float samples (already in PCM units) to `i16`, rounding to the
/// nearest step and saturating at `i16::MIN` / `i16::MAX`.
pub fn quantize(buffer: &[f64]) -> Vec<i16> {
    buffer
        .iter()
        .map(|&s| s.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16)
        .collect()
}

/// Render a score to float samples, before quantization.
pub fn render_float(score: &Score, config: &RenderConfig) -> Result<Vec<f64>, SynthError> {
    config.validate()?;
    let pitches = config.pitch_table();
    let voice = Voice::with_config(&pitches, config);
    let filter = score
        .filter
        .as_ref()
        .map(|spec| ZeroPhaseFilter::design(spec, config.sample_rate))
        .transpose()?;

    debug!(
        "rendering {} units at {} Hz",
        score.timeline.len(),
        config.sample_rate
    );
    let buffer = timeline::render_timeline(&voice, &score.timeline)?;

    Ok(match filter {
        Some(filter) => filter.apply(&buffer),
        None => buffer,
    })
}

/// Render a score to 16-bit PCM.
pub fn render(score: &Score, config: &RenderConfig) -> Result<RenderedAudio, SynthError> {
    let buffer = render_float(score, config)?;
    let samples = quantize(&buffer);
    debug!("rendered {} samples", samples.len());
    Ok(RenderedAudio {
        sample_rate: config.sample_rate,
        samples,
    })
}

const WAV_HEADER_LEN: u32 = 44;
const WAVE_FORMAT_PCM: u16 = 1;

/// Encode 16-bit PCM as a WAV file in memory. Multi-channel input is
/// interleaved frame by frame.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let frame_bytes = channels * 2;
    let data_len = (samples.len() * 2) as u32;

    let mut wav = Vec::with_capacity((WAV_HEADER_LEN + data_len) as usize);
    put_chunk_header(&mut wav, b"RIFF", WAV_HEADER_LEN - 8 + data_len);
    wav.extend_from_slice(b"WAVE");

    put_chunk_header(&mut wav, b"fmt ", 16);
    wav.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * u32::from(frame_bytes)).to_le_bytes());
    wav.extend_from_slice(&frame_bytes.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());

    put_chunk_header(&mut wav, b"data", data_len);
    wav.extend(samples.iter().flat_map(|s| s.to_le_bytes()));
    wav
}

fn put_chunk_header(wav: &mut Vec<u8>, id: &[u8; 4], len: u32) {
    wav.extend_from_slice(id);
    wav.extend_from_slice(&len.to_le_bytes());
}

/// Write rendered audio to a mono 16-bit WAV file.
#[cfg(feature = "wav-export")]
pub fn write_wav(
    path: impl AsRef<std::path::Path>,
    audio: &RenderedAudio,
) -> Result<(), SynthError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &audio.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
