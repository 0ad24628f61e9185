//! DSP — offline synthesis of a score into one finished buffer.
//!
//! Everything here is synchronous and deterministic: the same score and
//! configuration always produce the same samples, on native targets and
//! in WASM alike.

pub mod envelope;
pub mod filter;
pub mod harmonics;
pub mod mixer;
pub mod modulation;
pub mod oscillator;
pub mod renderer;
pub mod timeline;
pub mod voice;
