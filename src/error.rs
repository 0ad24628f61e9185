use thiserror::Error;

/// Every way a render can fail. All failures abort the whole render.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("unknown pitch name '{0}'")]
    InvalidNote(String),

    #[error("unknown wave shape '{0}'")]
    InvalidWaveType(String),

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("invalid duration or amplitude: {0}")]
    InvalidDuration(String),

    #[error("chord member {index} has {found} samples, expected {expected}")]
    LengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("chord has no notes")]
    EmptyChord,

    #[error("timeline has no units")]
    EmptyTimeline,

    #[error("invalid cutoff: {0}")]
    InvalidCutoff(String),

    #[error("filter order must be at least 1, got {0}")]
    InvalidFilterOrder(u32),

    #[error("invalid render config: {0}")]
    InvalidConfig(String),

    #[error("malformed score JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "wav-export")]
    #[error("WAV export failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("unit {unit}{}: {source}", note_suffix(.note))]
    InUnit {
        unit: usize,
        note: Option<usize>,
        source: Box<SynthError>,
    },
}

impl SynthError {
    /// Attach a timeline position to an error raised while rendering a unit.
    pub fn in_unit(self, unit: usize, note: Option<usize>) -> Self {
        SynthError::InUnit {
            unit,
            note,
            source: Box::new(self),
        }
    }

    /// The innermost error, with any location wrappers stripped.
    pub fn root(&self) -> &SynthError {
        match self {
            SynthError::InUnit { source, .. } => source.root(),
            other => other,
        }
    }
}

fn note_suffix(note: &Option<usize>) -> String {
    match note {
        Some(n) => format!(", note {n}"),
        None => String::new(),
    }
}
