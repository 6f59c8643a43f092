//! Error types for the engine.
//!
//! Nothing in here is fatal: derived computations recover locally where the
//! contract allows (out-of-range writes clamp, overflowed synthesis falls back
//! to silence) and everything else surfaces as a `Result` for the front-end
//! to present.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur inside the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A parameter write fell outside its declared range and was clamped.
    /// Carried in the clamp report; only returned as an error when a caller
    /// asks for strict validation.
    #[error("parameter '{name}' out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Analysis or playback was requested with no buffer.
    #[error("no audio buffer available")]
    EmptyInput,

    /// The audio output device could not be opened.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// An audio file could not be decoded.
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// A worker-thread future was cancelled. Silent: no notification fires.
    #[error("operation cancelled")]
    Cancelled,

    /// A synthesis step produced non-finite samples. The output buffer is
    /// replaced by silence of the requested length.
    #[error("synthesis produced non-finite samples ({len} requested)")]
    NumericOverflow { len: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a decode failure from any displayable source.
    pub fn decode(message: impl ToString) -> Self {
        Self::DecodeFailure(message.to_string())
    }

    /// Creates a device-unavailable error from any displayable source.
    pub fn device(message: impl ToString) -> Self {
        Self::DeviceUnavailable(message.to_string())
    }
}
