//! Audio interop: WAV files in and out, and the non-blocking playback
//! controller.
//!
//! The playback callback runs on the audio thread and touches nothing but
//! its own buffer, a lock-free command queue, and a pair of atomics. Live
//! parameter edits never reach a running stream; a new sound means a new
//! `play()` with a freshly synthesized buffer.

/// Playback stream lifecycle and cursor reporting.
pub mod playback;
/// 16-bit PCM mono WAV load/save.
pub mod wav;

pub use playback::{PlaybackController, PlaybackState};
pub use wav::{load_wav, save_wav, AudioBuffer};
