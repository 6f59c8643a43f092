//! WAV import and export.
//!
//! The exchange format is deliberately narrow: 16-bit integer PCM at 22050 or
//! 44100 Hz, one or two channels on the way in (stereo is averaged down to
//! mono), always mono on the way out. Everything else is a decode failure
//! rather than a best-effort guess.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::SUPPORTED_SAMPLE_RATES;

/// A mono sample buffer tagged with its rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Buffer length in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Loads a 16-bit PCM WAV file as a mono buffer.
pub fn load_wav(path: impl AsRef<Path>) -> EngineResult<AudioBuffer> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path).map_err(EngineError::decode)?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(EngineError::DecodeFailure(format!(
            "unsupported sample format: {:?} {} bits (16-bit PCM required)",
            spec.sample_format, spec.bits_per_sample
        )));
    }
    if !SUPPORTED_SAMPLE_RATES.contains(&spec.sample_rate) {
        return Err(EngineError::DecodeFailure(format!(
            "unsupported sample rate: {} Hz",
            spec.sample_rate
        )));
    }
    if spec.channels == 0 || spec.channels > 2 {
        return Err(EngineError::DecodeFailure(format!(
            "unsupported channel count: {}",
            spec.channels
        )));
    }

    let raw: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .map_err(EngineError::decode)?;

    // Divide by 32768 so the full i16 range, including i16::MIN, lands
    // inside [-1, 1].
    const SCALE: f32 = 1.0 / 32768.0;
    let samples: Vec<f32> = if spec.channels == 2 {
        raw.chunks_exact(2)
            .map(|pair| (pair[0] as f32 + pair[1] as f32) / 2.0 * SCALE)
            .collect()
    } else {
        raw.iter().map(|&s| s as f32 * SCALE).collect()
    };

    if samples.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    info!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate = spec.sample_rate,
        "loaded wav"
    );
    Ok(AudioBuffer::new(samples, spec.sample_rate))
}

/// Writes a mono buffer as 16-bit PCM. Samples are clamped to [-1, 1].
pub fn save_wav(path: impl AsRef<Path>, buffer: &AudioBuffer) -> EngineResult<()> {
    if buffer.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    let path = path.as_ref();
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).map_err(EngineError::decode)?;
    for &sample in &buffer.samples {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(quantized).map_err(EngineError::decode)?;
    }
    writer.finalize().map_err(EngineError::decode)?;

    info!(path = %path.display(), samples = buffer.len(), "saved wav");
    Ok(())
}
