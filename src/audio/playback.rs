//! Non-blocking playback of a rendered buffer.
//!
//! The controller lives on the UI thread and owns the cpal stream. The audio
//! callback owns its own read cursor over a shared immutable buffer; the two
//! sides talk through a lock-free command queue (seek, loop toggle) going in
//! and a pair of atomics (position, finished) coming out. The callback never
//! allocates, locks, or touches the scene.
//!
//! Position travels across threads as sample-count bits in an `AtomicU64`;
//! it is converted to seconds only at the reporting edge.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Producer, RingBuffer};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::event::EngineEvent;

use super::wav::AudioBuffer;

/// Commands the UI thread sends to a running audio callback.
enum Command {
    /// Jump the read cursor to this sample index.
    Seek(usize),
    SetLooping(bool),
}

/// Capacity of the UI -> callback command queue.
const COMMAND_QUEUE_CAP: usize = 64;

/// Minimum interval between `PositionChanged` events.
const POSITION_INTERVAL: Duration = Duration::from_millis(100);

/// Callback -> UI state, written by the audio thread.
struct Shared {
    /// Read cursor in buffer samples.
    position: AtomicU64,
    /// Set once when a non-looping stream runs off the end.
    finished: AtomicBool,
    /// Stream error reported by cpal's error callback. That callback runs off
    /// the render path, so a mutex is fine here.
    error: Mutex<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Owns the output stream and the loaded buffer.
///
/// Not `Send`: cpal streams are tied to the thread that built them, and the
/// engine only ever drives playback from the UI loop.
pub struct PlaybackController {
    state: PlaybackState,
    buffer: Option<Arc<Vec<f32>>>,
    sample_rate: u32,
    looping: bool,
    /// Cursor in seconds while no stream is live.
    idle_cursor: f64,
    shared: Arc<Shared>,
    stream: Option<cpal::Stream>,
    commands: Option<Producer<Command>>,
    last_position_report: Option<Instant>,
    pending: Vec<EngineEvent>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            buffer: None,
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            looping: false,
            idle_cursor: 0.0,
            shared: Arc::new(Shared {
                position: AtomicU64::new(0),
                finished: AtomicBool::new(false),
                error: Mutex::new(None),
            }),
            stream: None,
            commands: None,
            last_position_report: None,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Duration of the loaded buffer, seconds. Zero when nothing is loaded.
    pub fn duration(&self) -> f64 {
        match &self.buffer {
            Some(buffer) => buffer.len() as f64 / self.sample_rate as f64,
            None => 0.0,
        }
    }

    /// Replaces the loaded buffer. Stops any running stream and rewinds.
    pub fn load(&mut self, buffer: AudioBuffer) {
        self.teardown();
        self.sample_rate = buffer.sample_rate;
        self.buffer = Some(Arc::new(buffer.samples));
        self.idle_cursor = 0.0;
        info!(
            samples = self.buffer.as_ref().map_or(0, |b| b.len()),
            sample_rate = self.sample_rate,
            "buffer loaded"
        );
    }

    /// Starts playback from `start` seconds. Any running stream is replaced.
    pub fn play(&mut self, start: f64) -> EngineResult<()> {
        let buffer = match &self.buffer {
            Some(buffer) if !buffer.is_empty() => buffer.clone(),
            _ => return Err(EngineError::EmptyInput),
        };
        self.teardown();

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::device("no default output device"))?;
        let config = device
            .default_output_config()
            .map_err(EngineError::device)?;
        let channels = config.channels() as usize;
        let device_rate = config.sample_rate().0 as f64;

        let start_sample = ((start.max(0.0) * self.sample_rate as f64) as usize)
            .min(buffer.len().saturating_sub(1));
        self.shared.position.store(start_sample as u64, Ordering::Relaxed);
        self.shared.finished.store(false, Ordering::Relaxed);
        if let Ok(mut slot) = self.shared.error.lock() {
            *slot = None;
        }

        let (producer, mut consumer) = RingBuffer::<Command>::new(COMMAND_QUEUE_CAP);

        let shared = self.shared.clone();
        // Buffer samples advanced per device frame; handles 22050 under a
        // 44100/48000 device with nearest-neighbor lookup.
        let step = self.sample_rate as f64 / device_rate;
        let mut cursor = start_sample as f64;
        let mut looping = self.looping;
        let mut done = false;

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    while let Ok(command) = consumer.pop() {
                        match command {
                            Command::Seek(sample) => {
                                cursor = sample.min(buffer.len() - 1) as f64;
                                done = false;
                            }
                            Command::SetLooping(on) => looping = on,
                        }
                    }

                    for frame in data.chunks_mut(channels) {
                        if cursor as usize >= buffer.len() {
                            if looping {
                                cursor -= buffer.len() as f64;
                            } else {
                                done = true;
                            }
                        }
                        let sample = if done { 0.0 } else { buffer[cursor as usize] };
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                        if !done {
                            cursor += step;
                        }
                    }

                    shared
                        .position
                        .store((cursor as u64).min(buffer.len() as u64), Ordering::Relaxed);
                    if done {
                        shared.finished.store(true, Ordering::Relaxed);
                    }
                },
                {
                    let shared = self.shared.clone();
                    move |err| {
                        warn!(%err, "audio stream error");
                        if let Ok(mut slot) = shared.error.lock() {
                            slot.get_or_insert_with(|| err.to_string());
                        }
                    }
                },
                None,
            )
            .map_err(EngineError::device)?;
        stream.play().map_err(EngineError::device)?;

        info!(start, channels, device_rate, "playback started");
        self.stream = Some(stream);
        self.commands = Some(producer);
        self.state = PlaybackState::Playing;
        self.last_position_report = None;
        self.pending.push(EngineEvent::PlaybackStarted);
        Ok(())
    }

    /// Pauses a playing stream; no-op in any other state.
    pub fn pause(&mut self) -> EngineResult<()> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        if let Some(stream) = &self.stream {
            stream.pause().map_err(EngineError::device)?;
        }
        self.state = PlaybackState::Paused;
        self.pending.push(EngineEvent::PlaybackPaused);
        Ok(())
    }

    /// Resumes a paused stream; no-op in any other state.
    pub fn resume(&mut self) -> EngineResult<()> {
        if self.state != PlaybackState::Paused {
            return Ok(());
        }
        if let Some(stream) = &self.stream {
            stream.play().map_err(EngineError::device)?;
        }
        self.state = PlaybackState::Playing;
        self.pending.push(EngineEvent::PlaybackResumed);
        Ok(())
    }

    /// Stops playback and rewinds to zero. The buffer stays loaded.
    pub fn stop(&mut self) {
        let was_active = self.state != PlaybackState::Idle;
        self.teardown();
        self.idle_cursor = 0.0;
        if was_active {
            self.pending.push(EngineEvent::PlaybackStopped);
        }
    }

    /// Moves the playback cursor to `seconds`, clamped to the buffer. Works
    /// in every state; a running stream jumps without being rebuilt.
    pub fn seek(&mut self, seconds: f64) {
        let duration = self.duration();
        let target = seconds.clamp(0.0, duration);
        let sample = (target * self.sample_rate as f64) as usize;

        if let Some(commands) = &mut self.commands {
            if commands.push(Command::Seek(sample)).is_err() {
                warn!("command queue full, seek dropped");
            }
        } else {
            self.idle_cursor = target;
        }
    }

    pub fn set_looping(&mut self, on: bool) {
        self.looping = on;
        if let Some(commands) = &mut self.commands {
            if commands.push(Command::SetLooping(on)).is_err() {
                warn!("command queue full, loop toggle dropped");
            }
        }
    }

    /// Best estimate of the current cursor, seconds.
    pub fn position(&self) -> f64 {
        if self.stream.is_some() {
            self.shared.position.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
        } else {
            self.idle_cursor
        }
    }

    /// Drains state changes into engine events. Call once per frame: this is
    /// where end-of-buffer is noticed and `PositionChanged` is throttled.
    pub fn poll(&mut self) -> Vec<EngineEvent> {
        let mut events = std::mem::take(&mut self.pending);

        if self.state != PlaybackState::Idle {
            let error = self
                .shared
                .error
                .lock()
                .ok()
                .and_then(|mut slot| slot.take());
            if let Some(message) = error {
                self.teardown();
                events.push(EngineEvent::PlaybackError(message));
                events.push(EngineEvent::PlaybackStopped);
                return events;
            }
        }

        if self.state != PlaybackState::Idle && self.shared.finished.load(Ordering::Relaxed) {
            self.teardown();
            self.idle_cursor = 0.0;
            events.push(EngineEvent::PlaybackStopped);
            return events;
        }

        if self.state == PlaybackState::Playing {
            let now = Instant::now();
            let due = self
                .last_position_report
                .map_or(true, |last| now.duration_since(last) >= POSITION_INTERVAL);
            if due {
                self.last_position_report = Some(now);
                events.push(EngineEvent::PositionChanged(self.position()));
            }
        }
        events
    }

    /// Drops the stream and command queue and returns to `Idle`, remembering
    /// the cursor where the stream left off.
    fn teardown(&mut self) {
        if self.stream.is_some() {
            self.idle_cursor = self.position();
        }
        self.stream = None;
        self.commands = None;
        self.state = PlaybackState::Idle;
        self.last_position_report = None;
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}
