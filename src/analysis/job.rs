//! Worker-thread analysis futures.
//!
//! A decomposition of a long recording can cost more than a frame interval,
//! so the engine runs it off the UI thread and hands back a pollable job.
//! The host loop calls [`AnalysisJob::poll_events`] each frame: progress
//! events stream out as the worker advances, and exactly one completion (or
//! error) event arrives at the end. Cancellation is cooperative and silent:
//! the worker checks a flag between stages and a cancelled job emits nothing,
//! leaving the consumer's previous result in place.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::debug;

use crate::error::EngineError;
use crate::event::EngineEvent;

use super::peaks::{AnalysisOptions, AnalysisOutcome};
use super::spectrum::SpectralAnalyzer;

/// A running (or finished) worker-thread decomposition.
pub struct AnalysisJob {
    progress: Arc<AtomicU8>,
    cancel: Arc<AtomicBool>,
    receiver: Receiver<Result<AnalysisOutcome, EngineError>>,
    handle: Option<JoinHandle<()>>,
    last_reported: Option<u8>,
    finished: bool,
}

/// Spawns a decomposition of `samples` on a worker thread.
pub fn spawn_decompose(
    samples: Vec<f32>,
    sample_rate: u32,
    options: AnalysisOptions,
) -> AnalysisJob {
    spawn_with_cancel(samples, sample_rate, options, Arc::new(AtomicBool::new(false)))
}

fn spawn_with_cancel(
    samples: Vec<f32>,
    sample_rate: u32,
    options: AnalysisOptions,
    cancel: Arc<AtomicBool>,
) -> AnalysisJob {
    let progress = Arc::new(AtomicU8::new(0));
    let (sender, receiver) = channel();

    let worker_progress = progress.clone();
    let worker_cancel = cancel.clone();
    let handle = std::thread::spawn(move || {
        let checkpoint = |pct: u8| -> Result<(), EngineError> {
            if worker_cancel.load(Ordering::Relaxed) {
                return Err(EngineError::Cancelled);
            }
            worker_progress.store(pct, Ordering::Relaxed);
            Ok(())
        };

        let result = (|| {
            checkpoint(5)?;
            let mut analyzer = SpectralAnalyzer::new();
            checkpoint(20)?;
            let outcome = analyzer.decompose(&samples, sample_rate, &options)?;
            checkpoint(90)?;
            Ok(outcome)
        })();

        if result.is_ok() {
            worker_progress.store(100, Ordering::Relaxed);
        }
        // The receiver may already be gone; nothing to do then.
        let _ = sender.send(result);
    });

    AnalysisJob {
        progress,
        cancel,
        receiver,
        handle: Some(handle),
        last_reported: None,
        finished: false,
    }
}

impl AnalysisJob {
    /// Current progress, 0..=100.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Relaxed)
    }

    /// Requests cancellation. The worker stops at its next checkpoint; any
    /// partial result is discarded without a notification.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drains progress and completion into engine events. Call once per
    /// frame from the UI loop.
    pub fn poll_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        let pct = self.progress();
        if self.last_reported != Some(pct) {
            self.last_reported = Some(pct);
            events.push(EngineEvent::AnalysisProgress(pct));
        }

        match self.receiver.try_recv() {
            Ok(Ok(outcome)) => {
                self.finished = true;
                events.push(EngineEvent::AnalysisCompleted(outcome.partials));
            }
            Ok(Err(EngineError::Cancelled)) => {
                // Silent by contract.
                debug!("analysis cancelled");
                self.finished = true;
            }
            Ok(Err(error)) => {
                self.finished = true;
                events.push(EngineEvent::AnalysisError(error.to_string()));
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                events.push(EngineEvent::AnalysisError(
                    "analysis worker disappeared".to_string(),
                ));
            }
        }

        if self.finished {
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
        events
    }

    /// Blocks until the worker finishes. Test and batch helper; the UI path
    /// uses [`poll_events`](Self::poll_events).
    pub fn wait(mut self) -> Result<AnalysisOutcome, EngineError> {
        let result = self
            .receiver
            .recv()
            .map_err(|_| EngineError::Cancelled)
            .and_then(|r| r);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.finished = true;
        result
    }
}
