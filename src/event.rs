//! Engine -> consumer notifications.
//!
//! The engine never pushes into a GUI framework; it emits plain events that
//! the host loop drains or receives through a registered listener. All
//! listeners run synchronously on the caller's thread.

use crate::analysis::AnalyzedPartial;
use crate::scene::RatioPreset;

/// A notification emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Any scene mutation that actually changed a value.
    ParamsChanged,
    /// A ratio preset resolved successfully.
    RatioChanged(RatioPreset),
    /// Worker-thread analysis progress, 0..=100.
    AnalysisProgress(u8),
    /// Analysis finished with the decomposed partials.
    AnalysisCompleted(Vec<AnalyzedPartial>),
    /// Analysis failed.
    AnalysisError(String),
    PlaybackStarted,
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    /// Best estimate of the current playback time, seconds. Throttled to at
    /// most one per 100 ms.
    PositionChanged(f64),
    PlaybackError(String),
}

/// A synchronous listener list. Single writer, UI-thread only.
#[derive(Default)]
pub struct Listeners {
    subscribers: Vec<Box<dyn FnMut(&EngineEvent)>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + 'static) {
        self.subscribers.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: &EngineEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_receive_events_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::new();

        for tag in ["a", "b"] {
            let seen = seen.clone();
            listeners.subscribe(move |event| {
                seen.borrow_mut().push((tag, event.clone()));
            });
        }

        listeners.emit(&EngineEvent::ParamsChanged);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "a");
        assert_eq!(seen[1].0, "b");
    }
}
