//! # Event Queue
//!
//! Ticks and end-of-playback notifications produced by
//! [`crate::midi::sync::MidiSynchronizer`] are queued here rather than
//! delivered by callback, so the consumer can drain them at its own pace
//! (once per script-engine frame) instead of being called back from
//! whatever thread is driving playback.

use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The MIDI-tick-driven clock advanced to this script tick.
    MidiTime { script_tick: u64 },
    /// The MIDI file reached its end.
    MidiEnd,
    /// A plain wall-clock tick, independent of MIDI playback.
    Time { script_tick: u64 },
}

#[derive(Default)]
pub struct EventQueue {
    inner: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.inner.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<Event> {
        self.inner.lock().pop_front()
    }

    /// Drain every currently-queued event, in order.
    pub fn drain(&self) -> Vec<Event> {
        self.inner.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
