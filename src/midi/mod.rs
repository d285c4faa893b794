//! # MIDI Tempo Synchronization
//!
//! Reads a Standard MIDI File's tempo map and exposes a sample-accurate
//! synchronizer that scripts can query for the current MIDI tick and
//! script tick while a MIDI-driven sequence plays back.

pub mod event;
pub mod smf;
pub mod sync;
pub mod tick;

pub use event::{Event, EventQueue};
pub use sync::{AudioStream, MidiSynchronizer, StubAudioStream, SynchronizerState};
pub use tick::TickCalculator;

use thiserror::Error;

/// Playback-time failures. Unlike [`crate::error::CompileError`], these do
/// not carry a source position — they describe the state of the outside
/// world (missing files, a malformed SMF container), not a location in a
/// script.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no SoundFont is loaded")]
    NoSoundFont,
    #[error("MIDI file not found: {0}")]
    MidiFileNotFound(String),
    #[error("malformed MIDI file: {0}")]
    MidiInvalidFormat(String),
}
