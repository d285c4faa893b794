//! # MIDI Tempo Synchronizer
//!
//! Drives one render-backed [`AudioStream`] and emits `MIDI_TIME`/`MIDI_END`
//! events onto the shared [`EventQueue`] as playback advances.
//!
//! ## State machine
//!
//! `Idle -> Playing -> (Stopped | Ended) -> Idle`. At most one playback is
//! ever active: calling [`MidiSynchronizer::play`] from any state tears
//! down the previous [`AudioStream`] (if any) before starting the new one,
//! and resets the tick counter to zero.
//!
//! ## Locking discipline
//!
//! All synchronizer-owned state — the active session, the mute flag, the
//! state tag — lives behind one `parking_lot::Mutex` (`inner`). `tick()`,
//! `play()`, `stop()`, and `set_muted()` all acquire it; none of them block
//! on I/O while holding it except `play()`'s brief SMF parse. The injected
//! [`AudioStream`] carries its own internal locking on the renderer side —
//! this synchronizer never reaches into it except through the trait's
//! three methods, so the two locks are never nested in the same order
//! twice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::preprocess::FileProvider;

use super::event::{Event, EventQueue};
use super::smf::read_smf;
use super::tick::TickCalculator;
use super::PlaybackError;

/// Fixed output sample rate every sample-position conversion is anchored
/// to. The renderer is assumed to produce audio at this rate; rate
/// conversion for a differently-clocked source is the renderer's concern.
pub const SAMPLE_RATE: u32 = 44_100;

/// The renderer-facing handle a synchronizer drives. Implemented by the
/// embedding host; a `StubAudioStream` is provided for tests.
///
/// The synchronizer never renders audio itself — it only reads the
/// stream's position and tells it to mute or stop.
pub trait AudioStream: Send {
    /// Elapsed playback position, in seconds, since this stream started.
    fn position_seconds(&self) -> f64;
    /// Set the renderer's output gain to zero (`true`) or restore it.
    /// Muting never suppresses tick/end event emission.
    fn set_muted(&mut self, muted: bool);
    /// Tear down the stream. Idempotent: the renderer observes `stopped`
    /// and returns silence on every call after the first.
    fn stop(&mut self);
}

/// An in-memory, deterministic [`AudioStream`] for tests: its position
/// advances only when the test explicitly calls [`StubAudioStream::advance`],
/// rather than by wall-clock time.
#[derive(Debug, Default)]
pub struct StubAudioStream {
    position_seconds: f64,
    pub muted: bool,
    pub stopped: bool,
}

impl StubAudioStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, seconds: f64) {
        self.position_seconds += seconds;
    }
}

impl AudioStream for StubAudioStream {
    fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Coarse playback state, observable via [`MidiSynchronizer::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronizerState {
    Idle,
    Playing,
    Stopped,
    Ended,
}

struct Session {
    stream: Box<dyn AudioStream>,
    calculator: TickCalculator,
    duration_samples: u64,
    last_emitted_script_tick: u64,
    file: PathBuf,
}

struct Inner {
    state: SynchronizerState,
    session: Option<Session>,
    muted: bool,
}

/// At-most-one-active-playback tempo synchronizer. See the module docs for
/// the locking discipline and [`crate::midi`] for the wider event model.
pub struct MidiSynchronizer {
    inner: Mutex<Inner>,
    events: Arc<EventQueue>,
}

impl MidiSynchronizer {
    pub fn new(events: Arc<EventQueue>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SynchronizerState::Idle,
                session: None,
                muted: false,
            }),
            events,
        }
    }

    pub fn state(&self) -> SynchronizerState {
        self.inner.lock().state
    }

    pub fn current_file(&self) -> Option<PathBuf> {
        self.inner.lock().session.as_ref().map(|s| s.file.clone())
    }

    /// Start playing `path`'s MIDI tempo map, driving `stream` as the
    /// render-backed clock.
    ///
    /// Tears down any prior stream first, regardless of whether this call
    /// goes on to succeed — a failed `play` (missing SoundFont, missing
    /// file, malformed SMF) always leaves the synchronizer `Idle` rather
    /// than leaving a previous playback running untouched.
    ///
    /// `has_sound_font` stands in for "a SoundFont is currently loaded" —
    /// loading and parsing the `.sf2` itself is the renderer's job and out
    /// of scope here (see [`crate::midi`]). `duration_seconds` is the
    /// renderer's reported total playback length.
    pub fn play(
        &self,
        provider: &dyn FileProvider,
        path: &Path,
        has_sound_font: bool,
        duration_seconds: f64,
        stream: Box<dyn AudioStream>,
    ) -> Result<(), PlaybackError> {
        {
            let mut inner = self.inner.lock();
            if let Some(mut prev) = inner.session.take() {
                debug!("tearing down prior stream for {}", prev.file.display());
                prev.stream.stop();
            }
            inner.state = SynchronizerState::Idle;
        }

        if !has_sound_font {
            warn!("refusing to play {}: no SoundFont loaded", path.display());
            return Err(PlaybackError::NoSoundFont);
        }

        let bytes = provider
            .read(path)
            .map_err(|_| PlaybackError::MidiFileNotFound(path.display().to_string()))?;
        let smf = read_smf(&bytes)?;
        let calculator = TickCalculator::new(&smf, SAMPLE_RATE);
        let duration_samples = (duration_seconds.max(0.0) * SAMPLE_RATE as f64).round() as u64;

        let mut inner = self.inner.lock();
        let mut stream = stream;
        stream.set_muted(inner.muted);

        inner.session = Some(Session {
            stream,
            calculator,
            duration_samples,
            last_emitted_script_tick: 0,
            file: path.to_path_buf(),
        });
        inner.state = SynchronizerState::Playing;
        debug!("playing {} ({duration_samples} samples)", path.display());
        Ok(())
    }

    /// Idempotent: stopping an already-idle/stopped synchronizer is a no-op
    /// beyond tearing down any lingering stream.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if let Some(mut session) = inner.session.take() {
            session.stream.stop();
        }
        inner.state = SynchronizerState::Stopped;
    }

    /// Mute or unmute the active stream. Has no effect on event emission —
    /// `tick()` still advances and emits ticks while muted.
    pub fn set_muted(&self, muted: bool) {
        let mut inner = self.inner.lock();
        inner.muted = muted;
        if let Some(session) = inner.session.as_mut() {
            session.stream.set_muted(muted);
        }
    }

    /// Advance playback by one host-loop frame. Cheap and non-blocking: it
    /// only reads the stream's position and pushes queued events, never
    /// touching the filesystem.
    pub fn tick(&self) {
        let mut inner = self.inner.lock();
        if inner.state != SynchronizerState::Playing {
            return;
        }
        let Some(session) = inner.session.as_mut() else {
            return;
        };

        let position_seconds = session.stream.position_seconds();
        let sample = (position_seconds.max(0.0) * SAMPLE_RATE as f64).round() as u64;

        if sample >= session.duration_samples {
            trace!("playback of {} reached its end", session.file.display());
            self.events.push(Event::MidiEnd);
            inner.state = SynchronizerState::Ended;
            return;
        }

        let current_script_tick = session.calculator.script_tick_at_sample(sample);
        let last = session.last_emitted_script_tick;
        for script_tick in (last + 1)..=current_script_tick {
            self.events.push(Event::MidiTime { script_tick });
        }
        session.last_emitted_script_tick = current_script_tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::smf::DEFAULT_MICROS_PER_QUARTER;
    use std::collections::HashMap;

    struct MapProvider(HashMap<PathBuf, Vec<u8>>);

    impl FileProvider for MapProvider {
        fn read(&self, path: &Path) -> Result<Vec<u8>, String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| format!("no such file: {}", path.display()))
        }
    }

    fn vlq(mut value: u32) -> Vec<u8> {
        let mut stack = vec![(value & 0x7F) as u8];
        value >>= 7;
        while value > 0 {
            stack.push(((value & 0x7F) as u8) | 0x80);
            value >>= 7;
        }
        stack.reverse();
        stack
    }

    /// A minimal well-formed single-track SMF at 480 PPQ, constant 120 BPM.
    fn flat_smf_bytes() -> Vec<u8> {
        let mut events = vlq(0);
        events.extend_from_slice(&[0xFF, 0x51, 0x03]);
        events.extend_from_slice(&DEFAULT_MICROS_PER_QUARTER.to_be_bytes()[1..]);
        events.extend(vlq(0));
        events.extend_from_slice(&[0xFF, 0x2F, 0x00]); // end of track

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MThd");
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&480u16.to_be_bytes());
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(events.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&events);
        bytes
    }

    fn provider_with(path: &str) -> MapProvider {
        let mut map = HashMap::new();
        map.insert(PathBuf::from(path), flat_smf_bytes());
        MapProvider(map)
    }

    #[test]
    fn play_without_sound_font_refuses() {
        let sync = MidiSynchronizer::new(Arc::new(EventQueue::new()));
        let provider = provider_with("song.mid");
        let err = sync
            .play(
                &provider,
                Path::new("song.mid"),
                false,
                10.0,
                Box::new(StubAudioStream::new()),
            )
            .unwrap_err();
        assert_eq!(err, PlaybackError::NoSoundFont);
        assert_eq!(sync.state(), SynchronizerState::Idle);
    }

    #[test]
    fn play_with_missing_file_reports_not_found() {
        let sync = MidiSynchronizer::new(Arc::new(EventQueue::new()));
        let provider = MapProvider(HashMap::new());
        let err = sync
            .play(
                &provider,
                Path::new("missing.mid"),
                true,
                10.0,
                Box::new(StubAudioStream::new()),
            )
            .unwrap_err();
        assert!(matches!(err, PlaybackError::MidiFileNotFound(_)));
        assert_eq!(sync.state(), SynchronizerState::Idle);
    }

    #[test]
    fn failed_play_tears_down_a_prior_playing_session() {
        let sync = MidiSynchronizer::new(Arc::new(EventQueue::new()));
        let provider = provider_with("song.mid");
        sync.play(
            &provider,
            Path::new("song.mid"),
            true,
            10.0,
            Box::new(StubAudioStream::new()),
        )
        .unwrap();
        assert_eq!(sync.state(), SynchronizerState::Playing);

        let err = sync
            .play(
                &provider,
                Path::new("missing.mid"),
                true,
                10.0,
                Box::new(StubAudioStream::new()),
            )
            .unwrap_err();
        assert!(matches!(err, PlaybackError::MidiFileNotFound(_)));
        assert_eq!(sync.state(), SynchronizerState::Idle);
        assert!(sync.current_file().is_none());
    }

    #[test]
    fn tick_emits_midi_time_events_as_ticks_advance() {
        let events = Arc::new(EventQueue::new());
        let sync = MidiSynchronizer::new(events.clone());
        let provider = provider_with("song.mid");
        let mut stream = StubAudioStream::new();
        stream.advance(0.5); // one quarter note at 120 BPM
        sync.play(&provider, Path::new("song.mid"), true, 60.0, Box::new(stream))
            .unwrap();

        sync.tick();

        let drained = events.drain();
        assert!(!drained.is_empty());
        assert!(matches!(drained.last(), Some(Event::MidiTime { script_tick: 8 })));
        // Every tick in (0, 8] is present, strictly increasing, no gaps.
        let ticks: Vec<u64> = drained
            .iter()
            .map(|e| match e {
                Event::MidiTime { script_tick } => *script_tick,
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(ticks, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn tick_before_play_is_a_no_op() {
        let events = Arc::new(EventQueue::new());
        let sync = MidiSynchronizer::new(events.clone());
        sync.tick();
        assert!(events.is_empty());
    }

    #[test]
    fn reaching_duration_emits_exactly_one_midi_end() {
        let events = Arc::new(EventQueue::new());
        let sync = MidiSynchronizer::new(events.clone());
        let provider = provider_with("song.mid");
        let mut stream = StubAudioStream::new();
        stream.advance(2.0);
        sync.play(&provider, Path::new("song.mid"), true, 1.0, Box::new(stream))
            .unwrap();

        sync.tick();
        sync.tick();
        sync.tick();

        let drained = events.drain();
        let end_count = drained.iter().filter(|e| **e == Event::MidiEnd).count();
        assert_eq!(end_count, 1);
        assert_eq!(sync.state(), SynchronizerState::Ended);
    }

    #[test]
    fn replaying_resets_the_tick_counter() {
        let events = Arc::new(EventQueue::new());
        let sync = MidiSynchronizer::new(events.clone());
        let provider = provider_with("song.mid");

        // First playback advances well past a few script ticks.
        let mut stream = StubAudioStream::new();
        stream.advance(2.0);
        sync.play(&provider, Path::new("song.mid"), true, 60.0, Box::new(stream))
            .unwrap();
        sync.tick();
        let first_ticks = events.drain();
        assert!(!first_ticks.is_empty());

        // Replace with a fresh stream starting back at position 0 — ticking
        // it immediately must not emit (no time has passed since the reset).
        sync.play(
            &provider,
            Path::new("song.mid"),
            true,
            60.0,
            Box::new(StubAudioStream::new()),
        )
        .unwrap();
        sync.tick();
        assert!(events.is_empty());

        // Advancing a little after the reset starts the counter over at 1,
        // never continuing from the first playback's last tick.
        sync.set_muted(false); // no-op; exercises the control path post-replace
        sync.stop();
        sync.play(
            &provider,
            Path::new("song.mid"),
            true,
            60.0,
            Box::new({
                let mut s = StubAudioStream::new();
                s.advance(0.125);
                s
            }),
        )
        .unwrap();
        sync.tick();
        let drained = events.drain();
        assert_eq!(drained.first(), Some(&Event::MidiTime { script_tick: 1 }));
    }

    #[test]
    fn muting_does_not_suppress_tick_events() {
        let events = Arc::new(EventQueue::new());
        let sync = MidiSynchronizer::new(events.clone());
        let provider = provider_with("song.mid");
        let mut stream = StubAudioStream::new();
        stream.advance(0.25);
        sync.play(&provider, Path::new("song.mid"), true, 60.0, Box::new(stream))
            .unwrap();
        sync.set_muted(true);
        sync.tick();
        assert!(!events.is_empty());
    }

    #[test]
    fn stop_is_idempotent() {
        let sync = MidiSynchronizer::new(Arc::new(EventQueue::new()));
        sync.stop();
        sync.stop();
        assert_eq!(sync.state(), SynchronizerState::Stopped);
    }
}
