//! # FILLY/TFY Compiler & MIDI Tempo Synchronizer
//!
//! The compilation front-end and MIDI tempo synchronizer for a retro
//! event-driven scripting runtime. This crate covers only the two hardest
//! parts of that runtime:
//!
//! 1. A **compiler** — preprocessor, lexer, parser, and opcode emitter —
//!    that turns a directory of Shift-JIS `.TFY` script files into a flat
//!    opcode stream, resolving a single `main` entry point across files.
//! 2. A **MIDI tempo synchronizer** that converts audio-stream sample
//!    positions into script-visible `MIDI_TIME`/`MIDI_END` events while
//!    honoring intra-file tempo changes.
//!
//! The graphics subsystem, the VM interpreter loop, the audio renderer
//! itself, and CLI/file-system wiring beyond the [`preprocess::FileProvider`]
//! trait are external collaborators this crate does not implement.
//!
//! ## Compiler pipeline
//!
//! ```text
//! FileProvider -> preprocess -> lexer -> parser -> AST -> emit -> Vec<Opcode>
//! ```
//!
//! [`compile::compile_directory`] drives the whole pipeline across a set of
//! files and resolves the `main` entry point; the individual phases are
//! also exposed directly for callers that want finer control.
//!
//! ## Synchronizer
//!
//! [`midi::MidiSynchronizer`] drives one render-backed [`midi::AudioStream`]
//! and pushes events onto a shared [`midi::EventQueue`] as playback
//! advances, independent of the compiler pipeline above.

pub mod compile;
pub mod emit;
pub mod entry;
pub mod error;
pub mod lexer;
pub mod midi;
pub mod parser;
pub mod preprocess;
