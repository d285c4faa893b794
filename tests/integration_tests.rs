//! End-to-end scenarios exercising the whole compiler pipeline
//! (preprocess -> lex -> parse -> entry resolution -> emit) and the MIDI
//! synchronizer together, the way an embedding host actually calls them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filly_compiler::compile::compile_directory;
use filly_compiler::emit::opcode::Opcode;
use filly_compiler::midi::smf::DEFAULT_MICROS_PER_QUARTER;
use filly_compiler::midi::{Event, EventQueue, MidiSynchronizer, PlaybackError, StubAudioStream};
use filly_compiler::preprocess::FileProvider;

struct MapProvider(HashMap<PathBuf, Vec<u8>>);

impl FileProvider for MapProvider {
    fn read(&self, path: &Path) -> Result<Vec<u8>, String> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| format!("no such file: {}", path.display()))
    }
}

fn provider(files: &[(&str, &str)]) -> MapProvider {
    MapProvider(
        files
            .iter()
            .map(|(p, s)| (PathBuf::from(p), s.as_bytes().to_vec()))
            .collect(),
    )
}

// S3 — multi-file main resolution.
#[test]
fn multi_file_main_resolution() {
    let p = provider(&[
        ("helper.tfy", "function helper() { x = 1; }"),
        ("main.tfy", "function main() { helper(); }"),
        ("utils.tfy", "function utils() { y = 2; }"),
    ]);
    let paths = [
        Path::new("helper.tfy"),
        Path::new("main.tfy"),
        Path::new("utils.tfy"),
    ];
    let result = compile_directory(&p, &paths, false);
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);

    match &result.opcodes[0] {
        Opcode::DefineFunction { name, .. } => assert_eq!(name, "main"),
        other => panic!("expected main function first, got {other:?}"),
    }
    assert_eq!(result.opcodes.len(), 3);
}

#[test]
fn multi_file_multiple_mains_is_an_error_naming_both() {
    let p = provider(&[
        ("main.tfy", "function main() { y = 2; }"),
        ("main2.tfy", "function main() { y = 3; }"),
    ]);
    let paths = [Path::new("main.tfy"), Path::new("main2.tfy")];
    let result = compile_directory(&p, &paths, false);
    assert!(result.opcodes.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("main.tfy"));
    assert!(result.errors[0].message.contains("main2.tfy"));
}

// S4 — main case-insensitivity.
#[test]
fn main_is_found_regardless_of_case() {
    for spelling in ["main", "MAIN", "Main", "MaIn"] {
        let src = format!("function {spelling}() {{ return; }}");
        let p = provider(&[("a.tfy", &src)]);
        let result = compile_directory(&p, &[Path::new("a.tfy")], false);
        assert!(
            result.errors.is_empty(),
            "{spelling}: errors: {:?}",
            result.errors
        );
        assert_eq!(result.opcodes.len(), 1, "{spelling} was not found as main");
    }
}

#[test]
fn include_directive_is_expanded_before_the_main_search() {
    let p = provider(&[
        ("main.tfy", "#include \"shared.tfy\"\nfunction main() { shared(); }"),
        ("shared.tfy", "function shared() { x = 1; }"),
    ]);
    let result = compile_directory(&p, &[Path::new("main.tfy")], false);
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.opcodes.len(), 2);
}

// S2-shaped: parser recovery collects more than one error in a single pass
// and still lets the entry-point search run on the partial AST.
#[test]
fn parser_recovers_across_multiple_statement_errors() {
    let p = provider(&[(
        "main.tfy",
        "function main() {\n    x = ;\n    y = ;\n}",
    )]);
    let result = compile_directory(&p, &[Path::new("main.tfy")], false);
    assert!(result.errors.len() >= 2, "errors: {:?}", result.errors);
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

fn smf_with_tempo_change() -> Vec<u8> {
    // S5: first tempo event at MIDI tick 100; a tick-0 entry must be
    // synthesized ahead of it.
    let mut events = vlq(100);
    events.extend_from_slice(&[0xFF, 0x51, 0x03]);
    events.extend_from_slice(&1_000_000u32.to_be_bytes()[1..]);
    events.extend(vlq(0));
    events.extend_from_slice(&[0xFF, 0x2F, 0x00]);

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

// S5 — tempo map synthesizes tick 0 ahead of a later first tempo event.
#[test]
fn tempo_map_extraction_synthesizes_tick_zero() {
    let data = filly_compiler::midi::smf::read_smf(&smf_with_tempo_change()).unwrap();
    assert_eq!(data.tempo_changes[0].tick, 0);
    assert_eq!(data.tempo_changes[0].micros_per_quarter, DEFAULT_MICROS_PER_QUARTER);
    assert_eq!(data.tempo_changes[1].tick, 100);
}

// S8-shaped: full play/tick/replace lifecycle through the public
// MidiSynchronizer API, exercising both PlaybackError kinds and the event
// queue together.
#[test]
fn synchronizer_lifecycle_end_to_end() {
    let mut bytes = HashMap::new();
    bytes.insert(PathBuf::from("song.mid"), smf_with_tempo_change());
    let provider = MapProvider(bytes);

    let events = Arc::new(EventQueue::new());
    let sync = MidiSynchronizer::new(events.clone());

    let no_sf_err = sync
        .play(&provider, Path::new("song.mid"), false, 10.0, Box::new(StubAudioStream::new()))
        .unwrap_err();
    assert_eq!(no_sf_err, PlaybackError::NoSoundFont);

    let missing_err = sync
        .play(&provider, Path::new("nope.mid"), true, 10.0, Box::new(StubAudioStream::new()))
        .unwrap_err();
    assert!(matches!(missing_err, PlaybackError::MidiFileNotFound(_)));

    let mut stream = StubAudioStream::new();
    stream.advance(1.0);
    sync.play(&provider, Path::new("song.mid"), true, 30.0, Box::new(stream))
        .unwrap();
    sync.tick();

    let first_batch = events.drain();
    assert!(first_batch
        .iter()
        .all(|e| matches!(e, Event::MidiTime { .. })));

    // Replacing the playback resets the counter; ticking immediately after
    // emits nothing because no time has passed in the new stream.
    sync.play(
        &provider,
        Path::new("song.mid"),
        true,
        30.0,
        Box::new(StubAudioStream::new()),
    )
    .unwrap();
    sync.tick();
    assert!(events.is_empty());

    sync.stop();
    assert_eq!(sync.current_file(), None);
}
