//! # Preprocessor
//!
//! Resolves `#include "path"` directives before the lexer ever sees the
//! source, producing a single concatenated source string per compiled
//! entry plus a source map back to the originating file and line.
//!
//! ## Cycle detection
//!
//! Cycles are detected per include *chain*, not globally: file `a` may
//! legally be `#include`d by both `b` and `c` as long as neither `b` nor
//! `c` is itself reachable from `a`. A global "already seen" set would
//! reject that legitimate diamond-shaped include graph.

pub mod sjis;

#[cfg(test)]
mod tests;

use crate::error::{CompileError, Phase, Position};
use log::{debug, trace};
use std::path::{Path, PathBuf};

/// Supplies raw file bytes by path. Implemented by a filesystem-backed
/// provider in normal use and by an in-memory map in tests.
pub trait FileProvider {
    fn read(&self, path: &Path) -> Result<Vec<u8>, String>;
}

/// One line of the concatenated, preprocessed source, with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMapEntry {
    pub file: PathBuf,
    pub original_line: usize,
}

pub struct PreprocessResult {
    pub source: String,
    pub source_map: Vec<SourceMapEntry>,
    /// Every file actually read, in the order `#include` expanded them.
    /// A file reachable via more than one chain appears once per chain —
    /// this mirrors the source semantics of literal textual substitution,
    /// not a deduplicated "files this compile touched" set.
    pub included_files: Vec<PathBuf>,
    pub errors: Vec<CompileError>,
}

const INCLUDE_DIRECTIVE: &str = "#include";

/// Preprocess `entry_path`, following `#include` directives relative to the
/// including file's directory.
#[must_use]
pub fn preprocess(provider: &dyn FileProvider, entry_path: &Path) -> PreprocessResult {
    debug!("preprocess: starting at {}", entry_path.display());
    let mut source = String::new();
    let mut source_map = Vec::new();
    let mut included_files = Vec::new();
    let mut errors = Vec::new();
    let mut chain = Vec::new();

    expand_file(
        provider,
        entry_path,
        &mut chain,
        &mut source,
        &mut source_map,
        &mut included_files,
        &mut errors,
    );

    debug!(
        "preprocess: finished at {} ({} file(s) included, {} error(s))",
        entry_path.display(),
        included_files.len(),
        errors.len()
    );

    PreprocessResult {
        source,
        source_map,
        included_files,
        errors,
    }
}

fn expand_file(
    provider: &dyn FileProvider,
    path: &Path,
    chain: &mut Vec<PathBuf>,
    out: &mut String,
    source_map: &mut Vec<SourceMapEntry>,
    included_files: &mut Vec<PathBuf>,
    errors: &mut Vec<CompileError>,
) {
    trace!("preprocess: expanding {}", path.display());
    let canonical = normalize(path);

    if chain.contains(&canonical) {
        errors.push(CompileError::new(
            Phase::Preprocess,
            format!(
                "circular #include: {} is already in the include chain",
                canonical.display()
            ),
            Position::new(0, 0),
        ));
        return;
    }

    let bytes = match provider.read(path) {
        Ok(bytes) => bytes,
        Err(message) => {
            errors.push(CompileError::new(
                Phase::Preprocess,
                format!("cannot read {}: {message}", path.display()),
                Position::new(0, 0),
            ));
            return;
        }
    };

    let text = match sjis::decode(&bytes) {
        Ok(text) => text,
        Err(sjis::DecodeError { byte_offset }) => {
            let (line, col) = byte_position(&bytes, byte_offset);
            errors.push(CompileError::new(
                Phase::Preprocess,
                format!(
                    "{}: invalid Shift-JIS byte sequence at byte offset {byte_offset}",
                    path.display()
                ),
                Position::new(line, col),
            ));
            return;
        }
    };

    chain.push(canonical);
    included_files.push(path.to_path_buf());

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        if let Some(rest) = line.trim_start().strip_prefix(INCLUDE_DIRECTIVE) {
            match parse_include_target(rest) {
                Some(target) => {
                    let included = path
                        .parent()
                        .map(|dir| dir.join(&target))
                        .unwrap_or_else(|| PathBuf::from(&target));
                    expand_file(
                        provider,
                        &included,
                        chain,
                        out,
                        source_map,
                        included_files,
                        errors,
                    );
                }
                None => {
                    errors.push(CompileError::new(
                        Phase::Preprocess,
                        "malformed #include directive: expected #include \"path\"",
                        Position::new(line_no, 1),
                    ));
                }
            }
        } else {
            out.push_str(line);
            out.push('\n');
            source_map.push(SourceMapEntry {
                file: path.to_path_buf(),
                original_line: line_no,
            });
        }
    }

    chain.pop();
}

fn parse_include_target(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// 1-indexed `(line, column)` of `offset` within the raw, not-yet-decoded
/// `bytes`. Shift-JIS is ASCII-transparent for `\n`, so counting raw bytes
/// is safe even though the source hasn't decoded successfully yet.
fn byte_position(bytes: &[u8], offset: usize) -> (usize, usize) {
    let prefix = &bytes[..offset.min(bytes.len())];
    let line = 1 + prefix.iter().filter(|&&b| b == b'\n').count();
    let col = match prefix.iter().rposition(|&b| b == b'\n') {
        Some(last_newline) => offset - last_newline,
        None => offset + 1,
    };
    (line, col)
}

fn normalize(path: &Path) -> PathBuf {
    // Best-effort normalization without touching the filesystem: collapse
    // `.` and `..` components so two spellings of the same include path
    // are recognized as the same chain entry.
    let mut out = PathBuf::new();
    for component in path.components() {
        use std::path::Component;
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
