//! # Whole-Program Compilation
//!
//! Ties the individual phases ([`crate::preprocess`], [`crate::lexer`],
//! [`crate::parser`], [`crate::entry`], [`crate::emit`]) together across a
//! set of files, the way an embedding host actually wants to call this
//! crate: "compile this directory of `.TFY` files into one opcode stream."
//!
//! Each file is preprocessed and parsed independently (a file's own
//! `#include`s are resolved against it, per [`crate::preprocess`]), then
//! [`crate::entry::resolve_entry_point`] picks the file that owns `main`
//! and orders it first. Opcodes are emitted once, from the concatenated,
//! reordered statement lists — there is no per-file opcode stream.

use crate::emit;
use crate::emit::opcode::Opcode;
use crate::entry::resolve_entry_point;
use crate::error::CompileError;
use crate::lexer::tokenize;
use crate::parser::ast::{Program, Statement};
use crate::parser::parse;
use crate::preprocess::{preprocess, FileProvider};

use log::{debug, trace};
use std::path::Path;

pub struct CompileResult {
    pub opcodes: Vec<Opcode>,
    pub errors: Vec<CompileError>,
    /// Echoes the `debug` flag passed to [`compile_directory`]. Reserved
    /// for a future debug-info format; nothing in this crate reads it back.
    pub debug: bool,
}

/// Compile every file in `file_paths` and return one flat opcode stream
/// with the `main`-owning file's statements emitted first.
///
/// Lex/parse errors from every file are collected and attached to their
/// own file's preprocessed source for context, even if that file does not
/// end up being searched for `main`. A fatal preprocess or entry-point
/// error short-circuits emission: no opcodes are returned in that case.
///
/// `debug` is accepted and echoed back on [`CompileResult`] but otherwise
/// unused — reserved for a debug-info format this crate does not yet
/// define, per the compiler's `Debug` option being reserved-but-unused.
pub fn compile_directory(
    provider: &dyn FileProvider,
    file_paths: &[&Path],
    debug: bool,
) -> CompileResult {
    debug!("compile: starting over {} file(s)", file_paths.len());
    let mut errors = Vec::new();
    let mut files: Vec<(String, Vec<Statement>)> = Vec::with_capacity(file_paths.len());
    let mut any_fatal_preprocess_error = false;

    for path in file_paths {
        trace!("compile: preprocessing {}", path.display());
        let file_name = path.display().to_string();
        let preprocessed = preprocess(provider, path);

        if !preprocessed.errors.is_empty() {
            any_fatal_preprocess_error = true;
            errors.extend(preprocessed.errors);
            // No usable source for this file; still register it (with no
            // statements) so ordering by index stays consistent, and move on
            // to the next file rather than aborting the whole compile.
            files.push((file_name, Vec::new()));
            continue;
        }

        let lexed = tokenize(&preprocessed.source);
        errors.extend(
            lexed
                .errors
                .into_iter()
                .map(|e| e.with_context(&preprocessed.source)),
        );

        let parsed = parse(&lexed.tokens);
        errors.extend(
            parsed
                .errors
                .into_iter()
                .map(|e| e.with_context(&preprocessed.source)),
        );

        files.push((file_name, parsed.program.statements));
    }

    let order = match resolve_entry_point(&files) {
        Ok(order) => order,
        Err(entry_error) => {
            errors.push(entry_error);
            debug!("compile: no entry point, aborting before emission");
            return CompileResult {
                opcodes: Vec::new(),
                errors,
                debug,
            };
        }
    };

    if any_fatal_preprocess_error {
        // A compile that cannot fully resolve every file's source still
        // cannot be emitted, even if `main` itself happened to be found —
        // the emitted stream would silently omit a file's contents.
        debug!("compile: fatal preprocess error(s), aborting before emission");
        return CompileResult {
            opcodes: Vec::new(),
            errors,
            debug,
        };
    }

    let mut combined = Program::default();
    for file_index in order {
        combined.statements.extend(files[file_index].1.clone());
    }

    let emitted = emit::emit(&combined);
    errors.extend(emitted.errors);

    debug!(
        "compile: finished with {} opcode(s), {} error(s)",
        emitted.opcodes.len(),
        errors.len()
    );
    CompileResult {
        opcodes: emitted.opcodes,
        errors,
        debug,
    }
}
