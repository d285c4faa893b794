use std::fs;
use std::path::{Path, PathBuf};

use filly_compiler::compile::compile_directory;
use filly_compiler::preprocess::FileProvider;

/// Minimal real-filesystem [`FileProvider`]: reads bytes straight from disk,
/// relative to the current working directory. An embedding host is
/// expected to supply its own adapter (e.g. over an archive or a virtual
/// filesystem) — this one exists only so the binary has something to run.
struct DiskProvider;

impl FileProvider for DiskProvider {
    fn read(&self, path: &Path) -> Result<Vec<u8>, String> {
        fs::read(path).map_err(|err| err.to_string())
    }
}

/// Every `.TFY` file directly inside `dir`, in directory-listing order.
fn tfy_files_in(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();
    let entries = fs::read_dir(dir).map_err(|err| format!("cannot read {}: {err}", dir.display()))?;
    for entry in entries {
        let entry = entry.map_err(|err| err.to_string())?;
        let path = entry.path();
        let is_tfy = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tfy"));
        if is_tfy {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mut dir = None;
    let mut debug = false;
    for arg in &mut args {
        if arg == "--debug" {
            debug = true;
        } else {
            dir = Some(PathBuf::from(arg));
        }
    }
    let dir = match dir {
        Some(dir) => dir,
        None => {
            eprintln!("Usage: fillyc [--debug] <script-directory>");
            std::process::exit(1);
        }
    };

    let paths = tfy_files_in(&dir).unwrap_or_else(|err| {
        eprintln!("{err}");
        std::process::exit(1);
    });

    if paths.is_empty() {
        eprintln!("no .TFY files found in {}", dir.display());
        std::process::exit(1);
    }

    let path_refs: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
    let provider = DiskProvider;
    let result = compile_directory(&provider, &path_refs, debug);

    for error in &result.errors {
        eprintln!("{error}");
    }

    if result.opcodes.is_empty() && !result.errors.is_empty() {
        std::process::exit(1);
    }

    println!(
        "compiled {} opcodes from {} file(s)",
        result.opcodes.len(),
        paths.len()
    );
}
