//! # Entry-Point Resolver
//!
//! Locates the `main` function across every compiled file and orders the
//! compiled unit so that the file defining `main` comes first.
//!
//! ## Matching rule
//!
//! The match is case-insensitive over ASCII only (`main`, `Main`, `MAIN`
//! all match; non-ASCII case folding is out of scope — script source is
//! Shift-JIS-origin text and Japanese identifiers have no case to fold).
//!
//! Zero matches across the whole compiled set, or more than one match
//! (whether in the same file or spread across files), is an error: a
//! program needs exactly one entry point.

use crate::error::{CompileError, Phase, Position};
use crate::parser::ast::Statement;

/// One located `main`-like function definition.
pub struct MainCandidate<'a> {
    pub file_index: usize,
    pub statement: &'a Statement,
}

/// Find every top-level function definition in `files` whose name is an
/// ASCII case-insensitive match for `main`, and reorder `files` so the file
/// containing the sole match comes first.
///
/// `files` is a list of `(file_name, statements)` pairs, one per compiled
/// source file, in discovery order.
pub fn resolve_entry_point(
    files: &[(String, Vec<Statement>)],
) -> Result<Vec<usize>, CompileError> {
    let mut matches: Vec<(usize, usize)> = Vec::new(); // (file_index, line)

    for (file_index, (_, statements)) in files.iter().enumerate() {
        for stmt in statements {
            if let Statement::FunctionDef { name, line, .. } = stmt {
                if name.eq_ignore_ascii_case("main") {
                    matches.push((file_index, *line));
                }
            }
        }
    }

    match matches.len() {
        0 => Err(CompileError::new(
            Phase::EntryPoint,
            "no 'main' function found in any compiled file",
            Position::new(0, 0),
        )),
        1 => {
            let (main_file, _) = matches[0];
            let mut order = Vec::with_capacity(files.len());
            order.push(main_file);
            order.extend((0..files.len()).filter(|&i| i != main_file));
            Ok(order)
        }
        _ => {
            let locations: Vec<String> = matches
                .iter()
                .map(|(file_index, line)| format!("{}:{}", files[*file_index].0, line))
                .collect();
            Err(CompileError::new(
                Phase::EntryPoint,
                format!(
                    "multiple 'main' functions found: {}",
                    locations.join(", ")
                ),
                Position::new(0, 0),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn statements(src: &str) -> Vec<Statement> {
        let lexed = tokenize(src);
        assert!(lexed.errors.is_empty());
        parse(&lexed.tokens).program.statements
    }

    #[test]
    fn finds_single_main() {
        let files = vec![
            ("helpers.fly".to_string(), statements("function helper() { return 1; }")),
            ("main.fly".to_string(), statements("function main() { return 0; }")),
        ];
        let order = resolve_entry_point(&files).unwrap();
        assert_eq!(order[0], 1);
        assert_eq!(order[1], 0);
    }

    #[test]
    fn ordering_is_stable_when_main_is_the_last_file() {
        let files = vec![
            ("a.fly".to_string(), statements("function a() { return 1; }")),
            ("b.fly".to_string(), statements("function b() { return 2; }")),
            ("main.fly".to_string(), statements("function main() { return 0; }")),
        ];
        let order = resolve_entry_point(&files).unwrap();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn matches_case_insensitively() {
        let files = vec![("a.fly".to_string(), statements("function MAIN() { return 0; }"))];
        assert!(resolve_entry_point(&files).is_ok());
    }

    #[test]
    fn errors_on_zero_matches() {
        let files = vec![("a.fly".to_string(), statements("function helper() { return 1; }"))];
        assert!(resolve_entry_point(&files).is_err());
    }

    #[test]
    fn errors_on_multiple_matches_across_files() {
        let files = vec![
            ("a.fly".to_string(), statements("function main() { return 1; }")),
            ("b.fly".to_string(), statements("function main() { return 2; }")),
        ];
        let err = resolve_entry_point(&files).unwrap_err();
        assert!(err.message.contains("multiple"));
    }

    #[test]
    fn errors_on_multiple_matches_same_file() {
        let files = vec![(
            "a.fly".to_string(),
            statements("function main() { return 1; } function main() { return 2; }"),
        )];
        assert!(resolve_entry_point(&files).is_err());
    }
}
