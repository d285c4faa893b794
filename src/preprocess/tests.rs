#[cfg(test)]
mod tests {
    use crate::preprocess::{preprocess, FileProvider};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

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

    #[test]
    fn single_file_passes_through() {
        let p = provider(&[("main.fly", "mes(\"hi\");\n")]);
        let result = preprocess(&p, Path::new("main.fly"));
        assert!(result.errors.is_empty());
        assert_eq!(result.source, "mes(\"hi\");\n");
    }

    #[test]
    fn include_is_inlined_in_place() {
        let p = provider(&[
            ("main.fly", "#include \"helper.fly\"\nmes(\"after\");\n"),
            ("helper.fly", "mes(\"from helper\");\n"),
        ]);
        let result = preprocess(&p, Path::new("main.fly"));
        assert!(result.errors.is_empty());
        assert_eq!(result.source, "mes(\"from helper\");\nmes(\"after\");\n");
    }

    #[test]
    fn include_path_is_relative_to_including_file() {
        let p = provider(&[
            ("dir/main.fly", "#include \"helper.fly\"\n"),
            ("dir/helper.fly", "mes(\"ok\");\n"),
        ]);
        let result = preprocess(&p, Path::new("dir/main.fly"));
        assert!(result.errors.is_empty());
        assert_eq!(result.source, "mes(\"ok\");\n");
    }

    #[test]
    fn diamond_include_is_not_a_cycle() {
        let p = provider(&[
            ("main.fly", "#include \"b.fly\"\n#include \"c.fly\"\n"),
            ("b.fly", "#include \"shared.fly\"\n"),
            ("c.fly", "#include \"shared.fly\"\n"),
            ("shared.fly", "mes(\"shared\");\n"),
        ]);
        let result = preprocess(&p, Path::new("main.fly"));
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(result.source.matches("shared").count(), 2);
    }

    #[test]
    fn self_include_cycle_is_an_error() {
        let p = provider(&[("a.fly", "#include \"a.fly\"\n")]);
        let result = preprocess(&p, Path::new("a.fly"));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn mutual_include_cycle_is_an_error() {
        let p = provider(&[
            ("a.fly", "#include \"b.fly\"\n"),
            ("b.fly", "#include \"a.fly\"\n"),
        ]);
        let result = preprocess(&p, Path::new("a.fly"));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn missing_include_target_is_an_error() {
        let p = provider(&[("a.fly", "#include \"missing.fly\"\n")]);
        let result = preprocess(&p, Path::new("a.fly"));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn malformed_include_directive_is_an_error() {
        let p = provider(&[("a.fly", "#include missing_quotes\n")]);
        let result = preprocess(&p, Path::new("a.fly"));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn invalid_shift_jis_bytes_fail_the_preprocess() {
        let mut bytes = HashMap::new();
        bytes.insert(PathBuf::from("a.fly"), vec![b'x', b'\n', 0xFD, 0xFE]);
        struct RawProvider(HashMap<PathBuf, Vec<u8>>);
        impl FileProvider for RawProvider {
            fn read(&self, path: &Path) -> Result<Vec<u8>, String> {
                self.0
                    .get(path)
                    .cloned()
                    .ok_or_else(|| format!("no such file: {}", path.display()))
            }
        }
        let p = RawProvider(bytes);
        let result = preprocess(&p, Path::new("a.fly"));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].position.line, 2);
    }

    #[test]
    fn included_files_lists_every_expansion_in_order() {
        let p = provider(&[
            ("main.fly", "#include \"helper.fly\"\nmes(\"after\");\n"),
            ("helper.fly", "mes(\"from helper\");\n"),
        ]);
        let result = preprocess(&p, Path::new("main.fly"));
        assert_eq!(
            result.included_files,
            vec![PathBuf::from("main.fly"), PathBuf::from("helper.fly")],
        );
    }

    #[test]
    fn included_files_is_not_deduplicated_across_chains() {
        let p = provider(&[
            ("main.fly", "#include \"b.fly\"\n#include \"c.fly\"\n"),
            ("b.fly", "#include \"shared.fly\"\n"),
            ("c.fly", "#include \"shared.fly\"\n"),
            ("shared.fly", "mes(\"shared\");\n"),
        ]);
        let result = preprocess(&p, Path::new("main.fly"));
        let shared_count = result
            .included_files
            .iter()
            .filter(|f| *f == &PathBuf::from("shared.fly"))
            .count();
        assert_eq!(shared_count, 2);
    }

    #[test]
    fn source_map_tracks_original_file_and_line() {
        let p = provider(&[
            ("main.fly", "#include \"helper.fly\"\nmes(\"after\");\n"),
            ("helper.fly", "mes(\"from helper\");\n"),
        ]);
        let result = preprocess(&p, Path::new("main.fly"));
        assert_eq!(result.source_map[0].file, PathBuf::from("helper.fly"));
        assert_eq!(result.source_map[0].original_line, 1);
        assert_eq!(result.source_map[1].file, PathBuf::from("main.fly"));
        assert_eq!(result.source_map[1].original_line, 2);
    }
}
