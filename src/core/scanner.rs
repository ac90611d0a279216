use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use tracing::{debug, info};

use crate::error::{CflowgraphError, Result};

/// Path substrings skipped regardless of user excludes (vendored trees
/// the analysis should never descend into).
const BUILTIN_EXCLUDES: &[&str] = &["site-packages"];

/// Extensions cflow can analyze.
const SOURCE_EXTENSIONS: &[&str] = &["c", "h"];

/// Default file the discovered path list is persisted to, so later
/// invocations can skip the walk.
pub const PATHS_FILE: &str = "c.files";

/// Discovers C source files under a root path.
pub struct SourceScanner {
    excludes: Vec<String>,
    use_builtin_excludes: bool,
}

impl SourceScanner {
    pub fn new(excludes: Vec<String>, use_builtin_excludes: bool) -> Self {
        Self {
            excludes,
            use_builtin_excludes,
        }
    }

    /// Walks `root` for `.c`/`.h` files, honoring `.gitignore` and the
    /// exclude lists.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        debug!("getting files from {}", root.display());

        let mut paths = Vec::new();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| CflowgraphError::FileSystem(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() || !has_source_extension(path) {
                continue;
            }
            if self.is_excluded(path) {
                debug!("skipping {}", path.display());
                continue;
            }
            paths.push(path.to_path_buf());
        }

        info!("found {} source files under {}", paths.len(), root.display());
        Ok(paths)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let parent = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.excludes.iter().any(|ex| parent.contains(ex.as_str())) {
            return true;
        }
        self.use_builtin_excludes && BUILTIN_EXCLUDES.iter().any(|ex| parent.contains(ex))
    }

    /// Persists the discovered list, one path per line.
    pub fn write_paths_file(paths: &[PathBuf], file: &Path) -> Result<()> {
        let lines: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        fs::write(file, lines.join("\n"))?;
        Ok(())
    }

    /// Loads a previously written path list.
    pub fn read_paths_file(file: &Path) -> Result<Vec<PathBuf>> {
        if !file.exists() {
            return Err(CflowgraphError::Config(format!(
                "file {} does not exist; provide --rootpath to scan for sources",
                file.display()
            )));
        }
        let content = fs::read_to_string(file)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::tempdir;

    use super::*;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(&path).unwrap();
        path
    }

    #[test]
    fn test_scan_picks_up_c_and_h_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/main.c");
        touch(dir.path(), "include/api.h");
        touch(dir.path(), "README.md");

        let scanner = SourceScanner::new(vec![], true);
        let mut found = scanner.scan(dir.path()).unwrap();
        found.sort();

        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["api.h", "main.c"]);
    }

    #[test]
    fn test_scan_honors_excludes() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/main.c");
        touch(dir.path(), "vendor/third_party.c");
        touch(dir.path(), "deps/site-packages/ffi.c");

        let scanner = SourceScanner::new(vec!["vendor".to_string()], true);
        let found = scanner.scan(dir.path()).unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("src/main.c"));
    }

    #[test]
    fn test_builtin_excludes_can_be_disabled() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "deps/site-packages/ffi.c");

        let scanner = SourceScanner::new(vec![], false);
        let found = scanner.scan(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_paths_file_round_trip() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("c.files");
        let paths = vec![PathBuf::from("/src/a.c"), PathBuf::from("/src/b.h")];

        SourceScanner::write_paths_file(&paths, &list).unwrap();
        assert_eq!(SourceScanner::read_paths_file(&list).unwrap(), paths);
    }

    #[test]
    fn test_missing_paths_file_is_a_config_error() {
        let err = SourceScanner::read_paths_file(Path::new("/no/such/c.files")).unwrap_err();
        assert!(matches!(err, CflowgraphError::Config(_)));
    }
}
