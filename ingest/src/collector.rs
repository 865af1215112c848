use crate::IngestError;
use globset::{GlobBuilder, GlobMatcher};
use ignore::{DirEntry, WalkBuilder};
use itertools::Itertools;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// default pattern for result files, `*` crosses directory separators
pub const DEFAULT_GLOB: &str = "*.json";

/// compile a glob the same way the collector will use it
pub fn compile_glob(glob: &str) -> Result<GlobMatcher, globset::Error> {
    GlobBuilder::new(glob)
        .build()
        .map(|glob| glob.compile_matcher())
}

#[derive(Debug)]
/// Every result file below a root directory matching a glob
///
/// Paths are relative-matched against the root and yielded in ascending order.
pub struct Collector {
    // stored in descending order so `pop` yields ascending paths
    paths: Vec<PathBuf>,
}

impl Collector {
    pub fn load(root: &Path, glob: &str) -> Result<Self, IngestError> {
        let matcher = compile_glob(glob)?;

        if !root.is_dir() {
            return Err(IngestError::MissingRoot(root.to_path_buf()));
        }

        debug!("Filtering with glob: {matcher:?}");

        let mut builder = WalkBuilder::new(root);
        // result directories are build output, usually ignored or hidden
        builder.standard_filters(false);

        let paths = builder
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(error = %error, "Failed to walk results directory entry");
                    None
                }
            })
            .filter(is_file)
            .map(DirEntry::into_path)
            .filter(|path| matcher.is_match(path.strip_prefix(root).unwrap_or(path)))
            .sorted_by(|left, right| right.cmp(left))
            .collect_vec();

        debug!(root = ?root, files = paths.len(), "Collected result files");

        Ok(Self { paths })
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// regular files, and symlinks resolving to one; linked directories are not descended
fn is_file(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Some(kind) if kind.is_symlink() => match fs::metadata(entry.path()) {
            Ok(metadata) => metadata.is_file(),
            Err(error) => {
                warn!(path = ?entry.path(), error = %error, "Skipping broken symlink");
                false
            }
        },
        Some(kind) => kind.is_file(),
        None => false,
    }
}

impl Iterator for Collector {
    type Item = PathBuf;

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.paths.len(), Some(self.paths.len()))
    }

    fn next(&mut self) -> Option<Self::Item> {
        self.paths.pop()
    }
}

impl ExactSizeIterator for Collector {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "[]").unwrap();
    }

    #[test]
    fn collects_nested_json_in_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.json");
        touch(dir.path(), "a/deep/estimates.json");
        touch(dir.path(), "a/notes.txt");
        touch(dir.path(), ".hidden/c.json");

        let relative = Collector::load(dir.path(), DEFAULT_GLOB)
            .unwrap()
            .map(|path| path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect_vec();

        assert_eq!(
            relative,
            vec![
                PathBuf::from(".hidden/c.json"),
                PathBuf::from("a/deep/estimates.json"),
                PathBuf::from("b.json"),
            ]
        );
    }

    #[test]
    fn ignore_files_are_not_honoured() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.json\n").unwrap();
        touch(dir.path(), "results.json");

        assert_eq!(Collector::load(dir.path(), DEFAULT_GLOB).unwrap().len(), 1);
    }

    #[test]
    fn custom_glob_is_relative_to_root() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "group/new/estimates.json");
        touch(dir.path(), "group/base/estimates.json");

        let collector = Collector::load(dir.path(), "**/new/*.json").unwrap();

        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();

        assert!(Collector::load(dir.path(), DEFAULT_GLOB).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            Collector::load(&dir.path().join("missing"), DEFAULT_GLOB),
            Err(IngestError::MissingRoot(_))
        ));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            Collector::load(dir.path(), "[unterminated"),
            Err(IngestError::InvalidGlob(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_collected() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let root = dir.path().join("results");
        touch(dir.path(), "real.json");
        touch(dir.path(), "elsewhere/nested.json");
        fs::create_dir(&root).unwrap();
        symlink(dir.path().join("real.json"), root.join("link.json")).unwrap();
        symlink(dir.path().join("elsewhere"), root.join("linked_dir")).unwrap();
        symlink(dir.path().join("gone.json"), root.join("broken.json")).unwrap();

        let collected = Collector::load(&root, DEFAULT_GLOB).unwrap().collect_vec();

        assert_eq!(collected, vec![root.join("link.json")]);
    }
}
