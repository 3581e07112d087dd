//! Declarative description of a fixture tree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use crate::error::FixtureError;

/// Directories, files and symlinks to materialize under a fresh root.
///
/// All paths are relative to the fixture root. Symlink targets are stored
/// verbatim and may be relative, absolute or dangling.
///
/// ```
/// use hwtree_fixture::fixture::FixtureSpec;
///
/// let spec = FixtureSpec::new()
///     .dir("sys/bus/pci/devices/0000:00:00.0")
///     .file("config/foo.yaml", "a: 1")
///     .symlink(
///         "sys/bus/pci/devices/0000:00:00.0/link",
///         "../../../../class/net/eth0",
///     );
/// assert_eq!(spec.dirs.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureSpec {
    /// Directories to create, recursively.
    pub dirs: Vec<PathBuf>,
    /// File path to content.
    pub files: BTreeMap<PathBuf, Vec<u8>>,
    /// Link path to link target.
    pub symlinks: BTreeMap<PathBuf, PathBuf>,
}

impl FixtureSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory.
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.add_dir(path);
        self
    }

    /// Adds a file, replacing any earlier content for the same path.
    pub fn file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Adds a symlink, replacing any earlier target for the same path.
    pub fn symlink(mut self, link: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        self.add_symlink(link, target);
        self
    }

    /// In-place form of [`FixtureSpec::dir`]; duplicates are ignored.
    pub fn add_dir(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.dirs.contains(&path) {
            self.dirs.push(path);
        }
    }

    /// In-place form of [`FixtureSpec::file`].
    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    /// In-place form of [`FixtureSpec::symlink`].
    pub fn add_symlink(&mut self, link: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        self.symlinks.insert(link.into(), target.into());
    }

    /// Merges another spec into this one. Entries from `other` win on conflicts.
    pub fn merge(mut self, other: FixtureSpec) -> Self {
        for dir in other.dirs {
            self.add_dir(dir);
        }
        self.files.extend(other.files);
        self.symlinks.extend(other.symlinks);
        self
    }

    /// Checks that every declared path stays inside the fixture root.
    ///
    /// Besides rejecting absolute and upward paths, no path may sit below a
    /// declared symlink: creating it would follow the link, possibly out of
    /// the root.
    pub(crate) fn validate(&self) -> Result<(), FixtureError> {
        let paths = self
            .dirs
            .iter()
            .chain(self.files.keys())
            .chain(self.symlinks.keys());
        let links: BTreeSet<PathBuf> = self.symlinks.keys().map(|l| normalized(l)).collect();
        for path in paths {
            let below_link = normalized(path)
                .ancestors()
                .skip(1)
                .any(|ancestor| links.contains(ancestor));
            if !is_contained(path) || below_link {
                return Err(FixtureError::InvalidPath(path.clone()));
            }
        }
        Ok(())
    }
}

/// A path is contained when it is non-empty, relative and never walks upward.
fn is_contained(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Drops `.` components so `./a` and `a` compare equal.
fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
