//! The ordered list of image paths for the active folder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{SortDirection, SortMode};
use crate::error::{Error, Result};

/// Extensions (lowercase, without dot) the slideshow picks up.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Return `true` if `path` has one of the `exts` extensions, ignoring case.
#[must_use]
pub fn is_supported_image(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e.trim_start_matches('.') == ext)
        })
}

/// Image paths of one folder plus the sort state applied to them.
#[derive(Debug, Clone)]
pub struct ImageCollection {
    folder: Option<PathBuf>,
    items: Vec<PathBuf>,
    sort_mode: SortMode,
    sort_direction: SortDirection,
    rng: StdRng,
}

impl ImageCollection {
    pub fn new(sort_mode: SortMode, sort_direction: SortDirection) -> Self {
        Self {
            folder: None,
            items: Vec::new(),
            sort_mode,
            sort_direction,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Builds a collection from explicit paths, dropping duplicates.
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut collection = Self::new(SortMode::default(), SortDirection::default());
        for path in paths {
            if !collection.items.contains(&path) {
                collection.items.push(path);
            }
        }
        collection
    }

    /// Use a deterministic RNG for random sorting.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replaces the items with the images directly inside `folder`.
    ///
    /// Only files whose extension is in `exts` are kept; subfolders are not
    /// visited. Items are left in listing order; call [`Self::sort`] next.
    ///
    /// # Errors
    /// Returns [`Error::FolderUnavailable`] if the folder cannot be listed.
    pub fn load(&mut self, folder: &Path, exts: &[&str]) -> Result<usize> {
        if !folder.is_dir() {
            return Err(Error::FolderUnavailable(folder.to_path_buf()));
        }
        let root = std::path::absolute(folder)
            .map_err(|_| Error::FolderUnavailable(folder.to_path_buf()))?;

        let mut items = Vec::new();
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                // The root itself could not be read.
                Err(err) if err.depth() == 0 => {
                    debug!(error = %err, "folder listing failed");
                    return Err(Error::FolderUnavailable(folder.to_path_buf()));
                }
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && is_supported_image(entry.path(), exts) {
                items.push(entry.into_path());
            }
        }

        info!(folder = %root.display(), count = items.len(), "loaded image folder");
        self.items = items;
        self.folder = Some(root);
        Ok(self.items.len())
    }

    /// Reorders the items according to the sort mode and direction.
    ///
    /// Random mode reshuffles on every call.
    pub fn sort(&mut self) {
        match self.sort_mode {
            SortMode::Random => {
                self.items.shuffle(&mut self.rng);
                return;
            }
            SortMode::Time => {
                self.items
                    .sort_by_cached_key(|p| (created_at(p), p.to_string_lossy().into_owned()));
            }
            SortMode::Alphabetical => {
                self.items.sort_by_cached_key(|p| {
                    let name = p
                        .file_name()
                        .map(|n| n.to_string_lossy().to_lowercase())
                        .unwrap_or_default();
                    (name, p.to_string_lossy().into_owned())
                });
            }
        }
        if self.sort_direction == SortDirection::Descending {
            self.items.reverse();
        }
        debug!(mode = %self.sort_mode, direction = ?self.sort_direction, "collection sorted");
    }

    pub fn set_sort(&mut self, mode: SortMode, direction: SortDirection) {
        self.sort_mode = mode;
        self.sort_direction = direction;
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Removes the first occurrence of `path`; returns its former index.
    pub fn remove(&mut self, path: &Path) -> Option<usize> {
        let idx = self.position(path)?;
        self.items.remove(idx);
        Some(idx)
    }

    pub(crate) fn remove_at(&mut self, idx: usize) -> PathBuf {
        self.items.remove(idx)
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.items.iter().position(|p| p == path)
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Path> {
        self.items.get(idx).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Folder the items were loaded from, if any.
    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.items
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for ImageCollection {
    fn default() -> Self {
        Self::new(SortMode::default(), SortDirection::default())
    }
}

/// Creation time, falling back to modification time where the platform has none.
fn created_at(path: &Path) -> Option<SystemTime> {
    let meta = fs::metadata(path).ok()?;
    meta.created().or_else(|_| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/pics").join(n)).collect()
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(is_supported_image(Path::new("a/B.JPG"), IMAGE_EXTENSIONS));
        assert!(is_supported_image(Path::new("x.Gif"), IMAGE_EXTENSIONS));
        assert!(!is_supported_image(Path::new("x.webp"), IMAGE_EXTENSIONS));
        assert!(!is_supported_image(Path::new("noext"), IMAGE_EXTENSIONS));
    }

    #[test]
    fn from_paths_drops_duplicates() {
        let c = ImageCollection::from_paths(paths(&["a.png", "b.png", "a.png"]));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn alphabetical_is_case_insensitive() {
        let mut c = ImageCollection::from_paths(paths(&["b.png", "C.png", "a.png"]));
        c.set_sort(SortMode::Alphabetical, SortDirection::Ascending);
        c.sort();
        assert_eq!(c.as_slice(), paths(&["a.png", "b.png", "C.png"]).as_slice());
    }

    #[test]
    fn alphabetical_descending_is_reverse_of_ascending() {
        let names = ["delta.png", "Alpha.jpg", "charlie.gif", "bravo.bmp"];
        let mut c = ImageCollection::from_paths(paths(&names));
        c.set_sort(SortMode::Alphabetical, SortDirection::Ascending);
        c.sort();
        let mut asc = c.as_slice().to_vec();
        c.set_sort(SortMode::Alphabetical, SortDirection::Descending);
        c.sort();
        asc.reverse();
        assert_eq!(c.as_slice(), asc.as_slice());
    }

    #[test]
    fn ties_break_on_full_path() {
        let items = vec![PathBuf::from("/z/a.png"), PathBuf::from("/y/A.png")];
        let mut c = ImageCollection::from_paths(items);
        c.set_sort(SortMode::Alphabetical, SortDirection::Ascending);
        c.sort();
        assert_eq!(c.get(0), Some(Path::new("/y/A.png")));
    }

    #[test]
    fn random_sort_preserves_membership() {
        let names: Vec<String> = (0..40).map(|i| format!("{i}.png")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut c = ImageCollection::from_paths(paths(&refs)).with_seed(7);
        c.set_sort(SortMode::Random, SortDirection::Descending);
        c.sort();
        let mut sorted = c.as_slice().to_vec();
        sorted.sort();
        let mut expected = paths(&refs);
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut c = ImageCollection::from_paths(paths(&["a.png", "b.png"]));
        assert_eq!(c.remove(Path::new("/pics/zzz.png")), None);
        assert_eq!(c.len(), 2);
        assert_eq!(c.remove(Path::new("/pics/a.png")), Some(0));
        assert_eq!(c.as_slice(), paths(&["b.png"]).as_slice());
    }
}
