//! Cursor over an [`ImageCollection`] with wraparound stepping.

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, warn};

use crate::collection::ImageCollection;
use crate::config::{SortDirection, SortMode};
use crate::error::{Error, Result};

/// Stepping direction through the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Owns the active collection and the index of the current item.
///
/// `current` is `Some` exactly when the collection is non-empty.
#[derive(Debug, Clone, Default)]
pub struct NavigationController {
    collection: ImageCollection,
    current: Option<usize>,
}

impl NavigationController {
    pub fn new(collection: ImageCollection) -> Self {
        let current = (!collection.is_empty()).then_some(0);
        Self {
            collection,
            current,
        }
    }

    /// Swap in a freshly loaded collection and point at its first item.
    pub fn replace(&mut self, collection: ImageCollection) -> ImageCollection {
        let old = std::mem::replace(&mut self.collection, collection);
        self.reset();
        old
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Path of the current item.
    ///
    /// # Errors
    /// Returns [`Error::NoCurrentItem`] when the collection is empty.
    pub fn current_path(&self) -> Result<&Path> {
        self.current
            .and_then(|idx| self.collection.get(idx))
            .ok_or(Error::NoCurrentItem)
    }

    /// Advance one position, wrapping at the end.
    ///
    /// # Errors
    /// Returns [`Error::CollectionEmpty`] when there is nothing to step over.
    pub fn next(&mut self) -> Result<usize> {
        self.step(Direction::Forward)
    }

    /// Retreat one position, wrapping at the start.
    ///
    /// # Errors
    /// Returns [`Error::CollectionEmpty`] when there is nothing to step over.
    pub fn previous(&mut self) -> Result<usize> {
        self.step(Direction::Backward)
    }

    pub fn step(&mut self, direction: Direction) -> Result<usize> {
        let len = self.collection.len();
        let cur = self.current.ok_or(Error::CollectionEmpty)?;
        if len == 0 {
            return Err(Error::CollectionEmpty);
        }
        let idx = match direction {
            Direction::Forward => (cur + 1) % len,
            Direction::Backward => (cur + len - 1) % len,
        };
        self.current = Some(idx);
        Ok(idx)
    }

    /// Jump to a uniformly chosen index other than the current one.
    ///
    /// With a single item the index stays at 0.
    pub fn random_jump(&mut self) -> Result<usize> {
        let len = self.collection.len();
        let cur = self.current.ok_or(Error::CollectionEmpty)?;
        let idx = if len > 1 {
            let offset = self.collection.rng().random_range(1..len);
            (cur + offset) % len
        } else {
            0
        };
        self.current = Some(idx);
        Ok(idx)
    }

    /// Remove the current item from the collection.
    ///
    /// The item that slid into the vacated slot becomes current; past the end
    /// the index wraps to 0.
    ///
    /// # Errors
    /// [`Error::NoCurrentItem`] when already empty, [`Error::CollectionExhausted`]
    /// when the removed item was the last one.
    pub fn remove_current(&mut self) -> Result<PathBuf> {
        let idx = self.current.ok_or(Error::NoCurrentItem)?;
        let removed = self.collection.remove_at(idx);
        debug!(path = %removed.display(), index = idx, "removed current item");
        self.clamp_after_removal(idx)?;
        Ok(removed)
    }

    /// Drop the current item because it can no longer be opened.
    ///
    /// # Errors
    /// Same as [`Self::remove_current`].
    pub fn handle_unreadable(&mut self) -> Result<PathBuf> {
        if let Ok(path) = self.current_path() {
            warn!(path = %path.display(), "image unreadable; dropping from collection");
        }
        self.remove_current()
    }

    /// Remove `path` wherever it sits, keeping the current item current when
    /// another item is removed. Returns `false` if `path` was not present.
    ///
    /// # Errors
    /// [`Error::CollectionExhausted`] when the last item was removed.
    pub fn remove_path(&mut self, path: &Path) -> Result<bool> {
        let Some(idx) = self.collection.position(path) else {
            return Ok(false);
        };
        match self.current {
            Some(cur) if cur == idx => {
                self.remove_current()?;
            }
            Some(cur) => {
                self.collection.remove_at(idx);
                if idx < cur {
                    self.current = Some(cur - 1);
                }
            }
            None => {
                self.collection.remove_at(idx);
            }
        }
        Ok(true)
    }

    /// Make `path` current if it is in the collection.
    pub fn set_current_path(&mut self, path: &Path) -> bool {
        match self.collection.position(path) {
            Some(idx) => {
                self.current = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Re-sort the collection and return to the first item.
    pub fn sort(&mut self, mode: SortMode, direction: SortDirection) {
        self.collection.set_sort(mode, direction);
        self.collection.sort();
        self.reset();
    }

    fn reset(&mut self) {
        self.current = (!self.collection.is_empty()).then_some(0);
    }

    fn clamp_after_removal(&mut self, idx: usize) -> Result<()> {
        let len = self.collection.len();
        if len == 0 {
            self.current = None;
            return Err(Error::CollectionExhausted);
        }
        self.current = Some(if idx >= len { 0 } else { idx });
        Ok(())
    }
}
