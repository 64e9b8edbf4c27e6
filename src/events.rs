use std::ops::Range;
use std::path::PathBuf;

use crate::config::{SortDirection, SortMode};
use crate::metadata::ImageMetadata;
use crate::navigation::Direction;

/// Destination folders for copies of the current image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    Favorites,
    Likes,
}

impl CopyTarget {
    pub fn label(self) -> &'static str {
        match self {
            Self::Favorites => "Favorites",
            Self::Likes => "Likes",
        }
    }
}

/// Requests into the slideshow task.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideshowCommand {
    Start,
    Stop,
    Advance(Direction),
    RandomJump,
    SetPaused(bool),
    TogglePause,
    SetInterval(u64),
    SetSort {
        mode: SortMode,
        direction: SortDirection,
    },
    SetQuery(String),
    SetSkipToMatch(bool),
    SetConfirmDelete(bool),
    SetInfoPanelVisible(bool),
    SetCopyFolder(CopyTarget, PathBuf),
    OpenFolder(PathBuf),
    OpenFile(PathBuf),
    Delete { confirmed: bool },
    Copy(CopyTarget),
    /// The viewer could not show the current image.
    ItemUnreadable,
    /// A file disappeared from the active folder.
    FileRemoved(PathBuf),
}

/// What the viewer should show for the current image.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedItem {
    pub path: PathBuf,
    /// 1-based position in the collection.
    pub position: usize,
    pub total: usize,
    pub metadata: ImageMetadata,
    /// `metadata` rendered as text.
    pub text: String,
    /// Byte ranges of `text` that contain query terms.
    pub highlights: Vec<Range<usize>>,
}

/// Notifications out of the slideshow task.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideshowEvent {
    Display(DisplayedItem),
    /// Short user-facing message.
    Feedback(String),
    /// Deletion needs confirmation; resend with `confirmed: true`.
    ConfirmDelete(PathBuf),
    /// A folder was loaded and is now the source of the show.
    FolderOpened(PathBuf),
    /// The loaded folder has no images.
    Empty,
    /// Nothing is left to show.
    SessionEnded,
}
