//! Persisted slideshow settings and the stores that read and write them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const MIN_INTERVAL_MS: u64 = 500;
pub const MAX_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_INTERVAL_MS: u64 = 5_000;

/// How the collection is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Random,
    Time,
    #[serde(rename = "alpha", alias = "alphabetical")]
    Alphabetical,
}

impl SortMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Time => "time",
            Self::Alphabetical => "alpha",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "time" => Ok(Self::Time),
            "alpha" | "alphabetical" => Ok(Self::Alphabetical),
            other => Err(format!("unknown sort mode '{other}'")),
        }
    }
}

/// Sort direction; ignored for [`SortMode::Random`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Delay between automatic advances, always within
/// [`MIN_INTERVAL_MS`]..=[`MAX_INTERVAL_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideInterval(u64);

impl SlideInterval {
    /// Validates `millis` against the accepted range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInterval`] when out of range.
    pub fn new(millis: u64) -> Result<Self> {
        if (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&millis) {
            Ok(Self(millis))
        } else {
            Err(Error::InvalidInterval {
                got: millis,
                min: MIN_INTERVAL_MS,
                max: MAX_INTERVAL_MS,
            })
        }
    }

    /// Creates an interval, clamping to the valid range.
    pub fn clamped(millis: u64) -> Self {
        Self(millis.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS))
    }

    pub fn millis(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Default for SlideInterval {
    fn default() -> Self {
        Self(DEFAULT_INTERVAL_MS)
    }
}

/// Persisted settings. Field names match the on-disk settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsRecord {
    /// Folder the slideshow reads images from.
    pub source: Option<PathBuf>,
    /// Destination for "favorite" copies.
    pub favorites: Option<PathBuf>,
    /// Destination for "like" copies.
    pub likes: Option<PathBuf>,
    pub sort_order: SortMode,
    pub sort_direction: SortDirection,
    /// Milliseconds between automatic advances.
    pub interval: u64,
    /// Ask for confirmation before moving a file to the trash.
    pub confirm_delete: bool,
    /// Manual navigation skips to the next image whose metadata matches the query.
    pub skip_non_matching: bool,
    pub info_panel_visible: bool,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            source: None,
            favorites: None,
            likes: None,
            sort_order: SortMode::default(),
            sort_direction: SortDirection::default(),
            interval: DEFAULT_INTERVAL_MS,
            confirm_delete: true,
            skip_non_matching: false,
            info_panel_visible: false,
        }
    }
}

impl SettingsRecord {
    /// Normalize values that serde cannot constrain on its own.
    pub fn validated(mut self) -> Self {
        let clamped = SlideInterval::clamped(self.interval).millis();
        if clamped != self.interval {
            warn!(
                interval = self.interval,
                clamped, "interval outside accepted range; clamping"
            );
            self.interval = clamped;
        }
        self
    }

    pub fn slide_interval(&self) -> SlideInterval {
        SlideInterval::clamped(self.interval)
    }
}

/// Persistence for [`SettingsRecord`].
pub trait SettingsStore: Send {
    /// Loads settings. Missing or corrupt data yields defaults.
    fn load(&self) -> SettingsRecord;

    /// Persists `settings`.
    ///
    /// # Errors
    /// Returns the underlying IO or serialization failure.
    fn save(&self, settings: &SettingsRecord) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingsFormat {
    Json,
    Yaml,
}

impl SettingsFormat {
    fn for_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Stores settings in a single file; `.yaml`/`.yml` files are written as YAML,
/// everything else as JSON.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
    format: SettingsFormat,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SettingsFormat::for_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SettingsRecord> {
        let s = std::fs::read_to_string(&self.path)?;
        let record = match self.format {
            SettingsFormat::Json => serde_json::from_str(&s)?,
            SettingsFormat::Yaml => serde_yaml::from_str(&s)?,
        };
        Ok(record)
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> SettingsRecord {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file; using defaults");
            return SettingsRecord::default();
        }
        match self.read() {
            Ok(record) => record.validated(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "settings unreadable; using defaults");
                SettingsRecord::default()
            }
        }
    }

    fn save(&self, settings: &SettingsRecord) -> Result<()> {
        let body = match self.format {
            SettingsFormat::Json => serde_json::to_string_pretty(settings)?,
            SettingsFormat::Yaml => serde_yaml::to_string(settings)?,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, body)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}
