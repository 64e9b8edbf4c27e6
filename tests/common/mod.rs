#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rust_slideshow::RelocateError;
use rust_slideshow::config::{SettingsRecord, SettingsStore};
use rust_slideshow::metadata::{ImageMetadata, MetadataReader};
use rust_slideshow::relocate::Relocator;

/// Settings kept in memory; `saves` counts calls to `save`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub record: Arc<Mutex<SettingsRecord>>,
    pub saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn with(record: SettingsRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
            saves: Arc::default(),
        }
    }

    pub fn current(&self) -> SettingsRecord {
        self.record.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> SettingsRecord {
        self.current()
    }

    fn save(&self, settings: &SettingsRecord) -> rust_slideshow::Result<()> {
        *self.record.lock().unwrap() = settings.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Metadata looked up by file name; counts reads per file name.
#[derive(Clone, Default)]
pub struct MapReader {
    entries: Arc<HashMap<String, ImageMetadata>>,
    pub reads: Arc<Mutex<Vec<String>>>,
}

impl MapReader {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        let entries = entries
            .iter()
            .map(|(name, text)| {
                let meta: ImageMetadata = [("parameters", *text)].into_iter().collect();
                (name.to_string(), meta)
            })
            .collect();
        Self {
            entries: Arc::new(entries),
            reads: Arc::default(),
        }
    }

    pub fn read_names(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

impl MetadataReader for MapReader {
    fn read(&self, path: &Path) -> ImageMetadata {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.reads.lock().unwrap().push(name.clone());
        self.entries.get(&name).cloned().unwrap_or_default()
    }
}

/// Records relocation requests; trashing deletes the file so it really vanishes.
#[derive(Clone, Default)]
pub struct RecordingRelocator {
    pub trashed: Arc<Mutex<Vec<PathBuf>>>,
    pub copied: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    pub fail_with: Option<String>,
}

impl RecordingRelocator {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl Relocator for RecordingRelocator {
    fn move_to_trash(&self, path: &Path) -> Result<(), RelocateError> {
        if let Some(msg) = &self.fail_with {
            return Err(RelocateError::Io(std::io::Error::other(msg.clone())));
        }
        std::fs::remove_file(path)?;
        self.trashed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn copy_to(&self, path: &Path, dest_folder: &Path) -> Result<PathBuf, RelocateError> {
        if let Some(msg) = &self.fail_with {
            return Err(RelocateError::Io(std::io::Error::other(msg.clone())));
        }
        let dest = dest_folder.join(path.file_name().unwrap());
        self.copied
            .lock()
            .unwrap()
            .push((path.to_path_buf(), dest.clone()));
        Ok(dest)
    }
}

/// Create empty files named `names` inside `dir`.
pub fn touch_all(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|n| {
            let p = dir.join(n);
            std::fs::write(&p, b"x").unwrap();
            p
        })
        .collect()
}
