//! Moving images to the trash and copying them into favorite folders.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::RelocateError;

/// File relocation used by delete/favorite/like actions.
pub trait Relocator: Send {
    /// Move `path` to the platform trash.
    fn move_to_trash(&self, path: &Path) -> Result<(), RelocateError>;

    /// Copy `path` into `dest_folder`, keeping its file name. Returns the new path.
    fn copy_to(&self, path: &Path, dest_folder: &Path) -> Result<PathBuf, RelocateError>;
}

/// Relocator backed by the filesystem and the desktop trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRelocator;

impl Relocator for FsRelocator {
    fn move_to_trash(&self, path: &Path) -> Result<(), RelocateError> {
        if !path.exists() {
            return Err(RelocateError::NotFound(path.to_path_buf()));
        }
        trash::delete(path)?;
        info!(path = %path.display(), "moved to trash");
        Ok(())
    }

    fn copy_to(&self, path: &Path, dest_folder: &Path) -> Result<PathBuf, RelocateError> {
        if !path.exists() {
            return Err(RelocateError::NotFound(path.to_path_buf()));
        }
        if !dest_folder.is_dir() {
            return Err(RelocateError::MissingDestination(dest_folder.to_path_buf()));
        }
        let name = path
            .file_name()
            .ok_or_else(|| RelocateError::NotFound(path.to_path_buf()))?;
        let dest = dest_folder.join(name);
        fs::copy(path, &dest)?;
        info!(from = %path.display(), to = %dest.display(), "copied");
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copy_keeps_file_name() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("a.png");
        let dest = tmp.path().join("favs");
        fs::write(&src, b"x").unwrap();
        fs::create_dir_all(&dest).unwrap();

        let copied = FsRelocator.copy_to(&src, &dest).unwrap();
        assert_eq!(copied, dest.join("a.png"));
        assert_eq!(fs::read(&copied).unwrap(), b"x");
        assert!(src.exists(), "copy must leave the source in place");
    }

    #[test]
    fn copy_into_missing_folder_fails() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("a.png");
        fs::write(&src, b"x").unwrap();
        let err = FsRelocator
            .copy_to(&src, &tmp.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, RelocateError::MissingDestination(_)));
    }

    #[test]
    fn trash_missing_file_reports_not_found() {
        let err = FsRelocator
            .move_to_trash(Path::new("/no/such/file.png"))
            .unwrap_err();
        assert!(matches!(err, RelocateError::NotFound(_)));
    }
}
