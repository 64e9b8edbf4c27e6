//! Textual metadata embedded in image files.

use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

/// Key/value textual metadata of one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    entries: BTreeMap<String, String>,
}

impl ImageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as `key:\nvalue` blocks separated by blank lines.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}:\n{v}"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl<K, V> FromIterator<(K, V)> for ImageMetadata
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Source of per-image metadata.
///
/// Implementations never fail: anything unreadable yields empty metadata.
pub trait MetadataReader: Send {
    fn read(&self, path: &Path) -> ImageMetadata;
}

/// Reads PNG text chunks and EXIF fields straight from the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMetadataReader;

impl MetadataReader for FileMetadataReader {
    fn read(&self, path: &Path) -> ImageMetadata {
        let mut meta = ImageMetadata::new();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if is_png {
            read_png_text(path, &mut meta);
        }
        read_exif(path, &mut meta);
        if meta.is_empty() {
            debug!(path = %path.display(), "no metadata");
        }
        meta
    }
}

/// tEXt, zTXt and iTXt chunks that precede the image data.
fn read_png_text(path: &Path, meta: &mut ImageMetadata) -> Option<()> {
    let file = fs::File::open(path).ok()?;
    let decoder = png::Decoder::new(BufReader::new(file));
    let reader = decoder.read_info().ok()?;
    let info = reader.info();
    for t in &info.uncompressed_latin1_text {
        meta.insert(t.keyword.clone(), t.text.clone());
    }
    for t in &info.compressed_latin1_text {
        if let Ok(text) = t.get_text() {
            meta.insert(t.keyword.clone(), text);
        }
    }
    for t in &info.utf8_text {
        if let Ok(text) = t.get_text() {
            meta.insert(t.keyword.clone(), text);
        }
    }
    Some(())
}

fn read_exif(path: &Path, meta: &mut ImageMetadata) -> Option<()> {
    let file = fs::File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    for field in exif.fields() {
        let value = field.display_value().with_unit(&exif).to_string();
        meta.insert(field.tag.to_string(), value);
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rendering_joins_blocks() {
        let meta: ImageMetadata = [("parameters", "a cat"), ("Software", "x")]
            .into_iter()
            .collect();
        assert_eq!(meta.to_text(), "Software:\nx\n\nparameters:\na cat");
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let meta = FileMetadataReader.read(Path::new("/definitely/not/here.png"));
        assert!(meta.is_empty());
    }
}
