use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::data::Metadata;
use crate::errors::LabelerError;
use crate::types::SourceText;

/// Filesystem transport that walks every regular file under a root.
pub struct FileStream {
    root: PathBuf,
    follow_links: bool,
}

impl FileStream {
    /// Create a stream rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_links: false,
        }
    }

    /// Configure symlink traversal.
    pub fn with_follow_symlinks(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Regular files under the root in walk order.
    ///
    /// Entries that cannot be read (permissions, broken links) are logged and skipped.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(&self.root);
        if self.follow_links {
            walker = walker.follow_links(true);
        }
        walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect()
    }
}

/// True if the path has extension `ext` (case-insensitive, without the dot).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|found| found.to_str())
        .map(|found| found.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Number of lines when `path` is read as UTF-8 text.
///
/// `\n`, `\r\n` and a lone `\r` each end a line. A trailing line without a
/// terminator counts; an empty file has zero lines.
pub fn count_lines(path: &Path) -> Result<usize, LabelerError> {
    Ok(count_records(&read_source(path)?))
}

fn count_records(text: &str) -> usize {
    let mut bytes = text.bytes().peekable();
    let mut count = 0;
    while let Some(byte) = bytes.next() {
        match byte {
            b'\n' => count += 1,
            b'\r' => {
                count += 1;
                if bytes.peek() == Some(&b'\n') {
                    bytes.next();
                }
            }
            _ => {}
        }
    }
    if !matches!(text.as_bytes().last(), None | Some(b'\n' | b'\r')) {
        count += 1;
    }
    count
}

/// Read a source file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<SourceText, LabelerError> {
    fs::read_to_string(path).map_err(|err| LabelerError::UnreadableFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Read and parse a JSON metadata file.
pub fn read_metadata(path: &Path) -> Result<Metadata, LabelerError> {
    let missing = |reason: String| LabelerError::MissingMetadata {
        path: path.to_path_buf(),
        reason,
    };
    let raw = fs::read_to_string(path).map_err(|err| missing(err.to_string()))?;
    let value: Value = serde_json::from_str(&raw).map_err(|err| missing(err.to_string()))?;
    Ok(Metadata::new(value))
}
