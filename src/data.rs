use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::constants::labeling::META_FIELD_COMPILE_RESULT;
use crate::types::{CompileResult, FileName, LabelValue, SourceText};

/// A source file accepted by the scanner, paired with its metadata file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateFile {
    /// Path of the source text file.
    pub source_path: PathBuf,
    /// Sibling metadata path (same stem, metadata extension). May not exist.
    pub metadata_path: PathBuf,
}

impl CandidateFile {
    /// Pair `source_path` with its derived metadata path.
    pub fn from_source(source_path: impl Into<PathBuf>, metadata_extension: &str) -> Self {
        let source_path = source_path.into();
        let metadata_path = metadata_path_for(&source_path, metadata_extension);
        Self {
            source_path,
            metadata_path,
        }
    }

    /// File identity used as the table key.
    pub fn file_name(&self) -> FileName {
        self.source_path.to_string_lossy().into_owned()
    }
}

/// Derive the metadata path by substituting the extension of `source_path`.
pub fn metadata_path_for(source_path: &Path, metadata_extension: &str) -> PathBuf {
    source_path.with_extension(metadata_extension)
}

/// Sorted, de-duplicated list of candidate files produced by a scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileList {
    files: Vec<CandidateFile>,
}

impl FileList {
    /// Build a list from accepted source paths; sorts by path and drops duplicates.
    pub fn from_sources<I>(sources: I, metadata_extension: &str) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut sources: Vec<PathBuf> = sources.into_iter().collect();
        sources.sort();
        sources.dedup();
        let files = sources
            .into_iter()
            .map(|source| CandidateFile::from_source(source, metadata_extension))
            .collect();
        Self { files }
    }

    /// Build a list from already-paired files, normalizing order and uniqueness.
    pub fn from_files(mut files: Vec<CandidateFile>) -> Self {
        files.sort();
        files.dedup_by(|a, b| a.source_path == b.source_path);
        Self { files }
    }

    /// Files in source-path order.
    pub fn files(&self) -> &[CandidateFile] {
        &self.files
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when no file matched.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Parsed contents of a metadata file.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    raw: Value,
}

impl Metadata {
    /// Wrap a parsed JSON document.
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// `compile_result` rendered as text: strings verbatim, other values as compact JSON.
    pub fn compile_result(&self) -> Option<CompileResult> {
        match self.raw.get(META_FIELD_COMPILE_RESULT)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Underlying JSON value.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.raw) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.raw),
        }
    }
}

/// One output record. `label == None` marks a row pending a future resume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledRow {
    /// File identity.
    pub file_name: FileName,
    /// Raw source text (absent for pending rows).
    pub source: Option<SourceText>,
    /// Compile result from metadata, when present.
    pub compile_result: Option<CompileResult>,
    /// Assigned label.
    pub label: Option<LabelValue>,
}

impl LabeledRow {
    /// A row waiting to be labeled.
    pub fn pending(file_name: impl Into<FileName>) -> Self {
        Self {
            file_name: file_name.into(),
            source: None,
            compile_result: None,
            label: None,
        }
    }

    /// True when no label has been assigned yet.
    pub fn is_pending(&self) -> bool {
        self.label.is_none()
    }
}
