use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::debug;

use crate::constants::file_list::{
    BITCODE_PREFIX, FILE_LIST_EXTENSION, FILE_LIST_PREFIX, FILE_LIST_TIMESTAMP_FORMAT,
    FILE_LIST_VERSION,
};
use crate::data::{CandidateFile, FileList};
use crate::errors::LabelerError;
use crate::transport::fs::has_extension;

#[derive(bitcode::Encode, bitcode::Decode)]
/// Versioned on-disk form of a file list.
struct PersistedFileList {
    version: u8,
    files: Vec<PersistedCandidate>,
}

#[derive(bitcode::Encode, bitcode::Decode)]
struct PersistedCandidate {
    source: String,
    metadata: String,
}

/// Path for a scan result written at `now`, e.g. `found_files_2024-03-09_14-05-07.bin`.
pub fn timestamped_path<Tz>(dir: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dir.join(format!(
        "{FILE_LIST_PREFIX}{}.{FILE_LIST_EXTENSION}",
        now.format(FILE_LIST_TIMESTAMP_FORMAT)
    ))
}

/// True if `path` follows the file-list naming convention.
pub fn is_file_list_path(path: &Path) -> bool {
    has_extension(path, FILE_LIST_EXTENSION)
}

/// Persist `files` to `path`, creating parent directories as needed.
pub fn save(path: &Path, files: &FileList) -> Result<(), LabelerError> {
    ensure_parent_dir(path)?;
    let persisted = PersistedFileList {
        version: FILE_LIST_VERSION,
        files: files
            .files()
            .iter()
            .map(|file| PersistedCandidate {
                source: file.source_path.to_string_lossy().into_owned(),
                metadata: file.metadata_path.to_string_lossy().into_owned(),
            })
            .collect(),
    };
    let payload = encode_bitcode_payload(&bitcode::encode(&persisted));
    fs::write(path, &payload)?;
    debug!(path = %path.display(), bytes = payload.len(), count = files.len(), "wrote file list");
    Ok(())
}

/// Load a file list written by [`save`].
pub fn load(path: &Path) -> Result<FileList, LabelerError> {
    let bytes = fs::read(path)?;
    let raw = decode_bitcode_payload(&bytes)?;
    let persisted: PersistedFileList = bitcode::decode(raw).map_err(|err| {
        LabelerError::FileList(format!("failed to decode '{}': {err}", path.display()))
    })?;
    if persisted.version != FILE_LIST_VERSION {
        return Err(LabelerError::FileList(format!(
            "'{}' has version {}, expected {FILE_LIST_VERSION}",
            path.display(),
            persisted.version
        )));
    }
    let files = persisted
        .files
        .into_iter()
        .map(|file| CandidateFile {
            source_path: PathBuf::from(file.source),
            metadata_path: PathBuf::from(file.metadata),
        })
        .collect();
    Ok(FileList::from_files(files))
}

fn encode_bitcode_payload(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(BITCODE_PREFIX);
    out.extend_from_slice(bytes);
    out
}

fn decode_bitcode_payload(bytes: &[u8]) -> Result<&[u8], LabelerError> {
    match bytes.split_first() {
        Some((&BITCODE_PREFIX, rest)) => Ok(rest),
        _ => Err(LabelerError::FileList(
            "bitcode payload missing expected prefix".into(),
        )),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), LabelerError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
