use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::constants::scanner::SKIP_UNREADABLE_MSG;
use crate::data::FileList;
use crate::errors::LabelerError;
use crate::file_list;
use crate::transport::fs::{FileStream, count_lines, has_extension};

/// Finds source files whose line count lies within a target range.
///
/// Line counts are computed on a dedicated worker pool; results are sorted
/// before pairing so the output does not depend on the worker count.
pub struct DirectoryScanner {
    config: ScanConfig,
}

impl DirectoryScanner {
    /// Create a scanner for the given configuration.
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Walk the root and return every matching file paired with its metadata path.
    pub fn scan(&self) -> Result<FileList, LabelerError> {
        let root = &self.config.root;
        if !root.is_dir() {
            return Err(LabelerError::InvalidDirectory(root.clone()));
        }
        let candidates: Vec<PathBuf> = FileStream::new(root)
            .with_follow_symlinks(self.config.follow_links)
            .files()
            .into_iter()
            .filter(|path| has_extension(path, &self.config.source_extension))
            .collect();
        let (min, max) = self.config.line_range();
        debug!(
            root = %root.display(),
            candidates = candidates.len(),
            min,
            max,
            workers = self.config.workers,
            "counting lines"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()
            .map_err(|err| LabelerError::InvalidArgument(format!("worker pool: {err}")))?;
        let accepted: Vec<PathBuf> = pool.install(|| {
            candidates
                .par_iter()
                .filter_map(|path| within_range(path, min, max).then(|| path.clone()))
                .collect()
        });

        let files = FileList::from_sources(accepted, &self.config.metadata_extension);
        if files.is_empty() {
            return Err(LabelerError::NoMatchingFiles {
                root: root.clone(),
                min,
                max,
            });
        }
        Ok(files)
    }

    /// Scan, then persist the result in `output_dir` under a name derived from `now`.
    pub fn scan_and_persist<Tz>(
        &self,
        output_dir: &Path,
        now: &DateTime<Tz>,
    ) -> Result<(PathBuf, FileList), LabelerError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let files = self.scan()?;
        let path = file_list::timestamped_path(output_dir, now);
        info!(path = %path.display(), count = files.len(), "saving found files");
        file_list::save(&path, &files)?;
        Ok((path, files))
    }
}

fn within_range(path: &Path, min: usize, max: usize) -> bool {
    match count_lines(path) {
        Ok(lines) => {
            debug!(path = %path.display(), lines);
            (min..=max).contains(&lines)
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, SKIP_UNREADABLE_MSG);
            false
        }
    }
}
