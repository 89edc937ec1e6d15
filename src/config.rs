use std::path::PathBuf;

use crate::constants::scanner::{METADATA_EXTENSION, SOURCE_EXTENSION, WORKER_DIVISOR};
use crate::types::LabelName;

/// Directory scan configuration.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Root directory walked recursively.
    pub root: PathBuf,
    /// Desired number of lines per source file.
    pub target_lines: usize,
    /// Accepted distance from `target_lines` (inclusive on both sides).
    pub tolerance: usize,
    /// Extension of accepted source files (without the dot).
    pub source_extension: String,
    /// Extension substituted in to derive metadata paths.
    pub metadata_extension: String,
    /// Number of line-count workers.
    pub workers: usize,
    /// Follow symlinks while walking the root.
    pub follow_links: bool,
}

impl ScanConfig {
    /// Build a config for `root` with the default extensions and worker count.
    pub fn new(root: impl Into<PathBuf>, target_lines: usize, tolerance: usize) -> Self {
        Self {
            root: root.into(),
            target_lines,
            tolerance,
            ..Self::default()
        }
    }

    /// Inclusive line-count range accepted by the scan.
    pub fn line_range(&self) -> (usize, usize) {
        (
            self.target_lines.saturating_sub(self.tolerance),
            self.target_lines.saturating_add(self.tolerance),
        )
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            target_lines: 100,
            tolerance: 20,
            source_extension: SOURCE_EXTENSION.to_string(),
            metadata_extension: METADATA_EXTENSION.to_string(),
            workers: default_workers(),
            follow_links: false,
        }
    }
}

/// Default worker count: a quarter of the available cores, at least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|cores| cores.get() / WORKER_DIVISOR)
        .unwrap_or(1)
        .max(1)
}

/// Options shared by fresh and resumed labeling sessions.
#[derive(Clone, Debug)]
pub struct LabelConfig {
    /// Name of the label column.
    pub label_name: LabelName,
    /// Append the `exit` sentinel to the declared labels.
    pub exit_label: bool,
    /// Optional RNG seed; when set, the same file list yields the same sample.
    pub seed: Option<u64>,
    /// Metadata extension used to re-derive metadata paths on resume.
    pub metadata_extension: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            label_name: "label".to_string(),
            exit_label: true,
            seed: None,
            metadata_extension: METADATA_EXTENSION.to_string(),
        }
    }
}
