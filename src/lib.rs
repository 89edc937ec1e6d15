#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line entry points for the `finder` and `labeler` binaries.
pub mod cli;
/// Scan and labeling configuration types.
pub mod config;
/// Centralized constants used across the scanner, persistence, and prompts.
pub mod constants;
/// Candidate file, file list, metadata, and row types.
pub mod data;
/// File-list persistence.
pub mod file_list;
/// Label vocabulary collection and label prompts.
pub mod labels;
pub mod logging;
/// Terminal interaction.
pub mod operator;
/// Random sampling of file lists.
pub mod sampler;
/// Directory scanning by line count.
pub mod scanner;
/// Sampling and resumable labeling loop.
pub mod session;
/// Output table and CSV persistence.
pub mod table;
/// Input transports used by the scanner and labeler (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{LabelConfig, ScanConfig};
pub use data::{CandidateFile, FileList, LabeledRow, Metadata};
pub use errors::LabelerError;
pub use labels::LabelSet;
pub use logging::{LogConfig, Verbosity};
pub use operator::{ConsoleOperator, Operator};
pub use scanner::DirectoryScanner;
pub use session::{FreshSession, LabelingSession, ResumeSession, SessionReport, SessionState};
pub use table::OutputTable;
pub use types::{CompileResult, FileName, LabelName, LabelValue, SourceText};
