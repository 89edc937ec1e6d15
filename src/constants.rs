/// Constants used by the directory scanner.
pub mod scanner {
    /// Extension of source files accepted by the scanner.
    pub const SOURCE_EXTENSION: &str = "java";
    /// Extension of the sibling metadata file derived from each source file.
    pub const METADATA_EXTENSION: &str = "json";
    /// Divisor applied to available parallelism to size the line-count pool.
    pub const WORKER_DIVISOR: usize = 4;
    /// Log message used when unreadable files are excluded from a scan.
    pub const SKIP_UNREADABLE_MSG: &str = "skipping unreadable source file";
}

/// Constants used by file-list persistence and wire encoding.
pub mod file_list {
    /// Marker byte for bitcode-encoded payloads.
    pub const BITCODE_PREFIX: u8 = b'B';
    /// Format version for persisted file lists.
    pub const FILE_LIST_VERSION: u8 = 1;
    /// Extension of persisted file-list artifacts.
    pub const FILE_LIST_EXTENSION: &str = "bin";
    /// Prefix of timestamp-derived file-list names.
    pub const FILE_LIST_PREFIX: &str = "found_files_";
    /// `chrono` format used for the timestamp part of file-list names.
    pub const FILE_LIST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
}

/// Constants used by the output table.
pub mod table {
    /// Extension required for output tables.
    pub const TABLE_EXTENSION: &str = "csv";
    /// Column holding the file identity (source path).
    pub const COLUMN_FILE_NAME: &str = "file_name";
    /// Column holding the raw source text.
    pub const COLUMN_SOURCE: &str = "source";
    /// Column holding the compile result extracted from metadata.
    pub const COLUMN_COMPILE_RESULT: &str = "compile_result";
}

/// Constants used by the labeling loop and its prompts.
pub mod labeling {
    /// Reserved label that ends a session early and saves partial progress.
    pub const EXIT_LABEL: &str = "exit";
    /// Metadata field rendered into the `compile_result` column.
    pub const META_FIELD_COMPILE_RESULT: &str = "compile_result";
    /// Divider printed between labeled files.
    pub const DIVIDER: &str =
        "---------------------------------------------------------------------------------------------------";
    /// Log message used when a sampled file is skipped during prompting.
    pub const SKIP_FILE_MSG: &str = "skipping sampled file";
}

/// Constants used by logging setup.
pub mod logging {
    /// Default append-only process log.
    pub const DEFAULT_LOG_FILE: &str = "debug.log";
}
