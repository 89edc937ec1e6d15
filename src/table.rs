use std::path::Path;

use indexmap::IndexMap;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::constants::table::{
    COLUMN_COMPILE_RESULT, COLUMN_FILE_NAME, COLUMN_SOURCE, TABLE_EXTENSION,
};
use crate::data::LabeledRow;
use crate::errors::LabelerError;
use crate::transport::fs::has_extension;
use crate::types::{FileName, LabelName};

/// Labeling results keyed by file identity, in insertion order.
///
/// Rows without a label are pending and are re-prompted by a resumed session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTable {
    label_name: LabelName,
    rows: IndexMap<FileName, LabeledRow>,
}

impl OutputTable {
    /// Empty table whose label column is `label_name`.
    pub fn new(label_name: impl Into<LabelName>) -> Self {
        Self {
            label_name: label_name.into(),
            rows: IndexMap::new(),
        }
    }

    /// Name of the label column.
    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    /// Insert or replace a row; a replaced row keeps its position.
    pub fn upsert(&mut self, row: LabeledRow) {
        self.rows.insert(row.file_name.clone(), row);
    }

    /// Add a pending row for `file_name` unless the file is already present.
    pub fn push_pending(&mut self, file_name: impl Into<FileName>) {
        let file_name = file_name.into();
        self.rows
            .entry(file_name.clone())
            .or_insert_with(|| LabeledRow::pending(file_name));
    }

    /// Remove a row, preserving the order of the rest.
    pub fn remove(&mut self, file_name: &str) -> Option<LabeledRow> {
        self.rows.shift_remove(file_name)
    }

    /// Look up a row by file identity.
    pub fn get(&self, file_name: &str) -> Option<&LabeledRow> {
        self.rows.get(file_name)
    }

    /// All rows in table order.
    pub fn rows(&self) -> impl Iterator<Item = &LabeledRow> {
        self.rows.values()
    }

    /// File identities of pending rows, in table order.
    pub fn pending_files(&self) -> Vec<FileName> {
        self.rows
            .values()
            .filter(|row| row.is_pending())
            .map(|row| row.file_name.clone())
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows still waiting for a label.
    pub fn pending_count(&self) -> usize {
        self.rows.values().filter(|row| row.is_pending()).count()
    }

    /// Number of labeled rows.
    pub fn labeled_count(&self) -> usize {
        self.len() - self.pending_count()
    }

    /// Read a table written by [`OutputTable::write_csv`] (or any CSV with a
    /// `file_name` column). The last column is the label column.
    pub fn read_csv(path: &Path) -> Result<Self, LabelerError> {
        let mut reader = csv::ReaderBuilder::new().from_path(path)?;
        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(LabelerError::Table(format!(
                "'{}' needs a file_name column and a label column",
                path.display()
            )));
        }
        let column = |name: &str| headers.iter().position(|header| header == name);
        let file_idx = column(COLUMN_FILE_NAME).ok_or_else(|| {
            LabelerError::Table(format!(
                "'{}' has no {COLUMN_FILE_NAME} column",
                path.display()
            ))
        })?;
        let source_idx = column(COLUMN_SOURCE);
        let compile_idx = column(COLUMN_COMPILE_RESULT);
        let label_idx = headers.len() - 1;
        if label_idx == file_idx {
            return Err(LabelerError::Table(format!(
                "'{}' has no label column after {COLUMN_FILE_NAME}",
                path.display()
            )));
        }

        let mut table = Self::new(&headers[label_idx]);
        for record in reader.records() {
            let record = record?;
            let cell = |idx: Option<usize>| {
                idx.and_then(|idx| record.get(idx))
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            let Some(file_name) = cell(Some(file_idx)) else {
                debug!(path = %path.display(), "skipping row without file name");
                continue;
            };
            table.upsert(LabeledRow {
                file_name,
                source: cell(source_idx),
                compile_result: cell(compile_idx),
                label: cell(Some(label_idx)),
            });
        }
        Ok(table)
    }

    /// Write the table as CSV, replacing `path` atomically.
    pub fn write_csv(&self, path: &Path) -> Result<(), LabelerError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(staged.as_file_mut());
            writer.write_record([
                COLUMN_FILE_NAME,
                COLUMN_SOURCE,
                COLUMN_COMPILE_RESULT,
                self.label_name.as_str(),
            ])?;
            for row in self.rows.values() {
                writer.write_record([
                    row.file_name.as_str(),
                    row.source.as_deref().unwrap_or_default(),
                    row.compile_result.as_deref().unwrap_or_default(),
                    row.label.as_deref().unwrap_or_default(),
                ])?;
            }
            writer.flush()?;
        }
        staged.persist(path).map_err(|err| err.error)?;
        debug!(
            path = %path.display(),
            rows = self.len(),
            pending = self.pending_count(),
            "wrote output table"
        );
        Ok(())
    }
}

/// True if `path` follows the tabular-output convention (`.csv`).
pub fn is_table_path(path: &Path) -> bool {
    has_extension(path, TABLE_EXTENSION)
}
