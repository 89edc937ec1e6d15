use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::LabelConfig;
use crate::constants::labeling::SKIP_FILE_MSG;
use crate::data::{CandidateFile, LabeledRow, Metadata};
use crate::errors::LabelerError;
use crate::file_list::{self, is_file_list_path};
use crate::labels::{LabelSet, assign_label, collect_labels};
use crate::operator::Operator;
use crate::sampler::{sample_without_replacement, session_rng};
use crate::table::{OutputTable, is_table_path};
use crate::transport::fs::{read_metadata, read_source};
use crate::types::{FileName, SourceText};

/// Lifecycle of one labeling run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been asked of the operator yet.
    NotStarted,
    /// Waiting for the label vocabulary.
    CollectingLabels,
    /// Drawing the sample (fresh) or reading the pending queue (resume).
    Sampling,
    /// Showing files and collecting labels.
    Prompting,
    /// Every queued file was handled and the full table was written.
    Saved,
    /// The operator chose the exit label; a partial table was written.
    Exited,
}

/// Inputs for a session that samples a persisted file list.
#[derive(Clone, Debug)]
pub struct FreshSession {
    /// File list written by the scanner.
    pub file_list_path: PathBuf,
    /// CSV table to create (or overwrite).
    pub output_path: PathBuf,
    /// Requested number of files; capped at the list size.
    pub sample_size: usize,
    /// Label column, sentinel and seed options.
    pub config: LabelConfig,
}

/// Inputs for a session that continues a partially labeled table.
#[derive(Clone, Debug)]
pub struct ResumeSession {
    /// Existing CSV table; also the output.
    pub table_path: PathBuf,
    /// Sentinel and metadata options. The label column name is read from the table.
    pub config: LabelConfig,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionReport {
    /// `Saved` or `Exited`.
    pub state: SessionState,
    /// Files labeled during this run.
    pub labeled: usize,
    /// Files dropped because their metadata or source could not be read.
    pub skipped: usize,
    /// Rows left pending in the written table.
    pub pending: usize,
    /// Table that was written.
    pub output_path: PathBuf,
}

/// Drives label collection, sampling, and the prompt loop for one run.
pub struct LabelingSession<O> {
    operator: O,
    state: SessionState,
}

impl<O: Operator> LabelingSession<O> {
    /// Create a session that talks to `operator`.
    pub fn new(operator: O) -> Self {
        Self {
            operator,
            state: SessionState::NotStarted,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Return the operator, e.g. to inspect scripted output.
    pub fn into_operator(self) -> O {
        self.operator
    }

    /// Sample `request.sample_size` files from a file list and label them.
    ///
    /// Both paths are validated before the operator is asked anything.
    pub fn run_fresh(&mut self, request: FreshSession) -> Result<SessionReport, LabelerError> {
        let FreshSession {
            file_list_path,
            output_path,
            sample_size,
            config,
        } = request;
        if !file_list_path.is_file() || !is_file_list_path(&file_list_path) {
            return Err(LabelerError::InvalidArgument(format!(
                "'{}' is not a file list produced by the finder",
                file_list_path.display()
            )));
        }
        if !is_table_path(&output_path) {
            return Err(LabelerError::InvalidArgument(format!(
                "output '{}' is not a CSV file",
                output_path.display()
            )));
        }
        let files = file_list::load(&file_list_path)?;
        if files.is_empty() {
            return Err(LabelerError::InvalidArgument(format!(
                "file list '{}' is empty",
                file_list_path.display()
            )));
        }

        self.state = SessionState::CollectingLabels;
        let labels = collect_labels(&mut self.operator, &config.label_name, config.exit_label)?;

        self.state = SessionState::Sampling;
        let mut rng = session_rng(config.seed);
        let sample = sample_without_replacement(&files, sample_size, &mut rng);
        info!(
            requested = sample_size,
            sampled = sample.len(),
            available = files.len(),
            "sampled files"
        );
        let mut table = OutputTable::new(config.label_name.as_str());
        for file in &sample {
            table.push_pending(file.file_name());
        }

        self.prompt_queue(&mut table, &sample, &labels, &output_path)
    }

    /// Re-prompt every pending row of an existing table.
    ///
    /// The vocabulary is collected again and may differ from the one used before.
    pub fn run_resume(&mut self, request: ResumeSession) -> Result<SessionReport, LabelerError> {
        let ResumeSession { table_path, config } = request;
        if !table_path.is_file() || !is_table_path(&table_path) {
            return Err(LabelerError::InvalidArgument(format!(
                "'{}' is not an existing CSV file",
                table_path.display()
            )));
        }
        let mut table = OutputTable::read_csv(&table_path)?;
        let pending = table.pending_files();
        if pending.is_empty() {
            info!(path = %table_path.display(), "no pending rows to resume");
            self.state = SessionState::Saved;
            return Ok(SessionReport {
                state: self.state,
                labeled: 0,
                skipped: 0,
                pending: 0,
                output_path: table_path,
            });
        }

        self.state = SessionState::CollectingLabels;
        let labels = collect_labels(&mut self.operator, table.label_name(), config.exit_label)?;
        let dropped = labels_missing_from(&table, &labels);
        if !dropped.is_empty() {
            warn!(
                labels = %labels,
                previous = ?dropped,
                "resumed vocabulary differs from labels already in the table"
            );
            self.operator.show(&format!(
                "note: labels already in the table are not in {labels}: {}\n",
                dropped.join(", ")
            ))?;
        }

        self.state = SessionState::Sampling;
        info!(pending = pending.len(), total = table.len(), "resuming session");
        let queue: Vec<CandidateFile> = pending
            .into_iter()
            .map(|file_name| CandidateFile::from_source(file_name, &config.metadata_extension))
            .collect();

        self.prompt_queue(&mut table, &queue, &labels, &table_path)
    }

    fn prompt_queue(
        &mut self,
        table: &mut OutputTable,
        queue: &[CandidateFile],
        labels: &LabelSet,
        output_path: &Path,
    ) -> Result<SessionReport, LabelerError> {
        self.state = SessionState::Prompting;
        let mut labeled = 0usize;
        let mut skipped = 0usize;

        for file in queue {
            let file_name: FileName = file.file_name();
            self.operator.show(&format!("{file_name}\n"))?;

            let Some((source, metadata)) = load_candidate(file)? else {
                table.remove(&file_name);
                skipped += 1;
                continue;
            };
            self.operator.show(&format!("{metadata}\n"))?;
            self.operator.show(&format!("{source}\n"))?;

            let label = assign_label(&mut self.operator, labels)?;
            if labels.is_exit(&label) {
                debug!("saving current state");
                table.write_csv(output_path)?;
                self.state = SessionState::Exited;
                info!(
                    path = %output_path.display(),
                    labeled,
                    pending = table.pending_count(),
                    "session exited early"
                );
                return Ok(self.report(table, labeled, skipped, output_path));
            }

            table.upsert(LabeledRow {
                file_name,
                source: Some(source),
                compile_result: metadata.compile_result(),
                label: Some(label),
            });
            labeled += 1;
            table.write_csv(output_path)?;
        }

        table.write_csv(output_path)?;
        self.state = SessionState::Saved;
        info!(path = %output_path.display(), labeled, skipped, "session saved");
        Ok(self.report(table, labeled, skipped, output_path))
    }

    fn report(
        &self,
        table: &OutputTable,
        labeled: usize,
        skipped: usize,
        output_path: &Path,
    ) -> SessionReport {
        SessionReport {
            state: self.state,
            labeled,
            skipped,
            pending: table.pending_count(),
            output_path: output_path.to_path_buf(),
        }
    }
}

/// Read metadata and source for display; `None` when the file must be skipped.
fn load_candidate(file: &CandidateFile) -> Result<Option<(SourceText, Metadata)>, LabelerError> {
    let loaded = read_metadata(&file.metadata_path)
        .and_then(|metadata| read_source(&file.source_path).map(|source| (source, metadata)));
    match loaded {
        Ok(loaded) => Ok(Some(loaded)),
        Err(err) if err.is_recoverable() => {
            debug!(path = %file.source_path.display(), error = %err, SKIP_FILE_MSG);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Stored label values that the new vocabulary no longer offers, sorted.
fn labels_missing_from<'a>(table: &'a OutputTable, labels: &LabelSet) -> Vec<&'a str> {
    let unknown: HashSet<&str> = table
        .rows()
        .filter_map(|row| row.label.as_deref())
        .filter(|label| !labels.contains(label))
        .collect();
    let mut unknown: Vec<&str> = unknown.into_iter().collect();
    unknown.sort_unstable();
    unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FileList;
    use crate::operator::ConsoleOperator;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn write_candidate(dir: &Path, stem: &str, compile_result: &str) -> PathBuf {
        let source = dir.join(format!("{stem}.java"));
        fs::write(&source, format!("class {stem} {{}}\n")).unwrap();
        fs::write(
            dir.join(format!("{stem}.json")),
            format!(r#"{{"compile_result": "{compile_result}"}}"#),
        )
        .unwrap();
        source
    }

    fn operator(input: &str) -> ConsoleOperator<Cursor<String>, Vec<u8>> {
        ConsoleOperator::new(Cursor::new(input.to_string()), Vec::new())
    }

    #[test]
    fn fresh_session_validates_paths_before_prompting() {
        let dir = tempdir().unwrap();
        let list_path = dir.path().join("found_files.bin");
        file_list::save(
            &list_path,
            &FileList::from_sources(vec![dir.path().join("A.java")], "json"),
        )
        .unwrap();

        let mut session = LabelingSession::new(operator(""));
        let err = session
            .run_fresh(FreshSession {
                file_list_path: list_path,
                output_path: dir.path().join("labels.xlsx"),
                sample_size: 1,
                config: LabelConfig::default(),
            })
            .unwrap_err();
        assert!(matches!(err, LabelerError::InvalidArgument(_)));
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(session.into_operator().into_output().is_empty());
    }

    #[test]
    fn missing_metadata_skips_the_file_and_continues() {
        let dir = tempdir().unwrap();
        let good = write_candidate(dir.path(), "Good", "success");
        let orphan = dir.path().join("Orphan.java");
        fs::write(&orphan, "class Orphan {}\n").unwrap();
        let list_path = dir.path().join("found_files.bin");
        file_list::save(&list_path, &FileList::from_sources(vec![good, orphan], "json")).unwrap();
        let output_path = dir.path().join("labels.csv");

        let mut session = LabelingSession::new(operator("1\nok\nok\n"));
        let report = session
            .run_fresh(FreshSession {
                file_list_path: list_path,
                output_path: output_path.clone(),
                sample_size: 2,
                config: LabelConfig {
                    label_name: "quality".into(),
                    seed: Some(3),
                    ..LabelConfig::default()
                },
            })
            .unwrap();
        assert_eq!(report.state, SessionState::Saved);
        assert_eq!((report.labeled, report.skipped, report.pending), (1, 1, 0));

        let table = OutputTable::read_csv(&output_path).unwrap();
        assert_eq!(table.len(), 1);
        let row = table.rows().next().unwrap();
        assert!(row.file_name.ends_with("Good.java"));
        assert_eq!(row.compile_result.as_deref(), Some("success"));
        assert_eq!(row.label.as_deref(), Some("ok"));
    }

    #[test]
    fn non_utf8_source_is_skipped_and_dropped_from_the_table() {
        let dir = tempdir().unwrap();
        let good = write_candidate(dir.path(), "Good", "success");
        let binary = write_candidate(dir.path(), "Binary", "success");
        fs::write(&binary, [0xff, 0xfe, 0x00, 0x81]).unwrap();
        let list_path = dir.path().join("found_files.bin");
        file_list::save(&list_path, &FileList::from_sources(vec![good, binary], "json")).unwrap();
        let output_path = dir.path().join("labels.csv");

        let mut session = LabelingSession::new(operator("1\nok\nok\n"));
        let report = session
            .run_fresh(FreshSession {
                file_list_path: list_path,
                output_path: output_path.clone(),
                sample_size: 2,
                config: LabelConfig {
                    seed: Some(11),
                    ..LabelConfig::default()
                },
            })
            .unwrap();
        assert_eq!(report.state, SessionState::Saved);
        assert_eq!((report.labeled, report.skipped, report.pending), (1, 1, 0));

        let table = OutputTable::read_csv(&output_path).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.rows().all(|row| !row.file_name.ends_with("Binary.java")));
    }

    #[test]
    fn resume_with_a_new_vocabulary_tells_the_operator() {
        let dir = tempdir().unwrap();
        let first = write_candidate(dir.path(), "First", "success");
        let second = write_candidate(dir.path(), "Second", "failure");
        let path = dir.path().join("labels.csv");
        let mut table = OutputTable::new("label");
        table.upsert(LabeledRow {
            file_name: first.to_string_lossy().into_owned(),
            source: Some("class First {}".into()),
            compile_result: Some("success".into()),
            label: Some("yes".into()),
        });
        table.push_pending(second.to_string_lossy().into_owned());
        table.write_csv(&path).unwrap();

        let mut session = LabelingSession::new(operator("2\ngood\nbad\nbad\n"));
        let report = session
            .run_resume(ResumeSession {
                table_path: path.clone(),
                config: LabelConfig::default(),
            })
            .unwrap();
        assert_eq!(report.state, SessionState::Saved);
        assert_eq!(report.labeled, 1);

        let transcript = String::from_utf8(session.into_operator().into_output()).unwrap();
        assert!(transcript.contains("not in [good, bad, exit]: yes"));

        let table = OutputTable::read_csv(&path).unwrap();
        let labels: Vec<Option<&str>> = table.rows().map(|row| row.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("yes"), Some("bad")]);
    }

    #[test]
    fn unchanged_vocabulary_reports_no_missing_labels() {
        let mut table = OutputTable::new("label");
        table.upsert(LabeledRow {
            file_name: "A.java".into(),
            source: None,
            compile_result: None,
            label: Some("yes".into()),
        });
        table.push_pending("B.java".to_string());
        let same = LabelSet::new(["yes", "no"], true);
        assert!(labels_missing_from(&table, &same).is_empty());
        let other = LabelSet::new(["no"], true);
        assert_eq!(labels_missing_from(&table, &other), vec!["yes"]);
    }

    #[test]
    fn resume_without_pending_rows_does_not_prompt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("done.csv");
        let mut table = OutputTable::new("label");
        table.upsert(LabeledRow {
            file_name: "A.java".into(),
            source: Some("class A {}".into()),
            compile_result: None,
            label: Some("yes".into()),
        });
        table.write_csv(&path).unwrap();

        let mut session = LabelingSession::new(operator(""));
        let report = session
            .run_resume(ResumeSession {
                table_path: path,
                config: LabelConfig::default(),
            })
            .unwrap();
        assert_eq!(report.state, SessionState::Saved);
        assert_eq!(report.labeled, 0);
        assert!(session.into_operator().into_output().is_empty());
    }

    #[test]
    fn resume_rejects_missing_table() {
        let dir = tempdir().unwrap();
        let mut session = LabelingSession::new(operator(""));
        let err = session
            .run_resume(ResumeSession {
                table_path: dir.path().join("absent.csv"),
                config: LabelConfig::default(),
            })
            .unwrap_err();
        assert!(matches!(err, LabelerError::InvalidArgument(_)));
    }
}
