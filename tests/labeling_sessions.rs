use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

use codelabel::{
    ConsoleOperator, FileList, FreshSession, LabelConfig, LabeledRow, LabelerError,
    LabelingSession, OutputTable, ResumeSession, SessionState, file_list,
};

type ScriptedOperator = ConsoleOperator<Cursor<String>, Vec<u8>>;

const LABEL_PROMPT: &str = "Please label the above file";

struct Corpus {
    dir: TempDir,
    list_path: PathBuf,
}

impl Corpus {
    fn new(count: usize) -> Self {
        let dir = tempdir().unwrap();
        let mut sources = Vec::new();
        for idx in 0..count {
            let stem = format!("Sample{idx}");
            let source = dir.path().join(format!("{stem}.java"));
            fs::write(&source, format!("public class {stem} {{\n}}\n")).unwrap();
            fs::write(
                dir.path().join(format!("{stem}.json")),
                format!(r#"{{"src_file": "{stem}.java", "compile_result": "ok-{idx}"}}"#),
            )
            .unwrap();
            sources.push(source);
        }
        let list_path = dir.path().join("found_files_test.bin");
        file_list::save(&list_path, &FileList::from_sources(sources, "json")).unwrap();
        Self { dir, list_path }
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("labels.csv")
    }

    fn fresh(&self, sample_size: usize) -> FreshSession {
        FreshSession {
            file_list_path: self.list_path.clone(),
            output_path: self.output(),
            sample_size,
            config: LabelConfig {
                label_name: "readable".into(),
                seed: Some(2024),
                ..LabelConfig::default()
            },
        }
    }

    fn resume(&self) -> ResumeSession {
        ResumeSession {
            table_path: self.output(),
            config: LabelConfig::default(),
        }
    }
}

fn session(input: &str) -> LabelingSession<ScriptedOperator> {
    LabelingSession::new(ConsoleOperator::new(Cursor::new(input.to_string()), Vec::new()))
}

fn transcript(session: LabelingSession<ScriptedOperator>) -> String {
    String::from_utf8(session.into_operator().into_output()).unwrap()
}

fn labels_in(table: &OutputTable) -> Vec<Option<String>> {
    table.rows().map(|row| row.label.clone()).collect()
}

#[test]
fn exit_after_one_label_keeps_second_file_pending() {
    let corpus = Corpus::new(2);
    let mut fresh = session("2\nreadable\nunreadable\nreadable\nexit\n");
    let report = fresh.run_fresh(corpus.fresh(2)).unwrap();
    assert_eq!(report.state, SessionState::Exited);
    assert_eq!(fresh.state(), SessionState::Exited);
    assert_eq!((report.labeled, report.pending), (1, 1));
    assert!(transcript(fresh).contains("[readable, unreadable, exit]"));

    let table = OutputTable::read_csv(&corpus.output()).unwrap();
    assert_eq!(table.label_name(), "readable");
    assert_eq!(labels_in(&table), vec![Some("readable".to_string()), None]);
    let done = table.rows().next().unwrap();
    assert!(done.source.as_deref().unwrap().starts_with("public class Sample"));
    assert!(done.compile_result.as_deref().unwrap().starts_with("ok-"));
    let pending = table.rows().nth(1).unwrap();
    assert_eq!(pending, &LabeledRow::pending(pending.file_name.clone()));
}

#[test]
fn exit_persists_completed_rows_and_the_rest_of_the_queue() {
    let corpus = Corpus::new(5);
    let mut fresh = session("2\nyes\nno\nyes\nno\nexit\n");
    let report = fresh.run_fresh(corpus.fresh(5)).unwrap();
    assert_eq!(report.state, SessionState::Exited);

    let table = OutputTable::read_csv(&corpus.output()).unwrap();
    assert_eq!(table.len(), 5);
    assert_eq!(
        labels_in(&table),
        vec![
            Some("yes".to_string()),
            Some("no".to_string()),
            None,
            None,
            None
        ]
    );
}

#[test]
fn resume_prompts_only_for_pending_rows() {
    let corpus = Corpus::new(4);
    let mut fresh = session("2\nyes\nno\nyes\nexit\n");
    fresh.run_fresh(corpus.fresh(4)).unwrap();
    let before = OutputTable::read_csv(&corpus.output()).unwrap();
    assert_eq!((before.len(), before.pending_count()), (4, 3));

    let mut resumed = session("2\nyes\nno\nno\nyes\nno\n");
    let report = resumed.run_resume(corpus.resume()).unwrap();
    assert_eq!(report.state, SessionState::Saved);
    assert_eq!((report.labeled, report.pending), (3, 0));
    assert_eq!(transcript(resumed).matches(LABEL_PROMPT).count(), 3);

    let after = OutputTable::read_csv(&corpus.output()).unwrap();
    assert_eq!(after.len(), 4);
    assert_eq!(after.pending_count(), 0);
    assert_eq!(
        labels_in(&after),
        vec![
            Some("yes".to_string()),
            Some("no".to_string()),
            Some("yes".to_string()),
            Some("no".to_string())
        ]
    );
    let order_before: Vec<&str> = before.rows().map(|row| row.file_name.as_str()).collect();
    let order_after: Vec<&str> = after.rows().map(|row| row.file_name.as_str()).collect();
    assert_eq!(order_before, order_after);
}

#[test]
fn oversized_sample_labels_each_file_once() {
    let corpus = Corpus::new(3);
    let mut fresh = session("1\ngood\ngood\ngood\ngood\n");
    let report = fresh.run_fresh(corpus.fresh(10)).unwrap();
    assert_eq!(report.state, SessionState::Saved);
    assert_eq!(report.labeled, 3);
    assert_eq!(transcript(fresh).matches(LABEL_PROMPT).count(), 3);

    let table = OutputTable::read_csv(&corpus.output()).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.pending_count(), 0);
}

#[test]
fn invalid_label_never_advances_the_queue() {
    let corpus = Corpus::new(1);
    let mut fresh = session("2\nyes\nno\nmaybe\n\nYES\nno\n");
    let report = fresh.run_fresh(corpus.fresh(1)).unwrap();
    assert_eq!(report.labeled, 1);
    assert_eq!(transcript(fresh).matches(LABEL_PROMPT).count(), 4);

    let table = OutputTable::read_csv(&corpus.output()).unwrap();
    assert_eq!(labels_in(&table), vec![Some("no".to_string())]);
}

#[test]
fn each_label_is_checkpointed_before_the_next_prompt() {
    let corpus = Corpus::new(3);
    let mut fresh = session("1\nseen\nseen\n");
    let err = fresh.run_fresh(corpus.fresh(3)).unwrap_err();
    assert!(matches!(err, LabelerError::Io(_)));
    assert_eq!(fresh.state(), SessionState::Prompting);

    let table = OutputTable::read_csv(&corpus.output()).unwrap();
    assert_eq!((table.labeled_count(), table.pending_count()), (1, 2));
}

#[test]
fn same_seed_reproduces_the_sample() {
    let first = Corpus::new(12);
    let second_output = first.dir.path().join("again.csv");

    let mut a = session("1\nx\nexit\n");
    a.run_fresh(first.fresh(6)).unwrap();
    let mut b = session("1\nx\nexit\n");
    b.run_fresh(FreshSession {
        output_path: second_output.clone(),
        ..first.fresh(6)
    })
    .unwrap();

    let names = |path: &Path| -> Vec<String> {
        OutputTable::read_csv(path)
            .unwrap()
            .rows()
            .map(|row| row.file_name.clone())
            .collect()
    };
    assert_eq!(names(&first.output()), names(&second_output));
    assert_eq!(names(&second_output).len(), 6);
}
