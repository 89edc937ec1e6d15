use std::fmt;

use tracing::{error, info};

use crate::constants::labeling::{DIVIDER, EXIT_LABEL};
use crate::errors::LabelerError;
use crate::operator::Operator;
use crate::types::LabelValue;

/// Operator-declared label vocabulary for one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<LabelValue>,
    exit_enabled: bool,
}

impl LabelSet {
    /// Build a vocabulary from declared labels, optionally accepting the exit sentinel.
    pub fn new<I, L>(labels: I, exit_enabled: bool) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<LabelValue>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            exit_enabled,
        }
    }

    /// Declared labels, without the sentinel.
    pub fn labels(&self) -> &[LabelValue] {
        &self.labels
    }

    /// True if `value` is a declared label or the enabled sentinel.
    pub fn accepts(&self, value: &str) -> bool {
        self.is_exit(value) || self.contains(value)
    }

    /// True if `value` is a declared label.
    pub fn contains(&self, value: &str) -> bool {
        self.labels.iter().any(|label| label == value)
    }

    /// True if `value` is the enabled exit sentinel.
    pub fn is_exit(&self, value: &str) -> bool {
        self.exit_enabled && value == EXIT_LABEL
    }

    /// Validate one answer against the vocabulary.
    pub fn check(&self, value: &str) -> Result<(), LabelerError> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(LabelerError::InvalidLabelInput(format!(
                "'{value}' is not part of the label set {self}"
            )))
        }
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut all: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        if self.exit_enabled {
            all.push(EXIT_LABEL);
        }
        write!(f, "[{}]", all.join(", "))
    }
}

/// Ask the operator how many labels `label_name` has, then for each label.
///
/// Invalid answers are logged and asked again until a valid one arrives.
pub fn collect_labels<O: Operator + ?Sized>(
    operator: &mut O,
    label_name: &str,
    exit_enabled: bool,
) -> Result<LabelSet, LabelerError> {
    let count_prompt = format!("Please enter the number of labels for {label_name}: ");
    let count = loop {
        let answer = operator.prompt(&count_prompt)?;
        match parse_label_count(&answer) {
            Ok(count) => break count,
            Err(err) => error!(error = %err, "rejected label count"),
        }
    };

    operator.show(&format!("What labels are valid for {label_name}?"))?;
    let mut labels: Vec<LabelValue> = Vec::with_capacity(count);
    while labels.len() < count {
        let answer = operator.prompt("Enter a label: ")?;
        match validate_new_label(&answer, &labels, exit_enabled) {
            Ok(()) => labels.push(answer),
            Err(err) => error!(error = %err, "rejected label"),
        }
    }

    let set = LabelSet::new(labels, exit_enabled);
    info!(labels = %set, "valid labels");
    Ok(set)
}

/// Ask for a label for the file just displayed, re-prompting until the answer is in `labels`.
pub fn assign_label<O: Operator + ?Sized>(
    operator: &mut O,
    labels: &LabelSet,
) -> Result<LabelValue, LabelerError> {
    let prompt = format!("Please label the above file {labels}: ");
    let label = loop {
        let answer = operator.prompt(&prompt)?;
        match labels.check(&answer) {
            Ok(()) => break answer,
            Err(err) => error!(error = %err, "rejected label"),
        }
    };
    operator.show(DIVIDER)?;
    Ok(label)
}

fn parse_label_count(answer: &str) -> Result<usize, LabelerError> {
    match answer.parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(LabelerError::InvalidLabelInput(format!(
            "'{answer}' is not a positive integer"
        ))),
    }
}

fn validate_new_label(
    answer: &str,
    existing: &[LabelValue],
    exit_enabled: bool,
) -> Result<(), LabelerError> {
    if answer.is_empty() {
        return Err(LabelerError::InvalidLabelInput("labels cannot be empty".into()));
    }
    if exit_enabled && answer == EXIT_LABEL {
        return Err(LabelerError::InvalidLabelInput(format!(
            "'{EXIT_LABEL}' is reserved for ending the session"
        )));
    }
    if existing.iter().any(|label| label == answer) {
        return Err(LabelerError::InvalidLabelInput(format!(
            "'{answer}' was already declared"
        )));
    }
    Ok(())
}
