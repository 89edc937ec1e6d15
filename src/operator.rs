use std::io::{self, BufRead, Write};

use crate::errors::LabelerError;

/// The human on the other side of a labeling session.
pub trait Operator {
    /// Display a block of text.
    fn show(&mut self, text: &str) -> Result<(), LabelerError>;
    /// Display `message` and block until the operator answers. Answers are trimmed.
    fn prompt(&mut self, message: &str) -> Result<String, LabelerError>;
}

/// Line-oriented operator over any reader/writer pair.
///
/// End of input is an error (`UnexpectedEof`) rather than an empty answer, so
/// re-prompt loops terminate when stdin closes.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    /// Wrap an input and output stream.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the operator and return the output stream.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl ConsoleOperator<io::StdinLock<'static>, io::Stdout> {
    /// Operator bound to the process terminal.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn show(&mut self, text: &str) -> Result<(), LabelerError> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    fn prompt(&mut self, message: &str) -> Result<String, LabelerError> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "operator input closed").into());
        }
        Ok(line.trim().to_string())
    }
}
