//! The interactive operator of the tool.
//!
//! Resolution and issuance only talk to the operator through the [`Operator`]
//! trait: informational notices and yes/no questions. [`TerminalOperator`]
//! implements it on top of any line-oriented reader and writer, usually
//! stdin/stdout.
use std::io::{self, BufRead, Write};

use tracing::warn;

pub trait Operator {
    /// Shows an informational message, e.g. a missing file or a saved
    /// artifact.
    fn notify(&mut self, message: &str);

    /// Asks a yes/no question and blocks until it is answered.
    ///
    /// Returns an [`io::ErrorKind::UnexpectedEof`] error if no answer can be
    /// obtained at all.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

impl<T> Operator for &mut T
where
    T: Operator + ?Sized,
{
    fn notify(&mut self, message: &str) {
        (**self).notify(message);
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        (**self).confirm(question)
    }
}

/// Returns whether `answer` is an explicit affirmative: `y` or `yes`, in any
/// case and surrounded by any whitespace.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// An [`Operator`] reading answers line by line from `input` and writing
/// notices and questions to `output`.
#[derive(Debug)]
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
}

impl TerminalOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R, W> TerminalOperator<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            assume_yes: false,
        }
    }

    /// Answers every question affirmatively without reading any input. The
    /// questions are still printed.
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R, W> Operator for TerminalOperator<R, W>
where
    R: BufRead,
    W: Write,
{
    fn notify(&mut self, message: &str) {
        if let Err(error) = writeln!(self.output, "{message}") {
            warn!(%error, message, "failed to show message to the operator");
        }
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{question}")?;

        if self.assume_yes {
            writeln!(self.output, "y")?;
            return Ok(true);
        }
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no answer available on input",
            ));
        }

        Ok(is_affirmative(&answer))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use rstest::rstest;

    use super::*;

    /// Records every message and answers questions from a script.
    #[derive(Debug, Default)]
    pub struct ScriptedOperator {
        pub answers: VecDeque<bool>,
        pub messages: Vec<String>,
        pub questions: Vec<String>,
    }

    impl ScriptedOperator {
        pub fn answering(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl Operator for ScriptedOperator {
        fn notify(&mut self, message: &str) {
            self.messages.push(message.to_owned());
        }

        fn confirm(&mut self, question: &str) -> io::Result<bool> {
            self.questions.push(question.to_owned());
            self.answers
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
        }
    }

    #[rstest]
    #[case("y\n", true)]
    #[case("Y", true)]
    #[case("  yes \r\n", true)]
    #[case("YES\n", true)]
    #[case("n\n", false)]
    #[case("\n", false)]
    #[case("yep\n", false)]
    #[case("no\n", false)]
    fn affirmative_answers(#[case] answer: &str, #[case] expected: bool) {
        assert_eq!(is_affirmative(answer), expected);
    }

    #[test]
    fn terminal_reads_one_line_per_question() {
        let mut operator = TerminalOperator::new("y\nn\n".as_bytes(), Vec::new());

        assert!(operator.confirm("first? ").unwrap());
        assert!(!operator.confirm("second? ").unwrap());
        operator.notify("done");

        let (_, output) = operator.into_parts();
        assert_eq!(String::from_utf8(output).unwrap(), "first? second? done\n");
    }

    #[test]
    fn terminal_end_of_input_is_an_error() {
        let mut operator = TerminalOperator::new("".as_bytes(), Vec::new());

        let err = operator.confirm("anyone? ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn terminal_assume_yes_skips_input() {
        let mut operator = TerminalOperator::new("".as_bytes(), Vec::new()).assume_yes(true);

        assert!(operator.confirm("generate? ").unwrap());

        let (_, output) = operator.into_parts();
        assert_eq!(String::from_utf8(output).unwrap(), "generate? y\n");
    }
}
