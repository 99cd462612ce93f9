use std::io::{self, BufRead, StdinLock, Stdout, Write};

use tracing::warn;

/// Asks whether a planned queue should run.
pub trait ConfirmationPort {
    fn confirm(&mut self, call_count: usize) -> bool;
}

impl<F> ConfirmationPort for F
where
    F: FnMut(usize) -> bool,
{
    fn confirm(&mut self, call_count: usize) -> bool {
        self(call_count)
    }
}

/// Confirms every queue without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ConfirmationPort for AutoConfirm {
    fn confirm(&mut self, _call_count: usize) -> bool {
        true
    }
}

/// Line-based prompt: writes `Process queue (<n>)? (y/n)` and reads one answer.
#[derive(Debug)]
pub struct PromptConfirmation<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, call_count: usize) -> io::Result<String> {
        write!(self.output, "Process queue ({call_count})? (y/n) ")?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer)
    }
}

impl PromptConfirmation<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConfirmationPort for PromptConfirmation<R, W> {
    fn confirm(&mut self, call_count: usize) -> bool {
        match self.ask(call_count) {
            Ok(answer) => is_affirmative(&answer),
            Err(error) => {
                warn!(error = %error, "could not read confirmation, treating it as declined");
                false
            }
        }
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
