//! Operator-facing collaborators: wall clock and typed confirmation.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Local};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Asks the operator to approve a destructive action.
pub trait Confirmation {
    /// Show `prompt` and return true only if the operator typed `yes`.
    fn confirm(&self, prompt: &str) -> bool;
}

/// True if `answer` is `yes`, ignoring case and surrounding whitespace.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// True only for the literal answer `yes`.
pub fn is_exact_yes(answer: &str) -> bool {
    answer == "yes"
}

/// Reads the answer from stdin. An unreadable stdin counts as "no".
///
/// The default accepts any [`is_affirmative`] answer; [`exact`](Self::exact)
/// accepts only [`is_exact_yes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirmation {
    exact: bool,
}

impl StdinConfirmation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact() -> Self {
        Self { exact: true }
    }

    /// Print `prompt` and read one line from stdin, trimmed.
    pub fn read_line(prompt: &str) -> io::Result<String> {
        Ok(Self::read_answer(prompt)?.trim().to_string())
    }

    /// Print `prompt` and read one line from stdin without its line ending.
    fn read_answer(prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn accepts(&self, answer: &str) -> bool {
        if self.exact {
            is_exact_yes(answer)
        } else {
            is_affirmative(answer)
        }
    }
}

impl Confirmation for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        match Self::read_answer(prompt) {
            Ok(answer) => self.accepts(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read confirmation, treating as no");
                false
            }
        }
    }
}
