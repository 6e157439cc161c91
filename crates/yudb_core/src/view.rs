//! Presentation layer used by interactive commands.

use crate::error::CoreResult;
use std::io::{self, BufRead, Write};
use zeroize::Zeroizing;

/// Interactive front end: screen control and credential prompts.
pub trait Presenter: Send + Sync {
    /// Clears the screen.
    fn clear(&self) -> CoreResult<()>;

    /// Asks for a new username.
    fn prompt_username(&self) -> CoreResult<String>;

    /// Asks for the current and the new password, in that order.
    fn prompt_password_change(&self) -> CoreResult<(Zeroizing<String>, Zeroizing<String>)>;
}

/// Presenter bound to the process's stdin and stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPresenter;

impl TerminalPresenter {
    /// Creates a terminal presenter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn ask(prompt: &str) -> CoreResult<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Presenter for TerminalPresenter {
    fn clear(&self) -> CoreResult<()> {
        let mut stdout = io::stdout().lock();
        // Erase display, then home the cursor.
        stdout.write_all(b"\x1b[2J\x1b[H")?;
        stdout.flush()?;
        Ok(())
    }

    fn prompt_username(&self) -> CoreResult<String> {
        Self::ask("New username: ")
    }

    fn prompt_password_change(&self) -> CoreResult<(Zeroizing<String>, Zeroizing<String>)> {
        let old = Zeroizing::new(Self::ask("Current password: ")?);
        let new = Zeroizing::new(Self::ask("New password: ")?);
        Ok((old, new))
    }
}
