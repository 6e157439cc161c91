//! A presenter that replays canned answers.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use yudb_core::{CoreError, CoreResult, Presenter};
use zeroize::Zeroizing;

#[derive(Debug, Default)]
struct Script {
    usernames: VecDeque<String>,
    passwords: VecDeque<(String, String)>,
    clears: usize,
}

/// Presenter answering prompts from a queue.
///
/// Clones share the same script, so a test can keep one handle and give
/// another to the shell:
///
/// ```rust,ignore
/// let presenter = ScriptedPresenter::new().username("ops");
/// let shell = Shell::builder(engine).presenter(presenter.clone()).build()?;
/// shell.change_username()?;
/// assert_eq!(presenter.remaining_usernames(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedPresenter {
    script: Arc<Mutex<Script>>,
}

impl ScriptedPresenter {
    /// Creates a presenter with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an answer to the next username prompt.
    #[must_use]
    pub fn username(self, name: impl Into<String>) -> Self {
        self.script.lock().usernames.push_back(name.into());
        self
    }

    /// Queues answers to the next password prompt.
    #[must_use]
    pub fn password_change(self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.script
            .lock()
            .passwords
            .push_back((old.into(), new.into()));
        self
    }

    /// Returns how many times the screen was cleared.
    pub fn clears(&self) -> usize {
        self.script.lock().clears
    }

    /// Returns the number of unanswered username prompts queued.
    pub fn remaining_usernames(&self) -> usize {
        self.script.lock().usernames.len()
    }
}

impl Presenter for ScriptedPresenter {
    fn clear(&self) -> CoreResult<()> {
        self.script.lock().clears += 1;
        Ok(())
    }

    fn prompt_username(&self) -> CoreResult<String> {
        self.script
            .lock()
            .usernames
            .pop_front()
            .ok_or_else(|| CoreError::credentials("no scripted username left"))
    }

    fn prompt_password_change(&self) -> CoreResult<(Zeroizing<String>, Zeroizing<String>)> {
        let (old, new) = self
            .script
            .lock()
            .passwords
            .pop_front()
            .ok_or_else(|| CoreError::credentials("no scripted password left"))?;
        Ok((Zeroizing::new(old), Zeroizing::new(new)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_in_order() {
        let presenter = ScriptedPresenter::new().username("a").username("b");
        assert_eq!(presenter.prompt_username().unwrap(), "a");
        assert_eq!(presenter.prompt_username().unwrap(), "b");
        assert!(presenter.prompt_username().is_err());
    }

    #[test]
    fn test_clones_share_script() {
        let presenter = ScriptedPresenter::new().password_change("old", "new");
        let other = presenter.clone();
        other.clear().unwrap();
        assert_eq!(presenter.clears(), 1);

        let (old, new) = other.prompt_password_change().unwrap();
        assert_eq!((old.as_str(), new.as_str()), ("old", "new"));
        assert!(presenter.prompt_password_change().is_err());
    }
}
