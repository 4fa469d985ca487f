//! Per-living hint journal.
//!
//! A story installs a list of hints, each optionally bound to a named
//! progress state. As the living reaches states (picking up the right key,
//! unlocking the right door) the journal advances and the `hint` verb shows
//! the most relevant entry.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    /// Progress state this hint applies to; `None` means it applies from the
    /// start.
    pub trigger: Option<String>,
    pub text: String,
}

impl Hint {
    pub fn new(trigger: Option<&str>, text: &str) -> Self {
        Self {
            trigger: trigger.map(str::to_string),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintJournal {
    hints: Vec<Hint>,
    /// States reached so far, in order.
    reached: Vec<String>,
}

impl HintJournal {
    pub fn init(&mut self, hints: Vec<Hint>) {
        self.hints = hints;
        self.reached.clear();
    }

    /// Record that `state` has been reached. Returns true the first time, so
    /// hooks can fire their nudge exactly once; re-reporting is a no-op.
    pub fn checkpoint(&mut self, state: &str) -> bool {
        if self.reached.iter().any(|s| s == state) {
            false
        } else {
            self.reached.push(state.to_string());
            true
        }
    }

    pub fn has_reached(&self, state: &str) -> bool {
        self.reached.iter().any(|s| s == state)
    }

    /// The hint matching the most recently reached state, falling back to the
    /// unconditional hint.
    pub fn current(&self) -> Option<&str> {
        for state in self.reached.iter().rev() {
            if let Some(hint) = self
                .hints
                .iter()
                .find(|h| h.trigger.as_deref() == Some(state))
            {
                return Some(&hint.text);
            }
        }
        self.hints
            .iter()
            .find(|h| h.trigger.is_none())
            .map(|h| h.text.as_str())
    }
}
