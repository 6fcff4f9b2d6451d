use strum_macros::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// restart the whole quote on the first wrong character
    pub hard_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Idle,
    InProgress,
    Completed,
}

/// Word-level progress through the current quote.
///
/// Offsets are counted in chars, never bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_word_index: usize,
    pub current_word_start: usize,
    pub current_input: String,
    pub completed: bool,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if self.completed {
            Phase::Completed
        } else if self.is_active() {
            Phase::InProgress
        } else {
            Phase::Idle
        }
    }

    /// Any progress made: drives the timer.
    pub fn is_active(&self) -> bool {
        self.current_word_index != 0 || !self.current_input.is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
