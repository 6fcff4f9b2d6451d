use std::time::Instant;

use crate::quote::Quote;
use crate::session::{Phase, SessionConfig, SessionState};
use crate::timer::Timer;
use crate::typing_policy::{classify_input, violates_hard_mode, InputKind};

/// Number of leading chars of `a` matched position-by-position by `b`.
///
/// Only the first `a.len()` chars of `b` are looked at, so a `b` that runs
/// past a fully matched `a` still yields `a`'s length.
pub fn last_matching_index(a: &str, b: &str) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut b_chars = b.chars();
    for (i, expected) in a.chars().enumerate() {
        if b_chars.next() != Some(expected) {
            return i;
        }
    }
    a.chars().count()
}

/// Chars per minute; `None` when no whole second has elapsed yet.
pub fn cpm(chars: usize, elapsed_secs: u64) -> Option<f64> {
    if elapsed_secs == 0 {
        return None;
    }
    Some(chars as f64 * 60.0 / elapsed_secs as f64)
}

/// Effect of a single change of the input box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputOutcome {
    Typed,
    Advanced,
    /// `cpm` is `None` when the quote was finished inside the first second.
    Completed { cpm: Option<f64> },
    /// hard mode threw the session away; the display should shake
    Restarted,
    Ignored,
}

/// The quote split up for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segments {
    pub done: String,
    pub matched: String,
    pub mismatched: String,
    pub remaining: String,
}

/// A typing session over one quote.
#[derive(Debug)]
pub struct Sentence {
    quote: Quote,
    words: Vec<String>,
    content_len: usize,
    session_config: SessionConfig,
    state: SessionState,
    timer: Timer,
    final_cpm: Option<f64>,
}

impl Sentence {
    pub fn new(quote: Quote, session_config: SessionConfig) -> Self {
        let words = split_words(&quote.content);
        let content_len = quote.content.chars().count();
        Self {
            quote,
            words,
            content_len,
            session_config,
            state: SessionState::default(),
            timer: Timer::new(),
            final_cpm: None,
        }
    }

    /// Swap in a freshly fetched quote; progress starts over.
    pub fn replace_quote(&mut self, quote: Quote) {
        self.words = split_words(&quote.content);
        self.content_len = quote.content.chars().count();
        self.quote = quote;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.final_cpm = None;
        self.timer.reset();
    }

    pub fn set_hard_mode(&mut self, enabled: bool) {
        self.session_config.hard_mode = enabled;
    }

    /// Feed the complete current value of the input box.
    pub fn submit_input(&mut self, raw: &str, now: Instant) -> InputOutcome {
        if self.state.completed {
            return InputOutcome::Ignored;
        }

        let is_final = self.state.current_word_index + 1 == self.words.len();
        let outcome = match classify_input(self.current_word(), is_final, raw) {
            InputKind::Finish => {
                self.state.completed = true;
                self.state.current_input.clear();
                self.sync_timer(now);
                self.final_cpm = cpm(self.content_len, self.timer.elapsed_secs());
                tracing::info!(
                    elapsed_secs = self.timer.elapsed_secs(),
                    cpm = ?self.final_cpm,
                    "quote completed"
                );
                return InputOutcome::Completed {
                    cpm: self.final_cpm,
                };
            }
            InputKind::Advance => {
                self.state.current_word_index += 1;
                self.state.current_word_start += raw.chars().count();
                self.state.current_input.clear();
                tracing::debug!(word = self.state.current_word_index, "advanced");
                InputOutcome::Advanced
            }
            InputKind::Partial => {
                self.state.current_input = raw.to_string();
                if violates_hard_mode(&self.session_config, self.mismatch_len()) {
                    tracing::debug!(input = raw, "hard mode restart");
                    self.reset();
                    return InputOutcome::Restarted;
                }
                InputOutcome::Typed
            }
        };

        self.sync_timer(now);
        outcome
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.timer.on_tick(now);
    }

    fn sync_timer(&mut self, now: Instant) {
        let active = self.state.is_active() || self.state.completed;
        self.timer.sync(active, self.state.completed, now);
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub fn current_input(&self) -> &str {
        &self.state.current_input
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words
            .get(self.state.current_word_index)
            .map(String::as_str)
    }

    pub fn content_len(&self) -> usize {
        self.content_len
    }

    pub fn matched_prefix_len(&self) -> usize {
        match self.current_word() {
            Some(target) => last_matching_index(target, &self.state.current_input),
            None => 0,
        }
    }

    /// Typed chars past the correct prefix, overflow beyond the word included.
    pub fn mismatch_len(&self) -> usize {
        self.state
            .current_input
            .chars()
            .count()
            .saturating_sub(self.matched_prefix_len())
    }

    /// The part of the quote covered by wrong input, clamped to the content.
    pub fn mismatched_suffix(&self) -> String {
        let matched = self.matched_prefix_len();
        let input_len = self.state.current_input.chars().count();
        let from = self.state.current_word_start + matched;
        let to = self.state.current_word_start + matched.max(input_len);
        self.content_slice(from, to)
    }

    pub fn correct_char_count(&self) -> usize {
        if self.state.completed {
            self.content_len
        } else {
            self.state.current_word_start + self.matched_prefix_len()
        }
    }

    /// Share of the quote typed correctly, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.content_len == 0 {
            return if self.state.completed { 1.0 } else { 0.0 };
        }
        self.correct_char_count() as f64 / self.content_len as f64
    }

    /// Speed so far, or the frozen final value once completed.
    pub fn live_cpm(&self) -> Option<f64> {
        if self.state.completed {
            return self.final_cpm;
        }
        cpm(self.correct_char_count(), self.timer.elapsed()?)
    }

    pub fn final_cpm(&self) -> Option<f64> {
        self.final_cpm
    }

    pub fn segments(&self) -> Segments {
        if self.state.completed {
            return Segments {
                done: self.quote.content.clone(),
                ..Default::default()
            };
        }
        let start = self.state.current_word_start;
        let matched_end = start + self.matched_prefix_len();
        let mismatched_end = matched_end + self.mismatched_suffix().chars().count();
        Segments {
            done: self.content_slice(0, start),
            matched: self.content_slice(start, matched_end),
            mismatched: self.content_slice(matched_end, mismatched_end),
            remaining: self.content_slice(mismatched_end, self.content_len),
        }
    }

    fn content_slice(&self, from: usize, to: usize) -> String {
        let to = to.min(self.content_len);
        if from >= to {
            return String::new();
        }
        self.quote.content.chars().skip(from).take(to - from).collect()
    }
}

fn split_words(content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    content.split(' ').map(str::to_string).collect()
}
