use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How many past performances are kept.
pub const HISTORY_CAPACITY: usize = 5;

/// Recent chars/minute results, oldest first.
///
/// Serialized as a plain JSON array of numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct History {
    values: VecDeque<f64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed session, evicting the oldest entry past capacity.
    /// Values that are not finite and positive are dropped.
    pub fn record(&mut self, cpm: f64) -> &Self {
        if !Self::accepts(cpm) {
            return self;
        }
        self.values.push_back(cpm);
        while self.values.len() > HISTORY_CAPACITY {
            self.values.pop_front();
        }
        self
    }

    /// Only finite, positive speeds are ever stored.
    pub fn accepts(cpm: f64) -> bool {
        cpm.is_finite() && cpm > 0.0
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn best(&self) -> Option<f64> {
        self.values().reduce(f64::max)
    }

    pub fn average(&self) -> Option<f64> {
        match self.values.len() {
            0 => None,
            n => Some(self.values().sum::<f64>() / n as f64),
        }
    }

    /// Bar heights normalised against the best entry.
    pub fn bar_heights(&self, scale: f64) -> Vec<f64> {
        match self.best() {
            Some(best) => self.values().map(|v| v / best * scale).collect(),
            None => Vec::new(),
        }
    }
}

impl From<Vec<f64>> for History {
    fn from(values: Vec<f64>) -> Self {
        let mut history = History::new();
        for v in values {
            history.record(v);
        }
        history
    }
}

impl From<History> for Vec<f64> {
    fn from(history: History) -> Self {
        history.values.into_iter().collect()
    }
}
