use std::io;

use serde::{Deserialize, Serialize};

use crate::history::History;
use crate::store::KvStore;

pub const SETTINGS_KEY: &str = "settings";
pub const HISTORY_KEY: &str = "history";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub hard_mode: bool,
    pub show_time: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hard_mode: false,
            show_time: true,
        }
    }
}

/// Settings and history backed by a key-value store.
///
/// Both are read once on construction and written back on every change.
/// Unreadable or malformed values fall back to defaults.
pub struct Preferences {
    store: Box<dyn KvStore>,
    settings: Settings,
    history: History,
}

impl Preferences {
    pub fn load(store: Box<dyn KvStore>) -> Self {
        let settings = load_or_default(store.as_ref(), SETTINGS_KEY);
        let history = load_or_default(store.as_ref(), HISTORY_KEY);
        Self {
            store,
            settings,
            history,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn update_settings<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let before = self.settings;
        f(&mut self.settings);
        if before == self.settings {
            return Ok(());
        }
        tracing::info!(settings = ?self.settings, "settings changed");
        self.save(SETTINGS_KEY, &self.settings)
    }

    /// Add a finished session's chars/minute and persist the history.
    pub fn record(&mut self, cpm: f64) -> io::Result<()> {
        if !History::accepts(cpm) {
            tracing::warn!(cpm, "not recording invalid chars/minute");
            return Ok(());
        }
        self.history.record(cpm);
        self.save(HISTORY_KEY, &self.history)
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> io::Result<()> {
        let json = serde_json::to_string(value).map_err(io::Error::from)?;
        self.store.set(key, &json)
    }
}

fn load_or_default<T>(store: &dyn KvStore, key: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring malformed stored value");
            T::default()
        }
    }
}
