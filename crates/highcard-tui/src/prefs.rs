//! Persisted player preferences.
//!
//! Exactly two flags survive restarts: the entered name and whether name
//! entry has been completed. They are read once at startup and written once
//! when the player saves their name. The [`PrefsStore`] trait keeps the
//! storage medium swappable; the shipped implementation is a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// The two persisted flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prefs {
    pub user_name: String,
    pub name_entered: bool,
}

/// Abstraction over preference storage.
pub trait PrefsStore {
    /// Persist the preferences so they survive a restart.
    fn save(&self, prefs: &Prefs);
    /// Load previously saved preferences, if any.
    fn load(&self) -> Option<Prefs>;
    /// Clear the saved preferences.
    fn clear(&self);
}

/// JSON-file-backed [`PrefsStore`].
pub struct FilePrefs {
    path: PathBuf,
}

impl FilePrefs {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PrefsStore for FilePrefs {
    fn save(&self, prefs: &Prefs) {
        match serde_json::to_string_pretty(prefs) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to save prefs");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize prefs"),
        }
    }

    fn load(&self) -> Option<Prefs> {
        let json = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&json).ok()
    }

    fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}
