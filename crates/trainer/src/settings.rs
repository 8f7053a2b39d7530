//! User settings, persisted under the `settings` storage key.

use serde::{Deserialize, Serialize};

use crate::storage::{Storage, KEY_SETTINGS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PuzzleMode {
    Adaptive,
    Daily,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub daily_puzzles_disabled: bool,
    pub puzzle_mode: PuzzleMode,
    /// Playback volume, 0-100.
    pub sound_volume: u8,
    pub sounds_disabled: bool,
    pub auto_zen_mode: bool,
    pub hide_layout_aside: bool,
    pub hide_sidebar: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_puzzles_disabled: false,
            puzzle_mode: PuzzleMode::Adaptive,
            sound_volume: 30,
            sounds_disabled: false,
            auto_zen_mode: false,
            hide_layout_aside: true,
            hide_sidebar: true,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when absent or unreadable.
    pub async fn load(storage: &Storage) -> Self {
        storage.get(KEY_SETTINGS).await.unwrap_or_default()
    }

    pub async fn save(&self, storage: &Storage) {
        storage.set_logged(KEY_SETTINGS, self).await;
    }
}
