use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// User settings from Settings.yaml
///
/// Every field can be overridden from the environment with the `FOESMM_` prefix
/// (see [`crate::config::ConfigManager::load_settings`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debug_mode: bool,

    /// Log folder; relative paths are resolved against the configuration directory
    pub log_dir: String,

    /// Write the log file as JSON lines instead of plain text
    pub json_logs: bool,

    /// Game id to select after detection
    pub selected_game: Option<String>,

    /// Explicit installation folders keyed by game id, tried before channel probing
    pub install_paths: IndexMap<String, Utf8PathBuf>,

    /// Load order files (plugins.txt style) keyed by game id
    pub load_order_files: IndexMap<String, Utf8PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            log_dir: "logs".to_string(),
            json_logs: false,
            selected_game: None,
            install_paths: IndexMap::new(),
            load_order_files: IndexMap::new(),
        }
    }
}

impl Settings {
    /// Explicit installation override for a game
    pub fn install_path(&self, game_id: &str) -> Option<&Utf8PathBuf> {
        self.install_paths
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(game_id))
            .map(|(_, path)| path)
    }

    /// Load order file configured for a game
    pub fn load_order_file(&self, game_id: &str) -> Option<&Utf8PathBuf> {
        self.load_order_files
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(game_id))
            .map(|(_, path)| path)
    }
}
