// Game state management
//
// GameManager owns one GameInstance per catalog entry, tracks the selected game and
// emits change events for the presentation layer.

use crate::game::{ContentRefresh, GameInstance};
use crate::models::Catalog;
use crate::services::lookup::InstallLookup;
use crate::services::resolver::InstallSource;
use crate::services::version::VersionProbe;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Change events emitted by [`GameManager`]
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// An installation folder was resolved for a game
    InstallationDetected {
        game_id: String,
        path: Utf8PathBuf,
        source: InstallSource,
    },

    /// Detection ran and found nothing; the previous path (if any) is kept
    InstallationNotFound { game_id: String },

    /// Plugins, archives and links were reloaded
    ContentRefreshed {
        game_id: String,
        plugins: usize,
        archives: usize,
        links: usize,
    },

    /// The active game changed
    GameSelected { game_id: String },
}

/// Errors from [`GameManager`] operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameManagerError {
    #[error("Unknown game: {0}")]
    UnknownGame(String),

    #[error("Game {0} has no installation")]
    NotInstalled(String),
}

/// Registry of supported games with change event emission
///
/// # Usage
///
/// - [`from_catalog`](Self::from_catalog) builds one unconfigured instance per descriptor
/// - [`detect_all`](Self::detect_all) / [`detect`](Self::detect) resolve installations
/// - [`subscribe`](Self::subscribe) listens for [`GameEvent`]s
pub struct GameManager {
    games: IndexMap<String, GameInstance>,
    selected: Option<String>,
    events_tx: broadcast::Sender<GameEvent>,
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GameManager {
    /// Create an empty manager with a broadcast buffer of 100 events
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(100);
        Self {
            games: IndexMap::new(),
            selected: None,
            events_tx,
        }
    }

    /// One unconfigured instance per catalog entry, sharing the lookup and version probe.
    pub fn from_catalog(
        catalog: &Catalog,
        lookup: Arc<dyn InstallLookup>,
        version_probe: Arc<dyn VersionProbe>,
    ) -> Self {
        let mut manager = Self::new();
        for descriptor in &catalog.games {
            manager.register(GameInstance::new(
                descriptor.clone(),
                lookup.clone(),
                version_probe.clone(),
            ));
        }
        tracing::info!("Registered {} games from catalog", manager.games.len());
        manager
    }

    /// Add or replace a game instance, keyed by its lowercase id
    pub fn register(&mut self, game: GameInstance) -> Option<GameInstance> {
        let id = game.id().to_ascii_lowercase();
        tracing::debug!("Registering game {}", id);
        self.games.insert(id, game)
    }

    /// Replace the content-refresh hook of a game
    pub fn set_refresher(&mut self, id: &str, refresher: Arc<dyn ContentRefresh>) -> Result<(), GameManagerError> {
        let key = self.key(id)?;
        if let Some(game) = self.games.get_mut(&key) {
            game.set_refresher(refresher);
        }
        Ok(())
    }

    /// Detect one game's installation.
    ///
    /// Emits the outcome, followed by [`GameEvent::ContentRefreshed`] when the
    /// installation folder changed and the instance reloaded its content.
    pub fn detect(&mut self, id: &str, explicit: Option<&Utf8Path>) -> Result<bool, GameManagerError> {
        let key = self.key(id)?;
        let game = self.games.get_mut(&key).ok_or_else(|| GameManagerError::UnknownGame(id.to_string()))?;

        let previous = game.install_path().map(Utf8Path::to_path_buf);
        let Some(source) = game.resolve_installation(explicit) else {
            self.emit(GameEvent::InstallationNotFound { game_id: key });
            return Ok(false);
        };

        let path = game.install_path().map(Utf8Path::to_path_buf).unwrap_or_default();
        let changed = previous.as_ref() != Some(&path);
        self.emit(GameEvent::InstallationDetected {
            game_id: key.clone(),
            path,
            source,
        });

        if changed {
            self.emit_content(key);
        }

        Ok(true)
    }

    /// Detect every registered game.
    ///
    /// # Arguments
    /// * `overrides` - Explicit folders keyed by game id, tried before channel probing
    ///
    /// # Returns
    /// Ids of the games with a resolved installation
    pub fn detect_all(&mut self, overrides: &IndexMap<String, Utf8PathBuf>) -> Vec<String> {
        let ids: Vec<String> = self.games.keys().cloned().collect();
        let mut detected = Vec::new();

        for id in ids {
            let explicit = overrides
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(&id))
                .map(|(_, path)| path.as_path());

            if let Ok(true) = self.detect(&id, explicit) {
                detected.push(id);
            }
        }

        tracing::info!("Detected {} of {} games", detected.len(), self.games.len());
        detected
    }

    /// Reload a game's content and emit [`GameEvent::ContentRefreshed`]
    pub fn refresh_content(&mut self, id: &str) -> Result<(), GameManagerError> {
        let key = self.key(id)?;
        let game = self.games.get_mut(&key).ok_or_else(|| GameManagerError::UnknownGame(id.to_string()))?;

        if !game.is_configured() {
            return Err(GameManagerError::NotInstalled(key));
        }

        game.refresh_content();
        self.emit_content(key);
        Ok(())
    }

    /// Make a configured game the active one
    pub fn select(&mut self, id: &str) -> Result<(), GameManagerError> {
        let key = self.key(id)?;
        if !self.games[&key].is_configured() {
            return Err(GameManagerError::NotInstalled(key));
        }

        if self.selected.as_deref() != Some(key.as_str()) {
            tracing::info!("Selected game {}", key);
            self.selected = Some(key.clone());
            self.emit(GameEvent::GameSelected { game_id: key });
        }
        Ok(())
    }

    pub fn selected(&self) -> Option<&GameInstance> {
        self.selected.as_ref().and_then(|id| self.games.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&GameInstance> {
        self.games.get(&id.to_ascii_lowercase())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut GameInstance> {
        self.games.get_mut(&id.to_ascii_lowercase())
    }

    /// All games in catalog order
    pub fn games(&self) -> impl Iterator<Item = &GameInstance> {
        self.games.values()
    }

    /// Games with a resolved installation
    pub fn installed(&self) -> impl Iterator<Item = &GameInstance> {
        self.games.values().filter(|g| g.is_configured())
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Subscribe to game events
    ///
    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events_tx.subscribe()
    }

    fn emit_content(&self, key: String) {
        let Some(game) = self.games.get(&key) else {
            return;
        };
        let content = game.content();
        self.emit(GameEvent::ContentRefreshed {
            plugins: content.plugins().len(),
            archives: content.archives().len(),
            links: content.link_count(),
            game_id: key,
        });
    }

    fn emit(&self, event: GameEvent) {
        // Ignore send errors - it's OK if no one is listening
        let _ = self.events_tx.send(event);
    }

    fn key(&self, id: &str) -> Result<String, GameManagerError> {
        let key = id.to_ascii_lowercase();
        if self.games.contains_key(&key) {
            Ok(key)
        } else {
            Err(GameManagerError::UnknownGame(id.to_string()))
        }
    }
}
