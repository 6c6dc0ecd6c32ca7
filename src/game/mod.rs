//! Per-game lifecycle.
//!
//! A [`GameInstance`] pairs one immutable [`GameDescriptor`] with the state discovered
//! for it on this machine: the installation folder, the values derived from it, and the
//! [`ContentLinkModel`] filled by the content-refresh hook.
//!
//! ```text
//! Unconfigured ──instantiate(path) / detect_installation()──▶ Configured
//!                                                              │
//!                       failed re-detection keeps the path ◀───┘
//! ```
//!
//! The addressing mode and version are read from the executable each time they are
//! requested; nothing derived from the installation is cached.

pub mod content;

use crate::models::GameDescriptor;
use crate::services::image::{self, AddressingMode};
use crate::services::lookup::InstallLookup;
use crate::services::resolver::{InstallResolver, InstallSource};
use crate::services::validator::is_valid_game_folder;
use crate::services::version::VersionProbe;
use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use content::ContentLinkModel;
use std::fmt;
use std::sync::Arc;

/// Name of the content folder inside an installation
pub const DATA_FOLDER: &str = "Data";

/// Populates a game's plugins, archives and links after it is instantiated.
pub trait ContentRefresh: Send + Sync {
    fn refresh(&self, data_path: &Utf8Path, model: &mut ContentLinkModel) -> Result<()>;
}

/// Content refresh that loads nothing.
#[derive(Debug, Clone, Default)]
pub struct NoRefresh;

impl ContentRefresh for NoRefresh {
    fn refresh(&self, _data_path: &Utf8Path, _model: &mut ContentLinkModel) -> Result<()> {
        Ok(())
    }
}

/// Lifecycle state of a game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Unconfigured,
    Configured,
}

/// A supported game and its installation on this machine.
pub struct GameInstance {
    descriptor: Arc<GameDescriptor>,
    lookup: Arc<dyn InstallLookup>,
    version_probe: Arc<dyn VersionProbe>,
    refresher: Arc<dyn ContentRefresh>,
    install_path: Option<Utf8PathBuf>,
    content: ContentLinkModel,
}

impl GameInstance {
    /// Create an unconfigured instance with no content refresh.
    pub fn new(
        descriptor: impl Into<Arc<GameDescriptor>>,
        lookup: Arc<dyn InstallLookup>,
        version_probe: Arc<dyn VersionProbe>,
    ) -> Self {
        Self {
            descriptor: descriptor.into(),
            lookup,
            version_probe,
            refresher: Arc::new(NoRefresh),
            install_path: None,
            content: ContentLinkModel::new(),
        }
    }

    /// Replace the content-refresh hook.
    pub fn with_refresher(mut self, refresher: Arc<dyn ContentRefresh>) -> Self {
        self.set_refresher(refresher);
        self
    }

    pub fn set_refresher(&mut self, refresher: Arc<dyn ContentRefresh>) {
        self.refresher = refresher;
    }

    /// Build an instance and instantiate it from `path` in one step.
    ///
    /// Returns `None` if `path` is not a valid installation of the game.
    pub fn load(
        descriptor: impl Into<Arc<GameDescriptor>>,
        path: &Utf8Path,
        lookup: Arc<dyn InstallLookup>,
        version_probe: Arc<dyn VersionProbe>,
        refresher: Arc<dyn ContentRefresh>,
    ) -> Option<Self> {
        let mut game = Self::new(descriptor, lookup, version_probe).with_refresher(refresher);
        game.instantiate(path).then_some(game)
    }

    /// Adopt `path` as the installation folder if it is valid.
    ///
    /// On success the instance becomes Configured and the content-refresh hook runs.
    /// An invalid path leaves the instance untouched.
    pub fn instantiate(&mut self, path: &Utf8Path) -> bool {
        if !self.is_valid_game_folder(Some(path)) {
            tracing::warn!(game = %self.descriptor.id, path = %path, "not a valid installation");
            return false;
        }

        self.install_path = Some(path.to_path_buf());
        tracing::info!(game = %self.descriptor.id, path = %path, "instantiated");

        self.refresh_content();
        true
    }

    /// Locate the installation, trying `explicit`, the stored path and then every
    /// distribution channel in priority order.
    ///
    /// Content is refreshed when the installation folder changes. Returns false when
    /// nothing validates; the stored path and its content are kept in that case.
    pub fn detect_installation(&mut self, explicit: Option<&Utf8Path>) -> bool {
        self.resolve_installation(explicit).is_some()
    }

    /// Like [`detect_installation`](Self::detect_installation) but reports where the
    /// installation was found.
    pub fn resolve_installation(&mut self, explicit: Option<&Utf8Path>) -> Option<InstallSource> {
        let resolver = InstallResolver::new(&self.descriptor, self.lookup.as_ref());

        let Some(resolution) = resolver.resolve(explicit, self.install_path.as_deref()) else {
            tracing::info!(game = %self.descriptor.id, "no installation found");
            return None;
        };

        tracing::info!(
            game = %self.descriptor.id,
            path = %resolution.path,
            source = %resolution.source,
            "using installation"
        );

        let changed = self.install_path.as_ref() != Some(&resolution.path);
        self.install_path = Some(resolution.path);
        if changed {
            self.refresh_content();
        }
        Some(resolution.source)
    }

    /// Clear the content model and run the content-refresh hook.
    ///
    /// Hook failures are logged; the installation stays configured.
    pub fn refresh_content(&mut self) {
        self.content.clear();

        let Some(data_path) = self.data_path() else {
            return;
        };

        if let Err(e) = self.refresher.refresh(&data_path, &mut self.content) {
            tracing::warn!(game = %self.descriptor.id, "content refresh failed: {:#}", e);
        }
    }

    /// True iff `path` is present and contains this game's executable.
    pub fn is_valid_game_folder(&self, path: Option<&Utf8Path>) -> bool {
        is_valid_game_folder(path, &self.descriptor.executable)
    }

    pub fn status(&self) -> GameStatus {
        if self.install_path.is_some() {
            GameStatus::Configured
        } else {
            GameStatus::Unconfigured
        }
    }

    pub fn is_configured(&self) -> bool {
        self.status() == GameStatus::Configured
    }

    pub fn descriptor(&self) -> &GameDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn title(&self) -> &str {
        &self.descriptor.title
    }

    pub fn cover(&self) -> Option<&str> {
        self.descriptor.cover.as_deref()
    }

    pub fn install_path(&self) -> Option<&Utf8Path> {
        self.install_path.as_deref()
    }

    /// Full path of the game executable
    pub fn executable_path(&self) -> Option<Utf8PathBuf> {
        self.install_path
            .as_ref()
            .map(|path| path.join(&self.descriptor.executable))
    }

    /// `<install>/Data`
    pub fn data_path(&self) -> Option<Utf8PathBuf> {
        self.install_path.as_ref().map(|path| path.join(DATA_FOLDER))
    }

    /// File version of the game executable
    pub fn version(&self) -> Option<String> {
        self.executable_path()
            .and_then(|exe| self.version_probe.file_version(&exe))
    }

    /// Addressing mode of the game executable, `Unknown` while unconfigured.
    pub fn addressing_mode(&self) -> AddressingMode {
        match self.executable_path() {
            Some(exe) => image::inspect(&exe),
            None => AddressingMode::Unknown,
        }
    }

    pub fn is_large_address_aware(&self) -> bool {
        self.addressing_mode().is_large_address_aware()
    }

    pub fn content(&self) -> &ContentLinkModel {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut ContentLinkModel {
        &mut self.content
    }
}

impl fmt::Display for GameInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor.title)
    }
}

impl fmt::Debug for GameInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameInstance")
            .field("id", &self.descriptor.id)
            .field("install_path", &self.install_path)
            .field("plugins", &self.content.plugins().len())
            .field("archives", &self.content.archives().len())
            .finish()
    }
}
