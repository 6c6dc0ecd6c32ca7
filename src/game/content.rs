use crate::models::{Archive, Plugin};
use indexmap::IndexMap;
use thiserror::Error;

/// Errors raised by the content model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Plugin {0} is not registered")]
    InvalidReference(String),
}

/// Ordered plugins and archives plus the plugin → archive links between them.
///
/// - Plugin order is load order; archive order is mount priority. Both sequences are
///   append-only here, reordering belongs to the caller.
/// - Each plugin links to at most one archive, an archive may back any number of plugins.
/// - Every linked plugin is present in the plugin sequence. Removing a plugin drops its
///   link; archives are never removed as a side effect.
#[derive(Debug, Clone, Default)]
pub struct ContentLinkModel {
    plugins: Vec<Plugin>,
    archives: Vec<Archive>,
    links: IndexMap<String, Archive>,
}

impl ContentLinkModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin to the end of the load order.
    ///
    /// Returns false and leaves the model unchanged if a plugin with the same name
    /// (case-insensitive) is already registered.
    pub fn add_plugin(&mut self, plugin: impl Into<Plugin>) -> bool {
        let plugin = plugin.into();
        if self.contains_plugin(plugin.name()) {
            tracing::debug!("Plugin {} already registered", plugin);
            return false;
        }
        self.plugins.push(plugin);
        true
    }

    /// Append an archive to the end of the mount order.
    pub fn add_archive(&mut self, archive: impl Into<Archive>) {
        self.archives.push(archive.into());
    }

    /// Link `plugin` to `archive`, replacing any previous link for that plugin.
    ///
    /// # Errors
    /// [`ContentError::InvalidReference`] if the plugin is not registered; the model
    /// is left untouched.
    pub fn link(&mut self, plugin: &str, archive: impl Into<Archive>) -> Result<(), ContentError> {
        let Some(registered) = self.find_plugin(plugin) else {
            return Err(ContentError::InvalidReference(plugin.to_string()));
        };

        let key = registered.key();
        let archive = archive.into();
        tracing::trace!("Linking {} -> {}", plugin, archive);
        self.links.insert(key, archive);
        Ok(())
    }

    /// Remove a plugin and its link.
    ///
    /// Returns the removed plugin, or `None` if it was not registered.
    pub fn remove_plugin(&mut self, plugin: &str) -> Option<Plugin> {
        let idx = self
            .plugins
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(plugin))?;

        let removed = self.plugins.remove(idx);
        self.links.shift_remove(&removed.key());
        Some(removed)
    }

    /// Archive linked to `plugin`
    pub fn resolve(&self, plugin: &str) -> Option<&Archive> {
        self.links.get(&plugin.to_ascii_lowercase())
    }

    /// Plugins backed by `archive`, in load order
    pub fn plugins_backed_by(&self, archive: &str) -> Vec<&Plugin> {
        self.plugins
            .iter()
            .filter(|p| {
                self.links
                    .get(&p.key())
                    .is_some_and(|a| a.name().eq_ignore_ascii_case(archive))
            })
            .collect()
    }

    pub fn contains_plugin(&self, plugin: &str) -> bool {
        self.find_plugin(plugin).is_some()
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn archives(&self) -> &[Archive] {
        &self.archives
    }

    /// Links in load order of their plugins
    pub fn links(&self) -> Vec<(&Plugin, &Archive)> {
        self.plugins
            .iter()
            .filter_map(|p| self.links.get(&p.key()).map(|a| (p, a)))
            .collect()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty() && self.archives.is_empty()
    }

    /// Drop all plugins, archives and links
    pub fn clear(&mut self) {
        self.plugins.clear();
        self.archives.clear();
        self.links.clear();
    }

    fn find_plugin(&self, plugin: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|p| p.name().eq_ignore_ascii_case(plugin))
    }
}
