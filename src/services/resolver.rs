//! Priority-ordered installation discovery.
//!
//! Candidates are tried in this order and the first valid one wins:
//!
//! 1. An explicit path supplied by the caller
//! 2. The currently stored installation path, if it is still valid
//! 3. GOG keys (`Software\GOG.com\Games\<id>` → `path`)
//! 4. Steam keys (`Software\Microsoft\Windows\CurrentVersion\Uninstall\Steam App <id>` → `InstallLocation`)
//! 5. Retail keys (`Software\<key>` → per-key value name)
//!
//! Within a channel keys are probed one at a time in declared order, so a stale key
//! pointing at a removed folder does not hide a later, valid key.

use crate::models::GameDescriptor;
use crate::services::lookup::InstallLookup;
use crate::services::validator::is_valid_game_folder;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

pub const GOG_ROOT: &str = r"Software\GOG.com\Games";
pub const GOG_VALUE: &str = "path";
pub const STEAM_ROOT: &str = r"Software\Microsoft\Windows\CurrentVersion\Uninstall";
pub const STEAM_VALUE: &str = "InstallLocation";
pub const RETAIL_ROOT: &str = "Software";

/// Distribution channel publishing installation paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Gog,
    Steam,
    Retail,
}

impl Channel {
    /// Channels in probing priority
    pub const ALL: [Channel; 3] = [Channel::Gog, Channel::Steam, Channel::Retail];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Gog => write!(f, "GOG"),
            Channel::Steam => write!(f, "Steam"),
            Channel::Retail => write!(f, "retail"),
        }
    }
}

/// Where a resolved installation path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallSource {
    Explicit,
    Stored,
    Channel(Channel),
}

impl fmt::Display for InstallSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallSource::Explicit => write!(f, "explicit path"),
            InstallSource::Stored => write!(f, "stored path"),
            InstallSource::Channel(channel) => write!(f, "{} channel", channel),
        }
    }
}

/// A validated installation folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: Utf8PathBuf,
    pub source: InstallSource,
}

/// Resolves installation folders for one game.
pub struct InstallResolver<'a> {
    descriptor: &'a GameDescriptor,
    lookup: &'a dyn InstallLookup,
}

impl<'a> InstallResolver<'a> {
    pub fn new(descriptor: &'a GameDescriptor, lookup: &'a dyn InstallLookup) -> Self {
        Self { descriptor, lookup }
    }

    /// Find the highest-priority valid installation folder.
    ///
    /// # Arguments
    /// * `explicit` - Caller-supplied folder, tried first
    /// * `stored` - Previously resolved folder, tried second
    ///
    /// # Returns
    /// The first valid candidate, or `None` when nothing validates
    pub fn resolve(&self, explicit: Option<&Utf8Path>, stored: Option<&Utf8Path>) -> Option<Resolution> {
        if let Some(path) = explicit {
            if self.is_valid(path) {
                return Some(Resolution {
                    path: path.to_path_buf(),
                    source: InstallSource::Explicit,
                });
            }
            tracing::debug!(game = %self.descriptor.id, path = %path, "explicit path is not a valid installation");
        }

        if let Some(path) = stored
            && self.is_valid(path)
        {
            return Some(Resolution {
                path: path.to_path_buf(),
                source: InstallSource::Stored,
            });
        }

        Channel::ALL.into_iter().find_map(|channel| {
            self.probe_channel(channel).map(|path| Resolution {
                path,
                source: InstallSource::Channel(channel),
            })
        })
    }

    /// Probe one channel's keys in declared order.
    pub fn probe_channel(&self, channel: Channel) -> Option<Utf8PathBuf> {
        let found = match channel {
            Channel::Gog => self.probe_keys(GOG_ROOT, &self.descriptor.gog_keys, GOG_VALUE),
            Channel::Steam => self.probe_keys(STEAM_ROOT, &self.descriptor.steam_keys, STEAM_VALUE),
            Channel::Retail => self
                .descriptor
                .retail_keys
                .iter()
                .find_map(|(key, value_name)| self.probe_key(RETAIL_ROOT, key, value_name)),
        };

        match &found {
            Some(path) => tracing::info!(game = %self.descriptor.id, channel = %channel, path = %path, "found installation"),
            None => tracing::debug!(game = %self.descriptor.id, channel = %channel, "no installation"),
        }

        found
    }

    fn probe_keys(&self, root: &str, keys: &[String], value_name: &str) -> Option<Utf8PathBuf> {
        keys.iter().find_map(|key| self.probe_key(root, key, value_name))
    }

    fn probe_key(&self, root: &str, key: &str, value_name: &str) -> Option<Utf8PathBuf> {
        let candidate = self
            .lookup
            .lookup(root, std::slice::from_ref(&key.to_string()), value_name)?;

        if self.is_valid(&candidate) {
            Some(candidate)
        } else {
            let entry = format!(r"{}\{}", root, key);
            tracing::debug!(
                game = %self.descriptor.id,
                key = %entry,
                path = %candidate,
                "stale entry, not a valid installation"
            );
            None
        }
    }

    fn is_valid(&self, path: &Utf8Path) -> bool {
        is_valid_game_folder(Some(path), &self.descriptor.executable)
    }
}
