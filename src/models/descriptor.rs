use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Release state of a supported game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReleaseState {
    #[default]
    Released,
    EarlyAccess,
    Unreleased,
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseState::Released => write!(f, "Released"),
            ReleaseState::EarlyAccess => write!(f, "Early Access"),
            ReleaseState::Unreleased => write!(f, "Unreleased"),
        }
    }
}

/// Immutable description of one supported game.
///
/// One descriptor exists per catalog entry. It carries everything that differs between
/// games: titles, the executable used to recognise an installation, and the ordered
/// lookup keys for each distribution channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDescriptor {
    /// Stable identity, lowercase (e.g. `fallout3`)
    pub id: String,

    pub title: String,

    pub short_title: String,

    pub release_year: u16,

    #[serde(default)]
    pub release_state: ReleaseState,

    /// Executable path relative to the installation folder
    pub executable: String,

    /// Cover image resource identifier for the presentation layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,

    /// GOG product ids, probed in order
    #[serde(default)]
    pub gog_keys: Vec<String>,

    /// Steam uninstall entries (`Steam App <id>`), probed in order
    #[serde(default)]
    pub steam_keys: Vec<String>,

    /// Retail registry keys mapped to the value holding the install path, probed in order
    #[serde(default)]
    pub retail_keys: IndexMap<String, String>,
}

impl GameDescriptor {
    /// Create a descriptor with no channel keys.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        short_title: impl Into<String>,
        release_year: u16,
        executable: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            short_title: short_title.into(),
            release_year,
            release_state: ReleaseState::Released,
            executable: executable.into(),
            cover: None,
            gog_keys: Vec::new(),
            steam_keys: Vec::new(),
            retail_keys: IndexMap::new(),
        }
    }

    pub fn with_gog_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gog_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_steam_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steam_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_retail_key(mut self, key: impl Into<String>, value_name: impl Into<String>) -> Self {
        self.retail_keys.insert(key.into(), value_name.into());
        self
    }

    pub fn with_release_state(mut self, state: ReleaseState) -> Self {
        self.release_state = state;
        self
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }
}

impl fmt::Display for GameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Game catalog from Games.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub games: Vec<GameDescriptor>,
}

impl Catalog {
    /// Find a descriptor by id (case-insensitive)
    pub fn get(&self, id: &str) -> Option<&GameDescriptor> {
        self.games.iter().find(|g| g.id.eq_ignore_ascii_case(id))
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
