use std::fmt;

/// A content unit contributed to the game's data set (`.esm`, `.esl`, `.esp`).
///
/// Plugins are identified by file name, compared case-insensitively the same way the
/// game engines resolve them.
#[derive(Debug, Clone, Eq)]
pub struct Plugin {
    name: String,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without extension
    pub fn stem(&self) -> &str {
        file_stem(&self.name)
    }

    /// Master files (`.esm`) load before everything else
    pub fn is_master(&self) -> bool {
        has_extension(&self.name, "esm")
    }

    /// Light plugins (`.esl`)
    pub fn is_light(&self) -> bool {
        has_extension(&self.name, "esl")
    }

    pub(crate) fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }
}

impl PartialEq for Plugin {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Plugin {
    fn from(name: &str) -> Self {
        Plugin::new(name)
    }
}

/// A packaged container of content (`.bsa`, `.ba2`).
#[derive(Debug, Clone, Eq)]
pub struct Archive {
    name: String,
}

impl Archive {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stem(&self) -> &str {
        file_stem(&self.name)
    }
}

impl PartialEq for Archive {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Archive {
    fn from(name: &str) -> Self {
        Archive::new(name)
    }
}

fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, e)| e.eq_ignore_ascii_case(ext))
}
