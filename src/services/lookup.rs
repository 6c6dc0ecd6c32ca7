//! Key/value lookup capability used to discover installation folders.
//!
//! Installation paths are published by distribution channels through a hierarchical
//! key/value store (the Windows registry on the primary platform). The resolver depends
//! only on the narrow [`InstallLookup`] contract so the store can be substituted:
//!
//! - [`RegistryLookup`]: `HKEY_LOCAL_MACHINE`, native and `WOW6432Node` views (Windows only)
//! - [`SnapshotLookup`]: in-memory table, loadable from YAML
//! - [`ChainLookup`]: several lookups tried in order
//!
//! A missing key, missing value or unreachable store is "no match", never an error.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Resolve an installation path from a key/value store.
#[cfg_attr(test, mockall::automock)]
pub trait InstallLookup: Send + Sync {
    /// Look up `value_name` under `root\candidate` for each candidate in order and
    /// return the first value found.
    fn lookup(&self, root: &str, candidates: &[String], value_name: &str) -> Option<Utf8PathBuf>;
}

/// Windows registry lookup under `HKEY_LOCAL_MACHINE`.
///
/// 32-bit installers register under `WOW6432Node` on 64-bit Windows, so both views are
/// tried for each candidate. On other platforms there is no registry and every lookup
/// misses.
#[derive(Debug, Clone, Default)]
pub struct RegistryLookup;

impl RegistryLookup {
    pub fn new() -> Self {
        Self
    }

    #[cfg_attr(not(windows), allow(dead_code))]
    fn views(root: &str, candidate: &str) -> Vec<String> {
        let native = format!(r"{}\{}", root.trim_end_matches('\\'), candidate);
        let mut views = vec![native.clone()];

        if let Some((head, tail)) = native.split_once('\\')
            && head.eq_ignore_ascii_case("software")
            && !tail.to_ascii_lowercase().starts_with("wow6432node")
        {
            views.push(format!(r"{}\WOW6432Node\{}", head, tail));
        }

        views
    }
}

impl InstallLookup for RegistryLookup {
    #[cfg(windows)]
    fn lookup(&self, root: &str, candidates: &[String], value_name: &str) -> Option<Utf8PathBuf> {
        use winreg::RegKey;
        use winreg::enums::*;

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);

        for candidate in candidates {
            for key_path in Self::views(root, candidate) {
                let key = match hklm.open_subkey(&key_path) {
                    Ok(key) => key,
                    Err(e) => {
                        tracing::trace!("Registry key {} not available: {}", key_path, e);
                        continue;
                    }
                };

                match key.get_value::<String, _>(value_name) {
                    Ok(value) if !value.trim().is_empty() => {
                        tracing::debug!("Registry {}\\{} = {}", key_path, value_name, value);
                        return Some(Utf8PathBuf::from(value.trim()));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::trace!("Registry value {}\\{} not available: {}", key_path, value_name, e);
                    }
                }
            }
        }

        None
    }

    #[cfg(not(windows))]
    fn lookup(&self, root: &str, candidates: &[String], value_name: &str) -> Option<Utf8PathBuf> {
        tracing::trace!(
            "No registry on this platform, skipping {} {:?} {}",
            root,
            candidates,
            value_name
        );
        None
    }
}

/// In-memory key/value table.
///
/// Keys are full paths (`root\candidate`) and are matched case-insensitively, like
/// registry keys. Used for hosts without a registry and as a substitutable fake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotTable", into = "SnapshotTable")]
pub struct SnapshotLookup {
    keys: SnapshotTable,
}

type SnapshotTable = IndexMap<String, IndexMap<String, String>>;

impl From<SnapshotTable> for SnapshotLookup {
    fn from(table: SnapshotTable) -> Self {
        let keys = table
            .into_iter()
            .map(|(key, values)| {
                let values = values
                    .into_iter()
                    .map(|(name, value)| (name.to_ascii_lowercase(), value))
                    .collect();
                (key.to_ascii_lowercase(), values)
            })
            .collect();
        Self { keys }
    }
}

impl From<SnapshotLookup> for SnapshotTable {
    fn from(snapshot: SnapshotLookup) -> Self {
        snapshot.keys
    }
}

impl SnapshotLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value_name = value` under the key `root\candidate`.
    pub fn insert(
        &mut self,
        root: &str,
        candidate: &str,
        value_name: &str,
        value: impl AsRef<Utf8Path>,
    ) -> &mut Self {
        self.keys
            .entry(Self::key(root, candidate))
            .or_default()
            .insert(value_name.to_ascii_lowercase(), value.as_ref().to_string());
        self
    }

    pub fn with(mut self, root: &str, candidate: &str, value_name: &str, value: impl AsRef<Utf8Path>) -> Self {
        self.insert(root, candidate, value_name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn key(root: &str, candidate: &str) -> String {
        format!(r"{}\{}", root.trim_end_matches('\\'), candidate).to_ascii_lowercase()
    }
}

impl InstallLookup for SnapshotLookup {
    fn lookup(&self, root: &str, candidates: &[String], value_name: &str) -> Option<Utf8PathBuf> {
        let value_name = value_name.to_ascii_lowercase();

        candidates.iter().find_map(|candidate| {
            self.keys
                .get(&Self::key(root, candidate))
                .and_then(|values| values.get(&value_name))
                .map(Utf8PathBuf::from)
        })
    }
}

/// Tries each lookup in order; the first hit wins.
#[derive(Clone, Default)]
pub struct ChainLookup {
    lookups: Vec<Arc<dyn InstallLookup>>,
}

impl ChainLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, lookup: Arc<dyn InstallLookup>) -> Self {
        self.lookups.push(lookup);
        self
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

impl InstallLookup for ChainLookup {
    fn lookup(&self, root: &str, candidates: &[String], value_name: &str) -> Option<Utf8PathBuf> {
        self.lookups
            .iter()
            .find_map(|lookup| lookup.lookup(root, candidates, value_name))
    }
}
