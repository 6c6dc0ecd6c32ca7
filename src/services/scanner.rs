//! Data folder scanning: builds the plugin load order, the archive mount order and the
//! plugin → archive links from the files in an installation's `Data` folder.
//!
//! # Load order
//!
//! 1. Plugins listed in the load order file (if configured), in file order
//! 2. Remaining masters (`.esm`), then light plugins (`.esl`), then regular plugins
//!    (`.esp`), each group ordered by modification time and then by name
//!
//! # Archives
//!
//! An archive belongs to a plugin when its stem, minus an optional `" - Suffix"`, equals
//! the plugin stem (`Anchorage - Main.bsa` belongs to `Anchorage.esm`). Owned archives
//! mount in the load order of their plugin; archives without an owner follow, by name.
//! Each plugin links to its first owned archive.

use crate::game::content::ContentLinkModel;
use crate::game::ContentRefresh;
use crate::models::{Archive, Plugin};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::fs;
use std::io::{BufRead, BufReader};
use std::time::SystemTime;

const PLUGIN_EXTENSIONS: [&str; 3] = ["esm", "esl", "esp"];
const ARCHIVE_EXTENSIONS: [&str; 2] = ["bsa", "ba2"];

/// Populates a [`ContentLinkModel`] from a `Data` folder.
#[derive(Debug, Clone)]
pub struct DataFolderScanner {
    load_order_file: Option<Utf8PathBuf>,
    archive_pattern: Regex,
}

impl Default for DataFolderScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFolderScanner {
    pub fn new() -> Self {
        Self {
            load_order_file: None,
            archive_pattern: Regex::new(r"(?i)^(.+?)(?: - [^.]+)?\.(?:bsa|ba2)$")
                .expect("Invalid archive regex"),
        }
    }

    /// Use a plugins.txt style file to order the listed plugins first.
    pub fn with_load_order(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.load_order_file = Some(path.into());
        self
    }

    /// Stem of the plugin an archive belongs to
    pub fn archive_owner_stem<'a>(&self, archive_name: &'a str) -> Option<&'a str> {
        self.archive_pattern
            .captures(archive_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    fn scan_plugins(&self, data_path: &Utf8Path) -> Result<Vec<Plugin>> {
        let mut found = list_files(data_path, &PLUGIN_EXTENSIONS)?;

        let mut ordered = Vec::with_capacity(found.len());
        if let Some(load_order) = &self.load_order_file {
            for name in read_load_order(load_order)? {
                if let Some(idx) = found.iter().position(|(n, _)| n.eq_ignore_ascii_case(&name)) {
                    let (name, _) = found.remove(idx);
                    ordered.push(Plugin::new(name));
                }
            }
        }

        found.sort_by(|(a_name, a_time), (b_name, b_time)| {
            let a_plugin = Plugin::new(a_name.as_str());
            let b_plugin = Plugin::new(b_name.as_str());
            group(&a_plugin)
                .cmp(&group(&b_plugin))
                .then(a_time.cmp(b_time))
                .then_with(|| a_name.to_ascii_lowercase().cmp(&b_name.to_ascii_lowercase()))
        });
        ordered.extend(found.into_iter().map(|(name, _)| Plugin::new(name)));

        Ok(ordered)
    }

    fn scan_archives(&self, data_path: &Utf8Path, plugins: &[Plugin]) -> Result<Vec<(Archive, Option<usize>)>> {
        let mut archives: Vec<(Archive, Option<usize>)> = list_files(data_path, &ARCHIVE_EXTENSIONS)?
            .into_iter()
            .map(|(name, _)| {
                let owner = self.archive_owner_stem(&name).and_then(|stem| {
                    plugins.iter().position(|p| p.stem().eq_ignore_ascii_case(stem))
                });
                (Archive::new(name), owner)
            })
            .collect();

        archives.sort_by(|(a, a_owner), (b, b_owner)| {
            let rank = |owner: &Option<usize>| owner.unwrap_or(usize::MAX);
            rank(a_owner)
                .cmp(&rank(b_owner))
                .then_with(|| a.name().to_ascii_lowercase().cmp(&b.name().to_ascii_lowercase()))
        });

        Ok(archives)
    }
}

impl ContentRefresh for DataFolderScanner {
    fn refresh(&self, data_path: &Utf8Path, model: &mut ContentLinkModel) -> Result<()> {
        if !data_path.is_dir() {
            tracing::warn!("Data folder {} does not exist, no content to load", data_path);
            return Ok(());
        }

        let plugins = self.scan_plugins(data_path)?;
        let archives = self.scan_archives(data_path, &plugins)?;

        for plugin in &plugins {
            model.add_plugin(plugin.clone());
        }

        for (archive, owner) in archives {
            if let Some(idx) = owner
                && model.resolve(plugins[idx].name()).is_none()
            {
                model.link(plugins[idx].name(), archive.clone())?;
            }
            model.add_archive(archive);
        }

        tracing::info!(
            "Scanned {}: {} plugins, {} archives, {} links",
            data_path,
            model.plugins().len(),
            model.archives().len(),
            model.link_count()
        );

        Ok(())
    }
}

fn group(plugin: &Plugin) -> u8 {
    if plugin.is_master() {
        0
    } else if plugin.is_light() {
        1
    } else {
        2
    }
}

fn list_files(dir: &Utf8Path, extensions: &[&str]) -> Result<Vec<(String, SystemTime)>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Failed to read data folder: {}", dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir))?;
        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!("Skipping non UTF-8 file name in {}", dir);
            continue;
        };

        let matches = name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if !matches {
            continue;
        }

        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to read metadata for {}", name))?;
        if !metadata.is_file() {
            continue;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((name, modified));
    }

    Ok(files)
}

/// Read plugin names from a plugins.txt style file.
///
/// Blank lines and `#` comments are skipped; a leading `*`, `+` or `-` marker is stripped.
pub fn read_load_order(path: &Utf8Path) -> Result<Vec<String>> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open load order file: {}", path))?;

    let reader = BufReader::new(file);
    let mut plugins = Vec::new();

    for line_result in reader.lines() {
        let line = line_result.context("Failed to read line from load order file")?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let name = line.trim_start_matches(['*', '+', '-']).trim();
        if !name.is_empty() {
            plugins.push(name.to_string());
        }
    }

    Ok(plugins)
}
