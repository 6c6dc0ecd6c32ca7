//! foesmm - Game installation detection report
//!
//! Main entry point for the command-line tool.
//!
//! # Execution Flow
//!
//! 1. Load configuration from `FOESMM Data/` (or the directory given as first argument)
//!    - `Games.yaml` → Supported games and channel keys (built-in catalog if missing)
//!    - `Settings.yaml` → User preferences, install path overrides, load order files
//!    - `Registry.yaml` → Optional key/value snapshot consulted after the system registry
//! 2. Initialize logging → `FOESMM Data/logs/foesmm.<date>` unless `log_dir` is absolute
//! 3. Detect every game and scan the `Data` folder of the installed ones
//! 4. Print a report and remember the selected game
//!
//! # Platform
//!
//! Channel lookup reads the Windows registry. Other hosts rely on `Registry.yaml` and
//! the explicit overrides in `Settings.yaml`.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use foesmm_core::logging::{self, LogOptions};
use foesmm_core::services::{ChainLookup, DataFolderScanner, FixedFileInfoProbe, RegistryLookup, SnapshotLookup};
use foesmm_core::{APP_NAME, ConfigManager, GameEvent, GameManager, VERSION};
use std::fs;
use std::sync::Arc;

const DEFAULT_CONFIG_DIR: &str = "FOESMM Data";
const SNAPSHOT_FILE: &str = "Registry.yaml";

fn main() -> Result<()> {
    let config_dir = std::env::args()
        .nth(1)
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CONFIG_DIR));

    let config_manager = ConfigManager::new(&config_dir)?;
    let settings = config_manager.load_settings()?;

    let _guard = logging::init(&LogOptions::from_settings(&settings, config_manager.config_dir()))?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let catalog = config_manager.load_catalog()?;

    let mut lookup = ChainLookup::new().push(Arc::new(RegistryLookup::new()));
    let snapshot_path = config_manager.config_dir().join(SNAPSHOT_FILE);
    if snapshot_path.is_file() {
        let contents = fs::read_to_string(&snapshot_path)
            .with_context(|| format!("Failed to read snapshot: {}", snapshot_path))?;
        let snapshot: SnapshotLookup = serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot: {}", snapshot_path))?;
        tracing::info!("Loaded {} snapshot keys from {}", snapshot.len(), snapshot_path);
        lookup = lookup.push(Arc::new(snapshot));
    }

    let mut manager = GameManager::from_catalog(&catalog, Arc::new(lookup), Arc::new(FixedFileInfoProbe));
    let mut events = manager.subscribe();

    for descriptor in &catalog.games {
        let mut scanner = DataFolderScanner::new();
        if let Some(load_order) = settings.load_order_file(&descriptor.id) {
            scanner = scanner.with_load_order(load_order.clone());
        }
        manager.set_refresher(&descriptor.id, Arc::new(scanner))?;
    }

    let installed = manager.detect_all(&settings.install_paths);

    while let Ok(event) = events.try_recv() {
        match event {
            GameEvent::InstallationDetected { game_id, path, source } => {
                tracing::debug!("{}: {} via {}", game_id, path, source)
            }
            GameEvent::InstallationNotFound { game_id } => tracing::debug!("{}: not installed", game_id),
            GameEvent::ContentRefreshed { game_id, plugins, archives, links } => tracing::debug!(
                "{}: {} plugins, {} archives, {} links",
                game_id,
                plugins,
                archives,
                links
            ),
            GameEvent::GameSelected { .. } => {}
        }
    }

    println!("{} v{}", APP_NAME, VERSION);
    for game in manager.games() {
        match game.install_path() {
            Some(path) => println!(
                "  {:<24} {} [version {}, {}, {} plugins, {} archives]",
                game.title(),
                path,
                game.version().unwrap_or_else(|| "unknown".to_string()),
                game.addressing_mode(),
                game.content().plugins().len(),
                game.content().archives().len(),
            ),
            None => println!("  {:<24} not found", game.title()),
        }
    }

    let selected = settings
        .selected_game
        .clone()
        .filter(|id| installed.iter().any(|i| i.eq_ignore_ascii_case(id)))
        .or_else(|| installed.first().cloned());

    if let Some(id) = selected {
        manager.select(&id)?;
        if settings.selected_game.as_deref() != Some(id.as_str()) {
            let mut settings = settings.clone();
            settings.selected_game = Some(id.clone());
            config_manager.save_settings(&settings)?;
        }
        println!("Selected: {}", id);
    }

    tracing::info!("{} of {} games installed", installed.len(), manager.len());
    Ok(())
}
