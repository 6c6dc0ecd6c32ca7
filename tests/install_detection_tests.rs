//! Integration tests for installation discovery
//!
//! These tests verify that GameInstance detection:
//! - Prefers GOG over Steam over retail when several channels are installed
//! - Falls through stale registry entries to the next valid candidate
//! - Honors an explicit folder before any channel
//! - Keeps the previous installation when re-detection finds nothing

use camino::{Utf8Path, Utf8PathBuf};
use foesmm_core::services::resolver::{GOG_ROOT, GOG_VALUE, RETAIL_ROOT, STEAM_ROOT, STEAM_VALUE};
use foesmm_core::services::{Channel, InstallSource, NoVersion, SnapshotLookup};
use foesmm_core::{GameDescriptor, GameInstance, GameStatus};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn new_vegas() -> GameDescriptor {
    GameDescriptor::new("falloutnv", "Fallout: New Vegas", "FNV", 2010, "FalloutNV.exe")
        .with_gog_keys(["1454587428"])
        .with_steam_keys(["Steam App 22380"])
        .with_retail_key(r"Bethesda Softworks\FalloutNV", "Installed Path")
}

fn install(temp_dir: &TempDir, name: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::try_from(temp_dir.path().join(name)).unwrap();
    fs::create_dir_all(path.join("Data")).unwrap();
    fs::write(path.join("FalloutNV.exe"), b"MZ").unwrap();
    path
}

fn game(lookup: SnapshotLookup) -> GameInstance {
    GameInstance::new(new_vegas(), Arc::new(lookup), Arc::new(NoVersion))
}

#[test]
fn test_gog_preferred_over_steam() {
    let temp_dir = TempDir::new().unwrap();
    let gog = install(&temp_dir, "GOG");
    let steam = install(&temp_dir, "Steam");

    let lookup = SnapshotLookup::new()
        .with(STEAM_ROOT, "Steam App 22380", STEAM_VALUE, &steam)
        .with(GOG_ROOT, "1454587428", GOG_VALUE, &gog);

    let mut game = game(lookup);
    assert_eq!(game.resolve_installation(None), Some(InstallSource::Channel(Channel::Gog)));
    assert_eq!(game.install_path(), Some(gog.as_path()));
    assert_eq!(game.status(), GameStatus::Configured);
}

#[test]
fn test_detection_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let steam = install(&temp_dir, "Steam");
    let lookup = SnapshotLookup::new().with(STEAM_ROOT, "Steam App 22380", STEAM_VALUE, &steam);

    let mut game = game(lookup);
    assert!(game.detect_installation(None));
    let first = game.install_path().map(Utf8Path::to_path_buf);

    assert!(game.detect_installation(None));
    assert_eq!(game.install_path().map(Utf8Path::to_path_buf), first);
}

#[test]
fn test_stale_gog_entry_falls_back_to_retail() {
    let temp_dir = TempDir::new().unwrap();
    let retail = install(&temp_dir, "Retail");
    let missing = Utf8PathBuf::try_from(temp_dir.path().join("Uninstalled")).unwrap();

    let lookup = SnapshotLookup::new()
        .with(GOG_ROOT, "1454587428", GOG_VALUE, &missing)
        .with(RETAIL_ROOT, r"Bethesda Softworks\FalloutNV", "Installed Path", &retail);

    let mut game = game(lookup);
    assert_eq!(game.resolve_installation(None), Some(InstallSource::Channel(Channel::Retail)));
    assert_eq!(game.install_path(), Some(retail.as_path()));
}

#[test]
fn test_folder_without_executable_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let empty = Utf8PathBuf::try_from(temp_dir.path().join("Empty")).unwrap();
    fs::create_dir_all(&empty).unwrap();

    let lookup = SnapshotLookup::new().with(GOG_ROOT, "1454587428", GOG_VALUE, &empty);

    let mut game = game(lookup);
    assert!(!game.detect_installation(None));
    assert_eq!(game.status(), GameStatus::Unconfigured);
    assert_eq!(game.install_path(), None);
}

#[test]
fn test_explicit_path_wins() {
    let temp_dir = TempDir::new().unwrap();
    let gog = install(&temp_dir, "GOG");
    let portable = install(&temp_dir, "Portable");

    let lookup = SnapshotLookup::new().with(GOG_ROOT, "1454587428", GOG_VALUE, &gog);

    let mut game = game(lookup);
    assert_eq!(game.resolve_installation(Some(&portable)), Some(InstallSource::Explicit));
    assert_eq!(game.install_path(), Some(portable.as_path()));
}

#[test]
fn test_invalid_explicit_path_falls_back_to_channels() {
    let temp_dir = TempDir::new().unwrap();
    let steam = install(&temp_dir, "Steam");
    let bogus = Utf8PathBuf::try_from(temp_dir.path().join("Bogus")).unwrap();

    let lookup = SnapshotLookup::new().with(STEAM_ROOT, "Steam App 22380", STEAM_VALUE, &steam);

    let mut game = game(lookup);
    assert_eq!(game.resolve_installation(Some(&bogus)), Some(InstallSource::Channel(Channel::Steam)));
}

#[test]
fn test_failed_redetection_keeps_previous_path() {
    let temp_dir = TempDir::new().unwrap();
    let portable = install(&temp_dir, "Portable");

    let mut game = game(SnapshotLookup::new());
    assert!(game.detect_installation(Some(&portable)));

    fs::remove_file(portable.join("FalloutNV.exe")).unwrap();
    assert!(!game.detect_installation(None));
    assert_eq!(game.install_path(), Some(portable.as_path()));
}

#[test]
fn test_stored_path_reused_on_redetection() {
    let temp_dir = TempDir::new().unwrap();
    let portable = install(&temp_dir, "Portable");
    let gog = install(&temp_dir, "GOG");

    let lookup = SnapshotLookup::new().with(GOG_ROOT, "1454587428", GOG_VALUE, &gog);

    let mut game = game(lookup);
    assert!(game.detect_installation(Some(&portable)));
    assert_eq!(game.resolve_installation(None), Some(InstallSource::Stored));
    assert_eq!(game.install_path(), Some(portable.as_path()));
}

#[test]
fn test_snapshot_from_yaml_is_case_insensitive() {
    let temp_dir = TempDir::new().unwrap();
    let gog = install(&temp_dir, "GOG");

    let yaml = format!(
        "'SOFTWARE\\GOG.com\\Games\\1454587428':\n  PATH: '{}'\n",
        gog
    );
    let lookup: SnapshotLookup = serde_yaml_ng::from_str(&yaml).unwrap();

    let mut game = game(lookup);
    assert_eq!(game.resolve_installation(None), Some(InstallSource::Channel(Channel::Gog)));
}
