//! Integration tests for GameManager with game events
//!
//! These tests verify that the GameManager correctly:
//! - Emits detection and content events
//! - Supports multiple subscribers
//! - Applies explicit install overrides by game id
//! - Refuses to select games without an installation

use camino::Utf8PathBuf;
use foesmm_core::config::default_catalog;
use foesmm_core::services::resolver::{STEAM_ROOT, STEAM_VALUE};
use foesmm_core::services::{Channel, DataFolderScanner, InstallSource, NoVersion, SnapshotLookup};
use foesmm_core::{GameEvent, GameManager, GameManagerError};
use indexmap::IndexMap;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::time::{Duration, timeout};

fn install(temp_dir: &TempDir, folder: &str, exe: &str, data_files: &[&str]) -> Utf8PathBuf {
    let path = Utf8PathBuf::try_from(temp_dir.path().join(folder)).unwrap();
    fs::create_dir_all(path.join("Data")).unwrap();
    fs::write(path.join(exe), b"MZ").unwrap();
    for file in data_files {
        fs::write(path.join("Data").join(file), b"").unwrap();
    }
    path
}

fn manager(lookup: SnapshotLookup) -> GameManager {
    let mut manager = GameManager::from_catalog(&default_catalog(), Arc::new(lookup), Arc::new(NoVersion));
    for id in ["fallout3", "falloutnv", "fallout4"] {
        manager.set_refresher(id, Arc::new(DataFolderScanner::new())).unwrap();
    }
    manager
}

#[tokio::test]
async fn test_detection_events_emitted() {
    let temp_dir = TempDir::new().unwrap();
    let steam = install(&temp_dir, "Fallout 4", "Fallout4.exe", &["Fallout4.esm", "Fallout4 - Meshes.ba2"]);
    let lookup = SnapshotLookup::new().with(STEAM_ROOT, "Steam App 377160", STEAM_VALUE, &steam);

    let mut manager = manager(lookup);
    let mut rx = manager.subscribe();

    assert_eq!(manager.detect("Fallout4", None), Ok(true));

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");
    assert_eq!(
        event,
        GameEvent::InstallationDetected {
            game_id: "fallout4".to_string(),
            path: steam.clone(),
            source: InstallSource::Channel(Channel::Steam),
        }
    );

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");
    assert_eq!(
        event,
        GameEvent::ContentRefreshed {
            game_id: "fallout4".to_string(),
            plugins: 1,
            archives: 1,
            links: 1,
        }
    );
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let mut manager = manager(SnapshotLookup::new());
    let mut rx1 = manager.subscribe();
    let mut rx2 = manager.subscribe();

    assert_eq!(manager.detect("fallout3", None), Ok(false));

    for rx in [&mut rx1, &mut rx2] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");
        assert_eq!(event, GameEvent::InstallationNotFound { game_id: "fallout3".to_string() });
    }
}

#[test]
fn test_detect_all_with_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let fnv = install(&temp_dir, "FNV", "FalloutNV.exe", &["FalloutNV.esm"]);

    let mut manager = manager(SnapshotLookup::new());
    let mut overrides = IndexMap::new();
    overrides.insert("FalloutNV".to_string(), fnv.clone());

    let installed = manager.detect_all(&overrides);
    assert_eq!(installed, vec!["falloutnv".to_string()]);

    let game = manager.get("falloutnv").unwrap();
    assert_eq!(game.install_path(), Some(fnv.as_path()));
    assert!(game.content().contains_plugin("FalloutNV.esm"));
    assert_eq!(manager.installed().count(), 1);
}

#[test]
fn test_select_requires_installation() {
    let temp_dir = TempDir::new().unwrap();
    let fnv = install(&temp_dir, "FNV", "FalloutNV.exe", &[]);

    let mut manager = manager(SnapshotLookup::new());
    assert_eq!(manager.select("fallout3"), Err(GameManagerError::NotInstalled("fallout3".to_string())));
    assert_eq!(manager.select("morrowind"), Err(GameManagerError::UnknownGame("morrowind".to_string())));

    assert_eq!(manager.detect("falloutnv", Some(&fnv)), Ok(true));
    let mut rx = manager.subscribe();
    manager.select("FalloutNV").unwrap();
    manager.select("falloutnv").unwrap();

    assert_eq!(manager.selected().map(|g| g.id()), Some("falloutnv"));
    assert_eq!(rx.try_recv().unwrap(), GameEvent::GameSelected { game_id: "falloutnv".to_string() });
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_refresh_content_event_blocking() {
    let temp_dir = TempDir::new().unwrap();
    let fo3 = install(&temp_dir, "Fallout 3", "Fallout3.exe", &["Fallout3.esm"]);

    let mut manager = manager(SnapshotLookup::new());
    manager.detect("fallout3", Some(&fo3)).unwrap();
    let mut rx = manager.subscribe();

    fs::write(fo3.join("Data").join("Anchorage.esm"), b"").unwrap();
    manager.refresh_content("fallout3").unwrap();

    let event = tokio_test::block_on(rx.recv()).unwrap();
    assert!(
        matches!(event, GameEvent::ContentRefreshed { plugins: 2, .. }),
        "Expected ContentRefreshed with 2 plugins, got: {:?}",
        event
    );
}
