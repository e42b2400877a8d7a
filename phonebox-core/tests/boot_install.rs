//! Boot-time install and configuration persistence

mod common;

use common::*;
use phonebox_core::boot::{install_pending_update, BootOutcome};
use phonebox_core::config::{ConfigError, NodeConfig};
use phonebox_core::RestartReason;
use phonebox_hal::{FileStore, StoragePath};
use phonebox_protocol::{Timestamp, VersionInfo};

fn pending(size: u32) -> VersionInfo {
    VersionInfo {
        available: true,
        version: [0, 1, 4, 2],
        size,
        timestamp: Timestamp {
            hour: 9,
            day: 12,
            month: 1,
            year: 25,
        },
    }
}

fn stored_version(store: &MemStore) -> VersionInfo {
    VersionInfo::from_bytes(&store.contents(StoragePath::Version).unwrap()).unwrap()
}

#[test]
fn test_nothing_stored_boots_normally() {
    let mut store = MemStore::default();
    let mut updater = MockUpdater::default();
    let mut delay = NoDelay::default();

    let outcome =
        install_pending_update(&mut store, &mut updater, &mut delay, &NodeConfig::default());
    assert_eq!(outcome, Ok(BootOutcome::Ready(VersionInfo::default())));
    assert_eq!(updater.begun_with, None);
}

#[test]
fn test_installed_version_is_reported() {
    let mut store = MemStore::default();
    let mut version = pending(4);
    version.available = false;
    store.put(StoragePath::Version, &version.to_bytes());
    store.put(StoragePath::Firmware, &[1, 2, 3, 4]);

    let outcome = install_pending_update(
        &mut store,
        &mut MockUpdater::default(),
        &mut NoDelay::default(),
        &NodeConfig::default(),
    );
    assert_eq!(outcome, Ok(BootOutcome::Ready(version)));
    assert!(store.contents(StoragePath::Firmware).is_some());
}

#[test]
fn test_pending_image_is_installed() {
    let mut store = MemStore::default();
    let image: Vec<u8> = (0..200u8).collect();
    store.put(StoragePath::Version, &pending(200).to_bytes());
    store.put(StoragePath::Firmware, &image);
    let mut updater = MockUpdater::default();
    let mut delay = NoDelay::default();

    let outcome =
        install_pending_update(&mut store, &mut updater, &mut delay, &NodeConfig::default());

    assert_eq!(outcome, Ok(BootOutcome::Restart(RestartReason::UpdateInstalled)));
    assert_eq!(updater.begun_with, Some(200));
    assert_eq!(updater.image, image);
    assert!(updater.ended);
    assert!(!store.exists(StoragePath::Firmware));
    assert_eq!(delay.total_ms(), 3000);

    // Flag cleared and persisted before the restart request
    let version = stored_version(&store);
    assert!(!version.available);
    assert_eq!(version.version, [0, 1, 4, 2]);
}

#[test]
fn test_failed_install_still_clears_flag() {
    let mut store = MemStore::default();
    store.put(StoragePath::Version, &pending(3).to_bytes());
    store.put(StoragePath::Firmware, &[9, 9, 9]);
    let mut updater = MockUpdater {
        fail_end: true,
        ..MockUpdater::default()
    };

    let outcome = install_pending_update(
        &mut store,
        &mut updater,
        &mut NoDelay::default(),
        &NodeConfig::default(),
    );

    assert_eq!(outcome, Ok(BootOutcome::Restart(RestartReason::UpdateInstalled)));
    assert!(store.was_removed(StoragePath::Firmware));
    assert!(!stored_version(&store).available);
}

#[test]
fn test_firmware_close_failure_does_not_block_install() {
    let mut store = MemStore::default();
    store.put(StoragePath::Version, &pending(3).to_bytes());
    store.put(StoragePath::Firmware, &[7, 7, 7]);
    store.deny_close(StoragePath::Firmware);
    let mut updater = MockUpdater::default();

    let outcome = install_pending_update(
        &mut store,
        &mut updater,
        &mut NoDelay::default(),
        &NodeConfig::default(),
    );

    assert_eq!(outcome, Ok(BootOutcome::Restart(RestartReason::UpdateInstalled)));
    assert_eq!(updater.image, vec![7, 7, 7]);
    assert!(store.was_removed(StoragePath::Firmware));
    assert!(!stored_version(&store).available);
}

#[test]
fn test_rejected_image_is_kept() {
    let mut store = MemStore::default();
    store.put(StoragePath::Version, &pending(3).to_bytes());
    store.put(StoragePath::Firmware, &[9, 9, 9]);
    let mut updater = MockUpdater {
        reject_begin: true,
        ..MockUpdater::default()
    };

    let outcome = install_pending_update(
        &mut store,
        &mut updater,
        &mut NoDelay::default(),
        &NodeConfig::default(),
    );

    assert_eq!(outcome, Ok(BootOutcome::Restart(RestartReason::UpdateInstalled)));
    assert!(!store.was_removed(StoragePath::Firmware));
    assert_eq!(store.contents(StoragePath::Firmware), Some(vec![9, 9, 9]));
    assert!(!stored_version(&store).available);
}

#[test]
fn test_flag_without_image_boots_normally() {
    let mut store = MemStore::default();
    store.put(StoragePath::Version, &pending(3).to_bytes());
    store.put(StoragePath::Firmware, &[]);
    let mut updater = MockUpdater::default();

    let outcome = install_pending_update(
        &mut store,
        &mut updater,
        &mut NoDelay::default(),
        &NodeConfig::default(),
    );

    assert_eq!(outcome, Ok(BootOutcome::Ready(pending(3))));
    assert_eq!(updater.begun_with, None);
}

#[test]
fn test_corrupted_version_record_is_an_error() {
    let mut store = MemStore::default();
    store.put(StoragePath::Version, &[1, 2, 3]);

    let outcome = install_pending_update(
        &mut store,
        &mut MockUpdater::default(),
        &mut NoDelay::default(),
        &NodeConfig::default(),
    );
    assert!(outcome.is_err());
}

#[test]
fn test_config_defaults_when_absent() {
    let mut store = MemStore::default();
    assert_eq!(NodeConfig::load(&mut store), Ok(NodeConfig::default()));
}

#[test]
fn test_config_save_then_load() {
    let mut store = MemStore::default();
    let mut config = NodeConfig::default();
    config.server_port = 5555;
    config.module_count = Some(4);
    config.retry.backoff_ms = 250;

    config.save(&mut store).unwrap();
    assert_eq!(NodeConfig::load(&mut store), Ok(config));
}

#[test]
fn test_config_garbage_falls_back() {
    let mut store = MemStore::default();
    store.put(StoragePath::Config, &[0xFF; 3]);

    assert_eq!(NodeConfig::load(&mut store), Err(ConfigError::Decode));
    assert_eq!(NodeConfig::load_or_default(&mut store), NodeConfig::default());
}

#[test]
fn test_invalid_config_not_saved() {
    let mut store = MemStore::default();
    let mut config = NodeConfig::default();
    config.geometry.outputs_per_module = 0;

    assert_eq!(config.save(&mut store), Err(ConfigError::Invalid));
    assert!(!store.exists(StoragePath::Config));
}
