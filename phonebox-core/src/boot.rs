//! Boot-time installation of a pending image
//!
//! A completed transfer leaves the image in `/firmware` and a version
//! record flagged available. On the next boot the image is streamed into
//! the flashing primitive, the flag is cleared and persisted, and a restart
//! is requested.

use embedded_hal::delay::DelayNs;
use phonebox_hal::{FileStore, FirmwareUpdater, OpenMode, StorageError, StoragePath, StoredFile};
use phonebox_protocol::VersionInfo;

use crate::config::NodeConfig;
use crate::engine::RestartReason;
use crate::update::{load_version, store_version};

/// What the node should do after the boot check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootOutcome {
    /// Nothing to install, continue with the running image
    Ready(VersionInfo),
    /// An image was consumed, restart into it
    Restart(RestartReason),
}

/// Boot check errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootError {
    /// Version record or firmware file could not be accessed
    Storage(StorageError),
}

impl From<StorageError> for BootError {
    fn from(e: StorageError) -> Self {
        BootError::Storage(e)
    }
}

/// Result of streaming the image into the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Install {
    /// Updater refused the image size, nothing was written
    Rejected,
    /// Image written and verified
    Installed(usize),
    /// Image written but the updater reported an error
    Failed,
}

/// Install a pending image if one is stored
///
/// The availability flag is cleared and persisted before the restart is
/// requested, whether or not flashing succeeded, so a bad image cannot cause
/// a boot loop. The firmware file is removed only once the updater has
/// accepted it.
pub fn install_pending_update<S, U, D>(
    store: &mut S,
    updater: &mut U,
    delay: &mut D,
    config: &NodeConfig,
) -> Result<BootOutcome, BootError>
where
    S: FileStore,
    U: FirmwareUpdater,
    D: DelayNs,
{
    let mut version = load_version(store)?;
    info!("Installed version {}.{}.{}", version.major(), version.minor(), version.patch());

    if !version.available {
        info!("No updates to install");
        return Ok(BootOutcome::Ready(version));
    }

    if !store.exists(StoragePath::Firmware) {
        warn!("Update flagged but no firmware file present");
        return Ok(BootOutcome::Ready(version));
    }

    let mut file = store.open(StoragePath::Firmware, OpenMode::Read)?;
    let size = file.size();
    if size == 0 {
        close_firmware(file);
        warn!("Update flagged but firmware file is empty");
        return Ok(BootOutcome::Ready(version));
    }

    info!("Installing software update ({} bytes)", size);
    let result = install(updater, &mut file, size);
    close_firmware(file);

    match result {
        Install::Installed(written) => info!("Update installed successfully ({} bytes)", written),
        Install::Failed => error!("Update failed to install"),
        Install::Rejected => error!("Updater rejected image of {} bytes", size),
    }

    if result != Install::Rejected {
        if let Err(e) = store.remove(StoragePath::Firmware) {
            warn!("Failed to remove firmware file: {:?}", e);
        }
    }

    version.available = false;
    store_version(store, &version)?;

    info!("Device reset in {} ms", config.install_restart_delay_ms);
    delay.delay_ms(config.install_restart_delay_ms);
    Ok(BootOutcome::Restart(RestartReason::UpdateInstalled))
}

fn close_firmware<F: StoredFile>(file: F) {
    if let Err(e) = file.close() {
        warn!("Failed to close firmware file: {:?}", e);
    }
}

fn install<U: FirmwareUpdater, F: StoredFile>(updater: &mut U, file: &mut F, size: usize) -> Install {
    if updater.begin(size).is_err() {
        return Install::Rejected;
    }

    let written = updater.write_stream(file);
    match (written, updater.end()) {
        (Ok(n), Ok(())) => Install::Installed(n),
        _ => Install::Failed,
    }
}
