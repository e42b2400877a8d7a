//! Version record persistence

use phonebox_hal::{FileStore, StorageError, StoragePath};
use phonebox_protocol::{VersionInfo, VERSION_RECORD_BYTES};

/// Read the version record
///
/// A missing record yields the default (nothing installed, nothing
/// pending).
pub fn load_version<S: FileStore>(store: &mut S) -> Result<VersionInfo, StorageError> {
    if !store.exists(StoragePath::Version) {
        return Ok(VersionInfo::default());
    }

    let mut buffer = [0u8; VERSION_RECORD_BYTES];
    let len = store.read_file(StoragePath::Version, &mut buffer)?;
    VersionInfo::from_bytes(&buffer[..len]).ok_or(StorageError::Corrupted)
}

/// Overwrite the version record
pub fn store_version<S: FileStore>(store: &mut S, version: &VersionInfo) -> Result<(), StorageError> {
    store.write_file(StoragePath::Version, &version.to_bytes())
}
