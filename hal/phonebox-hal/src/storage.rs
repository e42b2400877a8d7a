//! Persistent file storage abstractions
//!
//! The node persists a handful of files at fixed paths on a small flash
//! filesystem. There are no directories; every file is addressed by a
//! [`StoragePath`].

/// Files the node keeps in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoragePath {
    /// Downloaded firmware image awaiting installation
    Firmware,
    /// 13-byte version record (see `phonebox_protocol::VersionInfo`)
    Version,
    /// Node configuration (binary postcard format)
    Config,
}

impl StoragePath {
    /// Filesystem path of this file
    pub fn as_str(self) -> &'static str {
        match self {
            StoragePath::Firmware => "/firmware",
            StoragePath::Version => "/version",
            StoragePath::Config => "/config",
        }
    }

}

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    /// Read from the start of an existing file
    Read,
    /// Create or truncate, then write from the start
    Write,
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// File could not be opened
    Open,
    /// Read failed
    Read,
    /// Write failed or wrote nothing
    Write,
    /// File does not exist
    NotFound,
    /// Data corrupted or has the wrong layout
    Corrupted,
    /// Filesystem is full
    Full,
}

/// An open file handle
///
/// Dropping a handle without [`StoredFile::close`] may leave buffered
/// writes unflushed on some filesystems.
pub trait StoredFile {
    /// Read up to `buf.len()` bytes, returning how many were read
    ///
    /// `Ok(0)` means end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Append `data`, returning how many bytes were written
    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError>;

    /// Total size of the file in bytes
    fn size(&self) -> usize;

    /// Flush and close the file
    fn close(self) -> Result<(), StorageError>
    where
        Self: Sized;
}

/// Minimal file store
pub trait FileStore {
    /// Handle type returned by [`FileStore::open`]
    type File: StoredFile;

    /// Open a file
    ///
    /// Opening with [`OpenMode::Write`] truncates any existing content.
    fn open(&mut self, path: StoragePath, mode: OpenMode) -> Result<Self::File, StorageError>;

    /// Delete a file
    fn remove(&mut self, path: StoragePath) -> Result<(), StorageError>;

    /// Check if a file exists
    fn exists(&mut self, path: StoragePath) -> bool;

    /// Read a whole small file into `buffer`
    ///
    /// Returns the number of bytes read. Fails with
    /// [`StorageError::Corrupted`] if the file is larger than `buffer`.
    fn read_file(&mut self, path: StoragePath, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let mut file = self.open(path, OpenMode::Read)?;
        if file.size() > buffer.len() {
            return Err(StorageError::Corrupted);
        }

        let mut filled = 0;
        while filled < buffer.len() {
            let n = file.read(&mut buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        file.close()?;
        Ok(filled)
    }

    /// Replace a whole small file with `data`
    fn write_file(&mut self, path: StoragePath, data: &[u8]) -> Result<(), StorageError> {
        let mut file = self.open(path, OpenMode::Write)?;
        let mut written = 0;
        while written < data.len() {
            let n = file.write(&data[written..])?;
            if n == 0 {
                return Err(StorageError::Write);
            }
            written += n;
        }
        file.close()
    }
}
