//! Firmware flashing abstraction
//!
//! Wraps the chip's OTA update primitive. The node only streams a stored
//! image into it; partition selection and boot switching are up to the
//! implementation.

use crate::storage::StoredFile;

/// Firmware flashing primitive
pub trait FirmwareUpdater {
    /// Error type for flashing operations
    type Error;

    /// Prepare to receive an image of `size` bytes
    fn begin(&mut self, size: usize) -> Result<(), Self::Error>;

    /// Stream the image from `source` until end of file
    ///
    /// Returns the number of bytes flashed.
    fn write_stream<F: StoredFile>(&mut self, source: &mut F) -> Result<usize, Self::Error>;

    /// Finalise the update
    ///
    /// Returns an error if the written image is incomplete or fails
    /// verification.
    fn end(&mut self) -> Result<(), Self::Error>;
}
