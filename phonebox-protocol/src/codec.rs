//! Byte-level decoding helpers
//!
//! The transport gives no framing guarantees beyond ordering, so every
//! field is assembled from single-byte reads.

use embedded_io::{Read, ReadExactError};

/// Errors that can occur while decoding a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError<E> {
    /// The 4-byte magic matches no known packet type
    UnknownMagic(u32),
    /// Declared module count exceeds `MAX_IO_MODULES`
    TooManyModules(u16),
    /// The stream ended in the middle of a message
    UnexpectedEof,
    /// The underlying reader failed
    Io(E),
}

impl<E> From<ReadExactError<E>> for DecodeError<E> {
    fn from(e: ReadExactError<E>) -> Self {
        match e {
            ReadExactError::UnexpectedEof => DecodeError::UnexpectedEof,
            ReadExactError::Other(e) => DecodeError::Io(e),
        }
    }
}

/// Read a single byte
pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8, DecodeError<R::Error>> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Read `N` bytes (at most 4) and assemble them little-endian
pub fn read_le<R: Read, const N: usize>(reader: &mut R) -> Result<u32, DecodeError<R::Error>> {
    let mut value = 0u32;
    for shift in 0..N.min(4) {
        value |= (read_u8(reader)? as u32) << (8 * shift);
    }
    Ok(value)
}

/// Read a little-endian `u16`
pub fn read_u16_le<R: Read>(reader: &mut R) -> Result<u16, DecodeError<R::Error>> {
    read_le::<R, 2>(reader).map(|v| v as u16)
}

/// Read a little-endian `u32`
pub fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32, DecodeError<R::Error>> {
    read_le::<R, 4>(reader)
}

/// Read `N` bytes, storing the first byte received last
pub fn read_reversed<R: Read, const N: usize>(
    reader: &mut R,
) -> Result<[u8; N], DecodeError<R::Error>> {
    let mut out = [0u8; N];
    for i in 0..N {
        out[N - 1 - i] = read_u8(reader)?;
    }
    Ok(out)
}
