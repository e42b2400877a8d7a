//! Control/I-O frame encoding and decoding
//!
//! Frame layout (offsets into the fixed 88-byte buffer):
//! - 0..4   MAGIC: `HEADER_PACKET`, little-endian
//! - 4..6   SIZE: number of module records that follow
//! - 6      ALARM: alarm light on if non-zero
//! - 7      BUZZER: buzzer on if non-zero
//! - 8..88  module records, 8 bytes each; unused records are zero
//!
//! Module record layout:
//! - 0..4   INPUTS: bits last sampled from the module, little-endian
//! - 4..8   OUTPUTS: bits to drive on the module, little-endian

use embedded_io::Read;

use crate::codec::{read_u16_le, read_u32_le, read_u8, DecodeError};

/// First byte of every message (low byte of each magic)
pub const OPEN_TAG: u8 = 0xFA;

/// Last byte of the ACK/NACK reply packets
pub const CLOSE_TAG: u8 = 0x7E;

/// Size of the packet magic
pub const HEADER_BYTES: usize = 4;

/// Magic of a control/I-O frame
pub const HEADER_PACKET: u32 = 0xAACA_EAFA;

/// Magic of a firmware update announcement
pub const UPDATE_HEADER_PACKET: u32 = 0xBBCA_EAFA;

/// Maximum number of modules in the chain
pub const MAX_IO_MODULES: usize = 10;

/// Size of one module record
pub const MODULE_RECORD_BYTES: usize = 8;

/// Size of the fixed frame buffer
pub const FRAME_BYTES: usize = HEADER_BYTES + 2 + 1 + 1 + MAX_IO_MODULES * MODULE_RECORD_BYTES;

/// Positive acknowledgement ("YE")
pub const ACK_PACKET: [u8; 4] = [OPEN_TAG, 0x59, 0x45, CLOSE_TAG];

/// Negative acknowledgement ("NO")
pub const NACK_PACKET: [u8; 4] = [OPEN_TAG, 0x4E, 0x4F, CLOSE_TAG];

/// Packet types selected by the 4-byte magic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketKind {
    /// Control/I-O frame
    Io,
    /// Firmware update announcement
    Update,
}

impl PacketKind {
    /// Identify a packet type from its magic
    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            HEADER_PACKET => Some(PacketKind::Io),
            UPDATE_HEADER_PACKET => Some(PacketKind::Update),
            _ => None,
        }
    }

}

/// Read the remaining three magic bytes after an open tag
///
/// `first` is the tag byte already consumed by the caller.
pub fn read_packet_kind<R: Read>(
    reader: &mut R,
    first: u8,
) -> Result<PacketKind, DecodeError<R::Error>> {
    let mut magic = first as u32;
    for shift in 1..HEADER_BYTES {
        magic |= (read_u8(reader)? as u32) << (8 * shift);
    }
    PacketKind::from_magic(magic).ok_or(DecodeError::UnknownMagic(magic))
}

/// Output and input state of one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleRecord {
    /// Bits last sampled from the module
    pub inputs: u32,
    /// Bits to drive on the module
    pub outputs: u32,
}

impl ModuleRecord {
    /// Create a record driving `outputs`
    pub const fn with_outputs(outputs: u32) -> Self {
        Self { inputs: 0, outputs }
    }

    /// Unpack a record from its wire layout
    pub fn from_bytes(bytes: &[u8; MODULE_RECORD_BYTES]) -> Self {
        Self {
            inputs: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            outputs: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Pack a record into its wire layout
    pub fn to_bytes(&self) -> [u8; MODULE_RECORD_BYTES] {
        let mut out = [0u8; MODULE_RECORD_BYTES];
        out[..4].copy_from_slice(&self.inputs.to_le_bytes());
        out[4..].copy_from_slice(&self.outputs.to_le_bytes());
        out
    }

    /// Check whether output `bit` should be driven high
    pub fn output(&self, bit: u8) -> bool {
        bit < 32 && self.outputs & (1 << bit) != 0
    }

    /// Record a high reading on input `bit`
    pub fn set_input(&mut self, bit: u8) {
        if bit < 32 {
            self.inputs |= 1 << bit;
        }
    }
}

/// A control/I-O frame
///
/// At most one frame is in flight; the engine decodes into it, runs the
/// bus transfer on its records and echoes the whole buffer back.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Magic as received
    pub header: u32,
    /// Number of module records (replaced by the chain length in replies)
    pub size: u16,
    /// Alarm light value
    pub alarm: u8,
    /// Buzzer value
    pub buzzer: u8,
    /// Module records; entries past `size` are zero
    pub modules: [ModuleRecord; MAX_IO_MODULES],
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}

impl Frame {
    /// Create an all-zero frame
    pub const fn empty() -> Self {
        Self {
            header: 0,
            size: 0,
            alarm: 0,
            buzzer: 0,
            modules: [ModuleRecord {
                inputs: 0,
                outputs: 0,
            }; MAX_IO_MODULES],
        }
    }

    /// Build an I/O frame from module records
    ///
    /// Records past `MAX_IO_MODULES` are ignored.
    pub fn io(alarm: u8, buzzer: u8, records: &[ModuleRecord]) -> Self {
        let mut frame = Self::empty();
        let count = records.len().min(MAX_IO_MODULES);
        frame.header = HEADER_PACKET;
        frame.size = count as u16;
        frame.alarm = alarm;
        frame.buzzer = buzzer;
        frame.modules[..count].copy_from_slice(&records[..count]);
        frame
    }

    /// Read everything after the magic of an I/O frame
    ///
    /// A declared size above `MAX_IO_MODULES` is rejected before any
    /// record byte is consumed.
    pub fn read_body<R: Read>(reader: &mut R, header: u32) -> Result<Self, DecodeError<R::Error>> {
        let size = read_u16_le(reader)?;
        if size as usize > MAX_IO_MODULES {
            return Err(DecodeError::TooManyModules(size));
        }

        let mut frame = Self::empty();
        frame.header = header;
        frame.size = size;
        frame.alarm = read_u8(reader)?;
        frame.buzzer = read_u8(reader)?;

        for record in frame.modules.iter_mut().take(size as usize) {
            let mut bytes = [0u8; MODULE_RECORD_BYTES];
            reader.read_exact(&mut bytes)?;
            *record = ModuleRecord::from_bytes(&bytes);
        }

        Ok(frame)
    }

    /// Decode a complete I/O frame, magic included
    pub fn decode<R: Read>(reader: &mut R) -> Result<Self, DecodeError<R::Error>> {
        let magic = read_u32_le(reader)?;
        match PacketKind::from_magic(magic) {
            Some(PacketKind::Io) => Self::read_body(reader, magic),
            _ => Err(DecodeError::UnknownMagic(magic)),
        }
    }

    /// Encode the whole frame buffer
    pub fn encode(&self, buffer: &mut [u8; FRAME_BYTES]) {
        buffer[0..4].copy_from_slice(&self.header.to_le_bytes());
        buffer[4..6].copy_from_slice(&self.size.to_le_bytes());
        buffer[6] = self.alarm;
        buffer[7] = self.buzzer;
        for (chunk, record) in buffer[8..]
            .chunks_exact_mut(MODULE_RECORD_BYTES)
            .zip(self.modules.iter())
        {
            chunk.copy_from_slice(&record.to_bytes());
        }
    }

    /// Encode the whole frame buffer into a new array
    pub fn to_bytes(&self) -> [u8; FRAME_BYTES] {
        let mut buffer = [0u8; FRAME_BYTES];
        self.encode(&mut buffer);
        buffer
    }

    /// Records covered by the declared size
    pub fn records(&self) -> &[ModuleRecord] {
        &self.modules[..(self.size as usize).min(MAX_IO_MODULES)]
    }

    /// Check if the alarm light should be on
    pub fn alarm_on(&self) -> bool {
        self.alarm != 0
    }

    /// Check if the buzzer should be on
    pub fn buzzer_on(&self) -> bool {
        self.buzzer != 0
    }
}
