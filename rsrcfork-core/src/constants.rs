//! Constants and limits for the resource fork format

use serde::{Deserialize, Serialize};

/// Size of the fork header (data offset, map offset, data length, map length)
pub const FORK_HEADER_SIZE: usize = 16;

/// System-reserved (112) plus application-reserved (128) bytes after the header
pub const RESERVED_AFTER_HEADER: usize = 112 + 128;

/// Offset of the data area in forks produced by the writer
pub const DATA_AREA_OFFSET: usize = FORK_HEADER_SIZE + RESERVED_AFTER_HEADER;

/// Map header: header copy (16) + next map handle (4) + file ref (2) +
/// file attributes (2) + type list offset (2) + name list offset (2)
pub const MAP_HEADER_SIZE: usize = 28;

/// Size of one type list entry: type (4) + count-1 (2) + ref list offset (2)
pub const TYPE_ENTRY_SIZE: usize = 8;

/// Size of one reference list entry: id (2) + name offset (2) +
/// attributes (1) + data offset (3) + handle (4)
pub const REF_ENTRY_SIZE: usize = 12;

/// Name offset marking an unnamed resource
pub const NO_NAME: u16 = 0xFFFF;

/// Largest data-area offset a reference entry can store
pub const MAX_DATA_OFFSET: usize = 0x00FF_FFFF;

/// Longest Pascal-style name
pub const MAX_NAME_LEN: usize = 255;

/// AppleDouble magic number
pub const APPLE_DOUBLE_MAGIC: u32 = 0x0005_1607;

/// AppleDouble version 2
pub const APPLE_DOUBLE_VERSION: u32 = 0x0002_0000;

/// AppleDouble entry ID of the resource fork
pub const APPLE_DOUBLE_RESOURCE_FORK: u32 = 2;

/// Resource attribute bits (stored as a single byte in the reference entry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourceAttributes(u8);

impl ResourceAttributes {
    /// No attributes set
    pub const NONE: u8 = 0b0000_0000;

    /// Resource is compressed
    pub const COMPRESSED: u8 = 0b0000_0001;

    /// Resource was modified (in-memory only on the original system)
    pub const CHANGED: u8 = 0b0000_0010;

    /// Load the resource when the file is opened
    pub const PRELOAD: u8 = 0b0000_0100;

    /// Resource cannot be changed
    pub const PROTECTED: u8 = 0b0000_1000;

    /// Resource cannot be moved in memory
    pub const LOCKED: u8 = 0b0001_0000;

    /// Resource may be purged from memory
    pub const PURGEABLE: u8 = 0b0010_0000;

    /// Load into the system heap
    pub const SYS_HEAP: u8 = 0b0100_0000;

    /// Reserved system reference bit
    pub const SYS_REF: u8 = 0b1000_0000;

    /// Create attributes from a raw byte
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// Get the raw attribute byte
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Check if the compressed bit is set
    pub const fn is_compressed(&self) -> bool {
        (self.0 & Self::COMPRESSED) != 0
    }

    /// Check if the preload bit is set
    pub const fn is_preload(&self) -> bool {
        (self.0 & Self::PRELOAD) != 0
    }

    /// Check if the protected bit is set
    pub const fn is_protected(&self) -> bool {
        (self.0 & Self::PROTECTED) != 0
    }

    /// Check if the locked bit is set
    pub const fn is_locked(&self) -> bool {
        (self.0 & Self::LOCKED) != 0
    }

    /// Check if the purgeable bit is set
    pub const fn is_purgeable(&self) -> bool {
        (self.0 & Self::PURGEABLE) != 0
    }

    /// Check if the system-heap bit is set
    pub const fn is_sys_heap(&self) -> bool {
        (self.0 & Self::SYS_HEAP) != 0
    }
}

impl From<u8> for ResourceAttributes {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}
