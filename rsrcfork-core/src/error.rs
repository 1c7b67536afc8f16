//! Error types for resource fork operations

use crate::types::ResType;
use thiserror::Error;

/// Errors that can occur while reading, writing or converting resource forks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForkError {
    /// The 16-byte fork header describes regions that do not fit the buffer
    #[error("Malformed resource fork header: {0}")]
    MalformedHeader(String),

    /// The resource map is internally inconsistent
    #[error("Malformed resource map: {0}")]
    MalformedMap(String),

    /// The same (type, id) pair appears twice
    #[error("Duplicate resource {res_type} #{id}")]
    DuplicateResource {
        /// Type of the offending resource.
        res_type: ResType,
        /// ID of the offending resource.
        id: i16,
    },

    /// A resource's length prefix runs past the end of the data area
    #[error("Truncated resource {res_type} #{id}: needs {expected} bytes at data offset {offset}, {available} available")]
    TruncatedResource {
        /// Type of the offending resource.
        res_type: ResType,
        /// ID of the offending resource.
        id: i16,
        /// Offset of the length prefix within the data area.
        offset: usize,
        /// Bytes required (prefix plus payload).
        expected: usize,
        /// Bytes actually present from the offset to the end of the data area.
        available: usize,
    },

    /// The resource carries the "compressed" attribute
    #[error("Compressed resource {res_type} #{id} is not supported")]
    UnsupportedCompressedResource {
        /// Type of the offending resource.
        res_type: ResType,
        /// ID of the offending resource.
        id: i16,
    },

    /// Input ended before a record was complete
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually available.
        actual: usize,
    },

    /// A JSON value cannot be coerced to a struct field's kind
    #[error("Field '{field}' expects {expected}, got {found}")]
    FieldTypeMismatch {
        /// Field name as it appears in the structured value.
        field: String,
        /// Human-readable description of the expected kind.
        expected: &'static str,
        /// The offending JSON value, rendered.
        found: String,
    },

    /// A named field has no value and no default
    #[error("Missing value for field '{0}'")]
    MissingField(String),

    /// Two fields of one struct spec share a name
    #[error("Duplicate field name '{0}' in struct spec")]
    DuplicateFieldName(String),

    /// The struct-spec text cannot be parsed
    #[error("Invalid struct spec: {0}")]
    InvalidStructSpec(String),

    /// A picture uses an opcode outside the supported raster subset
    #[error("Unsupported picture opcode ${opcode:04X} at offset {offset}")]
    UnsupportedPictureOpcode {
        /// The opcode value.
        opcode: u16,
        /// Byte offset of the opcode within the picture.
        offset: usize,
    },

    /// A picture's raster data is inconsistent
    #[error("Malformed picture: {0}")]
    MalformedPicture(String),

    /// A sound resource cannot be repackaged
    #[error("Malformed sound: {0}")]
    MalformedSound(String),

    /// A resource payload does not match the layout its type requires
    #[error("Malformed resource data: {0}")]
    MalformedResource(String),

    /// A byte has no mapping in the configured text encoding
    #[error("Byte 0x{byte:02X} at offset {offset} cannot be decoded")]
    UndecodableText {
        /// The unmapped byte.
        byte: u8,
        /// Its position in the input.
        offset: usize,
    },

    /// A character has no mapping in the configured text encoding
    #[error("Character {0:?} cannot be encoded")]
    UnencodableText(char),

    /// A type holds more resources than the 16-bit count field can express
    #[error("Too many resources of type {res_type}: {count}")]
    TooManyResources {
        /// The overflowing type.
        res_type: ResType,
        /// Number of resources requested.
        count: usize,
    },

    /// A payload or data-area offset overflows its on-disk field
    #[error("Resource {res_type} #{id} too large: {len} bytes")]
    ResourceTooLarge {
        /// Type of the offending resource.
        res_type: ResType,
        /// ID of the offending resource.
        id: i16,
        /// Payload length, or data-area offset when that overflows first.
        len: usize,
    },

    /// The reference or name list outgrows its 16-bit offsets
    #[error("Resource map too large: {0}")]
    MapTooLarge(String),

    /// A resource name exceeds 255 bytes
    #[error("Name of resource {res_type} #{id} is {len} bytes (max 255)")]
    NameTooLong {
        /// Type of the offending resource.
        res_type: ResType,
        /// ID of the offending resource.
        id: i16,
        /// Encoded name length.
        len: usize,
    },

    /// The envelope magic or version is wrong
    #[error("Not an AppleDouble file: {0}")]
    NotAppleDouble(String),

    /// The envelope carries no resource fork entry
    #[error("No resource fork found in envelope")]
    ForkNotFound,

    /// A textual type code cannot become a four-byte type
    #[error("Invalid resource type name {0:?}")]
    InvalidTypeName(String),

    /// The JSON index does not have the expected shape
    #[error("Invalid JSON index: {0}")]
    InvalidJson(String),

    /// Image encoding failed
    #[error("Image encoding error: {0}")]
    Image(String),
}

impl From<image::ImageError> for ForkError {
    fn from(err: image::ImageError) -> Self {
        ForkError::Image(err.to_string())
    }
}

impl From<hex::FromHexError> for ForkError {
    fn from(err: hex::FromHexError) -> Self {
        ForkError::InvalidJson(format!("bad hex data: {err}"))
    }
}
