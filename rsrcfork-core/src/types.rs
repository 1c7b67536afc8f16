//! Core types for resource forks

use crate::constants::ResourceAttributes;
use crate::error::ForkError;
use crate::text::TextOptions;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Four-byte resource type code (not necessarily printable)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResType(pub [u8; 4]);

impl ResType {
    /// Wrap a raw four-byte code
    pub const fn new(code: [u8; 4]) -> Self {
        Self(code)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// JSON key form: plain text when every byte is printable ASCII other
    /// than `%`, otherwise every byte escaped as `%XX`
    pub fn key(&self) -> String {
        if self.0.iter().all(|&b| (0x20..0x7F).contains(&b) && b != b'%') {
            self.0.iter().map(|&b| char::from(b)).collect()
        } else {
            self.0.iter().map(|b| format!("%{b:02X}")).collect()
        }
    }

    /// Directory-name form for side files: trailing spaces dropped (unless
    /// the code is all spaces), unsafe bytes percent-escaped
    pub fn dir_name(&self) -> String {
        let mut bytes: &[u8] = &self.0;
        if bytes != b"    " {
            while let [rest @ .., b' '] = bytes {
                bytes = rest;
            }
        }
        bytes
            .iter()
            .map(|&b| {
                if b.is_ascii_alphanumeric() || b"_.~-".contains(&b) {
                    char::from(b).to_string()
                } else {
                    format!("%{b:02X}")
                }
            })
            .collect()
    }

    /// Parse a textual type: percent escapes are decoded, other characters
    /// are encoded as Mac Roman, and the result is space-padded to 4 bytes
    pub fn parse(text: &str) -> Result<Self, ForkError> {
        let invalid = || ForkError::InvalidTypeName(text.to_string());
        let mut bytes = Vec::with_capacity(4);
        let mut rest = text;
        while let Some(c) = rest.chars().next() {
            if c == '%' {
                let hex = rest.get(1..3).ok_or_else(invalid)?;
                bytes.push(u8::from_str_radix(hex, 16).map_err(|_| invalid())?);
                rest = &rest[3..];
            } else {
                let mut buf = [0u8; 4];
                let encoded = TextOptions::default()
                    .encode(c.encode_utf8(&mut buf))
                    .map_err(|_| invalid())?;
                bytes.extend_from_slice(&encoded);
                rest = &rest[c.len_utf8()..];
            }
        }
        if bytes.is_empty() || bytes.len() > 4 {
            return Err(invalid());
        }
        bytes.resize(4, b' ');
        let mut code = [0u8; 4];
        code.copy_from_slice(&bytes);
        Ok(Self(code))
    }
}

impl From<&[u8; 4]> for ResType {
    fn from(code: &[u8; 4]) -> Self {
        Self(*code)
    }
}

impl fmt::Display for ResType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TextOptions::default().decode_lossy(&self.0))
    }
}

impl fmt::Debug for ResType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResType({:?})", self.key())
    }
}

/// A single typed, identified resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Four-byte type code
    pub res_type: ResType,

    /// Signed ID, unique within the type
    pub id: i16,

    /// Raw name bytes from the name list, if the resource is named
    pub name: Option<Bytes>,

    /// Attribute flags
    pub attributes: ResourceAttributes,

    /// Payload
    pub data: Bytes,

    /// Reserved handle field of the reference entry, preserved verbatim
    pub handle: u32,
}

impl Resource {
    /// Create an unnamed resource with no attributes
    pub fn new(res_type: ResType, id: i16, data: impl Into<Bytes>) -> Self {
        Self {
            res_type,
            id,
            name: None,
            attributes: ResourceAttributes::default(),
            data: data.into(),
            handle: 0,
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<Bytes>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the attribute byte
    pub fn with_attributes(mut self, bits: u8) -> Self {
        self.attributes = ResourceAttributes::new(bits);
        self
    }

    /// Name decoded for display
    pub fn name_str(&self, text: &TextOptions) -> String {
        self.name
            .as_ref()
            .map(|n| text.decode_lossy(n))
            .unwrap_or_default()
    }
}

/// Ordered collection of resources, grouped by type in reference-list order
#[derive(Debug, Clone, Default)]
pub struct ResourceFork {
    /// Map-level file attributes
    pub file_attributes: u16,

    /// Reserved "next map" handle from the map header
    pub next_map_handle: u32,

    /// Reserved file reference number from the map header
    pub file_ref_num: u16,

    types: IndexMap<ResType, IndexMap<i16, Resource>>,
}

impl ResourceFork {
    /// Create an empty fork
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource, keeping insertion order within its type
    pub fn insert(&mut self, resource: Resource) -> Result<(), ForkError> {
        let by_id = self.types.entry(resource.res_type).or_default();
        if by_id.contains_key(&resource.id) {
            return Err(ForkError::DuplicateResource {
                res_type: resource.res_type,
                id: resource.id,
            });
        }
        by_id.insert(resource.id, resource);
        Ok(())
    }

    /// Look up a resource by type and ID
    pub fn get(&self, res_type: &ResType, id: i16) -> Option<&Resource> {
        self.types.get(res_type).and_then(|by_id| by_id.get(&id))
    }

    /// Resources of one type, in order
    pub fn resources_of(&self, res_type: &ResType) -> Option<&IndexMap<i16, Resource>> {
        self.types.get(res_type)
    }

    /// Types in order
    pub fn types(&self) -> impl Iterator<Item = &ResType> {
        self.types.keys()
    }

    /// Per-type maps in order
    pub fn groups(&self) -> impl Iterator<Item = (&ResType, &IndexMap<i16, Resource>)> {
        self.types.iter()
    }

    /// Every resource, type by type, in reference-list order
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.types.values().flat_map(|by_id| by_id.values())
    }

    /// Total number of resources
    pub fn len(&self) -> usize {
        self.types.values().map(IndexMap::len).sum()
    }

    /// True when the fork holds no resources
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Equality is order-sensitive: reference-list order is part of a fork's identity.
impl PartialEq for ResourceFork {
    fn eq(&self, other: &Self) -> bool {
        self.file_attributes == other.file_attributes
            && self.next_map_handle == other.next_map_handle
            && self.file_ref_num == other.file_ref_num
            && self.types.keys().eq(other.types.keys())
            && self.iter().eq(other.iter())
    }
}

impl Eq for ResourceFork {}
