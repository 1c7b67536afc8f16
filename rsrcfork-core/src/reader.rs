//! Resource fork parsing (strict mode)

use crate::constants::{
    ResourceAttributes, FORK_HEADER_SIZE, MAP_HEADER_SIZE, NO_NAME, REF_ENTRY_SIZE,
};
use crate::cursor::ByteReader;
use crate::error::ForkError;
use crate::types::{ResType, Resource, ResourceFork};
use bytes::Bytes;

#[cfg(feature = "logging")]
use tracing::debug;

/// The four fields of the fork header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkHeader {
    /// Offset of the data area from the start of the fork
    pub data_offset: u32,
    /// Offset of the resource map from the start of the fork
    pub map_offset: u32,
    /// Length of the data area
    pub data_length: u32,
    /// Length of the resource map
    pub map_length: u32,
}

impl ForkHeader {
    /// Parse the first 16 bytes of `fork`
    pub fn parse(fork: &[u8]) -> Result<Self, ForkError> {
        if fork.len() < FORK_HEADER_SIZE {
            return Err(ForkError::MalformedHeader(format!(
                "fork is {} bytes, header needs {}",
                fork.len(),
                FORK_HEADER_SIZE
            )));
        }
        let mut r = ByteReader::new(fork);
        Ok(Self {
            data_offset: r.u32()?,
            map_offset: r.u32()?,
            data_length: r.u32()?,
            map_length: r.u32()?,
        })
    }

    /// Serialize to the on-disk 16 bytes
    pub fn to_bytes(&self) -> [u8; FORK_HEADER_SIZE] {
        let mut out = [0u8; FORK_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.data_offset.to_be_bytes());
        out[4..8].copy_from_slice(&self.map_offset.to_be_bytes());
        out[8..12].copy_from_slice(&self.data_length.to_be_bytes());
        out[12..16].copy_from_slice(&self.map_length.to_be_bytes());
        out
    }

    /// Check both regions against the buffer length and each other
    pub fn validate(&self, fork_len: usize) -> Result<(), ForkError> {
        let data_end = u64::from(self.data_offset) + u64::from(self.data_length);
        let map_end = u64::from(self.map_offset) + u64::from(self.map_length);
        let len = fork_len as u64;

        if data_end > len {
            return Err(ForkError::MalformedHeader(format!(
                "data area {}..{} exceeds fork length {}",
                self.data_offset, data_end, fork_len
            )));
        }
        if map_end > len {
            return Err(ForkError::MalformedHeader(format!(
                "resource map {}..{} exceeds fork length {}",
                self.map_offset, map_end, fork_len
            )));
        }
        if (self.map_length as usize) < MAP_HEADER_SIZE + 2 {
            return Err(ForkError::MalformedHeader(format!(
                "resource map length {} is smaller than the map header",
                self.map_length
            )));
        }
        let overlap = u64::from(self.data_offset) < map_end && u64::from(self.map_offset) < data_end;
        if self.data_length > 0 && overlap {
            return Err(ForkError::MalformedHeader(format!(
                "data area {}..{} overlaps resource map {}..{}",
                self.data_offset, data_end, self.map_offset, map_end
            )));
        }
        Ok(())
    }
}

/// Parse a resource fork from a byte buffer
///
/// This function performs strict validation:
/// - Header regions must fit the buffer and must not overlap
/// - Type, reference and name lists must lie inside the map
/// - Every length-prefixed payload must lie inside the data area
/// - (type, id) pairs must be unique
///
/// An empty buffer is an empty fork. Offsets are never clamped.
pub fn read_fork(fork: &[u8]) -> Result<ResourceFork, ForkError> {
    if fork.is_empty() {
        return Ok(ResourceFork::new());
    }

    let header = ForkHeader::parse(fork)?;
    header.validate(fork.len())?;

    let data_start = header.data_offset as usize;
    let data = &fork[data_start..data_start + header.data_length as usize];
    let map_start = header.map_offset as usize;
    let map = &fork[map_start..map_start + header.map_length as usize];

    #[cfg(feature = "logging")]
    if map[..FORK_HEADER_SIZE] != [0u8; FORK_HEADER_SIZE]
        && map[..FORK_HEADER_SIZE] != header.to_bytes()
    {
        debug!("Header copy in resource map differs from fork header");
    }

    let mut m = ByteReader::new(map);
    m.seek(FORK_HEADER_SIZE)?;
    let mut result = ResourceFork::new();
    result.next_map_handle = m.u32()?;
    result.file_ref_num = m.u16()?;
    result.file_attributes = m.u16()?;
    let type_list_offset = usize::from(m.u16()?);
    let name_list_offset = usize::from(m.u16()?);

    if type_list_offset + 2 > map.len() {
        return Err(ForkError::MalformedMap(format!(
            "type list offset {} outside map of {} bytes",
            type_list_offset,
            map.len()
        )));
    }
    if name_list_offset > map.len() {
        return Err(ForkError::MalformedMap(format!(
            "name list offset {} outside map of {} bytes",
            name_list_offset,
            map.len()
        )));
    }

    let type_list = &map[type_list_offset..];
    let names = &map[name_list_offset..];
    let mut t = ByteReader::new(type_list);
    let num_types = (usize::from(t.u16()?) + 1) & 0xFFFF;

    #[cfg(feature = "logging")]
    debug!(
        "Reading resource map: {} types, data area {} bytes",
        num_types,
        data.len()
    );

    for type_index in 0..num_types {
        let entry_err = |_| {
            ForkError::MalformedMap(format!("type entry {type_index} runs past end of map"))
        };
        let res_type = ResType::new(t.four_cc().map_err(entry_err)?);
        let count = usize::from(t.u16().map_err(entry_err)?) + 1;
        let ref_list_offset = usize::from(t.u16().map_err(entry_err)?);

        if result.resources_of(&res_type).is_some() {
            return Err(ForkError::MalformedMap(format!(
                "type {res_type} listed twice"
            )));
        }

        let mut refs = ByteReader::new(type_list);
        refs.seek(ref_list_offset).map_err(|_| {
            ForkError::MalformedMap(format!(
                "reference list of {res_type} at {ref_list_offset} outside type list"
            ))
        })?;
        if refs.remaining() < count * REF_ENTRY_SIZE {
            return Err(ForkError::MalformedMap(format!(
                "reference list of {res_type} ({count} entries) runs past end of map"
            )));
        }

        for _ in 0..count {
            let id = refs.i16()?;
            let name_offset = refs.u16()?;
            let attributes = ResourceAttributes::new(refs.u8()?);
            let data_offset = refs.u24()? as usize;
            let handle = refs.u32()?;

            let name = if name_offset == NO_NAME {
                None
            } else {
                Some(read_name(names, name_offset, res_type, id)?)
            };

            let payload = read_payload(data, data_offset, res_type, id)?;

            result.insert(Resource {
                res_type,
                id,
                name,
                attributes,
                data: payload,
                handle,
            })?;
        }
    }

    #[cfg(feature = "logging")]
    debug!("Read {} resources", result.len());

    Ok(result)
}

fn read_name(names: &[u8], offset: u16, res_type: ResType, id: i16) -> Result<Bytes, ForkError> {
    let mut r = ByteReader::new(names);
    r.seek(usize::from(offset))
        .and_then(|()| r.pstr())
        .map(Bytes::copy_from_slice)
        .map_err(|_| {
            ForkError::MalformedMap(format!(
                "name of {res_type} #{id} at offset {offset} runs past end of name list"
            ))
        })
}

fn read_payload(data: &[u8], offset: usize, res_type: ResType, id: i16) -> Result<Bytes, ForkError> {
    let available = data.len().saturating_sub(offset);
    let truncated = |expected: usize| ForkError::TruncatedResource {
        res_type,
        id,
        offset,
        expected,
        available,
    };
    if available < 4 {
        return Err(truncated(4));
    }
    let mut r = ByteReader::new(&data[offset..]);
    let len = r.u32()? as usize;
    let body = r.bytes(len).map_err(|_| truncated(len.saturating_add(4)))?;
    Ok(Bytes::copy_from_slice(body))
}
