//! Resource fork serialization

use crate::constants::{
    DATA_AREA_OFFSET, FORK_HEADER_SIZE, MAP_HEADER_SIZE, MAX_DATA_OFFSET, MAX_NAME_LEN, NO_NAME,
    REF_ENTRY_SIZE, RESERVED_AFTER_HEADER, TYPE_ENTRY_SIZE,
};
use crate::error::ForkError;
use crate::reader::ForkHeader;
use crate::types::{Resource, ResourceFork};
use bytes::{BufMut, Bytes, BytesMut};
use hashbrown::HashMap;

#[cfg(feature = "logging")]
use tracing::debug;

/// How the name list treats resources that share identical name bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    /// Every named resource gets its own name-list entry
    #[default]
    Independent,
    /// Identical names share a single entry
    Deduplicate,
}

/// Options controlling fork layout
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    /// Name-list policy
    pub name_policy: NamePolicy,
}

/// Serialize a fork with default options
///
/// The fork is laid out as follows:
/// 1. Header (16 bytes): data offset, map offset, data length, map length
/// 2. Reserved system and application areas (240 bytes, zero)
/// 3. Data area: each payload prefixed by its u32 length, type by type
/// 4. Map: header copy, reserved fields, type list, reference lists, name list
pub fn write_fork(fork: &ResourceFork) -> Result<Bytes, ForkError> {
    ForkWriter::new().write(fork)
}

/// Builder for serializing forks with non-default options
#[derive(Debug, Clone, Default)]
pub struct ForkWriter {
    options: WriterOptions,
}

impl ForkWriter {
    /// Create a writer with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name-list policy
    pub fn name_policy(mut self, policy: NamePolicy) -> Self {
        self.options.name_policy = policy;
        self
    }

    /// Share name-list entries between identical names
    pub fn dedup_names(self) -> Self {
        self.name_policy(NamePolicy::Deduplicate)
    }

    /// Serialize `fork` into a new buffer
    ///
    /// The whole fork is assembled in memory; nothing is returned unless
    /// every offset and length fits its field.
    pub fn write(&self, fork: &ResourceFork) -> Result<Bytes, ForkError> {
        let groups: Vec<(_, Vec<&Resource>)> = fork
            .groups()
            .filter(|(_, by_id)| !by_id.is_empty())
            .map(|(t, by_id)| (*t, by_id.values().collect()))
            .collect();

        // 16-bit IDs keep every type within its count field
        if groups.len() > usize::from(u16::MAX) + 1 {
            return Err(ForkError::MapTooLarge(format!("{} types", groups.len())));
        }

        // Data area
        let mut data = BytesMut::new();
        let mut data_offsets = Vec::with_capacity(fork.len());
        for resource in groups.iter().flat_map(|(_, r)| r.iter()) {
            if data.len() > MAX_DATA_OFFSET {
                return Err(ForkError::ResourceTooLarge {
                    res_type: resource.res_type,
                    id: resource.id,
                    len: data.len(),
                });
            }
            let len = u32::try_from(resource.data.len()).map_err(|_| ForkError::ResourceTooLarge {
                res_type: resource.res_type,
                id: resource.id,
                len: resource.data.len(),
            })?;
            data_offsets.push(data.len() as u32);
            data.put_u32(len);
            data.put_slice(&resource.data);
        }

        // Name list
        let mut names = BytesMut::new();
        let mut name_offsets = Vec::with_capacity(fork.len());
        let mut seen: HashMap<&[u8], u16> = HashMap::new();
        for resource in groups.iter().flat_map(|(_, r)| r.iter()) {
            let Some(name) = resource.name.as_deref() else {
                name_offsets.push(NO_NAME);
                continue;
            };
            if name.len() > MAX_NAME_LEN {
                return Err(ForkError::NameTooLong {
                    res_type: resource.res_type,
                    id: resource.id,
                    len: name.len(),
                });
            }
            if self.options.name_policy == NamePolicy::Deduplicate {
                if let Some(&offset) = seen.get(name) {
                    name_offsets.push(offset);
                    continue;
                }
            }
            let offset = u16::try_from(names.len())
                .ok()
                .filter(|&o| o != NO_NAME)
                .ok_or_else(|| ForkError::MapTooLarge(format!("name list exceeds {} bytes", NO_NAME)))?;
            seen.insert(name, offset);
            name_offsets.push(offset);
            names.put_u8(name.len() as u8);
            names.put_slice(name);
        }

        // Type list and reference lists; reference-list offsets are relative
        // to the type list, which starts with the type count
        let type_list_len = 2 + groups.len() * TYPE_ENTRY_SIZE + fork.len() * REF_ENTRY_SIZE;
        let name_list_offset = MAP_HEADER_SIZE + type_list_len;
        let name_list_offset = u16::try_from(name_list_offset)
            .map_err(|_| ForkError::MapTooLarge(format!("type list is {type_list_len} bytes")))?;

        let mut types = BytesMut::with_capacity(2 + groups.len() * TYPE_ENTRY_SIZE);
        let mut refs = BytesMut::with_capacity(fork.len() * REF_ENTRY_SIZE);
        types.put_u16((groups.len() as u16).wrapping_sub(1));
        let mut index = 0;
        for (res_type, resources) in &groups {
            let ref_list_offset = 2 + groups.len() * TYPE_ENTRY_SIZE + refs.len();
            types.put_slice(res_type.as_bytes());
            types.put_u16((resources.len() - 1) as u16);
            types.put_u16(ref_list_offset as u16);

            for resource in resources {
                refs.put_i16(resource.id);
                refs.put_u16(name_offsets[index]);
                refs.put_u32((u32::from(resource.attributes.as_u8()) << 24) | data_offsets[index]);
                refs.put_u32(resource.handle);
                index += 1;
            }
        }

        let map_len = MAP_HEADER_SIZE + type_list_len + names.len();
        let map_offset = DATA_AREA_OFFSET + data.len();
        let header = ForkHeader {
            data_offset: DATA_AREA_OFFSET as u32,
            map_offset: u32::try_from(map_offset)
                .map_err(|_| ForkError::MapTooLarge(format!("map offset {map_offset}")))?,
            data_length: data.len() as u32,
            map_length: map_len as u32,
        };

        let mut buf = BytesMut::with_capacity(map_offset + map_len);
        buf.put_slice(&header.to_bytes());
        buf.put_bytes(0, RESERVED_AFTER_HEADER);
        buf.put_slice(&data);

        // Map header, starting with the duplicate of the fork header
        buf.put_slice(&header.to_bytes());
        buf.put_u32(fork.next_map_handle);
        buf.put_u16(fork.file_ref_num);
        buf.put_u16(fork.file_attributes);
        buf.put_u16(MAP_HEADER_SIZE as u16);
        buf.put_u16(name_list_offset);
        buf.put_slice(&types);
        buf.put_slice(&refs);
        buf.put_slice(&names);

        debug_assert_eq!(buf.len(), map_offset + map_len);
        debug_assert!(FORK_HEADER_SIZE + RESERVED_AFTER_HEADER == DATA_AREA_OFFSET);

        #[cfg(feature = "logging")]
        debug!(
            "Wrote {} resources in {} types ({} bytes)",
            fork.len(),
            groups.len(),
            buf.len()
        );

        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_fork;
    use crate::types::ResType;

    #[test]
    fn test_header_and_duplicate() {
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"DATA"), 1, vec![0xAB; 3]))
            .unwrap();
        let bytes = write_fork(&fork).unwrap();

        let header = ForkHeader::parse(&bytes).unwrap();
        assert_eq!(header.data_offset, 256);
        assert_eq!(header.data_length, 4 + 3);
        assert_eq!(header.map_offset, 256 + 7);
        assert_eq!(bytes.len(), (header.map_offset + header.map_length) as usize);

        // data area: length prefix then payload
        assert_eq!(&bytes[256..263], &[0, 0, 0, 3, 0xAB, 0xAB, 0xAB]);

        // map starts with a copy of the header
        let map = header.map_offset as usize;
        assert_eq!(&bytes[map..map + 16], &bytes[0..16]);
    }

    #[test]
    fn test_empty_fork_layout() {
        let bytes = write_fork(&ResourceFork::new()).unwrap();
        let header = ForkHeader::parse(&bytes).unwrap();
        assert_eq!(header.data_length, 0);
        assert_eq!(header.map_length as usize, MAP_HEADER_SIZE + 2);
        // type count minus one wraps to 0xFFFF
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xFF]);
        assert!(read_fork(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_attributes_packed_with_offset() {
        let t = ResType::new(*b"DATA");
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(t, 1, vec![1])).unwrap();
        fork.insert(Resource::new(t, 2, vec![2]).with_attributes(0x20))
            .unwrap();
        let bytes = write_fork(&fork).unwrap();
        let header = ForkHeader::parse(&bytes).unwrap();
        let refs = header.map_offset as usize + MAP_HEADER_SIZE + 2 + TYPE_ENTRY_SIZE;
        // second reference entry: attributes 0x20, data offset 5
        assert_eq!(&bytes[refs + 12 + 4..refs + 12 + 8], &[0x20, 0, 0, 5]);
    }

    #[test]
    fn test_independent_names_are_not_shared() {
        let t = ResType::new(*b"DATA");
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(t, 1, Bytes::new()).with_name(&b"same"[..])).unwrap();
        fork.insert(Resource::new(t, 2, Bytes::new()).with_name(&b"same"[..])).unwrap();

        let independent = write_fork(&fork).unwrap();
        let shared = ForkWriter::new().dedup_names().write(&fork).unwrap();
        assert_eq!(independent.len(), shared.len() + 5);

        assert_eq!(read_fork(&independent).unwrap(), fork);
        assert_eq!(read_fork(&shared).unwrap(), fork);
    }

    #[test]
    fn test_name_too_long() {
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"DATA"), 1, Bytes::new()).with_name(vec![b'x'; 256]))
            .unwrap();
        assert!(matches!(write_fork(&fork), Err(ForkError::NameTooLong { len: 256, .. })));
    }

    #[test]
    fn test_full_id_space_overflows_reference_offsets() {
        let t = ResType::new(*b"DATA");
        let mut fork = ResourceFork::new();
        for id in i16::MIN..=i16::MAX {
            fork.insert(Resource::new(t, id, Bytes::new())).unwrap();
        }
        // 65536 resources still fit the count field but not 16-bit offsets
        assert_eq!(fork.len(), 65536);
        assert!(matches!(write_fork(&fork), Err(ForkError::MapTooLarge(_))));
    }

    #[test]
    fn test_name_list_overflow() {
        let t = ResType::new(*b"DATA");
        let mut fork = ResourceFork::new();
        for id in 0..300 {
            fork.insert(Resource::new(t, id, Bytes::new()).with_name(vec![b'n'; 255]))
                .unwrap();
        }
        match write_fork(&fork) {
            Err(ForkError::MapTooLarge(msg)) => assert!(msg.contains("name list")),
            other => panic!("expected a name list overflow, got {other:?}"),
        }
        // shared names stay small
        assert!(ForkWriter::new().dedup_names().write(&fork).is_ok());
    }

    #[test]
    fn test_data_area_overflow() {
        let t = ResType::new(*b"DATA");
        let mut fork = ResourceFork::new();
        for id in 1..=3 {
            fork.insert(Resource::new(t, id, vec![0u8; 8 << 20])).unwrap();
        }
        // the third payload would start past the 24-bit offset field
        assert!(matches!(
            write_fork(&fork),
            Err(ForkError::ResourceTooLarge { id: 3, .. })
        ));
    }
}
