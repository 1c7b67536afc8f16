//! AppleDouble envelope (version 2)
//!
//! Layout: magic (4), version (4), 16 filler bytes, entry count (2), then
//! `{id, offset, length}` entries of three big-endian u32 each. Only the
//! resource-fork entry is interpreted; other entries are carried opaquely.

use crate::constants::{APPLE_DOUBLE_MAGIC, APPLE_DOUBLE_RESOURCE_FORK, APPLE_DOUBLE_VERSION};
use crate::cursor::ByteReader;
use crate::error::ForkError;
use bytes::{BufMut, Bytes, BytesMut};
use indexmap::IndexMap;

#[cfg(feature = "logging")]
use tracing::debug;

const HEADER_SIZE: usize = 4 + 4 + 16 + 2;
const ENTRY_SIZE: usize = 12;

/// How to obtain fork bytes from a file's contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerMode {
    /// The file is an AppleDouble envelope
    #[default]
    Envelope,
    /// The whole file is the resource fork
    Raw,
}

/// Split an AppleDouble file into its entries, keyed by entry ID
pub fn unpack_apple_double(bytes: &[u8]) -> Result<IndexMap<u32, Bytes>, ForkError> {
    let mut r = ByteReader::new(bytes);
    let (magic, version) = match (r.u32(), r.u32()) {
        (Ok(m), Ok(v)) => (m, v),
        _ => {
            return Err(ForkError::NotAppleDouble(format!(
                "file is only {} bytes",
                bytes.len()
            )))
        }
    };
    if magic != APPLE_DOUBLE_MAGIC {
        return Err(ForkError::NotAppleDouble(format!("bad magic 0x{magic:08X}")));
    }
    if version != APPLE_DOUBLE_VERSION {
        return Err(ForkError::NotAppleDouble(format!(
            "unsupported version 0x{version:08X}"
        )));
    }
    let truncated = |_| ForkError::MalformedHeader("AppleDouble header is truncated".to_string());
    let count = r.skip(16).and_then(|()| r.u16()).map_err(truncated)?;

    let mut table = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let id = r.u32().map_err(truncated)?;
        let offset = r.u32().map_err(truncated)?;
        let length = r.u32().map_err(truncated)?;
        table.push((id, offset, length));
    }

    let mut entries = IndexMap::with_capacity(table.len());
    for (id, offset, length) in table {
        let start = offset as usize;
        let body = start
            .checked_add(length as usize)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| {
                ForkError::MalformedHeader(format!(
                    "AppleDouble entry {id} ({offset}+{length}) exceeds file length {}",
                    bytes.len()
                ))
            })?;
        entries.insert(id, Bytes::copy_from_slice(body));
    }

    #[cfg(feature = "logging")]
    debug!("AppleDouble envelope with {} entries", entries.len());

    Ok(entries)
}

/// Build an AppleDouble file from entries, in the given order
pub fn pack_apple_double(entries: &IndexMap<u32, Bytes>) -> Bytes {
    let table_end = HEADER_SIZE + entries.len() * ENTRY_SIZE;
    let total = table_end + entries.values().map(Bytes::len).sum::<usize>();
    let mut buf = BytesMut::with_capacity(total);

    buf.put_u32(APPLE_DOUBLE_MAGIC);
    buf.put_u32(APPLE_DOUBLE_VERSION);
    buf.put_bytes(0, 16);
    buf.put_u16(entries.len() as u16);

    let mut offset = table_end;
    for (id, body) in entries {
        buf.put_u32(*id);
        buf.put_u32(offset as u32);
        buf.put_u32(body.len() as u32);
        offset += body.len();
    }
    for body in entries.values() {
        buf.put_slice(body);
    }
    buf.freeze()
}

/// Wrap a resource fork in an AppleDouble envelope with no other entries
pub fn wrap_resource_fork(fork: Bytes) -> Bytes {
    let mut entries = IndexMap::new();
    entries.insert(APPLE_DOUBLE_RESOURCE_FORK, fork);
    pack_apple_double(&entries)
}

/// Locate the resource fork inside a file's contents
pub fn resource_fork_bytes(bytes: &[u8], mode: ContainerMode) -> Result<Bytes, ForkError> {
    match mode {
        ContainerMode::Raw => Ok(Bytes::copy_from_slice(bytes)),
        ContainerMode::Envelope => unpack_apple_double(bytes)?
            .swap_remove(&APPLE_DOUBLE_RESOURCE_FORK)
            .ok_or(ForkError::ForkNotFound),
    }
}
