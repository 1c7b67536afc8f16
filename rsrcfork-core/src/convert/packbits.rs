//! PackBits run-length decoding

use crate::cursor::ByteReader;
use crate::error::ForkError;

/// Unpack one PackBits-compressed run sequence into `item_size`-byte items
///
/// Each run starts with a flag byte `n`: `0..=127` copies the next `n + 1`
/// items literally, `129..=255` repeats the next item `257 - n` times, and
/// `128` is a no-op.
pub fn unpack_bits(packed: &[u8], item_size: usize) -> Result<Vec<u8>, ForkError> {
    let mut r = ByteReader::new(packed);
    let mut out = Vec::with_capacity(packed.len() * 2);
    while !r.is_empty() {
        let flag = r.u8()?;
        match flag {
            128 => {}
            129..=255 => {
                let item = r.bytes(item_size)?;
                for _ in 0..(257 - usize::from(flag)) {
                    out.extend_from_slice(item);
                }
            }
            _ => out.extend_from_slice(r.bytes((usize::from(flag) + 1) * item_size)?),
        }
    }
    Ok(out)
}

/// Read `rows` scanlines of `row_bytes` bytes each
///
/// Rows narrower than 8 bytes are stored unpacked. Otherwise each row is
/// preceded by its packed length: one byte, or two when `row_bytes > 250`.
pub fn unpack_rows(
    r: &mut ByteReader<'_>,
    row_bytes: usize,
    rows: usize,
    item_size: usize,
) -> Result<Vec<u8>, ForkError> {
    if row_bytes < 8 {
        return Ok(r.bytes(row_bytes * rows)?.to_vec());
    }
    let mut out = Vec::with_capacity(row_bytes * rows);
    for _ in 0..rows {
        let packed_len = if row_bytes > 250 {
            usize::from(r.u16()?)
        } else {
            usize::from(r.u8()?)
        };
        out.extend(unpack_bits(r.bytes(packed_len)?, item_size)?);
    }
    Ok(out)
}
