//! Hand-assembled resource fork vectors
//!
//! Each vector is built byte by byte from the on-disk layout, independent of
//! the writer, and checked against both the reader and the writer.

use pretty_assertions::assert_eq;
use rsrcfork_core::{read_fork, write_fork, ForkError, ResType, Resource, ResourceFork};

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// One `STR ` resource, ID 128, named "Hi", purgeable, payload "\x05Hello"
fn single_string_vector(header_copy: bool) -> Vec<u8> {
    let header = |buf: &mut Vec<u8>| {
        put_u32(buf, 256); // data offset
        put_u32(buf, 266); // map offset
        put_u32(buf, 10); // data length
        put_u32(buf, 53); // map length
    };

    let mut v = Vec::new();
    header(&mut v);
    v.resize(256, 0);

    // data area
    put_u32(&mut v, 6);
    v.extend_from_slice(b"\x05Hello");

    // map header
    if header_copy {
        header(&mut v);
    } else {
        v.extend_from_slice(&[0; 16]);
    }
    put_u32(&mut v, 0); // next map handle
    put_u16(&mut v, 0); // file ref num
    put_u16(&mut v, 0); // file attributes
    put_u16(&mut v, 28); // type list offset
    put_u16(&mut v, 50); // name list offset

    // type list
    put_u16(&mut v, 0); // one type
    v.extend_from_slice(b"STR ");
    put_u16(&mut v, 0); // one resource
    put_u16(&mut v, 10); // reference list offset

    // reference list
    put_u16(&mut v, 128);
    put_u16(&mut v, 0); // name offset
    put_u32(&mut v, 0x2000_0000); // purgeable, data offset 0
    put_u32(&mut v, 0); // handle

    // name list
    v.extend_from_slice(b"\x02Hi");

    assert_eq!(v.len(), 319);
    v
}

fn single_string_fork() -> ResourceFork {
    let mut fork = ResourceFork::new();
    fork.insert(
        Resource::new(ResType::new(*b"STR "), 128, b"\x05Hello".to_vec())
            .with_name(&b"Hi"[..])
            .with_attributes(0x20),
    )
    .unwrap();
    fork
}

#[test]
fn test_vector_single_string_reads() {
    let fork = read_fork(&single_string_vector(true)).unwrap();
    assert_eq!(fork, single_string_fork());
}

#[test]
fn test_vector_single_string_writes_exactly() {
    let bytes = write_fork(&single_string_fork()).unwrap();
    assert_eq!(bytes.to_vec(), single_string_vector(true));
}

#[test]
fn test_vector_zeroed_header_copy_is_accepted() {
    let fork = read_fork(&single_string_vector(false)).unwrap();
    assert_eq!(fork, single_string_fork());
}

#[test]
fn test_vector_empty_fork() {
    let mut v = Vec::new();
    put_u32(&mut v, 256);
    put_u32(&mut v, 256);
    put_u32(&mut v, 0);
    put_u32(&mut v, 30);
    v.resize(256, 0);
    let header = v[..16].to_vec();
    v.extend_from_slice(&header);
    v.extend_from_slice(&[0; 8]);
    put_u16(&mut v, 28);
    put_u16(&mut v, 30);
    put_u16(&mut v, 0xFFFF); // no types

    assert!(read_fork(&v).unwrap().is_empty());
    assert_eq!(write_fork(&ResourceFork::new()).unwrap().to_vec(), v);
}

#[test]
fn test_vector_map_outside_buffer() {
    let mut v = single_string_vector(true);
    v.truncate(300);
    assert!(matches!(read_fork(&v), Err(ForkError::MalformedHeader(_))));
}

#[test]
fn test_vector_truncated_payload() {
    let mut v = single_string_vector(true);
    // claim 7 payload bytes where the data area only holds 6
    v[256..260].copy_from_slice(&7u32.to_be_bytes());
    assert!(matches!(
        read_fork(&v),
        Err(ForkError::TruncatedResource { id: 128, expected: 11, available: 10, .. })
    ));
}

#[test]
fn test_vector_name_outside_map() {
    let mut v = single_string_vector(true);
    // name offset 200 lies past the 3-byte name list
    let ref_entry = 266 + 28 + 2 + 8;
    v[ref_entry + 2..ref_entry + 4].copy_from_slice(&200u16.to_be_bytes());
    assert!(matches!(read_fork(&v), Err(ForkError::MalformedMap(_))));
}
