//! Fuzzing entry points for rsrcfork-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_read_fork

use rsrcfork_core::{
    envelope::unpack_apple_double, read_fork, write_fork, ConvertContext, ConverterRegistry,
    ResType, Resource, ResourceFork, TextOptions,
};

/// Parse arbitrary bytes as a fork; anything that parses must re-serialize
/// to a fork that parses to the same collection
pub fn fuzz_read_fork(data: &[u8]) {
    if let Ok(fork) = read_fork(data) {
        if let Ok(bytes) = write_fork(&fork) {
            assert_eq!(read_fork(&bytes).ok(), Some(fork));
        }
    }
}

/// Run one converter over arbitrary payload bytes
///
/// The first four bytes select the resource type.
pub fn fuzz_convert(data: &[u8]) {
    let Some((code, payload)) = data.split_first_chunk::<4>() else {
        return;
    };
    let fork = ResourceFork::new();
    let ctx = ConvertContext {
        fork: &fork,
        text: TextOptions::default(),
    };
    let res = Resource::new(ResType::new(*code), 0, payload.to_vec());
    let _ = ConverterRegistry::standard().convert(&res, &ctx);
}

pub fn fuzz_envelope(data: &[u8]) {
    let _ = unpack_apple_double(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzz_read_fork_empty() {
        fuzz_read_fork(&[]);
    }

    #[test]
    fn test_fuzz_read_fork_random() {
        fuzz_read_fork(&[0x12, 0x34, 0x56, 0x78]);
        fuzz_read_fork(&[0xFF; 1024]);
    }

    #[test]
    fn test_fuzz_read_fork_valid() {
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"DATA"), 1, vec![1, 2, 3]))
            .unwrap();
        fuzz_read_fork(&write_fork(&fork).unwrap());
    }

    #[test]
    fn test_fuzz_convert_each_type() {
        for code in [b"PICT", b"snd ", b"cicn", b"ppat", b"STR#", b"ICN#", b"TMPL"] {
            let mut data = code.to_vec();
            data.extend_from_slice(&[0xFF; 64]);
            fuzz_convert(&data);
            fuzz_convert(code);
        }
    }

    #[test]
    fn test_fuzz_envelope() {
        fuzz_envelope(&[]);
        fuzz_envelope(&[0x00, 0x05, 0x16, 0x07, 0, 2, 0, 0]);
    }
}
