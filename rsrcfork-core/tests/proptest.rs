//! Property-based tests using proptest

use proptest::prelude::*;
use rsrcfork_core::{
    convert::{render_picture, unpack_bits},
    envelope::unpack_apple_double,
    export_fork, import_fork, read_fork, write_fork, ConverterRegistry, ExportOptions, ForkWriter,
    ImportOptions, NamePolicy, ResType, Resource, ResourceFork, StructSpec,
};

const TYPES: [&[u8; 4]; 5] = [b"STR ", b"DATA", b"icns", b"\0\0\0\x01", b"50%!"];

fn resource_strategy() -> impl Strategy<Value = Resource> {
    (
        0..TYPES.len(),
        any::<i16>(),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..40)),
        any::<u8>(),
        prop::collection::vec(any::<u8>(), 0..128),
        any::<u32>(),
    )
        .prop_map(|(t, id, name, attributes, data, handle)| {
            let mut res = Resource::new(ResType::new(*TYPES[t]), id, data).with_attributes(attributes);
            if let Some(name) = name {
                res = res.with_name(name);
            }
            res.handle = handle;
            res
        })
}

fn fork_strategy() -> impl Strategy<Value = ResourceFork> {
    (
        prop::collection::vec(resource_strategy(), 0..24),
        any::<u16>(),
        any::<u32>(),
        any::<u16>(),
    )
        .prop_map(|(resources, file_attributes, next_map_handle, file_ref_num)| {
            let mut fork = ResourceFork::new();
            fork.file_attributes = file_attributes;
            fork.next_map_handle = next_map_handle;
            fork.file_ref_num = file_ref_num;
            for res in resources {
                // later duplicates of a (type, id) pair are dropped
                let _ = fork.insert(res);
            }
            fork
        })
}

fn scalar_format() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "b", "B", "h", "H", "i", "I", "l", "L", "q", "Q", "f", "d", "?", "c", "4s", "3s",
        ]),
        1..6,
    )
    .prop_map(|codes| codes.concat())
}

proptest! {
    #[test]
    fn prop_write_read_round_trip(fork in fork_strategy()) {
        let bytes = write_fork(&fork).unwrap();
        prop_assert_eq!(read_fork(&bytes).unwrap(), fork);
    }

    #[test]
    fn prop_dedup_names_round_trip(fork in fork_strategy()) {
        let bytes = ForkWriter::new().name_policy(NamePolicy::Deduplicate).write(&fork).unwrap();
        let independent = write_fork(&fork).unwrap();
        prop_assert!(bytes.len() <= independent.len());
        prop_assert_eq!(read_fork(&bytes).unwrap(), fork);
    }

    #[test]
    fn prop_export_import_round_trip(fork in fork_strategy()) {
        let registry = ConverterRegistry::standard();
        let export = export_fork(&fork, &registry, &ExportOptions::default());
        let back = import_fork(&export.index, &registry, &ImportOptions::default()).unwrap();
        prop_assert_eq!(back, fork);
    }

    #[test]
    fn prop_struct_codec_idempotent(
        format in scalar_format(),
        repeat in 1usize..5,
        extra in prop::collection::vec(any::<u8>(), 0..8),
        seed in prop::collection::vec(any::<u8>(), 256),
    ) {
        let spec = StructSpec::parse(&format!("TEST:{format}")).unwrap();
        let mut data = seed[..spec.stride()].to_vec();
        data.extend_from_slice(&extra);
        prop_assert_eq!(spec.encode(&spec.decode(&data).unwrap()).unwrap(), data);

        let list = StructSpec::parse(&format!("TEST:{format}+")).unwrap();
        let records: Vec<u8> = seed.iter().cycle().take(list.stride() * repeat).copied().collect();
        prop_assert_eq!(list.encode(&list.decode(&records).unwrap()).unwrap(), records);
    }

    #[test]
    fn prop_float_bits_survive(bits in any::<u32>(), wide in any::<u64>()) {
        let single = StructSpec::parse("TEST:f").unwrap();
        let data = bits.to_be_bytes();
        prop_assert_eq!(single.encode(&single.decode(&data).unwrap()).unwrap(), data);

        let double = StructSpec::parse("TEST:d").unwrap();
        let data = wide.to_be_bytes();
        prop_assert_eq!(double.encode(&double.decode(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn prop_read_never_panics(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let _ = read_fork(&data);
    }

    #[test]
    fn prop_unpack_bits_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..512),
        item_size in 1usize..5,
    ) {
        let _ = unpack_bits(&data, item_size);
    }

    #[test]
    fn prop_picture_never_panics(tail in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut data = vec![0, 0, 0, 0, 0, 0, 0, 16, 0, 16, 0x11, 0x01];
        data.extend(tail);
        let _ = render_picture(&data);
    }

    #[test]
    fn prop_envelope_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = unpack_apple_double(&data);
    }
}
