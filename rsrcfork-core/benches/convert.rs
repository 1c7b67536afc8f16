use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rsrcfork_core::{
    convert::{parse_snd, render_picture, unpack_bits},
    ConvertContext, ConverterRegistry, ResType, Resource, ResourceFork, TextOptions,
};

/// PackBits stream alternating 64-byte literals and 64-byte runs
fn packed_stream(runs: usize) -> Vec<u8> {
    let mut packed = Vec::new();
    for i in 0..runs {
        packed.push(63);
        packed.extend((0..64).map(|b| (b ^ i) as u8));
        packed.push(193); // 257 - 193 = 64 repeats
        packed.push(i as u8);
    }
    packed
}

/// Version 1 picture with a single PackBitsRect covering the frame
fn bits_picture(width: u16, height: u16) -> Vec<u8> {
    let row_bytes = width.div_ceil(8);
    let rect = |p: &mut Vec<u8>| {
        p.extend_from_slice(&[0, 0, 0, 0]);
        p.extend_from_slice(&height.to_be_bytes());
        p.extend_from_slice(&width.to_be_bytes());
    };
    let mut p = vec![0, 0];
    rect(&mut p);
    p.extend_from_slice(&[0x11, 0x01, 0x98]);
    p.extend_from_slice(&row_bytes.to_be_bytes());
    rect(&mut p); // bounds
    rect(&mut p); // src
    rect(&mut p); // dst
    p.extend_from_slice(&[0, 0]);
    for row in 0..height {
        // one repeat run per row
        p.push(2);
        p.push((257 - row_bytes.min(128)) as u8);
        p.push(if row % 2 == 0 { 0xAA } else { 0x55 });
    }
    p.push(0xFF);
    p
}

/// Format 1 sound with `frames` 8-bit samples at 22050 Hz
fn sampled_sound(frames: u32) -> Vec<u8> {
    let mut d = vec![0, 1, 0, 1, 0, 5, 0, 0, 0, 0x80];
    d.extend_from_slice(&[0, 1, 0x80, 81, 0, 0, 0, 0, 0, 20]);
    d.extend_from_slice(&[0; 4]);
    d.extend_from_slice(&frames.to_be_bytes());
    d.extend_from_slice(&0x5622_0000u32.to_be_bytes());
    d.extend_from_slice(&[0; 8]);
    d.extend_from_slice(&[0, 60]);
    d.extend((0..frames).map(|i| (i % 256) as u8));
    d
}

fn bench_unpack_bits(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack_bits");

    for runs in [16, 256, 4096] {
        let packed = packed_stream(runs);
        group.throughput(Throughput::Bytes((runs * 128) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(runs), &packed, |b, packed| {
            b.iter(|| unpack_bits(black_box(packed), 1).unwrap());
        });
    }

    group.finish();
}

fn bench_render_picture(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_picture");

    for side in [64u16, 256, 1024] {
        let pict = bits_picture(side, side);
        group.throughput(Throughput::Elements(u64::from(side) * u64::from(side)));
        group.bench_with_input(BenchmarkId::from_parameter(side), &pict, |b, pict| {
            b.iter(|| render_picture(black_box(pict)).unwrap());
        });
    }

    group.finish();
}

fn bench_icons(c: &mut Criterion) {
    let registry = ConverterRegistry::standard();
    let fork = ResourceFork::new();
    let ctx = ConvertContext {
        fork: &fork,
        text: TextOptions::default(),
    };
    let icon = Resource::new(
        ResType::new(*b"icl8"),
        128,
        (0..32 * 32).map(|i| (i % 256) as u8).collect::<Vec<u8>>(),
    );

    c.bench_function("icl8_to_png", |b| {
        b.iter(|| {
            let artifact = registry.convert(black_box(&icon), &ctx).unwrap();
            artifact.to_file_bytes().unwrap()
        });
    });
}

fn bench_sound(c: &mut Criterion) {
    let snd = sampled_sound(22050);

    c.bench_function("snd_to_aiff_1s", |b| {
        b.iter(|| parse_snd(black_box(&snd), None).unwrap().to_aiff_c());
    });
}

criterion_group!(
    benches,
    bench_unpack_bits,
    bench_render_picture,
    bench_icons,
    bench_sound
);
criterion_main!(benches);
