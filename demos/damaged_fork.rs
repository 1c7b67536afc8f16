//! How damaged forks and undecodable resources are reported

use rsrcfork_core::{
    export_fork, read_fork, reader::ForkHeader, write_fork, ConverterRegistry, ExportOptions,
    ResType, Resource, ResourceFork,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("rsrcfork Damaged Fork Example\n");

    let mut fork = ResourceFork::new();
    fork.insert(Resource::new(ResType::new(*b"STR "), 128, b"\x05Hello".to_vec()))?;
    fork.insert(Resource::new(ResType::new(*b"DATA"), 129, vec![0x42; 64]))?;
    // A picture whose only opcode after the header draws text
    fork.insert(Resource::new(
        ResType::new(*b"PICT"),
        130,
        vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 8, 0x11, 0x01, 0x28, 0, 0, 0, 0, 1, b'A', 0xFF],
    ))?;
    let clean = write_fork(&fork)?;
    println!("Step 1: clean fork of {} bytes", clean.len());

    // Structural damage aborts the whole read
    println!("\nStep 2: structural damage");
    let header = ForkHeader::parse(&clean)?;

    let mut truncated = clean.to_vec();
    truncated.truncate(clean.len() - 8);
    report("Truncated map", &truncated);

    let mut stretched = clean.to_vec();
    let at = header.data_offset as usize;
    stretched[at..at + 4].copy_from_slice(&1000u32.to_be_bytes());
    report("Oversized payload length", &stretched);

    let mut overlapping = clean.to_vec();
    overlapping[8..12].copy_from_slice(&(header.data_length + 16).to_be_bytes());
    report("Overlapping regions", &overlapping);

    // A resource that cannot be converted only costs that resource
    println!("\nStep 3: per-resource conversion failures");
    let export = export_fork(&read_fork(&clean)?, &ConverterRegistry::standard(), &ExportOptions::default());
    for warning in &export.warnings {
        println!("  warning: {}", warning);
    }
    println!(
        "  PICT #130 kept as hex: {}",
        export.index["PICT"]["130"]["data"]
    );
    println!("  STR #128 decoded: {}", export.index["STR "]["128"]["obj"]);

    Ok(())
}

fn report(label: &str, bytes: &[u8]) {
    match read_fork(bytes) {
        Ok(fork) => println!("  {label}: unexpectedly read {} resources", fork.len()),
        Err(e) => println!("  {label}: {e}"),
    }
}
