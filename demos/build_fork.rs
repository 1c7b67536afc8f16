//! Build a resource fork from scratch and export it as a JSON index

use rsrcfork_core::{
    constants::ResourceAttributes, envelope::wrap_resource_fork, export_fork, ConverterRegistry,
    ExportOptions, ForkWriter, NamePolicy, ResType, Resource, ResourceFork, StructSpec,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("rsrcfork Build Example\n");

    let mut fork = ResourceFork::new();

    // A string list and a couple of single strings sharing a name
    fork.insert(Resource::new(
        ResType::new(*b"STR#"),
        128,
        b"\x00\x02\x05Hello\x05World".to_vec(),
    ))?;
    for id in 128..130 {
        fork.insert(
            Resource::new(ResType::new(*b"STR "), id, format!("\x07Line {:02}", id - 127).into_bytes())
                .with_name(&b"Caption"[..])
                .with_attributes(ResourceAttributes::PURGEABLE),
        )?;
    }

    // An 8x8 checkerboard pattern
    fork.insert(Resource::new(
        ResType::new(*b"PAT "),
        1,
        vec![0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55],
    ))?;

    // Game-specific records described by a struct spec
    fork.insert(Resource::new(
        ResType::new(*b"Spwn"),
        1000,
        vec![0, 10, 0, 20, 0, 1, 0, 30, 0, 40, 0, 2],
    ))?;

    let bytes = ForkWriter::new()
        .name_policy(NamePolicy::Deduplicate)
        .write(&fork)?;
    println!("Fork: {} resources, {} bytes", fork.len(), bytes.len());

    let envelope = wrap_resource_fork(bytes);
    std::fs::write("example_output.rsrc", &envelope)?;
    println!("Wrote {} bytes to example_output.rsrc\n", envelope.len());

    let mut registry = ConverterRegistry::standard();
    registry.register_struct(StructSpec::parse("Spwn:hhh+:x,y,kind")?);
    let export = export_fork(&fork, &registry, &ExportOptions::default());

    println!("{}", serde_json::to_string_pretty(&export.index)?);
    for side_file in &export.side_files {
        println!("side file: {} ({} bytes)", side_file.relative_path, side_file.bytes.len());
    }
    println!("\nUse 'rsrcfork extract example_output.rsrc' to extract it");

    Ok(())
}
