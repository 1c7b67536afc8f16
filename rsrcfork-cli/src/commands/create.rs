use crate::ConvertArgs;
use anyhow::{Context, Result};
use colored::*;
use rsrcfork_core::{
    envelope::wrap_resource_fork, import_fork, ForkWriter, ImportOptions, NamePolicy,
};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Write `bytes` to `output` through a temporary file in the same directory
fn write_atomically(output: &str, bytes: &[u8]) -> Result<()> {
    let dir = Path::new(output)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("Failed to write temporary file for {}", output))?;
    tmp.persist(output)
        .with_context(|| format!("Failed to write output file: {}", output))?;
    Ok(())
}

/// Rebuild a resource fork from a JSON index
///
/// The fork is assembled in memory; `output` is only replaced once every
/// resource has been encoded.
pub fn execute(input: &str, output: &str, args: &ConvertArgs, dedup_names: bool) -> Result<()> {
    info!("Creating {} from {}", output, input);

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;
    let index: Value =
        serde_json::from_str(&content).with_context(|| "Failed to parse JSON input")?;

    let registry = args.registry()?;
    let options = ImportOptions {
        include: args.include()?,
        exclude: args.exclude()?,
        text: args.text_options(),
    };
    let fork = import_fork(&index, &registry, &options)
        .with_context(|| format!("Failed to rebuild resources from {}", input))?;
    info!("Imported {} resources in {} types", fork.len(), fork.types().count());

    let policy = if dedup_names {
        NamePolicy::Deduplicate
    } else {
        NamePolicy::Independent
    };
    let fork_bytes = ForkWriter::new()
        .name_policy(policy)
        .write(&fork)
        .with_context(|| "Failed to encode resource fork")?;

    let bytes = if args.no_adf {
        fork_bytes
    } else {
        wrap_resource_fork(fork_bytes)
    };
    write_atomically(output, &bytes)?;

    println!("{} Wrote {} ({} bytes)", "✓".green(), output, bytes.len());

    Ok(())
}
