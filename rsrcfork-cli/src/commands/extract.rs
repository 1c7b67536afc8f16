use crate::ConvertArgs;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rsrcfork_core::{export_fork, json::SideFile, ExportOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const NAMED_FORK_SUFFIX: &str = "/..namedfork/rsrc";

/// Default index path for `input`: `<stem>.json` in the working directory
///
/// A trailing `/..namedfork/rsrc` is dropped, as is an AppleDouble `._`
/// prefix.
pub fn default_output(input: &str) -> PathBuf {
    let path = input.strip_suffix(NAMED_FORK_SUFFIX).unwrap_or(input);
    let name = Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_prefix("._").unwrap_or(&name);
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fork".to_string());
    PathBuf::from(format!("{stem}.json"))
}

/// Side-file directory next to an index: `<index without extension>_resources`
pub fn resources_dir(index_path: &Path) -> PathBuf {
    let mut name = index_path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push("_resources");
    index_path.with_file_name(name)
}

fn write_side_files(dir: &Path, side_files: &[SideFile], progress: bool) -> Result<()> {
    let pb = if progress {
        let pb = ProgressBar::new(side_files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message("Writing");
        pb
    } else {
        ProgressBar::hidden()
    };

    for side_file in side_files {
        let path = dir.join(&side_file.relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&path, &side_file.bytes)
            .with_context(|| format!("Failed to write side file: {}", path.display()))?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(())
}

/// Extract every resource of `input` into a JSON index plus side files
///
/// Returns the number of resources that fell back to hex because their
/// conversion failed.
pub fn execute(
    input: &str,
    output: Option<&str>,
    args: &ConvertArgs,
    progress: bool,
) -> Result<usize> {
    let index_path = output.map(PathBuf::from).unwrap_or_else(|| default_output(input));
    info!("Extracting {} to {}", input, index_path.display());

    let fork = crate::load_fork(input, args.container_mode())?;
    info!("Found {} resources in {} types", fork.len(), fork.types().count());

    let registry = args.registry()?;
    let options = ExportOptions {
        include: args.include()?,
        exclude: args.exclude()?,
        text: args.text_options(),
    };
    let export = export_fork(&fork, &registry, &options);

    let dir = resources_dir(&index_path);
    write_side_files(&dir, &export.side_files, progress)?;
    if !export.side_files.is_empty() {
        info!("Wrote {} side files to {}", export.side_files.len(), dir.display());
    }

    let json = serde_json::to_string_pretty(&export.index)
        .with_context(|| "Failed to serialize resource index")?;
    fs::write(&index_path, json)
        .with_context(|| format!("Failed to write output file: {}", index_path.display()))?;

    println!("{} Wrote {}", "✓".green(), index_path.display());

    // Repeat conversion failures at the end
    for warning in &export.warnings {
        warn!("{}", warning);
        println!("{} {}", "✗".red(), warning);
    }

    Ok(export.warnings.len())
}
