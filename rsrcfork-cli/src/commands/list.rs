use crate::ConvertArgs;
use anyhow::Result;
use rsrcfork_core::{Resource, ResourceFork, TextOptions};
use std::fmt::Write;
use tracing::info;

/// Resources sorted by type (case-insensitive) then by ID
pub fn sorted_resources<'f>(fork: &'f ResourceFork, text: &TextOptions) -> Vec<&'f Resource> {
    let mut resources: Vec<&Resource> = fork.iter().collect();
    resources.sort_by_cached_key(|res| {
        let type_key = text.decode_lossy(res.res_type.as_bytes()).to_uppercase();
        (type_key, res.id)
    });
    resources
}

/// Render the listing table
pub fn render(fork: &ResourceFork, text: &TextOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:4} {:>6} {:>8}  Name", "Type", "ID", "Size");
    let _ = writeln!(out, "{} {} {}  {}", "-".repeat(4), "-".repeat(6), "-".repeat(8), "-".repeat(32));
    for res in sorted_resources(fork, text) {
        let _ = writeln!(
            out,
            "{:4} {:>6} {:>8}  {}",
            text.decode_lossy(res.res_type.as_bytes()),
            res.id,
            res.data.len(),
            res.name_str(text)
        );
    }
    out
}

pub fn execute(input: &str, args: &ConvertArgs) -> Result<()> {
    info!("Listing resources in: {}", input);

    let mut fork = crate::load_fork(input, args.container_mode())?;
    let (include, exclude) = (args.include()?, args.exclude()?);
    if !include.is_empty() || !exclude.is_empty() {
        let mut selected = ResourceFork::new();
        for res in fork.iter().filter(|res| {
            !exclude.contains(&res.res_type)
                && (include.is_empty() || include.contains(&res.res_type))
        }) {
            selected.insert(res.clone())?;
        }
        fork = selected;
    }
    print!("{}", render(&fork, &args.text_options()));

    info!(
        "{} resources in {} types",
        fork.len(),
        fork.types().count()
    );

    Ok(())
}
