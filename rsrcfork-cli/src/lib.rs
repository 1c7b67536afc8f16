//! Library entry for rsrcfork-cli used by integration tests and embedding.

pub mod commands;

use anyhow::{Context, Result};
use rsrcfork_core::{
    read_fork, resource_fork_bytes, text::TextEncoding, ContainerMode, ConverterRegistry, ResType,
    ResourceFork, StructSpec, TextOptions,
};
use std::fs;
use tracing::info;

// Re-export commands for convenience
pub use commands::{create, extract, list};

/// Legacy text encoding selectable on the command line
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Encoding {
    /// Mac OS Roman
    #[default]
    Macroman,
    /// 7-bit ASCII
    Ascii,
}

/// Options shared by every command that converts resources
#[derive(Clone, Debug, Default, clap::Args)]
pub struct ConvertArgs {
    /// Don't interpret the fork file as AppleDouble
    #[arg(long)]
    pub no_adf: bool,

    /// Only process this resource type (repeatable, `%XX` escapes allowed)
    #[arg(short = 'i', long = "include-type", value_name = "TYPE")]
    pub include_types: Vec<String>,

    /// Skip this resource type (repeatable)
    #[arg(short = 'x', long = "exclude-type", value_name = "TYPE")]
    pub exclude_types: Vec<String>,

    /// Struct spec `TYPE:FORMAT:FIELDNAMES` (repeatable)
    #[arg(short = 's', long = "struct", value_name = "SPEC")]
    pub structs: Vec<String>,

    /// Legacy text encoding
    #[arg(long, value_enum, default_value_t = Encoding::Macroman)]
    pub encoding: Encoding,

    /// Fail on unmappable text instead of substituting a replacement
    #[arg(long)]
    pub strict_text: bool,
}

impl ConvertArgs {
    pub fn container_mode(&self) -> ContainerMode {
        if self.no_adf {
            ContainerMode::Raw
        } else {
            ContainerMode::Envelope
        }
    }

    pub fn text_options(&self) -> TextOptions {
        let encoding = match self.encoding {
            Encoding::Macroman => TextEncoding::MacRoman,
            Encoding::Ascii => TextEncoding::Ascii,
        };
        let options = TextOptions::new(encoding);
        if self.strict_text {
            options
        } else {
            options.replacing()
        }
    }

    /// Standard converters plus every `--struct` spec
    pub fn registry(&self) -> Result<ConverterRegistry> {
        let mut registry = ConverterRegistry::standard();
        for definition in &self.structs {
            let spec = StructSpec::parse(definition)
                .with_context(|| format!("Invalid struct spec: {}", definition))?;
            registry.register_struct(spec);
        }
        Ok(registry)
    }

    pub fn include(&self) -> Result<Vec<ResType>> {
        parse_types(&self.include_types)
    }

    pub fn exclude(&self) -> Result<Vec<ResType>> {
        parse_types(&self.exclude_types)
    }
}

/// Read `input` and parse the resource fork it holds
pub fn load_fork(input: &str, mode: ContainerMode) -> Result<ResourceFork> {
    let contents =
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;
    let fork_bytes = resource_fork_bytes(&contents, mode)
        .with_context(|| format!("No resource fork in {}", input))?;
    info!("Resource fork: {} bytes", fork_bytes.len());

    read_fork(&fork_bytes).with_context(|| format!("Failed to parse resource fork: {}", input))
}

fn parse_types(names: &[String]) -> Result<Vec<ResType>> {
    names
        .iter()
        .map(|name| {
            ResType::parse(name).with_context(|| format!("Invalid resource type: {}", name))
        })
        .collect()
}
