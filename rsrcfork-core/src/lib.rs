//! # rsrcfork core
//!
//! Reader, writer and type converters for classic Macintosh resource forks.
//!
//! ## Modules
//!
//! - `constants`: On-disk layout constants and attribute bits
//! - `types`: Core types (ResType, Resource, ResourceFork)
//! - `reader`: Resource fork parsing
//! - `writer`: Resource fork serialization
//! - `structspec`: Struct specs for decoding arbitrary records to JSON and back
//! - `convert`: Converter registry and built-in decoders (icons, patterns, pictures, sounds, strings)
//! - `json`: JSON index export and import
//! - `envelope`: AppleDouble container handling
//! - `text`: Mac Roman transcoding

pub mod constants;
pub mod convert;
pub mod cursor;
pub mod envelope;
pub mod error;
pub mod json;
pub mod reader;
pub mod structspec;
pub mod text;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use convert::{ConvertContext, ConvertedArtifact, ConverterRegistry};
pub use envelope::{resource_fork_bytes, ContainerMode};
pub use error::ForkError;
pub use json::{export_fork, import_fork, ExportOptions, ForkExport, ImportOptions};
pub use reader::read_fork;
pub use structspec::StructSpec;
pub use text::TextOptions;
pub use types::{ResType, Resource, ResourceFork};
pub use writer::{write_fork, ForkWriter, NamePolicy};

/// Result type alias for resource fork operations
pub type Result<T> = core::result::Result<T, ForkError>;
