//! JSON index export and import
//!
//! The index maps each type key to an object of `"<id>": wrapper` entries. A
//! wrapper carries the resource's metadata plus its payload as an inline
//! `obj`, a side-file reference (`file`) and/or uppercase hex `data`. Hex is
//! written whenever `obj` alone could not rebuild the original bytes, so a
//! fork survives export and import unchanged.

use crate::convert::{ConvertContext, ConvertedArtifact, ConverterRegistry};
use crate::error::ForkError;
use crate::text::{sanitize_resource_name, TextOptions};
use crate::types::{ResType, Resource, ResourceFork};
use bytes::Bytes;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::fmt;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Key of the fork-level metadata object
pub const METADATA_KEY: &str = "_metadata";

/// Which types to export and how to decode text
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// When non-empty, only these types are exported
    pub include: Vec<ResType>,
    /// Types skipped even if included
    pub exclude: Vec<ResType>,
    pub text: TextOptions,
}

/// Which types to import and how to encode text
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// When non-empty, only these types are imported
    pub include: Vec<ResType>,
    /// Types skipped even if included
    pub exclude: Vec<ResType>,
    pub text: TextOptions,
}

fn type_selected(include: &[ResType], exclude: &[ResType], res_type: &ResType) -> bool {
    !exclude.contains(res_type) && (include.is_empty() || include.contains(res_type))
}

/// A converted artifact destined for its own file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideFile {
    /// Path relative to the resources directory, `/`-separated
    pub relative_path: String,
    pub bytes: Bytes,
}

/// A resource whose conversion failed and fell back to hex
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionWarning {
    pub res_type: ResType,
    pub id: i16,
    pub error: ForkError,
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to convert {} #{}: {}",
            self.res_type.key(),
            self.id,
            self.error
        )
    }
}

/// Result of exporting a fork
#[derive(Debug, Clone)]
pub struct ForkExport {
    pub index: Value,
    pub side_files: Vec<SideFile>,
    pub warnings: Vec<ConversionWarning>,
}

struct ExportedResource {
    wrapper: Map<String, Value>,
    side_file: Option<SideFile>,
    warning: Option<ConversionWarning>,
}

/// Side-file path: `<type dir>/<id>[.<sanitized name>].<ext>`
pub fn side_file_path(res: &Resource, text: &TextOptions, extension: &str) -> String {
    let name = sanitize_resource_name(&res.name_str(text));
    if name.is_empty() {
        format!("{}/{}.{}", res.res_type.dir_name(), res.id, extension)
    } else {
        format!("{}/{}.{}.{}", res.res_type.dir_name(), res.id, name, extension)
    }
}

fn export_resource(
    res: &Resource,
    registry: &ConverterRegistry,
    ctx: &ConvertContext<'_>,
) -> ExportedResource {
    let mut wrapper = Map::new();
    if let Some(name) = res.name.as_deref() {
        let decoded = ctx.text.decode_lossy(name);
        // names the text encoding cannot carry are kept as hex too
        let lossless = ctx.text.encode(&decoded).is_ok_and(|bytes| bytes == name);
        wrapper.insert("name".into(), Value::from(decoded));
        if !lossless {
            wrapper.insert("name_hex".into(), Value::String(hex::encode_upper(name)));
        }
    }
    if res.attributes.as_u8() != 0 {
        wrapper.insert("flags".into(), Value::from(res.attributes.as_u8()));
    }
    if res.handle != 0 {
        wrapper.insert("handle".into(), Value::from(res.handle));
    }

    let hex = || Value::String(hex::encode_upper(&res.data));
    let converted = registry.convert(res, ctx).and_then(|artifact| {
        let file = artifact.to_file_bytes()?;
        Ok((artifact, file))
    });

    let mut side_file = None;
    let mut warning = None;
    match converted {
        Ok((artifact, Some(bytes))) => {
            let extension = artifact.side_file_extension().unwrap_or("bin");
            let relative_path = side_file_path(res, &ctx.text, extension);
            wrapper.insert("file".into(), Value::String(relative_path.clone()));
            wrapper.insert("data".into(), hex());
            side_file = Some(SideFile {
                relative_path,
                bytes,
            });
        }
        Ok((ConvertedArtifact::RawHex(raw), None)) => {
            wrapper.insert("data".into(), Value::String(hex::encode_upper(&raw)));
        }
        Ok((artifact, None)) => {
            if let Some(value) = artifact.inline_value() {
                let lossless = registry
                    .pack(&res.res_type, &value, &ctx.text)
                    .map(|packed| packed == res.data)
                    .unwrap_or(false);
                wrapper.insert("obj".into(), value);
                if !lossless {
                    #[cfg(feature = "logging")]
                    debug!(
                        "{} #{} does not re-encode exactly, keeping hex data",
                        res.res_type, res.id
                    );
                    wrapper.insert("data".into(), hex());
                }
            } else {
                wrapper.insert("data".into(), hex());
            }
        }
        Err(error) => {
            #[cfg(feature = "logging")]
            warn!("Failed to convert {} #{}: {}", res.res_type, res.id, error);
            wrapper.insert("conversion_error".into(), Value::String(error.to_string()));
            wrapper.insert("data".into(), hex());
            warning = Some(ConversionWarning {
                res_type: res.res_type,
                id: res.id,
                error,
            });
        }
    }

    ExportedResource {
        wrapper,
        side_file,
        warning,
    }
}

/// Convert every selected resource and assemble the index
///
/// Conversions run in parallel; the index, side files and warnings come out
/// in reference-list order.
pub fn export_fork(
    fork: &ResourceFork,
    registry: &ConverterRegistry,
    options: &ExportOptions,
) -> ForkExport {
    let ctx = ConvertContext {
        fork,
        text: options.text,
    };
    let selected: Vec<&Resource> = fork
        .iter()
        .filter(|res| type_selected(&options.include, &options.exclude, &res.res_type))
        .collect();

    #[cfg(feature = "logging")]
    debug!("Exporting {} of {} resources", selected.len(), fork.len());

    let exported: Vec<ExportedResource> = selected
        .par_iter()
        .map(|res| export_resource(res, registry, &ctx))
        .collect();

    let mut metadata = Map::new();
    metadata.insert("file_attributes".into(), Value::from(fork.file_attributes));
    metadata.insert("next_map_handle".into(), Value::from(fork.next_map_handle));
    metadata.insert("file_ref_num".into(), Value::from(fork.file_ref_num));

    let mut index = Map::new();
    index.insert(METADATA_KEY.into(), Value::Object(metadata));

    let mut side_files = Vec::new();
    let mut warnings = Vec::new();
    for (res, entry) in selected.iter().zip(exported) {
        let by_id = index
            .entry(res.res_type.key())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(by_id) = by_id {
            by_id.insert(res.id.to_string(), Value::Object(entry.wrapper));
        }
        side_files.extend(entry.side_file);
        warnings.extend(entry.warning);
    }

    ForkExport {
        index: Value::Object(index),
        side_files,
        warnings,
    }
}

fn invalid(msg: impl Into<String>) -> ForkError {
    ForkError::InvalidJson(msg.into())
}

fn int_field<T: TryFrom<u64>>(
    object: &Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<Option<T>, ForkError> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(format!("{context}: '{key}' is out of range: {value}"))),
    }
}

fn str_field<'v>(
    object: &'v Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<Option<&'v str>, ForkError> {
    object
        .get(key)
        .map(|value| {
            value
                .as_str()
                .ok_or_else(|| invalid(format!("{context}: '{key}' is not a string")))
        })
        .transpose()
}

fn import_resource(
    res_type: ResType,
    id_key: &str,
    wrapper: &Value,
    registry: &ConverterRegistry,
    text: &TextOptions,
) -> Result<Resource, ForkError> {
    let context = format!("{} #{id_key}", res_type.key());
    let id: i16 = id_key
        .parse()
        .map_err(|_| invalid(format!("{context}: resource ID is not a 16-bit integer")))?;
    let wrapper = wrapper
        .as_object()
        .ok_or_else(|| invalid(format!("{context}: entry is not an object")))?;

    let data = match (wrapper.get("data"), wrapper.get("obj")) {
        (Some(hex_data), _) => {
            let hex_text = hex_data
                .as_str()
                .ok_or_else(|| invalid(format!("{context}: 'data' is not a string")))?;
            hex::decode(hex_text)?
        }
        (None, Some(value)) => registry.pack(&res_type, value, text)?,
        (None, None) => {
            return Err(invalid(format!("{context}: neither 'data' nor 'obj' present")))
        }
    };

    let mut res = Resource::new(res_type, id, data);
    match (
        str_field(wrapper, "name_hex", &context)?,
        str_field(wrapper, "name", &context)?,
    ) {
        (Some(name_hex), _) => res = res.with_name(hex::decode(name_hex)?),
        (None, Some(name)) => res = res.with_name(text.encode(name)?),
        (None, None) => {}
    }
    if let Some(flags) = int_field::<u8>(wrapper, "flags", &context)? {
        res = res.with_attributes(flags);
    }
    res.handle = int_field::<u32>(wrapper, "handle", &context)?.unwrap_or(0);
    Ok(res)
}

/// Rebuild a fork from an index
pub fn import_fork(
    index: &Value,
    registry: &ConverterRegistry,
    options: &ImportOptions,
) -> Result<ResourceFork, ForkError> {
    let root = index
        .as_object()
        .ok_or_else(|| invalid("index is not an object"))?;

    let mut fork = ResourceFork::new();
    if let Some(metadata) = root.get(METADATA_KEY).and_then(Value::as_object) {
        fork.file_attributes = int_field(metadata, "file_attributes", METADATA_KEY)?.unwrap_or(0);
        fork.next_map_handle = int_field(metadata, "next_map_handle", METADATA_KEY)?.unwrap_or(0);
        fork.file_ref_num = int_field(metadata, "file_ref_num", METADATA_KEY)?.unwrap_or(0);
    }

    for (type_key, entries) in root {
        if type_key.starts_with('_') {
            continue;
        }
        let res_type = ResType::parse(type_key)?;
        if !type_selected(&options.include, &options.exclude, &res_type) {
            continue;
        }
        let entries = entries
            .as_object()
            .ok_or_else(|| invalid(format!("entries of {type_key} are not an object")))?;
        for (id_key, wrapper) in entries {
            fork.insert(import_resource(
                res_type,
                id_key,
                wrapper,
                registry,
                &options.text,
            )?)?;
        }
    }

    #[cfg(feature = "logging")]
    debug!("Imported {} resources", fork.len());

    Ok(fork)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ResourceAttributes;
    use crate::structspec::StructSpec;
    use crate::text::TextEncoding;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_fork() -> ResourceFork {
        let mut fork = ResourceFork::new();
        fork.file_attributes = 0x0020;
        fork.insert(
            Resource::new(ResType::new(*b"STR "), 128, b"\x05Hello".to_vec())
                .with_name(&b"Greeting"[..]),
        )
        .unwrap();
        fork.insert(
            Resource::new(ResType::new(*b"DATA"), -1, vec![0xDE, 0xAD])
                .with_attributes(ResourceAttributes::PURGEABLE),
        )
        .unwrap();
        fork
    }

    #[test]
    fn test_export_shape() {
        let export = export_fork(
            &sample_fork(),
            &ConverterRegistry::standard(),
            &ExportOptions::default(),
        );
        assert_eq!(
            export.index,
            json!({
                "_metadata": {"file_attributes": 32, "next_map_handle": 0, "file_ref_num": 0},
                "STR ": {"128": {"name": "Greeting", "obj": "Hello"}},
                "DATA": {"-1": {"flags": 32, "data": "DEAD"}}
            })
        );
        assert!(export.side_files.is_empty());
        assert!(export.warnings.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let fork = sample_fork();
        let registry = ConverterRegistry::standard();
        let export = export_fork(&fork, &registry, &ExportOptions::default());
        let back = import_fork(&export.index, &registry, &ImportOptions::default()).unwrap();
        assert_eq!(back, fork);
    }

    #[test]
    fn test_inexact_inline_value_keeps_data() {
        // trailing byte after the string is not part of the inline value
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"STR "), 1, b"\x02Hi!".to_vec()))
            .unwrap();
        let registry = ConverterRegistry::standard();
        let export = export_fork(&fork, &registry, &ExportOptions::default());
        assert_eq!(export.index["STR "]["1"]["obj"], json!("Hi"));
        assert_eq!(export.index["STR "]["1"]["data"], json!("02486921"));
        let back = import_fork(&export.index, &registry, &ImportOptions::default()).unwrap();
        assert_eq!(back, fork);
    }

    #[test]
    fn test_failed_conversion_falls_back() {
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"PICT"), 5, vec![0u8; 12]))
            .unwrap();
        let export = export_fork(&fork, &ConverterRegistry::standard(), &ExportOptions::default());
        let wrapper = &export.index["PICT"]["5"];
        assert!(wrapper["conversion_error"].is_string());
        assert_eq!(wrapper["data"], json!("0".repeat(24)));
        assert_eq!(export.warnings.len(), 1);
        assert_eq!(export.warnings[0].id, 5);
    }

    #[test]
    fn test_undecodable_name_keeps_hex() {
        let mut fork = ResourceFork::new();
        fork.insert(
            Resource::new(ResType::new(*b"DATA"), 1, vec![0xAB]).with_name(&b"Caf\x8E"[..]),
        )
        .unwrap();
        fork.insert(Resource::new(ResType::new(*b"DATA"), 2, vec![0xCD]).with_name(&b"plain"[..]))
            .unwrap();

        let text = TextOptions::new(TextEncoding::Ascii).replacing();
        let registry = ConverterRegistry::standard();
        let export = export_fork(
            &fork,
            &registry,
            &ExportOptions {
                text,
                ..Default::default()
            },
        );
        assert_eq!(export.index["DATA"]["1"]["name"], json!("Caf\u{FFFD}"));
        assert_eq!(export.index["DATA"]["1"]["name_hex"], json!("4361668E"));
        assert!(export.index["DATA"]["2"].get("name_hex").is_none());

        let options = ImportOptions {
            text,
            ..Default::default()
        };
        assert_eq!(import_fork(&export.index, &registry, &options).unwrap(), fork);
    }

    #[test]
    fn test_huge_picture_frame_falls_back() {
        let mut fork = ResourceFork::new();
        let data = vec![0, 18, 0x80, 0x00, 0x80, 0x00, 0x7F, 0xFF, 0x7F, 0xFF, 0x11, 0x01, 0xFF];
        fork.insert(Resource::new(ResType::new(*b"PICT"), 9, data.clone()))
            .unwrap();
        fork.insert(Resource::new(ResType::new(*b"STR "), 1, b"\x02Hi".to_vec()))
            .unwrap();
        let export = export_fork(&fork, &ConverterRegistry::standard(), &ExportOptions::default());
        assert!(export.index["PICT"]["9"]["conversion_error"].is_string());
        assert_eq!(export.index["PICT"]["9"]["data"], json!(hex::encode_upper(&data)));
        assert_eq!(export.index["STR "]["1"]["obj"], json!("Hi"));
        assert_eq!(export.warnings.len(), 1);
    }

    #[test]
    fn test_side_file_naming() {
        let mut fork = ResourceFork::new();
        fork.insert(
            Resource::new(ResType::new(*b"icns"), 200, b"icns\x00\x00\x00\x08".to_vec())
                .with_name(&b"App Icon!"[..]),
        )
        .unwrap();
        let export = export_fork(&fork, &ConverterRegistry::standard(), &ExportOptions::default());
        assert_eq!(export.side_files.len(), 1);
        assert_eq!(export.side_files[0].relative_path, "icns/200.AppIcon.icns");
        assert_eq!(export.index["icns"]["200"]["file"], json!("icns/200.AppIcon.icns"));
    }

    #[test]
    fn test_type_filters() {
        let fork = sample_fork();
        let registry = ConverterRegistry::standard();
        let options = ExportOptions {
            exclude: vec![ResType::new(*b"DATA")],
            ..Default::default()
        };
        let export = export_fork(&fork, &registry, &options);
        assert!(export.index.get("DATA").is_none());

        let full = export_fork(&fork, &registry, &ExportOptions::default());
        let only_data = ImportOptions {
            include: vec![ResType::new(*b"DATA")],
            ..Default::default()
        };
        let back = import_fork(&full.index, &registry, &only_data).unwrap();
        assert_eq!(back.len(), 1);
        assert!(back.get(&ResType::new(*b"DATA"), -1).is_some());
    }

    #[test]
    fn test_struct_spec_round_trip() {
        let mut registry = ConverterRegistry::standard();
        registry.register_struct(StructSpec::parse("vers:BBBBh:major,minor,stage,build,region").unwrap());
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"vers"), 1, vec![1, 2, 0x80, 0, 0, 0]))
            .unwrap();

        let export = export_fork(&fork, &registry, &ExportOptions::default());
        assert_eq!(export.index["vers"]["1"]["obj"]["stage"], json!(0x80));
        assert!(export.index["vers"]["1"].get("data").is_none());
        let back = import_fork(&export.index, &registry, &ImportOptions::default()).unwrap();
        assert_eq!(back, fork);
    }

    #[test]
    fn test_import_errors() {
        let registry = ConverterRegistry::standard();
        let options = ImportOptions::default();
        for index in [
            json!([]),
            json!({"STR ": {"1": {}}}),
            json!({"STR ": {"abc": {"data": ""}}}),
            json!({"STR ": {"1": {"data": "XYZ"}}}),
            json!({"DATA": {"1": {"data": "", "flags": 300}}}),
        ] {
            assert!(
                matches!(import_fork(&index, &registry, &options), Err(ForkError::InvalidJson(_))),
                "{index}"
            );
        }
    }
}
