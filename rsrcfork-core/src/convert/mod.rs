//! Per-type converters from legacy resource payloads to modern artifacts
//!
//! A [`ConverterRegistry`] maps a [`ResType`] to either a built-in decoder or
//! a user-supplied [`StructSpec`]. Struct specs take precedence; types with
//! neither become raw hex.

mod icons;
mod packbits;
mod palette;
mod pict;
mod raster;
mod sound;
mod strings;

pub use packbits::{unpack_bits, unpack_rows};
pub use palette::{clut4, clut8, Rgba};
pub use pict::render_picture;
pub use raster::{Raster, Rect};
pub use sound::{codec_info, ieee_extended, parse_snd, AiffSound, Codec};

use crate::error::ForkError;
use crate::structspec::StructSpec;
use crate::text::TextOptions;
use crate::types::{ResType, Resource, ResourceFork};
use bytes::Bytes;
use hashbrown::HashMap;
use image::{ImageBuffer, RgbaImage};
use serde_json::Value;
use std::fmt;

/// What a converter can see besides the resource itself
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    /// The whole fork, for converters that combine resources (icon masks)
    pub fork: &'a ResourceFork,
    pub text: TextOptions,
}

/// The decoded form of one resource
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertedArtifact {
    /// RGBA raster, row-major, 4 bytes per pixel
    Png {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
    AiffC(AiffSound),
    Text(String),
    StringList(Vec<String>),
    Structured(Value),
    RawHex(Bytes),
    /// Payload already in a modern format, written out unchanged
    File {
        extension: &'static str,
        bytes: Bytes,
    },
}

impl ConvertedArtifact {
    /// Extension of the side file this artifact is written to, if any
    pub fn side_file_extension(&self) -> Option<&'static str> {
        match self {
            ConvertedArtifact::Png { .. } => Some("png"),
            ConvertedArtifact::AiffC(_) => Some("aiff"),
            ConvertedArtifact::File { extension, .. } => Some(*extension),
            _ => None,
        }
    }

    /// The inline JSON value, for artifacts that live in the index
    ///
    /// Raw hex yields `None`: it is stored under the `data` key instead.
    pub fn inline_value(&self) -> Option<Value> {
        match self {
            ConvertedArtifact::Text(text) => Some(Value::String(text.clone())),
            ConvertedArtifact::StringList(items) => Some(Value::Array(
                items.iter().cloned().map(Value::String).collect(),
            )),
            ConvertedArtifact::Structured(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Encoded side-file contents
    pub fn to_file_bytes(&self) -> Result<Option<Bytes>, ForkError> {
        match self {
            ConvertedArtifact::Png {
                width,
                height,
                pixels,
            } => encode_png(*width, *height, pixels).map(|png| Some(Bytes::from(png))),
            ConvertedArtifact::AiffC(sound) => Ok(Some(sound.to_aiff_c())),
            ConvertedArtifact::File { bytes, .. } => Ok(Some(bytes.clone())),
            _ => Ok(None),
        }
    }
}

/// Encode RGBA pixels as PNG
pub fn encode_png(width: u32, height: u32, pixels: &[u8]) -> Result<Vec<u8>, ForkError> {
    let img: RgbaImage = ImageBuffer::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
        ForkError::Image(format!(
            "{} bytes do not form a {width}x{height} RGBA image",
            pixels.len()
        ))
    })?;

    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
    img.write_with_encoder(encoder)?;
    Ok(png_data)
}

/// Decoder signature shared by every built-in converter
pub type DecodeFn = fn(&Resource, &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError>;

/// Inverse of a decoder for types whose inline value fully describes the payload
pub type PackFn = fn(&Value, &TextOptions) -> Result<Vec<u8>, ForkError>;

/// A built-in decoder and, where one exists, its packer
#[derive(Clone, Copy)]
pub struct BuiltinConverter {
    pub decode: DecodeFn,
    pub pack: Option<PackFn>,
}

impl BuiltinConverter {
    /// A decode-only converter
    pub fn decoder(decode: DecodeFn) -> Self {
        Self { decode, pack: None }
    }

    /// A converter that can also rebuild the payload from its inline value
    pub fn reversible(decode: DecodeFn, pack: PackFn) -> Self {
        Self {
            decode,
            pack: Some(pack),
        }
    }
}

impl fmt::Debug for BuiltinConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinConverter")
            .field("reversible", &self.pack.is_some())
            .finish()
    }
}

/// The converter chosen for a type
#[derive(Debug, Clone, Copy)]
pub enum Converter<'r> {
    Builtin(&'r BuiltinConverter),
    Struct(&'r StructSpec),
}

/// Lookup table from resource type to converter
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    builtins: HashMap<ResType, BuiltinConverter>,
    structs: HashMap<ResType, StructSpec>,
}

impl ConverterRegistry {
    /// An empty registry: everything converts to raw hex
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in converter
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for code in [b"ICN#", b"ics#", b"icl4", b"icl8", b"ics4", b"ics8"] {
            registry.register(ResType::new(*code), BuiltinConverter::decoder(icons::decode_icon));
        }
        let decoders: [(&[u8; 4], DecodeFn); 8] = [
            (b"SICN", icons::decode_sicn),
            (b"PAT ", icons::decode_pat),
            (b"PAT#", icons::decode_pat_list),
            (b"cicn", pict::decode_cicn),
            (b"ppat", pict::decode_ppat),
            (b"PICT", pict::decode_pict),
            (b"snd ", sound::decode_snd),
            (b"icns", strings::decode_icns),
        ];
        for (code, decode) in decoders {
            registry.register(ResType::new(*code), BuiltinConverter::decoder(decode));
        }
        let reversible: [(&[u8; 4], DecodeFn, PackFn); 5] = [
            (b"STR ", strings::decode_str, strings::pack_str),
            (b"STR#", strings::decode_str_list, strings::pack_str_list),
            (b"TEXT", strings::decode_text, strings::pack_text),
            (b"plst", strings::decode_text, strings::pack_text),
            (b"TMPL", strings::decode_tmpl, strings::pack_tmpl),
        ];
        for (code, decode, pack) in reversible {
            registry.register(ResType::new(*code), BuiltinConverter::reversible(decode, pack));
        }
        registry
    }

    /// Register or replace the built-in converter for a type
    pub fn register(&mut self, res_type: ResType, converter: BuiltinConverter) {
        self.builtins.insert(res_type, converter);
    }

    /// Register a struct spec; it wins over any built-in for its type
    pub fn register_struct(&mut self, spec: StructSpec) {
        self.structs.insert(spec.res_type(), spec);
    }

    pub fn get(&self, res_type: &ResType) -> Option<Converter<'_>> {
        match self.structs.get(res_type) {
            Some(spec) => Some(Converter::Struct(spec)),
            None => self.builtins.get(res_type).map(Converter::Builtin),
        }
    }

    /// Convert one resource
    ///
    /// Compressed resources fail with `UnsupportedCompressedResource`; empty
    /// payloads and unregistered types become raw hex.
    pub fn convert(
        &self,
        res: &Resource,
        ctx: &ConvertContext<'_>,
    ) -> Result<ConvertedArtifact, ForkError> {
        if res.attributes.is_compressed() {
            return Err(ForkError::UnsupportedCompressedResource {
                res_type: res.res_type,
                id: res.id,
            });
        }
        if res.data.is_empty() {
            return Ok(ConvertedArtifact::RawHex(Bytes::new()));
        }
        match self.get(&res.res_type) {
            Some(Converter::Struct(spec)) => spec.decode(&res.data).map(ConvertedArtifact::Structured),
            Some(Converter::Builtin(builtin)) => (builtin.decode)(res, ctx),
            None => Ok(ConvertedArtifact::RawHex(res.data.clone())),
        }
    }

    /// Rebuild a payload from its inline JSON value
    pub fn pack(
        &self,
        res_type: &ResType,
        value: &Value,
        text: &TextOptions,
    ) -> Result<Vec<u8>, ForkError> {
        match self.get(res_type) {
            Some(Converter::Struct(spec)) => spec.encode(value),
            Some(Converter::Builtin(BuiltinConverter {
                pack: Some(pack), ..
            })) => pack(value, text),
            _ => Err(ForkError::InvalidJson(format!(
                "{res_type} has no inline representation; supply hex data instead"
            ))),
        }
    }
}
