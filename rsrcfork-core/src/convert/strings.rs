//! String, text and template resources, plus opaque passthroughs

use super::{ConvertContext, ConvertedArtifact};
use crate::cursor::ByteReader;
use crate::error::ForkError;
use crate::text::TextOptions;
use crate::types::Resource;
use serde_json::{json, Map, Value};

#[cfg(feature = "logging")]
use tracing::warn;

fn expect_str<'v>(value: &'v Value, field: &str) -> Result<&'v str, ForkError> {
    value.as_str().ok_or_else(|| ForkError::FieldTypeMismatch {
        field: field.to_string(),
        expected: "string",
        found: value.to_string(),
    })
}

fn push_pstr(out: &mut Vec<u8>, text: &str, options: &TextOptions) -> Result<(), ForkError> {
    let bytes = options.encode(text)?;
    let len = u8::try_from(bytes.len()).map_err(|_| {
        ForkError::MalformedResource(format!("string of {} bytes exceeds 255", bytes.len()))
    })?;
    out.push(len);
    out.extend_from_slice(&bytes);
    Ok(())
}

/// `STR `: one Pascal string
pub fn decode_str(res: &Resource, ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let mut r = ByteReader::new(&res.data);
    let text = ctx.text.decode(r.pstr()?)?;
    #[cfg(feature = "logging")]
    if !r.is_empty() {
        warn!("{} trailing bytes after string {} #{}", r.remaining(), res.res_type, res.id);
    }
    Ok(ConvertedArtifact::Text(text))
}

pub fn pack_str(value: &Value, text: &TextOptions) -> Result<Vec<u8>, ForkError> {
    let mut out = Vec::new();
    push_pstr(&mut out, expect_str(value, "obj")?, text)?;
    Ok(out)
}

/// `STR#`: a count followed by that many Pascal strings
pub fn decode_str_list(res: &Resource, ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let mut r = ByteReader::new(&res.data);
    let count = r.u16()?;
    let strings = (0..count)
        .map(|_| ctx.text.decode(r.pstr()?))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ConvertedArtifact::StringList(strings))
}

pub fn pack_str_list(value: &Value, text: &TextOptions) -> Result<Vec<u8>, ForkError> {
    let items = value.as_array().ok_or_else(|| ForkError::FieldTypeMismatch {
        field: "obj".to_string(),
        expected: "array of strings",
        found: value.to_string(),
    })?;
    let count = u16::try_from(items.len()).map_err(|_| {
        ForkError::MalformedResource(format!("{} strings exceed the 16-bit count", items.len()))
    })?;
    let mut out = count.to_be_bytes().to_vec();
    for (i, item) in items.iter().enumerate() {
        push_pstr(&mut out, expect_str(item, &format!("[{i}]"))?, text)?;
    }
    Ok(out)
}

/// `TEXT` and `plst`: the whole payload as text
pub fn decode_text(res: &Resource, ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    Ok(ConvertedArtifact::Text(ctx.text.decode(&res.data)?))
}

pub fn pack_text(value: &Value, text: &TextOptions) -> Result<Vec<u8>, ForkError> {
    text.encode(expect_str(value, "obj")?)
}

/// `TMPL`: repeated (label, four-character field type) pairs
pub fn decode_tmpl(res: &Resource, ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let mut r = ByteReader::new(&res.data);
    let mut fields = Vec::new();
    while !r.is_empty() {
        let label = ctx.text.decode(r.pstr()?)?;
        let field_type = ctx.text.decode(&r.four_cc()?)?;
        fields.push(json!({ "label": label, "type": field_type }));
    }
    Ok(ConvertedArtifact::Structured(Value::Array(fields)))
}

pub fn pack_tmpl(value: &Value, text: &TextOptions) -> Result<Vec<u8>, ForkError> {
    let fields = value.as_array().ok_or_else(|| ForkError::FieldTypeMismatch {
        field: "obj".to_string(),
        expected: "array of template fields",
        found: value.to_string(),
    })?;
    let empty = Map::new();
    let mut out = Vec::new();
    for field in fields {
        let entry = field.as_object().unwrap_or(&empty);
        let label = entry
            .get("label")
            .ok_or_else(|| ForkError::MissingField("label".to_string()))?;
        let field_type = entry
            .get("type")
            .ok_or_else(|| ForkError::MissingField("type".to_string()))?;
        push_pstr(&mut out, expect_str(label, "label")?, text)?;
        let code = text.encode(expect_str(field_type, "type")?)?;
        if code.len() != 4 {
            return Err(ForkError::FieldTypeMismatch {
                field: "type".to_string(),
                expected: "four-character code",
                found: field_type.to_string(),
            });
        }
        out.extend_from_slice(&code);
    }
    Ok(out)
}

/// `icns`: already a modern container, copied to a side file
pub fn decode_icns(res: &Resource, _ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    Ok(ConvertedArtifact::File {
        extension: "icns",
        bytes: res.data.clone(),
    })
}
