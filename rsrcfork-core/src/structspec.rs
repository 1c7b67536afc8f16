//! Struct specs: textual descriptions of fixed big-endian binary records
//!
//! A definition reads `TYPE:FORMAT[:NAMES]`, for example
//! `"vers:BBBBh:major,minor,stage,build,region"`. FORMAT uses single-letter
//! field codes with optional decimal counts; a trailing `+` means the resource
//! is a list of such records.

use crate::cursor::ByteReader;
use crate::error::ForkError;
use crate::text::TextOptions;
use crate::types::ResType;
use bytes::{BufMut, BytesMut};
use serde_json::{Map, Number, Value};

/// Key holding undeclared trailing bytes of a non-repeatable struct
pub const REMAINDER_KEY: &str = ".remainder";

/// Fixed-width scalar kinds, all big-endian
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// One byte; 0 and 1 become `false` and `true`
    Bool,
    /// One Mac Roman character
    Char,
}

impl ScalarKind {
    fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'b' => Self::I8,
            'B' => Self::U8,
            'h' => Self::I16,
            'H' => Self::U16,
            'i' | 'l' => Self::I32,
            'I' | 'L' => Self::U32,
            'q' => Self::I64,
            'Q' => Self::U64,
            'f' => Self::F32,
            'd' => Self::F64,
            '?' => Self::Bool,
            'c' => Self::Char,
            _ => return None,
        })
    }

    /// Width in bytes
    pub const fn width(self) -> usize {
        match self {
            Self::I8 | Self::U8 | Self::Bool | Self::Char => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::I8 => "an 8-bit signed integer",
            Self::U8 => "an 8-bit unsigned integer",
            Self::I16 => "a 16-bit signed integer",
            Self::U16 => "a 16-bit unsigned integer",
            Self::I32 => "a 32-bit signed integer",
            Self::U32 => "a 32-bit unsigned integer",
            Self::I64 => "a 64-bit signed integer",
            Self::U64 => "a 64-bit unsigned integer",
            Self::F32 | Self::F64 => "a number",
            Self::Bool => "a boolean",
            Self::Char => "a one-character string",
        }
    }
}

/// What a field occupies in the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// N opaque bytes, shown as hex
    Bytes(usize),
    /// N bytes skipped on decode and zero-filled on encode
    Padding(usize),
}

impl FieldKind {
    /// Width in bytes
    pub const fn width(self) -> usize {
        match self {
            Self::Scalar(kind) => kind.width(),
            Self::Bytes(n) | Self::Padding(n) => n,
        }
    }
}

/// One field of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key in the structured value; `None` for padding
    pub name: Option<String>,
    pub kind: FieldKind,
}

/// A parsed, immutable record layout bound to one resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructSpec {
    res_type: ResType,
    fields: Vec<FieldSpec>,
    repeatable: bool,
    stride: usize,
    bare: bool,
}

impl StructSpec {
    /// Parse a `TYPE:FORMAT[:NAMES]` definition
    pub fn parse(definition: &str) -> Result<Self, ForkError> {
        let mut parts = definition.splitn(3, ':');
        let (Some(type_name), Some(format)) = (parts.next(), parts.next()) else {
            return Err(ForkError::InvalidStructSpec(format!(
                "{definition:?} is not of the form TYPE:FORMAT[:NAMES]"
            )));
        };
        let names: Vec<&str> = match parts.next() {
            Some(list) if !list.is_empty() => list.split(',').map(str::trim).collect(),
            _ => Vec::new(),
        };
        Self::new(ResType::parse(type_name)?, format, &names)
    }

    /// Build a spec from a format string and field names
    ///
    /// Names are assigned to value fields in order; missing or empty names
    /// become `.field<N>`, N being the value-field index.
    pub fn new(res_type: ResType, format: &str, names: &[&str]) -> Result<Self, ForkError> {
        let (kinds, repeatable) = parse_format(format)?;
        let value_count = kinds
            .iter()
            .filter(|k| !matches!(k, FieldKind::Padding(_)))
            .count();
        if value_count == 0 {
            return Err(ForkError::InvalidStructSpec(format!(
                "format {format:?} declares no value fields"
            )));
        }
        if names.len() > value_count {
            return Err(ForkError::InvalidStructSpec(format!(
                "{} names given for {} fields",
                names.len(),
                value_count
            )));
        }

        let mut fields = Vec::with_capacity(kinds.len());
        let mut seen = hashbrown::HashSet::new();
        let mut index = 0;
        for kind in kinds {
            if let FieldKind::Padding(_) = kind {
                fields.push(FieldSpec { name: None, kind });
                continue;
            }
            let name = match names.get(index) {
                Some(n) if !n.is_empty() => (*n).to_string(),
                _ => format!(".field{index}"),
            };
            if name == REMAINDER_KEY || !seen.insert(name.clone()) {
                return Err(ForkError::DuplicateFieldName(name));
            }
            fields.push(FieldSpec {
                name: Some(name),
                kind,
            });
            index += 1;
        }

        let stride = fields.iter().map(|f| f.kind.width()).sum();
        if stride == 0 {
            return Err(ForkError::InvalidStructSpec(format!(
                "format {format:?} describes an empty record"
            )));
        }

        Ok(Self {
            res_type,
            stride,
            bare: value_count == 1 && names.is_empty(),
            fields,
            repeatable,
        })
    }

    /// Resource type the spec applies to
    pub fn res_type(&self) -> ResType {
        self.res_type
    }

    /// Fields in record order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Byte length of one record
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// True when the resource is a list of records
    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    /// Decode a resource payload
    pub fn decode(&self, data: &[u8]) -> Result<Value, ForkError> {
        let mut r = ByteReader::new(data);
        if self.repeatable {
            if data.len() % self.stride != 0 {
                return Err(ForkError::ShortRead {
                    expected: data.len().next_multiple_of(self.stride),
                    actual: data.len(),
                });
            }
            let mut records = Vec::with_capacity(data.len() / self.stride);
            while !r.is_empty() {
                records.push(self.decode_record(&mut r)?);
            }
            return Ok(Value::Array(records));
        }

        let record = self.decode_record(&mut r)?;
        if r.is_empty() {
            return Ok(record);
        }
        let tail = Value::String(hex::encode_upper(r.rest()));
        let mut obj = match record {
            Value::Object(obj) => obj,
            scalar => {
                let mut obj = Map::new();
                obj.insert(self.value_keys().next().unwrap_or_default().to_string(), scalar);
                obj
            }
        };
        obj.insert(REMAINDER_KEY.to_string(), tail);
        Ok(Value::Object(obj))
    }

    /// Encode a structured value back to bytes
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, ForkError> {
        let mut out = BytesMut::new();
        if self.repeatable {
            let Value::Array(records) = value else {
                return Err(mismatch("(records)", "a list of records", value));
            };
            for record in records {
                self.encode_record(record, &mut out)?;
            }
        } else {
            self.encode_record(value, &mut out)?;
            if let Some(tail) = value.get(REMAINDER_KEY) {
                let hex_text = tail
                    .as_str()
                    .ok_or_else(|| mismatch(REMAINDER_KEY, "a hex string", tail))?;
                out.put_slice(&hex::decode(hex_text)?);
            }
        }
        Ok(out.to_vec())
    }

    fn value_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|f| f.name.as_deref())
    }

    fn decode_record(&self, r: &mut ByteReader<'_>) -> Result<Value, ForkError> {
        let mut obj = Map::new();
        let mut bare_value = None;
        for field in &self.fields {
            let value = match field.kind {
                FieldKind::Padding(n) => {
                    r.skip(n)?;
                    continue;
                }
                FieldKind::Bytes(n) => Value::String(hex::encode_upper(r.bytes(n)?)),
                FieldKind::Scalar(kind) => decode_scalar(kind, r)?,
            };
            match &field.name {
                Some(_) if self.bare => bare_value = Some(value),
                Some(name) => {
                    obj.insert(name.clone(), value);
                }
                None => {}
            }
        }
        Ok(bare_value.unwrap_or(Value::Object(obj)))
    }

    fn encode_record(&self, record: &Value, out: &mut BytesMut) -> Result<(), ForkError> {
        let mut positional = match record {
            Value::Array(items) => Some(items.iter()),
            _ => None,
        };
        for field in &self.fields {
            let (kind, name) = match (field.kind, field.name.as_deref()) {
                (FieldKind::Padding(n), _) => {
                    out.put_bytes(0, n);
                    continue;
                }
                (kind, Some(name)) => (kind, name),
                (_, None) => continue,
            };
            let value = match (&mut positional, record) {
                (Some(items), _) => items.next(),
                (None, Value::Object(obj)) => obj.get(name),
                (None, scalar) if self.bare => Some(scalar),
                (None, other) => return Err(mismatch("(record)", "an object", other)),
            }
            .ok_or_else(|| ForkError::MissingField(name.to_string()))?;

            if let FieldKind::Scalar(scalar) = kind {
                encode_scalar(scalar, name, value, out)?;
                continue;
            }
            let width = kind.width();
            let text = value
                .as_str()
                .ok_or_else(|| mismatch(name, "a hex string", value))?;
            let bytes = hex::decode(text)?;
            if bytes.len() > width {
                return Err(mismatch(name, "a hex string that fits the field", value));
            }
            out.put_slice(&bytes);
            out.put_bytes(0, width - bytes.len());
        }
        Ok(())
    }
}

fn parse_format(format: &str) -> Result<(Vec<FieldKind>, bool), ForkError> {
    let invalid = |why: String| ForkError::InvalidStructSpec(format!("format {format:?}: {why}"));

    let body = format.trim();
    let (body, repeatable) = match body.strip_suffix('+') {
        Some(rest) => (rest, true),
        None => (body, false),
    };
    let body = body.strip_prefix(['>', '!']).unwrap_or(body);

    let mut kinds = Vec::new();
    let mut count: Option<usize> = None;
    for c in body.chars() {
        if c.is_whitespace() {
            continue;
        }
        if let Some(digit) = c.to_digit(10) {
            let n = count.unwrap_or(0);
            count = Some(
                n.checked_mul(10)
                    .and_then(|n| n.checked_add(digit as usize))
                    .ok_or_else(|| invalid("count overflows".to_string()))?,
            );
            continue;
        }
        let n = count.take();
        match c {
            's' => kinds.push(FieldKind::Bytes(n.unwrap_or(1))),
            'x' => kinds.push(FieldKind::Padding(n.unwrap_or(1))),
            '<' | '@' | '=' => {
                return Err(invalid(format!("byte order '{c}' is not supported, records are big-endian")))
            }
            _ => {
                let kind = ScalarKind::from_code(c)
                    .ok_or_else(|| invalid(format!("unknown field code '{c}'")))?;
                match n {
                    Some(0) => return Err(invalid(format!("zero count for '{c}'"))),
                    n => kinds.extend(std::iter::repeat(FieldKind::Scalar(kind)).take(n.unwrap_or(1))),
                }
            }
        }
    }
    if count.is_some() {
        return Err(invalid("count without a field code".to_string()));
    }
    Ok((kinds, repeatable))
}

fn decode_scalar(kind: ScalarKind, r: &mut ByteReader<'_>) -> Result<Value, ForkError> {
    Ok(match kind {
        ScalarKind::I8 => r.i8()?.into(),
        ScalarKind::U8 => r.u8()?.into(),
        ScalarKind::I16 => r.i16()?.into(),
        ScalarKind::U16 => r.u16()?.into(),
        ScalarKind::I32 => r.i32()?.into(),
        ScalarKind::U32 => r.u32()?.into(),
        ScalarKind::I64 => r.i64()?.into(),
        ScalarKind::U64 => r.u64()?.into(),
        ScalarKind::F32 => {
            let v = r.f32()?;
            if v.is_nan() && v.to_bits() != f32::NAN.to_bits() {
                Value::String(format!("nan:0x{:08X}", v.to_bits()))
            } else {
                float_value(f64::from(v))
            }
        }
        ScalarKind::F64 => {
            let v = r.f64()?;
            if v.is_nan() && v.to_bits() != f64::NAN.to_bits() {
                Value::String(format!("nan:0x{:016X}", v.to_bits()))
            } else {
                float_value(v)
            }
        }
        ScalarKind::Bool => match r.u8()? {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            // other bytes stay numeric so they survive re-encoding
            other => other.into(),
        },
        ScalarKind::Char => Value::String(TextOptions::default().decode_lossy(r.bytes(1)?)),
    })
}

fn float_value(v: f64) -> Value {
    match Number::from_f64(v) {
        Some(n) => Value::Number(n),
        None if v.is_nan() => Value::String("nan".to_string()),
        None if v > 0.0 => Value::String("inf".to_string()),
        None => Value::String("-inf".to_string()),
    }
}

fn encode_scalar(
    kind: ScalarKind,
    name: &str,
    value: &Value,
    out: &mut BytesMut,
) -> Result<(), ForkError> {
    let int = |min: i128, max: i128| -> Result<i128, ForkError> {
        value
            .as_i64()
            .map(i128::from)
            .or_else(|| value.as_u64().map(i128::from))
            .filter(|v| (min..=max).contains(v))
            .ok_or_else(|| mismatch(name, kind.describe(), value))
    };
    match kind {
        ScalarKind::I8 => out.put_i8(int(i8::MIN.into(), i8::MAX.into())? as i8),
        ScalarKind::U8 => out.put_u8(int(0, u8::MAX.into())? as u8),
        ScalarKind::I16 => out.put_i16(int(i16::MIN.into(), i16::MAX.into())? as i16),
        ScalarKind::U16 => out.put_u16(int(0, u16::MAX.into())? as u16),
        ScalarKind::I32 => out.put_i32(int(i32::MIN.into(), i32::MAX.into())? as i32),
        ScalarKind::U32 => out.put_u32(int(0, u32::MAX.into())? as u32),
        ScalarKind::I64 => out.put_i64(int(i64::MIN.into(), i64::MAX.into())? as i64),
        ScalarKind::U64 => out.put_u64(int(0, u64::MAX.into())? as u64),
        ScalarKind::F32 => match nan_bits(kind, name, value)? {
            Some(bits) => {
                let bits = u32::try_from(bits)
                    .ok()
                    .filter(|b| f32::from_bits(*b).is_nan())
                    .ok_or_else(|| mismatch(name, kind.describe(), value))?;
                out.put_u32(bits)
            }
            None => {
                let v = float_from(kind, name, value)?;
                out.put_f32(if v.is_nan() { f32::NAN } else { v as f32 })
            }
        },
        ScalarKind::F64 => match nan_bits(kind, name, value)? {
            Some(bits) if f64::from_bits(bits).is_nan() => out.put_u64(bits),
            Some(_) => return Err(mismatch(name, kind.describe(), value)),
            None => out.put_f64(float_from(kind, name, value)?),
        },
        ScalarKind::Bool => match value {
            Value::Bool(b) => out.put_u8(u8::from(*b)),
            _ => out.put_u8(int(0, u8::MAX.into())? as u8),
        },
        ScalarKind::Char => {
            let text = value
                .as_str()
                .filter(|s| s.chars().count() == 1)
                .ok_or_else(|| mismatch(name, kind.describe(), value))?;
            out.put_slice(&TextOptions::default().encode(text)?);
        }
    }
    Ok(())
}

/// Bit pattern of a non-canonical NaN written as `nan:0x...`
fn nan_bits(kind: ScalarKind, name: &str, value: &Value) -> Result<Option<u64>, ForkError> {
    match value.as_str().and_then(|s| s.strip_prefix("nan:0x")) {
        Some(hex) => u64::from_str_radix(hex, 16)
            .map(Some)
            .map_err(|_| mismatch(name, kind.describe(), value)),
        None => Ok(None),
    }
}

fn float_from(kind: ScalarKind, name: &str, value: &Value) -> Result<f64, ForkError> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "nan" => Some(f64::NAN),
            "inf" => Some(f64::INFINITY),
            "-inf" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
    .ok_or_else(|| mismatch(name, kind.describe(), value))
}

fn mismatch(field: &str, expected: &'static str, found: &Value) -> ForkError {
    ForkError::FieldTypeMismatch {
        field: field.to_string(),
        expected,
        found: found.to_string(),
    }
}
