//! Legacy single-byte text encodings

use crate::error::ForkError;
use serde::{Deserialize, Serialize};

/// Mac OS Roman, bytes 0x80..=0xFF (0x00..=0x7F are ASCII)
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è', //
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü', //
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø', //
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø', //
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ', //
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ', //
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô', //
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

/// Single-byte encoding used for names, strings and text resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    /// Mac OS Roman (every byte is mapped)
    #[default]
    MacRoman,
    /// 7-bit ASCII (bytes 0x80 and above are unmapped)
    Ascii,
}

/// What to do with bytes or characters the encoding cannot map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplacementPolicy {
    /// Fail with `UndecodableText` / `UnencodableText`
    #[default]
    Strict,
    /// Substitute U+FFFD when decoding and `?` when encoding
    Replace,
}

/// Text transcoding configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextOptions {
    /// Legacy encoding of resource text
    pub encoding: TextEncoding,
    /// Handling of unmapped input
    pub policy: ReplacementPolicy,
}

impl TextOptions {
    /// Options with the given encoding and the strict policy
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            policy: ReplacementPolicy::Strict,
        }
    }

    /// Switch to the replacing policy
    pub fn replacing(mut self) -> Self {
        self.policy = ReplacementPolicy::Replace;
        self
    }

    fn map_byte(&self, byte: u8) -> Option<char> {
        match (self.encoding, byte) {
            (_, 0x00..=0x7F) => Some(char::from(byte)),
            (TextEncoding::MacRoman, _) => Some(MAC_ROMAN_HIGH[usize::from(byte - 0x80)]),
            (TextEncoding::Ascii, _) => None,
        }
    }

    fn map_char(&self, c: char) -> Option<u8> {
        if c.is_ascii() {
            return Some(c as u8);
        }
        match self.encoding {
            TextEncoding::MacRoman => MAC_ROMAN_HIGH
                .iter()
                .position(|&m| m == c)
                .map(|i| 0x80 + i as u8),
            TextEncoding::Ascii => None,
        }
    }

    /// Decode legacy bytes to a string
    pub fn decode(&self, bytes: &[u8]) -> Result<String, ForkError> {
        let mut out = String::with_capacity(bytes.len());
        for (offset, &byte) in bytes.iter().enumerate() {
            match (self.map_byte(byte), self.policy) {
                (Some(c), _) => out.push(c),
                (None, ReplacementPolicy::Replace) => out.push(char::REPLACEMENT_CHARACTER),
                (None, ReplacementPolicy::Strict) => {
                    return Err(ForkError::UndecodableText { byte, offset })
                }
            }
        }
        Ok(out)
    }

    /// Decode, substituting U+FFFD regardless of policy
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| self.map_byte(b).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    /// Encode a string to legacy bytes
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, ForkError> {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            match (self.map_char(c), self.policy) {
                (Some(b), _) => out.push(b),
                (None, ReplacementPolicy::Replace) => out.push(b'?'),
                (None, ReplacementPolicy::Strict) => return Err(ForkError::UnencodableText(c)),
            }
        }
        Ok(out)
    }
}

/// Keep only characters that are safe in a file name
pub fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_roman_round_trip_all_bytes() {
        let opts = TextOptions::default();
        let all: Vec<u8> = (0..=255).collect();
        let text = opts.decode(&all).unwrap();
        assert_eq!(text.chars().count(), 256);
        assert_eq!(opts.encode(&text).unwrap(), all);
    }

    #[test]
    fn test_mac_roman_known_characters() {
        let opts = TextOptions::default();
        assert_eq!(opts.decode(&[0x8E, 0xA5, 0xD2, 0xD3]).unwrap(), "é•“”");
        assert_eq!(opts.encode("Café").unwrap(), b"Caf\x8E");
    }

    #[test]
    fn test_ascii_strict_rejects_high_bytes() {
        let opts = TextOptions::new(TextEncoding::Ascii);
        let err = opts.decode(b"ok\xA5").unwrap_err();
        assert_eq!(err, ForkError::UndecodableText { byte: 0xA5, offset: 2 });
    }

    #[test]
    fn test_ascii_replace_policy() {
        let opts = TextOptions::new(TextEncoding::Ascii).replacing();
        assert_eq!(opts.decode(b"a\xFFb").unwrap(), "a\u{FFFD}b");
        assert_eq!(opts.encode("naïve").unwrap(), b"na?ve");
    }

    #[test]
    fn test_unencodable_character() {
        let opts = TextOptions::default();
        assert_eq!(opts.encode("日"), Err(ForkError::UnencodableText('日')));
    }

    #[test]
    fn test_sanitize_resource_name() {
        assert_eq!(sanitize_resource_name("My Icon #2"), "MyIcon2");
        assert_eq!(sanitize_resource_name("snd_boom-1"), "snd_boom-1");
    }
}
