//! Character encodings recorded on text units.

use serde::{Deserialize, Serialize};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Charset {
    #[default]
    Utf8,
    /// UTF-8 with a leading byte order mark, preserved on write.
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1; the fallback for bytes that are not valid UTF-8.
    Latin1,
}

impl Charset {
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf8Bom => "UTF-8 (BOM)",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Latin1 => "ISO-8859-1",
        }
    }

    /// BOM sniffing, then UTF-8, then ISO-8859-1.
    pub fn decode(bytes: &[u8]) -> Result<(Charset, String), String> {
        if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
            return std::str::from_utf8(rest)
                .map(|s| (Charset::Utf8Bom, s.to_string()))
                .map_err(|e| format!("invalid UTF-8 after BOM: {e}"));
        }
        if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
            return decode_utf16(rest, u16::from_le_bytes).map(|s| (Charset::Utf16Le, s));
        }
        if let Some(rest) = bytes.strip_prefix(UTF16BE_BOM) {
            return decode_utf16(rest, u16::from_be_bytes).map(|s| (Charset::Utf16Be, s));
        }
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok((Charset::Utf8, s.to_string())),
            Err(_) => Ok((Charset::Latin1, bytes.iter().map(|&b| b as char).collect())),
        }
    }

    /// Inverse of [`Charset::decode`]. Characters outside ISO-8859-1 are
    /// written as `?` for [`Charset::Latin1`].
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Utf8Bom => [UTF8_BOM, text.as_bytes()].concat(),
            Charset::Utf16Le => {
                let mut out = UTF16LE_BOM.to_vec();
                out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                out
            }
            Charset::Utf16Be => {
                let mut out = UTF16BE_BOM.to_vec();
                out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
                out
            }
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }
}

fn decode_utf16(bytes: &[u8], word: fn([u8; 2]) -> u16) -> Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err("odd byte count in UTF-16 content".to_string());
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| word([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| format!("invalid UTF-16: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_then_encode_preserves_bytes() {
        let samples: [&[u8]; 4] = [
            b"plain ascii\n",
            b"\xEF\xBB\xBFwith bom\n",
            b"caf\xE9\n",
            b"\xFF\xFEh\x00i\x00",
        ];
        for bytes in samples {
            let (charset, text) = Charset::decode(bytes).unwrap();
            assert_eq!(charset.encode(&text), bytes, "{}", charset.name());
        }
    }

    #[test]
    fn latin1_fallback_for_invalid_utf8() {
        let (charset, text) = Charset::decode(b"caf\xE9").unwrap();
        assert_eq!(charset, Charset::Latin1);
        assert_eq!(text, "café");
    }

    #[test]
    fn truncated_utf16_is_rejected() {
        assert!(Charset::decode(b"\xFF\xFEh").is_err());
    }
}
