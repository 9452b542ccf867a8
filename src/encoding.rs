//! String encoding names and the shared decode/encode routines.
//!
//! Both [`ByteBuffer`](crate::ByteBuffer) and [`ByteStream`](crate::ByteStream)
//! decode strings through [`decode_string`], which is generic over a
//! byte-peeking closure: the buffer version peeks its own storage, the stream
//! version peeks through the chain so strings span buffer boundaries
//! transparently.

use std::str::FromStr;

use crate::error::{Error, Result};

/// A recognized string encoding.
///
/// `ascii` and `latin1` are aliases for the same single-byte decoding; the
/// UTF-16 variants differ only in byte order selection.  `Utf16Bom` consumes
/// a leading 2-byte order mark, selecting little-endian on `0xFFFE` and
/// big-endian otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    Ascii,
    Latin1,
    Utf8,
    Utf16Be,
    Utf16Le,
    Utf16Bom,
}

impl StringEncoding {
    /// Parse an encoding name, case-insensitively.
    /// Returns `None` if the name is not recognised.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ascii" => Some(StringEncoding::Ascii),
            "latin1" => Some(StringEncoding::Latin1),
            "utf8" | "utf-8" => Some(StringEncoding::Utf8),
            "utf16be" | "utf16-be" => Some(StringEncoding::Utf16Be),
            "utf16le" | "utf16-le" => Some(StringEncoding::Utf16Le),
            "utf16bom" | "utf16-bom" => Some(StringEncoding::Utf16Bom),
            _ => None,
        }
    }

    /// Human-readable name (for diagnostics only — never parsed).
    pub fn name(self) -> &'static str {
        match self {
            StringEncoding::Ascii => "ascii",
            StringEncoding::Latin1 => "latin1",
            StringEncoding::Utf8 => "utf8",
            StringEncoding::Utf16Be => "utf16be",
            StringEncoding::Utf16Le => "utf16le",
            StringEncoding::Utf16Bom => "utf16bom",
        }
    }
}

impl FromStr for StringEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StringEncoding::from_name(s).ok_or_else(|| Error::UnknownEncoding(s.to_string()))
    }
}

/// The outcome of a decode: the text plus how many bytes a `read` form
/// should consume afterwards.
pub(crate) struct Decoded {
    pub text: String,
    pub advance_by: usize,
}

/// Decode `length` bytes starting at `offset` as `encoding`.
///
/// `length` of `None` selects null-terminated decoding over at most
/// `remaining` bytes; `Some(0)` also falls back to `remaining` but without
/// null termination.  Decoding never touches bytes past `offset + length`,
/// except that a UTF-16 word straddling the window end is fetched whole.
pub(crate) fn decode_string<F>(
    peek: F,
    offset: usize,
    length: Option<usize>,
    remaining: usize,
    encoding: StringEncoding,
) -> Result<Decoded>
where
    F: Fn(usize) -> Result<u8>,
{
    let null_terminated = length.is_none();
    let length = match length {
        Some(n) if n > 0 => n,
        _ => remaining,
    };
    let end = offset + length;
    let start = offset;
    let mut offset = offset;
    let mut text = String::new();

    let peek_u16 = |off: usize, little_endian: bool| -> Result<u16> {
        let a = peek(off)?;
        let b = peek(off + 1)?;
        Ok(if little_endian {
            u16::from_le_bytes([a, b])
        } else {
            u16::from_be_bytes([a, b])
        })
    };

    match encoding {
        StringEncoding::Ascii | StringEncoding::Latin1 => {
            while offset < end {
                let byte = peek(offset)?;
                offset += 1;
                if null_terminated && byte == 0 {
                    break;
                }
                text.push(char::from(byte));
            }
        }
        StringEncoding::Utf8 => {
            while offset < end {
                let b1 = peek(offset)?;
                offset += 1;
                if null_terminated && b1 == 0 {
                    break;
                }
                if b1 & 0x80 == 0 {
                    text.push(char::from(b1));
                } else if b1 & 0xe0 == 0xc0 {
                    // one continuation (U+0080 to U+07FF)
                    let b2 = peek(offset)? & 0x3f;
                    offset += 1;
                    let pt = (u32::from(b1 & 0x1f) << 6) | u32::from(b2);
                    text.push(char::from_u32(pt).unwrap_or(char::REPLACEMENT_CHARACTER));
                } else if b1 & 0xf0 == 0xe0 {
                    // two continuations (U+0800 to U+FFFF)
                    let b2 = peek(offset)? & 0x3f;
                    offset += 1;
                    let b3 = peek(offset)? & 0x3f;
                    offset += 1;
                    let pt = (u32::from(b1 & 0x0f) << 12) | (u32::from(b2) << 6) | u32::from(b3);
                    text.push(char::from_u32(pt).unwrap_or(char::REPLACEMENT_CHARACTER));
                } else if b1 & 0xf8 == 0xf0 {
                    // three continuations (U+10000 to U+10FFFF)
                    let b2 = peek(offset)? & 0x3f;
                    offset += 1;
                    let b3 = peek(offset)? & 0x3f;
                    offset += 1;
                    let b4 = peek(offset)? & 0x3f;
                    offset += 1;
                    let pt = (u32::from(b1 & 0x0f) << 18)
                        | (u32::from(b2) << 12)
                        | (u32::from(b3) << 6)
                        | u32::from(b4);
                    text.push(char::from_u32(pt).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                // Other lead bytes contribute nothing.
            }
        }
        StringEncoding::Utf16Be | StringEncoding::Utf16Le | StringEncoding::Utf16Bom => {
            let little_endian = match encoding {
                StringEncoding::Utf16Be => false,
                StringEncoding::Utf16Le => true,
                _ => {
                    let bom = peek_u16(offset, false)?;
                    if length < 2 || (null_terminated && bom == 0) {
                        return Ok(Decoded {
                            text,
                            advance_by: start + 2,
                        });
                    }
                    offset += 2;
                    bom == 0xfffe
                }
            };

            while offset < end {
                let w1 = peek_u16(offset, little_endian)?;
                if null_terminated && w1 == 0 {
                    break;
                }
                offset += 2;

                if !(0xd800..=0xdfff).contains(&w1) {
                    text.push(char::from_u32(u32::from(w1)).unwrap_or(char::REPLACEMENT_CHARACTER));
                } else {
                    let w2 = peek_u16(offset, little_endian)?;
                    if !(0xdc00..=0xdfff).contains(&w2) {
                        return Err(Error::InvalidUtf16);
                    }
                    if !(0xd800..=0xdbff).contains(&w1) {
                        // A low surrogate cannot start a pair.
                        return Err(Error::InvalidUtf16);
                    }
                    offset += 2;
                    let pt = 0x10000
                        + ((u32::from(w1 - 0xd800) << 10) | u32::from(w2 - 0xdc00));
                    text.push(char::from_u32(pt).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
        }
    }

    Ok(Decoded {
        text,
        advance_by: length,
    })
}

/// Encode a string for the write path.
///
/// `Ascii`/`Latin1` keep the low byte of each UTF-16 code unit; `Utf8` is
/// standard UTF-8; the UTF-16 variants write one 16-bit word per code unit.
/// `Utf16Bom` writes big-endian and does not emit an order mark.
pub(crate) fn encode_string(s: &str, encoding: StringEncoding) -> Vec<u8> {
    let mut data = Vec::new();
    match encoding {
        StringEncoding::Ascii | StringEncoding::Latin1 => {
            for unit in s.encode_utf16() {
                data.push((unit & 0xff) as u8);
            }
        }
        StringEncoding::Utf8 => {
            data.extend_from_slice(s.as_bytes());
        }
        StringEncoding::Utf16Le => {
            for unit in s.encode_utf16() {
                data.extend_from_slice(&unit.to_le_bytes());
            }
        }
        StringEncoding::Utf16Be | StringEncoding::Utf16Bom => {
            for unit in s.encode_utf16() {
                data.extend_from_slice(&unit.to_be_bytes());
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peek_from(data: &[u8]) -> impl Fn(usize) -> Result<u8> + '_ {
        move |offset| {
            data.get(offset)
                .copied()
                .ok_or(Error::underflow(1, 0))
        }
    }

    #[test]
    fn parses_every_recognized_name() {
        for name in [
            "ascii", "latin1", "utf8", "utf-8", "utf16be", "utf16-be", "utf16le", "utf16-le",
            "utf16bom", "utf16-bom", "ASCII", "Utf16BOM",
        ] {
            assert!(StringEncoding::from_name(name).is_some(), "{name}");
        }
        assert!(StringEncoding::from_name("utf32").is_none());
        assert_eq!(
            "utf32".parse::<StringEncoding>(),
            Err(Error::UnknownEncoding("utf32".to_string()))
        );
    }

    #[test]
    fn latin1_maps_high_bytes() {
        let data = [0x41, 0xe9, 0xff];
        let decoded =
            decode_string(peek_from(&data), 0, Some(3), 3, StringEncoding::Latin1).unwrap();
        assert_eq!(decoded.text, "Aéÿ");
        assert_eq!(decoded.advance_by, 3);
    }

    #[test]
    fn null_terminated_stops_early_but_advances_fully() {
        let data = [b'w', b'a', b'v', 0, b'x', b'y'];
        let decoded =
            decode_string(peek_from(&data), 0, None, data.len(), StringEncoding::Ascii).unwrap();
        assert_eq!(decoded.text, "wav");
        assert_eq!(decoded.advance_by, data.len());
    }

    #[test]
    fn utf8_surrogate_pair_round_trip() {
        let data = [0xf0, 0x9f, 0x98, 0x80];
        let decoded =
            decode_string(peek_from(&data), 0, Some(4), 4, StringEncoding::Utf8).unwrap();
        assert_eq!(decoded.text, "\u{1f600}");
        assert_eq!(decoded.text.encode_utf16().count(), 2);
        assert_eq!(encode_string(&decoded.text, StringEncoding::Utf8), data);
    }

    #[test]
    fn utf16_bom_selects_byte_order() {
        // 0xFFFE selects little-endian.
        let le = [0xff, 0xfe, b'h', 0, b'i', 0];
        let decoded =
            decode_string(peek_from(&le), 0, Some(6), 6, StringEncoding::Utf16Bom).unwrap();
        assert_eq!(decoded.text, "hi");

        // Anything else decodes big-endian; the leading word is consumed.
        let be = [0xfe, 0xff, 0, b'h', 0, b'i'];
        let decoded =
            decode_string(peek_from(&be), 0, Some(6), 6, StringEncoding::Utf16Bom).unwrap();
        assert_eq!(decoded.text, "hi");
    }

    #[test]
    fn utf16_invalid_low_surrogate_is_rejected() {
        // High surrogate followed by a plain character.
        let data = [0xd8, 0x3d, 0x00, 0x41];
        let result = decode_string(peek_from(&data), 0, Some(4), 4, StringEncoding::Utf16Be);
        assert_eq!(result.err(), Some(Error::InvalidUtf16));
    }

    #[test]
    fn utf16_pairs_combine() {
        // U+1F600 as UTF-16BE: D83D DE00.
        let data = [0xd8, 0x3d, 0xde, 0x00];
        let decoded =
            decode_string(peek_from(&data), 0, Some(4), 4, StringEncoding::Utf16Be).unwrap();
        assert_eq!(decoded.text, "\u{1f600}");
    }

    #[test]
    fn ascii_write_keeps_low_byte() {
        assert_eq!(encode_string("Aé", StringEncoding::Ascii), vec![0x41, 0xe9]);
    }

    #[test]
    fn utf16_write_orders_bytes() {
        assert_eq!(
            encode_string("hi", StringEncoding::Utf16Le),
            vec![b'h', 0, b'i', 0]
        );
        assert_eq!(
            encode_string("hi", StringEncoding::Utf16Be),
            vec![0, b'h', 0, b'i']
        );
        // The BOM variant writes big-endian without a mark.
        assert_eq!(
            encode_string("hi", StringEncoding::Utf16Bom),
            vec![0, b'h', 0, b'i']
        );
    }
}
