//! The JVM "modified UTF-8" encoding.
//!
//! Differences from standard UTF-8:
//!
//! - U+0000 is written as the two bytes `C0 80`, never as a single zero byte
//! - supplementary characters (above U+FFFF) are written as their UTF-16
//!   surrogate pair, each half encoded as a 3-byte sequence, 6 bytes in total
//! - there are no 4-byte sequences
//!
//! Lone surrogates are representable in modified UTF-8 but not in a Rust
//! `str`, so decoding rejects them.

use crate::error::{Error, Result};

/// Encodes `text` as modified UTF-8
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + text.len() / 2);
    for c in text.chars() {
        let cp = c as u32;
        match cp {
            0x01..=0x7F => out.push(cp as u8),
            0x00 | 0x80..=0x7FF => {
                out.push(0xC0 | (cp >> 6) as u8);
                out.push(0x80 | (cp & 0x3F) as u8);
            }
            0x800..=0xFFFF => push_three(&mut out, cp as u16),
            _ => {
                let mut units = [0u16; 2];
                for &unit in c.encode_utf16(&mut units).iter() {
                    push_three(&mut out, unit);
                }
            }
        }
    }
    out
}

fn push_three(out: &mut Vec<u8>, unit: u16) {
    out.push(0xE0 | (unit >> 12) as u8);
    out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
    out.push(0x80 | (unit & 0x3F) as u8);
}

/// Decodes modified UTF-8 bytes.
///
/// Fails with [`Error::MalformedUtf8`] naming the offset of the first
/// sequence that matches none of the 1, 2, 3 or 6 byte forms.
pub fn decode(bytes: &[u8]) -> Result<String> {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let lead = bytes[i];
        match lead {
            0x01..=0x7F => {
                out.push(lead as char);
                i += 1;
            }
            0xC0..=0xDF => {
                let next = continuation(bytes, i + 1)?;
                let cp = (u32::from(lead & 0x1F) << 6) | u32::from(next);
                out.push(char::from_u32(cp).ok_or(Error::MalformedUtf8 { offset: i })?);
                i += 2;
            }
            0xE0..=0xEF => {
                let unit = three(bytes, i)?;
                let c = match unit {
                    0xD800..=0xDBFF => {
                        let low = match bytes.get(i + 3) {
                            Some(0xE0..=0xEF) => three(bytes, i + 3)?,
                            _ => return Err(Error::MalformedUtf8 { offset: i }),
                        };
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(Error::MalformedUtf8 { offset: i });
                        }
                        i += 3;
                        0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
                    }
                    0xDC00..=0xDFFF => return Err(Error::MalformedUtf8 { offset: i }),
                    _ => u32::from(unit),
                };
                out.push(char::from_u32(c).ok_or(Error::MalformedUtf8 { offset: i })?);
                i += 3;
            }
            _ => return Err(Error::MalformedUtf8 { offset: i }),
        }
    }

    Ok(out)
}

/// Payload bits of a `10xxxxxx` continuation byte
fn continuation(bytes: &[u8], at: usize) -> Result<u8> {
    match bytes.get(at) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(b & 0x3F),
        _ => Err(Error::MalformedUtf8 { offset: at }),
    }
}

/// Decodes one 3-byte sequence into a UTF-16 code unit
fn three(bytes: &[u8], at: usize) -> Result<u16> {
    let lead = bytes[at] & 0x0F;
    let mid = continuation(bytes, at + 1)?;
    let low = continuation(bytes, at + 2)?;
    Ok((u16::from(lead) << 12) | (u16::from(mid) << 6) | u16::from(low))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(c: char, expected_len: usize) {
        let text = c.to_string();
        let encoded = encode(&text);
        assert_eq!(encoded.len(), expected_len, "length for U+{:04X}", c as u32);
        assert_eq!(decode(&encoded).unwrap(), text, "U+{:04X}", c as u32);
    }

    #[test]
    fn test_boundary_code_points() {
        roundtrip('\u{0}', 2);
        roundtrip('\u{7F}', 1);
        roundtrip('\u{80}', 2);
        roundtrip('\u{7FF}', 2);
        roundtrip('\u{800}', 3);
        roundtrip('\u{FFFF}', 3);
        roundtrip('\u{1F600}', 6);
        roundtrip('\u{10FFFF}', 6);
    }

    #[test]
    fn test_nul_is_two_bytes() {
        assert_eq!(encode("\0"), vec![0xC0, 0x80]);
    }

    #[test]
    fn test_supplementary_is_surrogate_pair() {
        // U+1F600 = D83D DE00
        assert_eq!(
            encode("\u{1F600}"),
            vec![0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]
        );
    }

    #[test]
    fn test_mixed_text() {
        let text = "java.base/\u{e9}t\u{e9}-\u{4e2d}\u{1F600}";
        assert_eq!(decode(&encode(text)).unwrap(), text);
    }

    #[test]
    fn test_rejects_raw_nul() {
        assert!(matches!(
            decode(&[b'a', 0x00]),
            Err(Error::MalformedUtf8 { offset: 1 })
        ));
    }

    #[test]
    fn test_rejects_truncated_sequence() {
        assert!(decode(&[0xC3]).is_err());
        assert!(decode(&[0xE2, 0x82]).is_err());
    }

    #[test]
    fn test_rejects_four_byte_utf8() {
        // Standard UTF-8 for U+1F600
        assert!(decode(&[0xF0, 0x9F, 0x98, 0x80]).is_err());
    }

    #[test]
    fn test_rejects_lone_surrogates() {
        assert!(decode(&[0xED, 0xA0, 0xBD]).is_err());
        assert!(decode(&[0xED, 0xB8, 0x80]).is_err());
        assert!(decode(&[0xED, 0xA0, 0xBD, b'x', b'y', b'z']).is_err());
    }
}
