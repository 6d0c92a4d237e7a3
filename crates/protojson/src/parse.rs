//! Literal parsers used by the field decoders.
//!
//! Every function takes one raw JSON item (already validated by the scanner)
//! and returns `None` when the item does not have the expected shape.

use std::str;

fn number_text(b: &[u8]) -> Option<&str> {
    match b.first() {
        Some(b'-' | b'0'..=b'9') => str::from_utf8(b).ok(),
        _ => None,
    }
}

pub fn parse_i32(b: &[u8]) -> Option<i32> {
    number_text(b)?.parse().ok()
}

pub fn parse_i64(b: &[u8]) -> Option<i64> {
    number_text(b)?.parse().ok()
}

pub fn parse_u32(b: &[u8]) -> Option<u32> {
    number_text(b)?.parse().ok()
}

pub fn parse_u64(b: &[u8]) -> Option<u64> {
    number_text(b)?.parse().ok()
}

/// Out-of-range magnitudes are rejected rather than saturated to infinity.
pub fn parse_f32(b: &[u8]) -> Option<f32> {
    let v: f32 = number_text(b)?.parse().ok()?;
    v.is_finite().then_some(v)
}

pub fn parse_f64(b: &[u8]) -> Option<f64> {
    let v: f64 = number_text(b)?.parse().ok()?;
    v.is_finite().then_some(v)
}

pub fn parse_bool(b: &[u8]) -> Option<bool> {
    match b {
        b"true" => Some(true),
        b"false" => Some(false),
        _ => None,
    }
}

/// Decodes a quoted JSON string literal.
///
/// Invalid UTF-8 and unpaired surrogate escapes become U+FFFD.
pub fn unquote(s: &[u8]) -> Option<String> {
    if s.len() < 2 || s[0] != b'"' || s[s.len() - 1] != b'"' {
        return None;
    }
    let s = &s[1..s.len() - 1];

    if !s.iter().any(|&c| c == b'\\' || c == b'"' || c < b' ') {
        return Some(String::from_utf8_lossy(s).into_owned());
    }

    let mut out: Vec<u8> = Vec::with_capacity(s.len());
    let mut r = 0;
    while r < s.len() {
        let c = s[r];
        match c {
            b'\\' => {
                r += 1;
                let esc = *s.get(r)?;
                r += 1;
                match esc {
                    b'"' | b'\\' | b'/' | b'\'' => out.push(esc),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'u' => {
                        let mut code = hex4(s.get(r..r + 4)?)?;
                        r += 4;
                        if (0xd800..0xe000).contains(&code) {
                            let low = match s.get(r..r + 6) {
                                Some([b'\\', b'u', rest @ ..]) => hex4(rest),
                                _ => None,
                            };
                            match low {
                                Some(low) if (0xd800..0xdc00).contains(&code)
                                    && (0xdc00..0xe000).contains(&low) =>
                                {
                                    code = 0x10000 + ((code - 0xd800) << 10) + (low - 0xdc00);
                                    r += 6;
                                }
                                _ => code = 0xfffd,
                            }
                        }
                        let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    }
                    _ => return None,
                }
            }
            b'"' => return None,
            c if c < b' ' => return None,
            _ => {
                out.push(c);
                r += 1;
            }
        }
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

fn hex4(b: &[u8]) -> Option<u32> {
    if b.len() != 4 {
        return None;
    }
    let mut v = 0u32;
    for &c in b {
        v = (v << 4) | (c as char).to_digit(16)?;
    }
    Some(v)
}
