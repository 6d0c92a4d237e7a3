//! HTML-safe JSON string escaping.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// ASCII bytes that can be copied through without escaping.
fn is_safe(b: u8) -> bool {
    b >= 0x20 && !matches!(b, b'"' | b'\\' | b'<' | b'>' | b'&') && b < 0x80
}

/// Appends `s` as a quoted JSON string.
///
/// Control bytes, `<`, `>` and `&` become `\u00XX`; U+2028 and U+2029 are
/// escaped as well.
pub fn append_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if ch.is_ascii() {
            let b = ch as u8;
            if is_safe(b) {
                continue;
            }
            buf.extend_from_slice(&bytes[start..i]);
            buf.push(b'\\');
            match b {
                b'\\' | b'"' => buf.push(b),
                b'\n' => buf.push(b'n'),
                b'\r' => buf.push(b'r'),
                b'\t' => buf.push(b't'),
                _ => {
                    buf.extend_from_slice(b"u00");
                    buf.push(HEX[(b >> 4) as usize]);
                    buf.push(HEX[(b & 0xf) as usize]);
                }
            }
            start = i + 1;
        } else if ch == '\u{2028}' || ch == '\u{2029}' {
            buf.extend_from_slice(&bytes[start..i]);
            buf.extend_from_slice(b"\\u202");
            buf.push(HEX[(ch as u32 & 0xf) as usize]);
            start = i + ch.len_utf8();
        }
    }
    buf.extend_from_slice(&bytes[start..]);
    buf.push(b'"');
}
