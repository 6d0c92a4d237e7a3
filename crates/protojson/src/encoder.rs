//! `Encoder`: append-only JSON writer.
//!
//! Values written through the `write_*` methods get a `,` separator inserted
//! automatically unless the previous byte already opens a container, ends a
//! key or is a separator. Callers therefore never track "first element"
//! state themselves.

use base64::Engine;

use crate::strings::append_string;

pub struct Encoder {
    buf: Vec<u8>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Encoder {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn begin_object(&mut self) {
        self.separator();
        self.buf.push(b'{');
    }

    pub fn end_object(&mut self) {
        self.buf.push(b'}');
    }

    pub fn begin_array(&mut self) {
        self.separator();
        self.buf.push(b'[');
    }

    pub fn end_array(&mut self) {
        self.buf.push(b']');
    }

    pub fn write_key(&mut self, key: &str) {
        self.separator();
        append_string(&mut self.buf, key);
        self.buf.push(b':');
    }

    pub fn write_null(&mut self) {
        self.separator();
        self.buf.extend_from_slice(b"null");
    }

    pub fn write_bool(&mut self, v: bool) {
        self.separator();
        self.buf
            .extend_from_slice(if v { b"true" as &[u8] } else { b"false" });
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_ascii(&v.to_string());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_ascii(&v.to_string());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_ascii(&v.to_string());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_ascii(&v.to_string());
    }

    /// Shortest decimal that reads back as the same `f32`. Non-finite values
    /// are written as the strings `"NaN"`, `"+Inf"` and `"-Inf"`.
    pub fn write_f32(&mut self, v: f32) {
        match non_finite(f64::from(v)) {
            Some(s) => self.write_str(s),
            None => self.write_ascii(&format!("{}", v)),
        }
    }

    pub fn write_f64(&mut self, v: f64) {
        match non_finite(v) {
            Some(s) => self.write_str(s),
            None => self.write_ascii(&format!("{}", v)),
        }
    }

    pub fn write_str(&mut self, s: &str) {
        self.separator();
        append_string(&mut self.buf, s);
    }

    /// Standard padded base64, or `null` when there is no byte slice at all.
    pub fn write_bytes(&mut self, v: Option<&[u8]>) {
        let Some(v) = v else {
            self.write_null();
            return;
        };
        self.separator();
        self.buf.push(b'"');
        if !v.is_empty() {
            let encoded = base64::engine::general_purpose::STANDARD.encode(v);
            self.buf.extend_from_slice(encoded.as_bytes());
        }
        self.buf.push(b'"');
    }

    fn write_ascii(&mut self, s: &str) {
        self.separator();
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn separator(&mut self) {
        match self.buf.last() {
            None | Some(b'{' | b'[' | b':' | b',') => {}
            Some(_) => self.buf.push(b','),
        }
    }
}

fn non_finite(v: f64) -> Option<&'static str> {
    if v.is_nan() {
        Some("NaN")
    } else if v == f64::INFINITY {
        Some("+Inf")
    } else if v == f64::NEG_INFINITY {
        Some("-Inf")
    } else {
        None
    }
}
