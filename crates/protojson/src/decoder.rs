//! `Decoder`: a cursor over JSON text that has already passed the scanner.
//!
//! Because the input is known to be well formed, walking it only needs to
//! find item boundaries. Any inconsistency found here means the bytes changed
//! between validation and decoding, reported as [`DecodeError::OutOfSync`].

use crate::error::DecodeError;
use crate::parse::unquote;
use crate::scanner::check_valid;

pub struct Decoder<'a> {
    data: &'a [u8],
    x: usize,
}

impl<'a> Decoder<'a> {
    /// Validates `data` and positions the cursor at its start.
    pub fn new(data: &'a [u8]) -> Result<Self, DecodeError> {
        check_valid(data)?;
        Ok(Self { data, x: 0 })
    }

    pub fn skip_whitespace(&mut self) {
        while self.x < self.data.len() {
            match self.data[self.x] {
                b' ' | b'\t' | b'\n' | b'\r' => self.x += 1,
                _ => break,
            }
        }
    }

    /// First byte of the next item, after whitespace.
    pub fn peek(&mut self) -> Result<u8, DecodeError> {
        self.skip_whitespace();
        self.data.get(self.x).copied().ok_or(DecodeError::OutOfSync)
    }

    /// Consumes the next item and returns its raw bytes, inner whitespace
    /// included.
    pub fn read_item(&mut self) -> Result<&'a [u8], DecodeError> {
        self.skip_whitespace();
        let start = self.x;
        let data = self.data;
        let first = *data.get(start).ok_or(DecodeError::OutOfSync)?;
        let end = match first {
            b'"' => string_end(data, start)?,
            b'{' | b'[' => composite_end(data, start)?,
            b't' | b'n' => start + 4,
            b'f' => start + 5,
            b'-' | b'0'..=b'9' => {
                let mut x = start + 1;
                while x < data.len()
                    && matches!(data[x], b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-')
                {
                    x += 1;
                }
                x
            }
            _ => return Err(DecodeError::OutOfSync),
        };
        if end > data.len() {
            return Err(DecodeError::OutOfSync);
        }
        self.x = end;
        Ok(&data[start..end])
    }

    /// Consumes the opening `{` of an object.
    pub fn begin_object(&mut self) -> Result<(), DecodeError> {
        self.expect(b'{')
    }

    /// Consumes the opening `[` of an array.
    pub fn begin_array(&mut self) -> Result<(), DecodeError> {
        self.expect(b'[')
    }

    /// Reads the next key of the current object and the `:` after it.
    /// Returns `None` once the closing `}` has been consumed.
    pub fn next_key(&mut self) -> Result<Option<String>, DecodeError> {
        if self.peek()? == b',' {
            self.x += 1;
        }
        if self.peek()? == b'}' {
            self.x += 1;
            return Ok(None);
        }
        let raw = self.read_item()?;
        let key = unquote(raw).ok_or(DecodeError::OutOfSync)?;
        self.expect(b':')?;
        Ok(Some(key))
    }

    /// Moves to the next array element. Returns `false` once the closing `]`
    /// has been consumed.
    pub fn next_element(&mut self) -> Result<bool, DecodeError> {
        if self.peek()? == b',' {
            self.x += 1;
        }
        if self.peek()? == b']' {
            self.x += 1;
            return Ok(false);
        }
        Ok(true)
    }

    /// Only whitespace may follow the top-level value.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        self.skip_whitespace();
        if self.x != self.data.len() {
            return Err(DecodeError::OutOfSync);
        }
        Ok(())
    }

    fn expect(&mut self, c: u8) -> Result<(), DecodeError> {
        if self.peek()? != c {
            return Err(DecodeError::OutOfSync);
        }
        self.x += 1;
        Ok(())
    }
}

/// Index one past the closing quote of the string starting at `start`.
fn string_end(data: &[u8], start: usize) -> Result<usize, DecodeError> {
    let mut x = start + 1;
    while x < data.len() {
        match data[x] {
            b'\\' => x += 2,
            b'"' => return Ok(x + 1),
            _ => x += 1,
        }
    }
    Err(DecodeError::OutOfSync)
}

/// Index one past the bracket closing the object or array at `start`.
fn composite_end(data: &[u8], start: usize) -> Result<usize, DecodeError> {
    let mut depth = 0usize;
    let mut x = start;
    while x < data.len() {
        match data[x] {
            b'"' => {
                x = string_end(data, x)?;
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(x + 1);
                }
            }
            _ => {}
        }
        x += 1;
    }
    Err(DecodeError::OutOfSync)
}
