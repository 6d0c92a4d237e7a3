//! Byte-at-a-time JSON validation state machine.
//!
//! The whole input is validated before any field is decoded, so every later
//! pass can walk the bytes without re-checking syntax. Error messages follow
//! the fixed vocabulary callers assert on: `invalid character 'x' <context>`
//! or `unexpected end of JSON input`.

use crate::error::SyntaxError;

/// Deepest object/array nesting accepted.
pub const MAX_NESTING_DEPTH: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    ObjectKey,
    ObjectValue,
    ArrayValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeginValue,
    BeginValueOrEmpty,
    BeginStringOrEmpty,
    BeginString,
    EndValue,
    EndTop,
    InString,
    InStringEsc,
    /// Inside `\u`, holding the number of hex digits already read.
    InStringEscU(u8),
    Neg,
    One,
    Zero,
    Dot,
    Dot0,
    E,
    ESign,
    E0,
    /// Inside `true`/`false`/`null`; `at` indexes the next expected byte.
    Literal { word: &'static [u8], at: usize },
}

/// Validates that `data` holds exactly one JSON value.
pub fn check_valid(data: &[u8]) -> Result<(), SyntaxError> {
    let mut scan = Scanner::new();
    for &c in data {
        scan.bytes += 1;
        scan.step(c)?;
    }
    scan.eof()
}

#[derive(Debug)]
pub struct Scanner {
    state: State,
    stack: Vec<Phase>,
    end_top: bool,
    bytes: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            state: State::BeginValue,
            stack: Vec::new(),
            end_top: false,
            bytes: 0,
        }
    }

    /// Signals end of input. Incomplete values report `unexpected end of
    /// JSON input`; a dangling number or literal reports its own context.
    pub fn eof(&mut self) -> Result<(), SyntaxError> {
        if self.end_top {
            return Ok(());
        }
        self.step(b' ')?;
        if self.end_top {
            return Ok(());
        }
        Err(SyntaxError::new("unexpected end of JSON input", self.bytes))
    }

    pub fn step(&mut self, c: u8) -> Result<(), SyntaxError> {
        match self.state {
            State::BeginValueOrEmpty => {
                if is_space(c) {
                    return Ok(());
                }
                if c == b']' {
                    return self.end_value(c);
                }
                self.begin_value(c)
            }
            State::BeginValue => self.begin_value(c),
            State::BeginStringOrEmpty => {
                if is_space(c) {
                    return Ok(());
                }
                if c == b'}' {
                    if let Some(last) = self.stack.last_mut() {
                        *last = Phase::ObjectValue;
                    }
                    return self.end_value(c);
                }
                self.begin_string(c)
            }
            State::BeginString => self.begin_string(c),
            State::EndValue => self.end_value(c),
            State::EndTop => self.end_top(c),
            State::InString => {
                match c {
                    b'"' => self.state = State::EndValue,
                    b'\\' => self.state = State::InStringEsc,
                    c if c < 0x20 => return Err(self.error(c, "in string literal")),
                    _ => {}
                }
                Ok(())
            }
            State::InStringEsc => match c {
                b'b' | b'f' | b'n' | b'r' | b't' | b'\\' | b'/' | b'"' => {
                    self.state = State::InString;
                    Ok(())
                }
                b'u' => {
                    self.state = State::InStringEscU(0);
                    Ok(())
                }
                _ => Err(self.error(c, "in string escape code")),
            },
            State::InStringEscU(seen) => {
                if !c.is_ascii_hexdigit() {
                    return Err(self.error(c, "in \\u hexadecimal character escape"));
                }
                self.state = if seen == 3 {
                    State::InString
                } else {
                    State::InStringEscU(seen + 1)
                };
                Ok(())
            }
            State::Neg => match c {
                b'0' => {
                    self.state = State::Zero;
                    Ok(())
                }
                b'1'..=b'9' => {
                    self.state = State::One;
                    Ok(())
                }
                _ => Err(self.error(c, "in numeric literal")),
            },
            State::One => {
                if c.is_ascii_digit() {
                    return Ok(());
                }
                self.zero(c)
            }
            State::Zero => self.zero(c),
            State::Dot => {
                if c.is_ascii_digit() {
                    self.state = State::Dot0;
                    return Ok(());
                }
                Err(self.error(c, "after decimal point in numeric literal"))
            }
            State::Dot0 => match c {
                b'0'..=b'9' => Ok(()),
                b'e' | b'E' => {
                    self.state = State::E;
                    Ok(())
                }
                _ => self.end_value(c),
            },
            State::E => {
                if c == b'+' || c == b'-' {
                    self.state = State::ESign;
                    return Ok(());
                }
                self.exponent_sign(c)
            }
            State::ESign => self.exponent_sign(c),
            State::E0 => {
                if c.is_ascii_digit() {
                    return Ok(());
                }
                self.end_value(c)
            }
            State::Literal { word, at } => {
                if c != word[at] {
                    let context = format!(
                        "in literal {} (expecting '{}')",
                        String::from_utf8_lossy(word),
                        word[at] as char
                    );
                    return Err(self.error(c, &context));
                }
                self.state = if at + 1 == word.len() {
                    State::EndValue
                } else {
                    State::Literal { word, at: at + 1 }
                };
                Ok(())
            }
        }
    }

    fn begin_value(&mut self, c: u8) -> Result<(), SyntaxError> {
        if is_space(c) {
            return Ok(());
        }
        match c {
            b'{' => {
                self.state = State::BeginStringOrEmpty;
                self.push(c, Phase::ObjectKey)
            }
            b'[' => {
                self.state = State::BeginValueOrEmpty;
                self.push(c, Phase::ArrayValue)
            }
            b'"' => {
                self.state = State::InString;
                Ok(())
            }
            b'-' => {
                self.state = State::Neg;
                Ok(())
            }
            b'0' => {
                self.state = State::Zero;
                Ok(())
            }
            b'1'..=b'9' => {
                self.state = State::One;
                Ok(())
            }
            b't' => self.literal(b"true"),
            b'f' => self.literal(b"false"),
            b'n' => self.literal(b"null"),
            _ => Err(self.error(c, "looking for beginning of value")),
        }
    }

    fn begin_string(&mut self, c: u8) -> Result<(), SyntaxError> {
        if is_space(c) {
            return Ok(());
        }
        if c == b'"' {
            self.state = State::InString;
            return Ok(());
        }
        Err(self.error(c, "looking for beginning of object key string"))
    }

    fn end_value(&mut self, c: u8) -> Result<(), SyntaxError> {
        let Some(phase) = self.stack.last().copied() else {
            self.state = State::EndTop;
            self.end_top = true;
            return self.end_top(c);
        };
        if is_space(c) {
            self.state = State::EndValue;
            return Ok(());
        }
        match phase {
            Phase::ObjectKey => {
                if c == b':' {
                    self.set_phase(Phase::ObjectValue);
                    self.state = State::BeginValue;
                    return Ok(());
                }
                Err(self.error(c, "after object key"))
            }
            Phase::ObjectValue => match c {
                b',' => {
                    self.set_phase(Phase::ObjectKey);
                    self.state = State::BeginString;
                    Ok(())
                }
                b'}' => {
                    self.pop();
                    Ok(())
                }
                _ => Err(self.error(c, "after object key:value pair")),
            },
            Phase::ArrayValue => match c {
                b',' => {
                    self.state = State::BeginValue;
                    Ok(())
                }
                b']' => {
                    self.pop();
                    Ok(())
                }
                _ => Err(self.error(c, "after array element")),
            },
        }
    }

    fn end_top(&mut self, c: u8) -> Result<(), SyntaxError> {
        if is_space(c) {
            return Ok(());
        }
        Err(self.error(c, "after top-level value"))
    }

    fn zero(&mut self, c: u8) -> Result<(), SyntaxError> {
        match c {
            b'.' => {
                self.state = State::Dot;
                Ok(())
            }
            b'e' | b'E' => {
                self.state = State::E;
                Ok(())
            }
            _ => self.end_value(c),
        }
    }

    fn exponent_sign(&mut self, c: u8) -> Result<(), SyntaxError> {
        if c.is_ascii_digit() {
            self.state = State::E0;
            return Ok(());
        }
        Err(self.error(c, "in exponent of numeric literal"))
    }

    fn literal(&mut self, word: &'static [u8]) -> Result<(), SyntaxError> {
        self.state = State::Literal { word, at: 1 };
        Ok(())
    }

    fn push(&mut self, c: u8, phase: Phase) -> Result<(), SyntaxError> {
        self.stack.push(phase);
        if self.stack.len() <= MAX_NESTING_DEPTH {
            return Ok(());
        }
        Err(self.error(c, "exceeded max depth"))
    }

    fn pop(&mut self) {
        self.stack.pop();
        if self.stack.is_empty() {
            self.state = State::EndTop;
            self.end_top = true;
        } else {
            self.state = State::EndValue;
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if let Some(last) = self.stack.last_mut() {
            *last = phase;
        }
    }

    fn error(&self, c: u8, context: &str) -> SyntaxError {
        SyntaxError::new(
            format!("invalid character {} {}", quote_char(c), context),
            self.bytes,
        )
    }
}

fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n')
}

/// Formats a byte as a quoted character for error messages.
pub(crate) fn quote_char(c: u8) -> String {
    match c {
        b'\'' => r"'\''".to_string(),
        b'"' => "'\"'".to_string(),
        0x07 => r"'\a'".to_string(),
        0x08 => r"'\b'".to_string(),
        0x0c => r"'\f'".to_string(),
        b'\n' => r"'\n'".to_string(),
        b'\r' => r"'\r'".to_string(),
        b'\t' => r"'\t'".to_string(),
        0x0b => r"'\v'".to_string(),
        b'\\' => r"'\\'".to_string(),
        0x00..=0x1f | 0x7f => format!("'\\x{:02x}'", c),
        0x80..=0xa0 | 0xad => format!("'\\u{:04x}'", c),
        _ => format!("'{}'", char::from(c)),
    }
}
