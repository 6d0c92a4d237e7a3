//! Layered serialization options.
//!
//! Options are resolved once, at schema compile time, in the order
//! schema → message → oneof/enum → field. Every knob is an `Option` so an
//! unset value can fall through to the enclosing level.

use serde::Deserialize;

/// How JSON keys are derived from declared names when no explicit key is
/// configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStyle {
    /// The declared name, unchanged.
    #[default]
    TextName,
    /// `name_style1` → `NameStyle1`.
    UpperCamel,
    /// `name_style1` → `nameStyle1`.
    JsonName,
}

impl NameStyle {
    pub fn field_key(self, name: &str) -> String {
        match self {
            NameStyle::TextName => name.to_string(),
            NameStyle::UpperCamel => upper_camel_case(name),
            NameStyle::JsonName => json_camel_case(name),
        }
    }

    /// Oneof discriminator keys only change under `UpperCamel`.
    pub fn oneof_key(self, name: &str) -> String {
        match self {
            NameStyle::UpperCamel => upper_camel_case(name),
            NameStyle::TextName | NameStyle::JsonName => name.to_string(),
        }
    }
}

/// Capitalizes each word, dropping an `_` that precedes a lowercase letter.
/// A leading `_` becomes `X` so the result always starts upper case.
pub fn upper_camel_case(s: &str) -> String {
    let b = s.as_bytes();
    let mut out = String::with_capacity(b.len());
    let mut i = 0;
    while i < b.len() {
        let c = b[i];
        let next_lower = b.get(i + 1).is_some_and(u8::is_ascii_lowercase);
        match c {
            b'.' if next_lower => {}
            b'.' => out.push('_'),
            b'_' if i == 0 || b[i - 1] == b'.' => out.push('X'),
            b'_' if next_lower => {}
            b'0'..=b'9' => out.push(c as char),
            _ => {
                out.push(c.to_ascii_uppercase() as char);
                while b.get(i + 1).is_some_and(u8::is_ascii_lowercase) {
                    i += 1;
                    out.push(b[i] as char);
                }
            }
        }
        i += 1;
    }
    out
}

/// Drops every `_` and upper-cases a lowercase letter that followed one.
pub fn json_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut after_underscore = false;
    for c in s.chars() {
        if c != '_' {
            out.push(if after_underscore {
                c.to_ascii_uppercase()
            } else {
                c
            });
        }
        after_underscore = c == '_';
    }
    out
}

/// Options that apply schema-wide or to one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerializeOptions {
    pub name_style: Option<NameStyle>,
    pub ignore: Option<bool>,
    pub omit_empty: Option<bool>,
    pub use_enum_string: Option<bool>,
    pub hide_oneof_key: Option<bool>,
    pub disallow_unknown_fields: Option<bool>,
}

impl SerializeOptions {
    /// Returns a copy with every unset option taken from `parent`.
    pub fn inherit(&self, parent: &SerializeOptions) -> SerializeOptions {
        SerializeOptions {
            name_style: self.name_style.or(parent.name_style),
            ignore: self.ignore.or(parent.ignore),
            omit_empty: self.omit_empty.or(parent.omit_empty),
            use_enum_string: self.use_enum_string.or(parent.use_enum_string),
            hide_oneof_key: self.hide_oneof_key.or(parent.hide_oneof_key),
            disallow_unknown_fields: self
                .disallow_unknown_fields
                .or(parent.disallow_unknown_fields),
        }
    }

    pub fn resolve(&self) -> MessagePolicy {
        MessagePolicy {
            name_style: self.name_style.unwrap_or_default(),
            ignore: self.ignore.unwrap_or(false),
            omit_empty: self.omit_empty.unwrap_or(false),
            use_enum_string: self.use_enum_string,
            hide_oneof_key: self.hide_oneof_key.unwrap_or(false),
            disallow_unknown_fields: self.disallow_unknown_fields.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldOptions {
    /// Explicit JSON key; `"-"` ignores the field.
    pub json: Option<String>,
    pub omit_empty: Option<bool>,
    pub use_enum_string: Option<bool>,
    pub ignore: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OneofOptions {
    /// Explicit discriminator key; `"-"` ignores the whole group.
    pub json: Option<String>,
    pub ignore: Option<bool>,
    pub omit_empty: Option<bool>,
    pub hide_oneof_key: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnumOptions {
    pub use_enum_string: Option<bool>,
}

/// Message-level options after inheritance and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagePolicy {
    pub name_style: NameStyle,
    pub ignore: bool,
    pub omit_empty: bool,
    /// Left unset so an enum's own setting can still apply to its fields.
    pub use_enum_string: Option<bool>,
    pub hide_oneof_key: bool,
    pub disallow_unknown_fields: bool,
}

/// Resolved settings for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPolicy {
    pub key: Option<String>,
    pub omit_empty: bool,
    pub enum_as_string: bool,
    pub ignore: bool,
}

impl FieldOptions {
    pub fn resolve(
        &self,
        name: &str,
        msg: &MessagePolicy,
        enum_options: Option<&EnumOptions>,
    ) -> FieldPolicy {
        let ignore = self.ignore.unwrap_or(msg.ignore) || self.json.as_deref() == Some("-");
        let enum_as_string = self
            .use_enum_string
            .or(msg.use_enum_string)
            .or(enum_options.and_then(|e| e.use_enum_string))
            .unwrap_or(false);
        FieldPolicy {
            key: (!ignore).then(|| {
                self.json
                    .clone()
                    .unwrap_or_else(|| msg.name_style.field_key(name))
            }),
            omit_empty: self.omit_empty.unwrap_or(msg.omit_empty),
            enum_as_string,
            ignore,
        }
    }
}

/// Resolved settings for one oneof group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneofPolicy {
    pub key: Option<String>,
    pub omit_empty: bool,
    pub hidden: bool,
    pub ignore: bool,
}

impl OneofOptions {
    pub fn resolve(&self, name: &str, msg: &MessagePolicy) -> OneofPolicy {
        let ignore = self.ignore.unwrap_or(msg.ignore) || self.json.as_deref() == Some("-");
        OneofPolicy {
            key: (!ignore).then(|| {
                self.json
                    .clone()
                    .unwrap_or_else(|| msg.name_style.oneof_key(name))
            }),
            omit_empty: self.omit_empty.unwrap_or(msg.omit_empty),
            hidden: self.hide_oneof_key.unwrap_or(msg.hide_oneof_key),
            ignore,
        }
    }
}
