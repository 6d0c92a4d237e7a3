//! Plain-data schema definitions.
//!
//! These are what a schema producer hands to the codec: message, field,
//! oneof and enum declarations with their serialize options, in declaration
//! order. They can be built in code or deserialized from JSON, and are turned
//! into descriptors by [`Schema::compile`].
//!
//! # Example
//!
//! ```
//! use protojson::schema_def::{FieldDef, Kind, MessageDef, SchemaDef};
//!
//! let schema = SchemaDef::new()
//!     .message(
//!         MessageDef::new("Point")
//!             .field(FieldDef::new("x", Kind::Int32))
//!             .field(FieldDef::new("y", Kind::Int32)),
//!     )
//!     .compile()
//!     .unwrap();
//! let point = schema.message_type("Point").unwrap();
//! assert_eq!(point.name(), "Point");
//! ```

use std::sync::Arc;

use serde::Deserialize;

use crate::descriptor::Schema;
use crate::error::SchemaError;
use crate::options::{EnumOptions, FieldOptions, NameStyle, OneofOptions, SerializeOptions};

/// Declared field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    String,
    Bytes,
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    Enum,
    Message,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Bool => "bool",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Sint32 => "sint32",
            Kind::Sint64 => "sint64",
            Kind::Fixed32 => "fixed32",
            Kind::Fixed64 => "fixed64",
            Kind::Sfixed32 => "sfixed32",
            Kind::Sfixed64 => "sfixed64",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Enum => "enum",
            Kind::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    #[default]
    Singular,
    Optional,
    Repeated,
    Map,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaDef {
    pub options: SerializeOptions,
    pub messages: Vec<MessageDef>,
    pub enums: Vec<EnumDef>,
}

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::Definition(e.to_string()))
    }

    pub fn options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn message(mut self, message: MessageDef) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, def: EnumDef) -> Self {
        self.enums.push(def);
        self
    }

    pub fn compile(&self) -> Result<Arc<Schema>, SchemaError> {
        Schema::compile(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageDef {
    pub name: String,
    pub options: SerializeOptions,
    pub fields: Vec<FieldDef>,
    pub oneofs: Vec<OneofDef>,
}

impl MessageDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name_style(mut self, style: NameStyle) -> Self {
        self.options.name_style = Some(style);
        self
    }

    pub fn disallow_unknown_fields(mut self) -> Self {
        self.options.disallow_unknown_fields = Some(true);
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn oneof(mut self, oneof: OneofDef) -> Self {
        self.oneofs.push(oneof);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    pub kind: Kind,
    #[serde(default)]
    pub label: Label,
    /// Key kind, for `Label::Map` only. `kind` then describes the value.
    #[serde(default)]
    pub map_key: Option<Kind>,
    /// Enum or message name for `Kind::Enum` and `Kind::Message`.
    #[serde(default)]
    pub type_name: Option<String>,
    /// Name of the oneof group this field belongs to.
    #[serde(default)]
    pub oneof: Option<String>,
    #[serde(default)]
    pub options: FieldOptions,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: Label::Singular,
            map_key: None,
            type_name: None,
            oneof: None,
            options: FieldOptions::default(),
        }
    }

    pub fn message(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, Kind::Message).type_name(type_name)
    }

    pub fn enumeration(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, Kind::Enum).type_name(type_name)
    }

    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.label = Label::Optional;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    pub fn map(mut self, key: Kind) -> Self {
        self.label = Label::Map;
        self.map_key = Some(key);
        self
    }

    pub fn in_oneof(mut self, oneof: impl Into<String>) -> Self {
        self.oneof = Some(oneof.into());
        self
    }

    pub fn json(mut self, key: impl Into<String>) -> Self {
        self.options.json = Some(key.into());
        self
    }

    pub fn omit_empty(mut self, on: bool) -> Self {
        self.options.omit_empty = Some(on);
        self
    }

    pub fn enum_string(mut self, on: bool) -> Self {
        self.options.use_enum_string = Some(on);
        self
    }

    pub fn ignore(mut self) -> Self {
        self.options.ignore = Some(true);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OneofDef {
    pub name: String,
    pub options: OneofOptions,
}

impl OneofDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn hidden(mut self, on: bool) -> Self {
        self.options.hide_oneof_key = Some(on);
        self
    }

    pub fn json(mut self, key: impl Into<String>) -> Self {
        self.options.json = Some(key.into());
        self
    }

    pub fn omit_empty(mut self, on: bool) -> Self {
        self.options.omit_empty = Some(on);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<EnumValueDef>,
    pub options: EnumOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumValueDef {
    pub name: String,
    pub number: i32,
}

impl EnumDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValueDef {
            name: name.into(),
            number,
        });
        self
    }

    pub fn use_enum_string(mut self, on: bool) -> Self {
        self.options.use_enum_string = Some(on);
        self
    }
}
