//! Error types shared by the codec.
//!
//! Decode errors render with the exact wording callers compare against, so
//! the `#[error]` strings below are part of the public contract.

/// Malformed JSON text. `offset` is the number of bytes consumed when the
/// scanner gave up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{msg}")]
pub struct SyntaxError {
    pub msg: String,
    pub offset: usize,
}

impl SyntaxError {
    pub(crate) fn new(msg: impl Into<String>, offset: usize) -> Self {
        Self {
            msg: msg.into(),
            offset,
        }
    }
}

/// Where inside a field a mismatching value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Value,
    Array,
    ArrayElement,
    Map,
    MapKey,
    MapValue,
    Oneof,
}

impl Position {
    fn prefix(self) -> &'static str {
        match self {
            Position::Value => "",
            Position::Array => "as array ",
            Position::ArrayElement => "as array element ",
            Position::Map => "as map ",
            Position::MapKey => "as map key ",
            Position::MapValue => "as map value ",
            Position::Oneof => "as oneof ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("json: cannot unmarshal {raw} into object")]
    NotObject { raw: String },

    #[error("json: cannot unmarshal {raw} {}into field {field} of type {ty}", .position.prefix())]
    Mismatch {
        raw: String,
        position: Position,
        field: String,
        ty: String,
    },

    #[error("json: unknown enum value {raw} in field {field}")]
    UnknownEnumValue { raw: String, field: String },

    #[error("json: unknown field {key:?}")]
    UnknownField { key: String },

    #[error("json: unknown oneof field {key:?}")]
    UnknownOneofField { key: String },

    #[error("json: unmarshal: the field {key} is type oneof, allow contains only one")]
    OneofConflict { key: String },

    #[error("json: cannot unmarshal into {message}: exceeded max depth")]
    MaxDepth { message: String },

    #[error("json: Unmarshal: {message} is nil")]
    NilReceiver { message: String },

    #[error("JSON decoder out of sync - data changing underfoot?")]
    OutOfSync,
}

impl DecodeError {
    pub(crate) fn mismatch(raw: &[u8], position: Position, field: &str, ty: String) -> Self {
        DecodeError::Mismatch {
            raw: String::from_utf8_lossy(raw).into_owned(),
            position,
            field: field.to_string(),
            ty,
        }
    }

    pub(crate) fn not_object(raw: &[u8]) -> Self {
        DecodeError::NotObject {
            raw: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

/// A message instance holds a value that does not fit its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("json: field {field} of {message} holds {found}, expected {expected}")]
    ValueMismatch {
        message: String,
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("json: cannot marshal {message}: exceeded max depth")]
    MaxDepth { message: String },

    #[error("json: message {found} stored in field {field} of type {expected}")]
    MessageMismatch {
        field: String,
        expected: String,
        found: String,
    },
}

/// Failures while compiling schema definitions into descriptors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema: message {0:?} is defined more than once")]
    DuplicateMessage(String),

    #[error("schema: enum {0:?} is defined more than once")]
    DuplicateEnum(String),

    #[error("schema: field {message}.{field} refers to unknown message {target:?}")]
    UnknownMessage {
        message: String,
        field: String,
        target: String,
    },

    #[error("schema: field {message}.{field} refers to unknown enum {target:?}")]
    UnknownEnum {
        message: String,
        field: String,
        target: String,
    },

    #[error("schema: field {message}.{field} has no type reference for kind {kind}")]
    MissingTypeRef {
        message: String,
        field: String,
        kind: &'static str,
    },

    #[error("schema: field {message}.{field} uses {kind} as map key")]
    InvalidMapKey {
        message: String,
        field: String,
        kind: &'static str,
    },

    #[error("schema: field {message}.{field} is a oneof member and must be singular")]
    InvalidOneofMember { message: String, field: String },

    #[error("schema: field {message}.{field} refers to undeclared oneof {oneof:?}")]
    UnknownOneof {
        message: String,
        field: String,
        oneof: String,
    },

    #[error("schema: oneof {message}.{oneof} has no members")]
    EmptyOneof { message: String, oneof: String },

    #[error("schema: field {message}.{field} is declared more than once")]
    DuplicateField { message: String, field: String },

    #[error("schema: {message}.{name} resolves to an empty json key")]
    EmptyJsonKey { message: String, name: String },

    #[error("schema: json key {key:?} is used more than once in {scope}")]
    DuplicateJsonKey { scope: String, key: String },

    #[error("schema: enum {enum_name} declares {symbol:?} more than once")]
    DuplicateEnumSymbol { enum_name: String, symbol: String },

    #[error("schema: invalid definition: {0}")]
    Definition(String),
}

/// Misuse of the instance accessors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("message {message} has no field {field:?}")]
    UnknownField { message: String, field: String },

    #[error("message {message} has no oneof {oneof:?}")]
    UnknownOneof { message: String, oneof: String },

    #[error("field {field:?} does not belong to a oneof")]
    NotOneofMember { field: String },

    #[error("field {field:?} belongs to oneof {oneof:?}; use set_oneof")]
    OneofMember { oneof: String, field: String },

    #[error("value does not fit field {field:?} of type {expected}")]
    TypeMismatch { field: String, expected: String },
}
