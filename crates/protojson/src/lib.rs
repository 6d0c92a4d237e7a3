//! Schema-driven JSON codec for protobuf-style messages.
//!
//! A [`SchemaDef`] describes messages, enums and their serialize options.
//! Compiling it yields a [`Schema`] whose [`MessageType`]s build
//! [`Message`] instances that marshal to and unmarshal from JSON text.
//! Unmarshal merges into the existing instance instead of resetting it.
//!
//! # Example
//!
//! ```
//! use protojson::{FieldDef, Kind, MessageDef, SchemaDef};
//!
//! let schema = SchemaDef::new()
//!     .message(
//!         MessageDef::new("Item")
//!             .field(FieldDef::new("name", Kind::String).omit_empty(true))
//!             .field(FieldDef::new("counts", Kind::Int32).map(Kind::Int32)),
//!     )
//!     .compile()
//!     .unwrap();
//! let item = schema.message_type("Item").unwrap();
//!
//! let mut m = item.new_message();
//! m.unmarshal_json(br#"{"counts": {"1": 10}}"#).unwrap();
//! m.unmarshal_json(br#"{"counts": {"2": 20}}"#).unwrap();
//! assert_eq!(m.marshal_json().unwrap(), br#"{"counts":{"1":10,"2":20}}"#);
//! ```

pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod marshal;
pub mod options;
pub mod parse;
pub mod policy;
pub mod scanner;
pub mod schema_def;
pub mod strings;
pub mod unmarshal;
pub mod value;

pub use descriptor::{MessageType, Schema};
pub use error::{DecodeError, EncodeError, FieldError, SchemaError, SyntaxError};
pub use marshal::marshal;
pub use options::{FieldOptions, NameStyle, OneofOptions, SerializeOptions};
pub use schema_def::{EnumDef, FieldDef, Kind, Label, MessageDef, OneofDef, SchemaDef};
pub use unmarshal::unmarshal;
pub use value::{FieldValue, MapKey, Message, OneofCase, Value};
